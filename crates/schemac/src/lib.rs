//! Extensible JSON Schema compiler.
//!
//! schemac compiles draft-07 schemas into reusable validators. Keywords are
//! held in a registry that callers extend with their own definitions, and
//! keyword values may be read from the validated data through `$data`.
//!
//! # Crate Structure
//!
//! - Root re-exports: registry, extension API and compiler from `schemac-core`
//! - [`store`]: directory-backed schema documents (behind `store` feature)

pub use schemac_core::*;

/// Re-export store types (requires `store` feature).
#[cfg(feature = "store")]
pub mod store {
    pub use schemac_store::*;
}
