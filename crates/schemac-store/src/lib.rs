//! Directory-backed schema documents for the schemac compiler.
//!
//! Load `*.schema.json` files from a directory with size and count limits,
//! then install them into a [`schemac_core::SchemaCompiler`] so `$ref`s
//! between documents resolve.

pub mod config;
pub mod error;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use store::SchemaStore;
