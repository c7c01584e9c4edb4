//! Keyword registry and compilation engine for JSON Schema (draft-07) validators.
//!
//! A [`SchemaCompiler`] owns a registry of keyword rules grouped by the data
//! type they apply to. Compiling a schema lowers every keyword into a typed
//! program once; the resulting [`ValidateFunction`] runs that program against
//! any number of inputs, from any number of threads.
//!
//! Custom keywords are added through [`SchemaCompiler::add_keyword`] with a
//! [`KeywordDefinition`]. Keyword values may be `{"$data": "<pointer>"}`
//! references into the validated data when [`Options::data`] is enabled.

pub(crate) mod compile;
pub mod compiler;
pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod keyword;
pub mod report;
pub mod rules;
pub mod types;
pub mod validator;
pub mod vocab;

pub use compiler::SchemaCompiler;
pub use config::Options;
pub use context::KeywordCx;
pub use definition::{definition_schema, KeywordDefinition, KeywordErrorDefinition};
pub use error::{Result, SchemaError};
pub use keyword::{is_identifier, KeywordInfo};
pub use report::{errors_text, ErrorObject, ValidationErrors};
pub use rules::{Rule, RuleGroup, ValidationRules};
pub use types::{json_equal, DataType};
pub use validator::ValidateFunction;
pub use vocab::format::{Format, Formats};
pub use vocab::BuiltinKeyword;
