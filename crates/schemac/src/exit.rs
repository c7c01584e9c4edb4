use std::fmt;
use std::io;
use std::path::Path;

use schemac_core::SchemaError;
use schemac_store::StoreError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const SCHEMA_ERROR: i32 = 65;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(path: &Path, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => FAILURE,
    };
    CliError::new(code, format!("{}: {err}", path.display()))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    CliError::new(SCHEMA_ERROR, format!("{context}: {err}"))
}

pub fn store_error(context: &str, err: StoreError) -> CliError {
    match err {
        StoreError::Schema(err) => schema_error(context, err),
        other => CliError::new(SCHEMA_ERROR, format!("{context}: {other}")),
    }
}
