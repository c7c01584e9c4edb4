use schemac_core::SchemaError;

/// Errors raised while loading or installing schema documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A schema file could not be read or violated a load limit.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// A schema file is not valid JSON.
    #[error("schema {name} is not valid JSON: {source}")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Two documents resolve to the same key.
    #[error("duplicate schema key {0}")]
    DuplicateKey(String),

    /// The compiler rejected a document.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
