use crate::report::{errors_text, ErrorObject};

/// Errors raised while registering keywords or compiling schemas.
///
/// Validation failures are never reported through this type; they are
/// returned as [`ErrorObject`] records by the compiled validator.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The keyword name is already recognized by the registry.
    #[error("keyword {0} is already defined")]
    DuplicateKeyword(String),

    /// The keyword name does not match the identifier grammar.
    #[error("keyword {0} is not a valid identifier")]
    InvalidIdentifier(String),

    /// The keyword definition failed the definition meta-schema.
    #[error("custom keyword definition for {keyword} is invalid: {}", errors_text(.errors))]
    InvalidDefinition {
        keyword: String,
        errors: Vec<ErrorObject>,
    },

    /// A keyword's schema value is malformed.
    #[error("{keyword} at {schema_path}: {message}")]
    Compilation {
        keyword: String,
        schema_path: String,
        message: String,
    },

    /// A schema node is neither an object nor a boolean.
    #[error("schema at {schema_path} must be an object or a boolean")]
    InvalidSchemaType { schema_path: String },

    /// Strict keyword mode rejected a keyword nobody recognizes.
    #[error("unknown keyword {keyword} at {schema_path}")]
    UnknownKeyword {
        keyword: String,
        schema_path: String,
    },

    /// The schema uses a format that is not registered.
    #[error("unknown format \"{format}\" at {schema_path}")]
    UnknownFormat { format: String, schema_path: String },

    /// A `$ref` could not be resolved against the schema cache.
    #[error("can't resolve reference {reference} from id {base}")]
    MissingRef { reference: String, base: String },

    /// A `pattern`/`patternProperties` regex did not compile.
    #[error("invalid regular expression {pattern:?} at {schema_path}: {source}")]
    InvalidRegex {
        pattern: String,
        schema_path: String,
        #[source]
        source: regex::Error,
    },

    /// A `$data` pointer is malformed.
    #[error("invalid $data reference {pointer:?} at {schema_path}")]
    InvalidDataRef {
        pointer: String,
        schema_path: String,
    },

    /// A schema with the same key is already in the schema cache.
    #[error("schema with key or id \"{0}\" already exists")]
    DuplicateSchema(String),

    /// An `$id` or `$ref` is not a valid URI reference.
    #[error("invalid URI {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, SchemaError>;

impl SchemaError {
    pub(crate) fn compilation(
        keyword: &str,
        schema_path: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::Compilation {
            keyword: keyword.to_string(),
            schema_path: schema_path.to_string(),
            message: message.into(),
        }
    }
}
