/// Limits and rewriting applied while loading schema documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// When true, object schemas reject properties they do not declare.
    pub strict_mode: bool,
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas: usize,
    /// Maximum bytes allowed per schema file.
    pub max_file_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_schemas: 256,
            max_file_size: 256 * 1024,
        }
    }
}
