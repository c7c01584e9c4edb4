use std::collections::BTreeMap;
use std::fs::{File, Metadata};
use std::io::Read;
use std::path::Path;

use schemac_core::SchemaCompiler;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Schema documents keyed by `$id` (or file stem), ready to install into a compiler.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    documents: BTreeMap<String, Value>,
    config: StoreConfig,
}

impl SchemaStore {
    /// Create an empty store with default config.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with explicit config.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            documents: BTreeMap::new(),
            config,
        }
    }

    /// Add a document from JSON text. `name` is used when it has no `$id`.
    pub fn insert(&mut self, name: &str, schema_json: &str) -> Result<String> {
        let schema: Value =
            serde_json::from_str(schema_json).map_err(|source| StoreError::InvalidJson {
                name: name.to_string(),
                source,
            })?;
        self.insert_value(name, schema)
    }

    /// Add a parsed document. `name` is used when it has no `$id`.
    pub fn insert_value(&mut self, name: &str, mut schema: Value) -> Result<String> {
        if self.config.strict_mode {
            apply_strict_mode(&mut schema);
        }
        let key = schema
            .get("$id")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();
        if self.documents.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        debug!(key = %key, "schema document stored");
        self.documents.insert(key.clone(), schema);
        Ok(key)
    }

    /// Load schemas from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, StoreConfig::default())
    }

    /// Load every `*.schema.json` regular file in `path`.
    ///
    /// Symlinked schema files are refused. Files are read in name order, so
    /// duplicate-key errors are reported deterministically.
    pub fn from_directory_with_config(path: &Path, config: StoreConfig) -> Result<Self> {
        let mut store = Self::with_config(config);

        let mut entries = std::fs::read_dir(path)
            .map_err(|err| StoreError::LoadFailed(format!("{}: {err}", path.display())))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| StoreError::LoadFailed(err.to_string()))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut loaded = 0usize;
        for entry in entries {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(stem) = file_name.strip_suffix(SCHEMA_SUFFIX) else {
                continue;
            };
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| StoreError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                return Err(StoreError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            loaded = loaded.saturating_add(1);
            if loaded > store.config.max_schemas {
                return Err(StoreError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {loaded}",
                    store.config.max_schemas
                )));
            }

            let content = read_limited(&entry_path, &path_metadata, store.config.max_file_size)?;
            store.insert(stem, &content)?;
        }

        debug!(path = %path.display(), count = store.len(), "schema directory loaded");
        Ok(store)
    }

    /// Add every document to the compiler's schema cache.
    ///
    /// Either all documents are added or, on the first failure, none remain.
    pub fn install(&self, compiler: &mut SchemaCompiler) -> Result<Vec<String>> {
        let mut installed = Vec::with_capacity(self.documents.len());
        for (key, schema) in &self.documents {
            match compiler.add_schema(schema.clone(), Some(key)) {
                Ok(normalized) => installed.push(normalized),
                Err(err) => {
                    for normalized in &installed {
                        compiler.remove_schema(normalized);
                    }
                    return Err(err.into());
                }
            }
        }
        Ok(installed)
    }

    /// Stored document by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    /// Stored keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

fn read_limited(path: &Path, path_metadata: &Metadata, max_bytes: usize) -> Result<String> {
    let name = path.display();
    let file = File::open(path)
        .map_err(|err| StoreError::LoadFailed(format!("failed opening schema {name}: {err}")))?;
    let opened_metadata = file
        .metadata()
        .map_err(|err| StoreError::LoadFailed(err.to_string()))?;

    #[cfg(unix)]
    {
        if !same_file_identity(path_metadata, &opened_metadata) {
            return Err(StoreError::LoadFailed(format!(
                "schema file changed during load: {name}"
            )));
        }
    }
    #[cfg(not(unix))]
    let _ = path_metadata;

    if opened_metadata.len() > max_bytes as u64 {
        return Err(StoreError::LoadFailed(format!(
            "schema file too large ({} bytes): {name}",
            opened_metadata.len()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| StoreError::LoadFailed(format!("failed reading schema {name}: {err}")))?;
    if content.len() > max_bytes {
        return Err(StoreError::LoadFailed(format!(
            "schema file too large while reading: {name}"
        )));
    }
    Ok(content)
}

#[cfg(unix)]
fn same_file_identity(path_metadata: &Metadata, opened_metadata: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

/// Close object schemas that say nothing about additional properties.
fn apply_strict_mode(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_object_schema(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for key in ["properties", "patternProperties", "definitions", "dependencies"] {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    children.values_mut().for_each(apply_strict_mode);
                }
            }
            for key in [
                "additionalProperties",
                "propertyNames",
                "items",
                "additionalItems",
                "contains",
                "not",
                "if",
                "then",
                "else",
                "allOf",
                "anyOf",
                "oneOf",
            ] {
                if let Some(child) = map.get_mut(key) {
                    apply_strict_mode(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_strict_mode),
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    const OBJECT_KEYWORDS: [&str; 7] = [
        "properties",
        "patternProperties",
        "required",
        "dependencies",
        "propertyNames",
        "minProperties",
        "maxProperties",
    ];

    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "object"),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_prefers_id_over_name() {
        let mut store = SchemaStore::new();
        let key = store
            .insert("ignored", r#"{"$id": "http://example.com/a.json"}"#)
            .unwrap();
        assert_eq!(key, "http://example.com/a.json");
        assert_eq!(store.insert("b", "{}").unwrap(), "b");
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["b", "http://example.com/a.json"]);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut store = SchemaStore::new();
        store.insert("a", "{}").unwrap();
        assert!(matches!(
            store.insert("a", "true"),
            Err(StoreError::DuplicateKey(key)) if key == "a"
        ));
    }

    #[test]
    fn invalid_json_names_the_document() {
        let mut store = SchemaStore::new();
        assert!(matches!(
            store.insert("broken", "{"),
            Err(StoreError::InvalidJson { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn strict_mode_closes_nested_object_schemas() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "inner": {"required": ["v"]},
                "open": {"type": "object", "additionalProperties": true}
            },
            "items": [{"properties": {}}],
            "definitions": {"scalar": {"type": "string"}}
        });
        apply_strict_mode(&mut schema);

        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["inner"]["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["open"]["additionalProperties"], json!(true));
        assert_eq!(schema["items"][0]["additionalProperties"], json!(false));
        assert!(schema["definitions"]["scalar"].get("additionalProperties").is_none());
    }

    #[test]
    fn type_lists_count_as_object_schemas() {
        let map = json!({"type": ["null", "object"]});
        assert!(is_object_schema(map.as_object().unwrap()));
        let map = json!({"type": "array"});
        assert!(!is_object_schema(map.as_object().unwrap()));
    }
}
