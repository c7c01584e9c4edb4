use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::compile::{self, refs, Env};
use crate::config::Options;
use crate::error::{Result, SchemaError};
use crate::rules::ValidationRules;
use crate::validator::ValidateFunction;
use crate::vocab::format::{Format, Formats};

/// Compiles schemas into [`ValidateFunction`]s.
///
/// Owns the keyword registry, the format registry and the schema cache used
/// to resolve `$ref`s between documents.
pub struct SchemaCompiler {
    pub(crate) options: Options,
    pub(crate) rules: ValidationRules,
    pub(crate) formats: Formats,
    pub(crate) schemas: HashMap<String, Value>,
    compiled: RwLock<HashMap<String, ValidateFunction>>,
    pub(crate) definition_validator: OnceLock<ValidateFunction>,
}

impl SchemaCompiler {
    /// Create a compiler with the built-in keywords and formats.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            rules: ValidationRules::with_builtins(),
            formats: Formats::builtin(),
            schemas: HashMap::new(),
            compiled: RwLock::new(HashMap::new()),
            definition_validator: OnceLock::new(),
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Compile `schema`; `$ref`s may point into it or into the schema cache.
    pub fn compile(&self, schema: &Value) -> Result<ValidateFunction> {
        self.compile_with(&self.rules, schema)
    }

    pub(crate) fn compile_with(
        &self,
        rules: &ValidationRules,
        schema: &Value,
    ) -> Result<ValidateFunction> {
        compile::compile_root(
            Env {
                rules,
                options: self.options,
                formats: &self.formats,
                schemas: &self.schemas,
            },
            schema,
        )
    }

    /// Add a document to the schema cache under `key`, or under its `$id` when `key` is `None`.
    ///
    /// Returns the normalized key.
    pub fn add_schema(&mut self, schema: Value, key: Option<&str>) -> Result<String> {
        let id = key
            .or_else(|| schema.get("$id").and_then(Value::as_str))
            .ok_or_else(|| SchemaError::compilation("$id", "#", "schema needs an $id or a key"))?;
        let key = refs::normalize_id(id)?;
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::DuplicateSchema(key));
        }
        debug!(key = %key, "schema added");
        self.schemas.insert(key.clone(), schema);
        self.invalidate();
        Ok(key)
    }

    /// Remove a document from the schema cache. Returns it when it was present.
    pub fn remove_schema(&mut self, key: &str) -> Option<Value> {
        let key = refs::normalize_id(key).ok()?;
        let removed = self.schemas.remove(&key);
        if removed.is_some() {
            debug!(key = %key, "schema removed");
            self.invalidate();
        }
        removed
    }

    /// Compiled validator for a cached document, memoized.
    ///
    /// Returns `Ok(None)` when no document has that key.
    pub fn get_schema(&self, key: &str) -> Result<Option<ValidateFunction>> {
        let key = refs::normalize_id(key)?;
        if let Some(found) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Some(found.clone()));
        }

        let Some(schema) = self.schemas.get(&key) else {
            return Ok(None);
        };
        let compiled = self.compile(schema)?;

        let mut memo = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Some(memo.entry(key).or_insert(compiled).clone()))
    }

    /// Register a format for the `format` keyword, replacing any format with that name.
    pub fn add_format(&mut self, name: impl Into<String>, format: Format) {
        self.formats.insert(name, format);
        self.invalidate();
    }

    pub fn schema_keys(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Drop memoized validators after the registry, formats or cache change.
    pub(crate) fn invalidate(&mut self) {
        self.compiled
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl std::fmt::Debug for SchemaCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCompiler")
            .field("options", &self.options)
            .field("rules", &self.rules)
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cached_schemas_resolve_across_documents() {
        let mut compiler = SchemaCompiler::default();
        compiler
            .add_schema(
                json!({"$id": "http://example.com/defs.json", "definitions": {"port": {"type": "integer", "maximum": 65535}}}),
                None,
            )
            .unwrap();

        let validator = compiler
            .compile(&json!({"$ref": "http://example.com/defs.json#/definitions/port"}))
            .unwrap();
        assert!(validator.is_valid(&json!(8080)));
        assert!(!validator.is_valid(&json!(70000)));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut compiler = SchemaCompiler::default();
        compiler.add_schema(json!({}), Some("a.json")).unwrap();
        let err = compiler.add_schema(json!({}), Some("a.json")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateSchema(_)));
    }

    #[test]
    fn get_schema_memoizes_until_removed() {
        let mut compiler = SchemaCompiler::default();
        compiler
            .add_schema(json!({"type": "string"}), Some("name.json"))
            .unwrap();

        let first = compiler.get_schema("name.json").unwrap().unwrap();
        assert!(first.is_valid(&json!("x")));
        assert!(compiler.get_schema("name.json").unwrap().is_some());

        assert!(compiler.remove_schema("name.json").is_some());
        assert!(compiler.get_schema("name.json").unwrap().is_none());
    }

    #[test]
    fn missing_references_fail_compilation() {
        let compiler = SchemaCompiler::default();
        let err = compiler.compile(&json!({"$ref": "other.json"})).unwrap_err();
        assert!(matches!(err, SchemaError::MissingRef { .. }));
    }

    #[test]
    fn custom_formats() {
        let mut compiler = SchemaCompiler::default();
        let schema = json!({"format": "even"});
        assert!(matches!(
            compiler.compile(&schema).unwrap_err(),
            SchemaError::UnknownFormat { .. }
        ));

        compiler.add_format("even", Format::number(|x| x % 2.0 == 0.0));
        let validator = compiler.compile(&schema).unwrap();
        assert!(validator.is_valid(&json!(4)));
        assert!(!validator.is_valid(&json!(5)));
        assert!(validator.is_valid(&json!("odd strings are not numbers")));
    }
}
