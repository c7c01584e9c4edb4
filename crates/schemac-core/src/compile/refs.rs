//! `$id` indexing and `$ref` resolution over the documents visible to a compilation.

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use crate::compile::data::parse_tokens;
use crate::error::{Result, SchemaError};

/// Base URI of documents without an `$id`.
pub(crate) const DEFAULT_BASE: &str = "json-schema:///";

/// Keywords whose values are data, not subschemas.
const DATA_KEYWORDS: &[&str] = &["const", "enum", "default", "examples"];

pub(crate) fn default_base() -> Result<Url> {
    Url::parse(DEFAULT_BASE).map_err(|source| SchemaError::InvalidUri {
        uri: DEFAULT_BASE.to_string(),
        source,
    })
}

pub(crate) fn join(base: &Url, reference: &str) -> Result<Url> {
    base.join(reference).map_err(|source| SchemaError::InvalidUri {
        uri: reference.to_string(),
        source,
    })
}

/// Canonical cache key of a schema id: absolute, without fragment.
pub(crate) fn normalize_id(id: &str) -> Result<String> {
    let mut url = join(&default_base()?, id)?;
    url.set_fragment(None);
    Ok(url.into())
}

/// Base URI of `schema` resolved against `base`.
pub(crate) fn schema_base(schema: &Value, base: &Url) -> Result<Url> {
    match schema.get("$id").and_then(Value::as_str) {
        Some(id) => {
            let mut url = join(base, id)?;
            url.set_fragment(None);
            Ok(url)
        }
        None => Ok(base.clone()),
    }
}

/// A resolved `$ref` target.
#[derive(Debug)]
pub(crate) struct Target<'c> {
    pub(crate) schema: &'c Value,
    pub(crate) base: Url,
    /// Identity of the target; equal keys compile to the same procedure.
    pub(crate) key: String,
    /// Fragment used as the schema path of errors inside the target.
    pub(crate) fragment: String,
}

/// Index of every identified schema in the visible documents.
#[derive(Debug, Default)]
pub(crate) struct Resolver<'c> {
    documents: HashMap<String, &'c Value>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(
        root: &'c Value,
        root_base: &Url,
        cache: impl IntoIterator<Item = (&'c String, &'c Value)>,
    ) -> Result<Self> {
        let mut resolver = Self::default();
        for (key, document) in cache {
            let base = Url::parse(key).map_err(|source| SchemaError::InvalidUri {
                uri: key.clone(),
                source,
            })?;
            resolver.documents.insert(key.clone(), document);
            resolver.index(document, &base)?;
        }
        resolver.documents.insert(root_base.to_string(), root);
        resolver.index(root, root_base)?;
        Ok(resolver)
    }

    fn index(&mut self, schema: &'c Value, base: &Url) -> Result<()> {
        match schema {
            Value::Object(map) => {
                let mut base = base.clone();
                if let Some(id) = map.get("$id").and_then(Value::as_str) {
                    let url = join(&base, id)?;
                    match url.fragment() {
                        Some(anchor) if !anchor.is_empty() && !anchor.starts_with('/') => {
                            self.documents.insert(url.to_string(), schema);
                        }
                        _ => {
                            let mut url = url;
                            url.set_fragment(None);
                            self.documents.insert(url.to_string(), schema);
                            base = url;
                        }
                    }
                }
                for (keyword, value) in map {
                    if !DATA_KEYWORDS.contains(&keyword.as_str()) {
                        self.index(value, &base)?;
                    }
                }
                Ok(())
            }
            Value::Array(items) => items.iter().try_for_each(|item| self.index(item, base)),
            _ => Ok(()),
        }
    }

    pub(crate) fn resolve(&self, base: &Url, reference: &str) -> Result<Target<'c>> {
        let missing = || SchemaError::MissingRef {
            reference: reference.to_string(),
            base: base.to_string(),
        };

        let url = join(base, reference)?;
        let fragment = url.fragment().unwrap_or_default().to_string();
        let mut document_url = url.clone();
        document_url.set_fragment(None);

        if !fragment.is_empty() && !fragment.starts_with('/') {
            let schema = self
                .documents
                .get(url.as_str())
                .copied()
                .ok_or_else(missing)?;
            return Ok(Target {
                schema,
                base: document_url,
                key: url.to_string(),
                fragment: String::new(),
            });
        }

        let document = self
            .documents
            .get(document_url.as_str())
            .copied()
            .ok_or_else(missing)?;
        let pointer = urlencoding::decode(&fragment).map_err(|_| missing())?;
        let tokens = parse_tokens(&pointer).ok_or_else(missing)?;

        let mut schema = document;
        let mut target_base = document_url.clone();
        for token in &tokens {
            schema = match schema {
                Value::Object(map) => map.get(token),
                Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(missing)?;
            target_base = schema_base(schema, &target_base)?;
        }

        Ok(Target {
            schema,
            base: target_base,
            key: format!("{document_url}#{pointer}"),
            fragment: pointer.into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolver<'c>(root: &'c Value, cache: &'c HashMap<String, Value>) -> Resolver<'c> {
        let base = schema_base(root, &default_base().unwrap()).unwrap();
        Resolver::new(root, &base, cache).unwrap()
    }

    #[test]
    fn resolves_local_pointers() {
        let root = json!({"definitions": {"a~b": {"type": "string"}}});
        let cache = HashMap::new();
        let resolver = resolver(&root, &cache);
        let base = default_base().unwrap();

        let target = resolver.resolve(&base, "#/definitions/a~0b").unwrap();
        assert_eq!(target.schema, &json!({"type": "string"}));
        assert_eq!(target.fragment, "/definitions/a~0b");

        let whole = resolver.resolve(&base, "#").unwrap();
        assert_eq!(whole.schema, &root);
    }

    #[test]
    fn resolves_nested_ids_and_anchors() {
        let root = json!({
            "$id": "http://example.com/root.json",
            "definitions": {
                "item": {"$id": "item.json", "type": "integer"},
                "named": {"$id": "#named", "type": "string"}
            }
        });
        let cache = HashMap::new();
        let resolver = resolver(&root, &cache);
        let base = Url::parse("http://example.com/root.json").unwrap();

        let item = resolver.resolve(&base, "item.json").unwrap();
        assert_eq!(item.schema["type"], "integer");

        let named = resolver.resolve(&base, "#named").unwrap();
        assert_eq!(named.schema["type"], "string");
    }

    #[test]
    fn resolves_cached_documents() {
        let root = json!({"$ref": "defs.json#/definitions/id"});
        let mut cache = HashMap::new();
        cache.insert(
            normalize_id("defs.json").unwrap(),
            json!({"definitions": {"id": {"type": "integer"}}}),
        );
        let resolver = resolver(&root, &cache);

        let target = resolver.resolve(&default_base().unwrap(), "defs.json#/definitions/id").unwrap();
        assert_eq!(target.schema, &json!({"type": "integer"}));
        assert_eq!(target.key, "json-schema:///defs.json#/definitions/id");
    }

    #[test]
    fn missing_targets_are_errors() {
        let root = json!({});
        let cache = HashMap::new();
        let resolver = resolver(&root, &cache);
        let err = resolver
            .resolve(&default_base().unwrap(), "#/definitions/nope")
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingRef { .. }));
    }
}
