//! Keyword extension API: adding, removing and inspecting keywords.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::compiler::SchemaCompiler;
use crate::config::Options;
use crate::definition::{self, KeywordDefinition};
use crate::error::{Result, SchemaError};
use crate::report::ErrorObject;
use crate::rules::{Rule, ValidationRules};
use crate::validator::ValidateFunction;
use crate::vocab::format::Formats;

/// Lookup result of [`SchemaCompiler::get_keyword`].
#[derive(Debug, Clone, Copy)]
pub enum KeywordInfo<'a> {
    /// A custom keyword and its definition.
    Custom(&'a KeywordDefinition),
    /// A keyword recognized by the built-in set.
    Builtin,
    Unknown,
}

impl KeywordInfo<'_> {
    pub fn is_known(&self) -> bool {
        !matches!(self, KeywordInfo::Unknown)
    }
}

/// Whether `name` can be used as a keyword: `^[a-z_$][a-z0-9_$-]*$`, ignoring case.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-'))
}

/// Schema accepting `{"$data": "<json pointer or relative json pointer>"}`.
fn data_reference_schema() -> Value {
    json!({
        "type": "object",
        "required": ["$data"],
        "properties": {
            "$data": {
                "type": "string",
                "anyOf": [
                    { "format": "relative-json-pointer" },
                    { "format": "json-pointer" }
                ]
            }
        },
        "additionalProperties": false
    })
}

impl SchemaCompiler {
    /// Register a custom keyword.
    ///
    /// Fails when the name is already recognized or is not an identifier, when
    /// the definition is invalid, or when its meta-schema does not compile. On
    /// failure the registry is unchanged.
    pub fn add_keyword(&mut self, name: &str, definition: KeywordDefinition) -> Result<()> {
        self.add_keyword_inner(name, definition, true)
    }

    /// [`add_keyword`](Self::add_keyword) without checking the definition.
    pub fn add_keyword_unchecked(&mut self, name: &str, definition: KeywordDefinition) -> Result<()> {
        self.add_keyword_inner(name, definition, false)
    }

    fn add_keyword_inner(
        &mut self,
        name: &str,
        mut definition: KeywordDefinition,
        check: bool,
    ) -> Result<()> {
        if definition.keywords.is_empty() {
            definition.keywords.push(name.to_string());
        }
        let mut rules = self.rules.clone();
        self.register(&mut rules, name, Arc::new(definition), check)?;
        self.rules = rules;
        self.invalidate();
        Ok(())
    }

    /// Register every keyword of every definition, or none of them.
    pub fn add_vocabulary<I>(&mut self, definitions: I) -> Result<()>
    where
        I: IntoIterator<Item = KeywordDefinition>,
    {
        self.add_vocabulary_inner(definitions, true)
    }

    /// [`add_vocabulary`](Self::add_vocabulary) without checking the definitions.
    pub fn add_vocabulary_unchecked<I>(&mut self, definitions: I) -> Result<()>
    where
        I: IntoIterator<Item = KeywordDefinition>,
    {
        self.add_vocabulary_inner(definitions, false)
    }

    fn add_vocabulary_inner<I>(&mut self, definitions: I, check: bool) -> Result<()>
    where
        I: IntoIterator<Item = KeywordDefinition>,
    {
        let mut rules = self.rules.clone();
        for definition in definitions {
            if definition.keywords.is_empty() {
                return Err(SchemaError::InvalidDefinition {
                    keyword: String::new(),
                    errors: vec![ErrorObject {
                        keyword: "required".to_string(),
                        data_path: String::new(),
                        schema_path: "#/required".to_string(),
                        params: json!({ "missingProperty": "keyword" }),
                        message: "should have required property 'keyword'".to_string(),
                    }],
                });
            }
            let definition = Arc::new(definition);
            for name in &definition.keywords {
                self.register(&mut rules, name, definition.clone(), check)?;
            }
        }
        self.rules = rules;
        self.invalidate();
        Ok(())
    }

    fn register(
        &self,
        rules: &mut ValidationRules,
        name: &str,
        definition: Arc<KeywordDefinition>,
        check: bool,
    ) -> Result<()> {
        if rules.is_known(name) {
            return Err(SchemaError::DuplicateKeyword(name.to_string()));
        }
        if !is_identifier(name) {
            return Err(SchemaError::InvalidIdentifier(name.to_string()));
        }
        if check {
            let errors = self.keyword_definition_errors(&definition)?;
            if !errors.is_empty() {
                return Err(SchemaError::InvalidDefinition {
                    keyword: name.to_string(),
                    errors,
                });
            }
        }

        let meta_validator = match &definition.meta_schema {
            Some(meta) => {
                let schema = if definition.data && self.options.data {
                    json!({ "anyOf": [meta, data_reference_schema()] })
                } else {
                    meta.clone()
                };
                Some(self.compile_with(rules, &schema)?)
            }
            None => None,
        };

        let types = definition.types.clone();
        rules.add_custom(Rule::custom(name, definition, meta_validator), &types);
        debug!(keyword = name, types = ?types, "keyword added");
        Ok(())
    }

    /// Remove a keyword (custom or built-in). Removing an unknown keyword does nothing.
    pub fn remove_keyword(&mut self, name: &str) {
        if self.rules.remove(name) {
            debug!(keyword = name, "keyword removed");
            self.invalidate();
        }
    }

    pub fn get_keyword(&self, name: &str) -> KeywordInfo<'_> {
        match self.rules.custom(name).and_then(|rule| rule.definition()) {
            Some(definition) => KeywordInfo::Custom(definition),
            None if self.rules.is_known(name) => KeywordInfo::Builtin,
            None => KeywordInfo::Unknown,
        }
    }

    /// Check a definition, failing with [`SchemaError::InvalidDefinition`].
    pub fn validate_keyword_definition(&self, definition: &KeywordDefinition) -> Result<()> {
        let errors = self.keyword_definition_errors(definition)?;
        if errors.is_empty() {
            return Ok(());
        }
        Err(SchemaError::InvalidDefinition {
            keyword: definition.keywords.join(","),
            errors,
        })
    }

    /// Violations of the definition meta-schema and of the definition shape rules.
    pub fn keyword_definition_errors(
        &self,
        definition: &KeywordDefinition,
    ) -> Result<Vec<ErrorObject>> {
        let mut errors = match self.definition_validator()?.validate(&definition.to_value()) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.into_errors(),
        };
        errors.extend(definition::shape_errors(definition));
        if let Some(name) = definition.keywords.iter().find(|name| !is_identifier(name)) {
            errors.push(ErrorObject {
                keyword: "pattern".to_string(),
                data_path: "/keyword".to_string(),
                schema_path: "#/properties/keyword".to_string(),
                params: json!({ "pattern": identifier_pattern().map(Regex::as_str) }),
                message: format!("{name:?} is not a valid keyword identifier"),
            });
        }
        Ok(errors)
    }

    fn definition_validator(&self) -> Result<&ValidateFunction> {
        if let Some(validator) = self.definition_validator.get() {
            return Ok(validator);
        }
        let rules = ValidationRules::with_builtins();
        let formats = Formats::builtin();
        let schemas = Default::default();
        let validator = crate::compile::compile_root(
            crate::compile::Env {
                rules: &rules,
                options: Options {
                    all_errors: true,
                    ..Options::default()
                },
                formats: &formats,
                schemas: &schemas,
            },
            definition::definition_schema(),
        )?;
        Ok(self.definition_validator.get_or_init(|| validator))
    }
}

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^[a-z_$][a-z0-9_$-]*$").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_grammar() {
        assert!(is_identifier("even"));
        assert!(is_identifier("$my-keyword_2"));
        assert!(is_identifier("X"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier("dotted.name"));
    }

    #[test]
    fn identifier_regex_agrees() {
        let re = identifier_pattern().unwrap();
        for name in ["even", "$x", "a-b", "9a", "a b", ""] {
            assert_eq!(re.is_match(name), is_identifier(name), "{name}");
        }
    }
}
