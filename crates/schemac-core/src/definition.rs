//! Custom keyword definitions and the meta-schema they are checked against.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::{json, Map, Value};

use crate::context::KeywordCx;
use crate::error::Result;
use crate::types::DataType;

/// Builds the user-facing message from `(schema value, data)`.
pub type MessageFn = Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>;
/// Builds the structured `params` from `(schema value, data)`.
pub type ParamsFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;
/// Direct check of `(schema value, data)`; `true` means valid.
pub type ValidateFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;
/// Data check produced by a [`CompileFn`]; `true` means valid.
pub type DataCheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
/// Turns `(schema value, parent schema)` into a data check at compile time.
pub type CompileFn = Arc<
    dyn Fn(&Value, &Map<String, Value>) -> std::result::Result<DataCheckFn, String> + Send + Sync,
>;
/// Expands `(schema value, parent schema)` into a schema compiled in the keyword's place.
pub type MacroFn = Arc<dyn Fn(&Value, &Map<String, Value>) -> Value + Send + Sync>;
/// Low-level contributor: adds checks through the keyword context.
pub type CodeFn = Arc<dyn Fn(&mut KeywordCx<'_, '_>) -> Result<()> + Send + Sync>;

/// Message and params generators for a keyword's failures.
#[derive(Clone)]
pub struct KeywordErrorDefinition {
    pub message: MessageFn,
    pub params: ParamsFn,
}

impl KeywordErrorDefinition {
    pub fn new(
        message: impl Fn(&Value, &Value) -> String + Send + Sync + 'static,
        params: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: Arc::new(message),
            params: Arc::new(params),
        }
    }

    /// Error used when a custom keyword does not define one.
    pub(crate) fn default_for(keyword: &str) -> Self {
        let message = format!("should pass \"{keyword}\" keyword validation");
        let params = json!({ "keyword": keyword });
        Self::new(move |_, _| message.clone(), move |_, _| params.clone())
    }
}

impl fmt::Debug for KeywordErrorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeywordErrorDefinition { .. }")
    }
}

/// Author-supplied contract for a custom keyword.
///
/// Exactly one of `code`, `validate`, `compile` or `macro_fn` carries the
/// validation logic.
#[derive(Clone, Default)]
pub struct KeywordDefinition {
    /// Keyword names sharing this definition (used by vocabularies).
    pub keywords: Vec<String>,
    /// Data types the keyword applies to; empty applies to any type.
    pub types: Vec<DataType>,
    /// Accepted types of the keyword's literal schema value; empty accepts any.
    pub schema_type: Vec<DataType>,
    /// Whether the schema value may be a `{"$data": pointer}` reference.
    pub data: bool,
    /// Schema that literal schema values of this keyword must satisfy.
    pub meta_schema: Option<Value>,
    /// Keywords handled by this keyword's implementation.
    pub implements: Vec<String>,
    pub code: Option<CodeFn>,
    pub validate: Option<ValidateFn>,
    pub compile: Option<CompileFn>,
    pub macro_fn: Option<MacroFn>,
    pub error: Option<KeywordErrorDefinition>,
    /// Asynchronous validation; not supported by this engine.
    pub is_async: bool,
    /// `Some(false)`: `validate` receives `null` instead of the schema value.
    pub schema: Option<bool>,
    /// Fixed validation result, overriding what the logic returns.
    pub valid: Option<bool>,
}

impl KeywordDefinition {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keywords: vec![keyword.into()],
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn for_type(mut self, data_type: DataType) -> Self {
        self.types.push(data_type);
        self
    }

    pub fn schema_type(mut self, data_type: DataType) -> Self {
        self.schema_type.push(data_type);
        self
    }

    pub fn allow_data(mut self) -> Self {
        self.data = true;
        self
    }

    pub fn meta_schema(mut self, schema: Value) -> Self {
        self.meta_schema = Some(schema);
        self
    }

    pub fn implements(mut self, keyword: impl Into<String>) -> Self {
        self.implements.push(keyword.into());
        self
    }

    pub fn code(
        mut self,
        code: impl Fn(&mut KeywordCx<'_, '_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.code = Some(Arc::new(code));
        self
    }

    pub fn validate(
        mut self,
        validate: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    pub fn compile(
        mut self,
        compile: impl Fn(&Value, &Map<String, Value>) -> std::result::Result<DataCheckFn, String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.compile = Some(Arc::new(compile));
        self
    }

    pub fn macro_fn(
        mut self,
        expand: impl Fn(&Value, &Map<String, Value>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.macro_fn = Some(Arc::new(expand));
        self
    }

    pub fn error(
        mut self,
        message: impl Fn(&Value, &Value) -> String + Send + Sync + 'static,
        params: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.error = Some(KeywordErrorDefinition::new(message, params));
        self
    }

    pub fn without_schema(mut self) -> Self {
        self.schema = Some(false);
        self
    }

    pub fn always(mut self, valid: bool) -> Self {
        self.valid = Some(valid);
        self
    }

    pub(crate) fn error_definition(&self, keyword: &str) -> KeywordErrorDefinition {
        self.error
            .clone()
            .unwrap_or_else(|| KeywordErrorDefinition::default_for(keyword))
    }

    fn logic_count(&self) -> usize {
        [
            self.code.is_some(),
            self.validate.is_some(),
            self.compile.is_some(),
            self.macro_fn.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// JSON projection checked by [`definition_schema`], using the definition field names.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self.keywords.as_slice() {
            [single] => {
                map.insert("keyword".into(), json!(single));
            }
            names => {
                map.insert("keyword".into(), json!(names));
            }
        }
        if !self.types.is_empty() {
            map.insert("type".into(), type_list(&self.types));
        }
        if !self.schema_type.is_empty() {
            map.insert("schemaType".into(), type_list(&self.schema_type));
        }
        if self.data {
            map.insert("$data".into(), json!(true));
        }
        if let Some(meta) = &self.meta_schema {
            map.insert("metaSchema".into(), meta.clone());
        }
        if !self.implements.is_empty() {
            map.insert("implements".into(), json!(self.implements));
        }
        for (name, present) in [
            ("code", self.code.is_some()),
            ("validate", self.validate.is_some()),
            ("compile", self.compile.is_some()),
            ("macro", self.macro_fn.is_some()),
            ("error", self.error.is_some()),
        ] {
            if present {
                map.insert(name.into(), json!(true));
            }
        }
        if self.is_async {
            map.insert("async".into(), json!(true));
        }
        if let Some(schema) = self.schema {
            map.insert("schema".into(), json!(schema));
        }
        if let Some(valid) = self.valid {
            map.insert("valid".into(), json!(valid));
        }
        Value::Object(map)
    }
}

fn type_list(types: &[DataType]) -> Value {
    match types {
        [single] => json!(single.as_str()),
        many => json!(many.iter().map(|t| t.as_str()).collect::<Vec<_>>()),
    }
}

impl fmt::Debug for KeywordDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordDefinition")
            .field("keywords", &self.keywords)
            .field("types", &self.types)
            .field("schema_type", &self.schema_type)
            .field("data", &self.data)
            .field("meta_schema", &self.meta_schema)
            .field("implements", &self.implements)
            .field("code", &self.code.as_ref().map(|_| "<fn>"))
            .field("validate", &self.validate.as_ref().map(|_| "<fn>"))
            .field("compile", &self.compile.as_ref().map(|_| "<fn>"))
            .field("macro_fn", &self.macro_fn.as_ref().map(|_| "<fn>"))
            .field("error", &self.error)
            .field("is_async", &self.is_async)
            .field("schema", &self.schema)
            .field("valid", &self.valid)
            .finish()
    }
}

/// Meta-schema for [`KeywordDefinition::to_value`] projections.
pub fn definition_schema() -> &'static Value {
    static SCHEMA: OnceLock<Value> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        json!({
            "definitions": {
                "simpleTypes": {
                    "enum": ["array", "boolean", "integer", "null", "number", "object", "string"]
                },
                "typeList": {
                    "anyOf": [
                        { "$ref": "#/definitions/simpleTypes" },
                        {
                            "type": "array",
                            "items": { "$ref": "#/definitions/simpleTypes" },
                            "minItems": 1,
                            "uniqueItems": true
                        }
                    ]
                }
            },
            "type": "object",
            "required": ["keyword"],
            "dependencies": {
                "schema": ["validate"],
                "valid": { "not": { "required": ["macro"] } },
                "$data": { "anyOf": [{ "required": ["code"] }, { "required": ["validate"] }] }
            },
            "properties": {
                "keyword": {
                    "anyOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" }, "minItems": 1 }
                    ]
                },
                "type": { "$ref": "#/definitions/typeList" },
                "schemaType": { "$ref": "#/definitions/typeList" },
                "schema": { "type": "boolean" },
                "metaSchema": { "type": "object" },
                "implements": { "type": "array", "items": { "type": "string" } },
                "valid": { "type": "boolean" },
                "$data": { "type": "boolean" },
                "async": { "type": "boolean" },
                "code": { "const": true },
                "validate": { "const": true },
                "compile": { "const": true },
                "macro": { "const": true },
                "error": { "const": true }
            }
        })
    })
}

/// Shape checks the meta-schema cannot express, reported like validation errors.
pub(crate) fn shape_errors(definition: &KeywordDefinition) -> Vec<crate::report::ErrorObject> {
    use crate::report::ErrorObject;

    let mut errors = Vec::new();
    let mut push = |keyword: &str, data_path: &str, params: Value, message: String| {
        errors.push(ErrorObject {
            keyword: keyword.to_string(),
            data_path: data_path.to_string(),
            schema_path: "#".to_string(),
            params,
            message,
        });
    };

    match definition.logic_count() {
        0 => push(
            "logic",
            "",
            json!({ "allowed": ["code", "validate", "compile", "macro"] }),
            "should define one of code, validate, compile or macro".to_string(),
        ),
        1 => {}
        count => push(
            "logic",
            "",
            json!({ "count": count }),
            "should define only one of code, validate, compile or macro".to_string(),
        ),
    }
    if definition.is_async {
        push(
            "async",
            "/async",
            json!({}),
            "asynchronous keywords are not supported".to_string(),
        );
    }
    for (index, name) in definition.implements.iter().enumerate() {
        if !crate::keyword::is_identifier(name) {
            push(
                "implements",
                &format!("/implements/{index}"),
                json!({ "keyword": name }),
                format!("{name:?} is not a valid keyword identifier"),
            );
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_uses_definition_field_names() {
        let definition = KeywordDefinition::new("range")
            .for_type(DataType::Number)
            .schema_type(DataType::Array)
            .allow_data()
            .validate(|_, _| true);

        assert_eq!(
            definition.to_value(),
            json!({
                "keyword": "range",
                "type": "number",
                "schemaType": "array",
                "$data": true,
                "validate": true
            })
        );
    }

    #[test]
    fn shape_errors_require_exactly_one_logic() {
        let none = KeywordDefinition::new("empty");
        assert_eq!(shape_errors(&none).len(), 1);

        let two = KeywordDefinition::new("twice")
            .validate(|_, _| true)
            .macro_fn(|_, _| json!(true));
        assert_eq!(shape_errors(&two)[0].params, json!({ "count": 2 }));

        let fine = KeywordDefinition::new("fine").validate(|_, _| true);
        assert!(shape_errors(&fine).is_empty());
    }

    #[test]
    fn shape_errors_flag_async_and_bad_implements() {
        let mut definition = KeywordDefinition::new("x")
            .validate(|_, _| true)
            .implements("1bad");
        definition.is_async = true;

        let keywords: Vec<_> = shape_errors(&definition)
            .into_iter()
            .map(|e| e.keyword)
            .collect();
        assert_eq!(keywords, vec!["async", "implements"]);
    }
}
