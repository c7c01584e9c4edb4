use schemac_core::{ErrorObject, Options, SchemaCompiler, SchemaError};
use serde_json::{json, Value};

fn compiler() -> SchemaCompiler {
    SchemaCompiler::new(Options {
        data: true,
        all_errors: true,
        ..Options::default()
    })
}

fn errors(schema: &Value, data: &Value) -> Vec<ErrorObject> {
    match compiler().compile(schema).unwrap().validate(data) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.into_errors(),
    }
}

fn min_schema() -> Value {
    json!({
        "properties": {
            "min": {"type": "number"},
            "value": {"minimum": {"$data": "1/min"}}
        }
    })
}

#[test]
fn relative_reference_resolves_against_sibling() {
    assert!(errors(&min_schema(), &json!({"min": 5, "value": 5})).is_empty());

    let found = errors(&min_schema(), &json!({"min": 5, "value": 4}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].keyword, "minimum");
    assert_eq!(found[0].data_path, "/value");
    assert_eq!(found[0].schema_path, "#/properties/value/minimum");
    assert_eq!(found[0].params, json!({"comparison": ">=", "limit": 5}));
    assert_eq!(found[0].message, "should be >= 5");
}

#[test]
fn unresolved_reference_passes() {
    assert!(errors(&min_schema(), &json!({"value": -100})).is_empty());
}

#[test]
fn wrongly_typed_reference_fails() {
    let found = errors(&min_schema(), &json!({"min": "five", "value": 4}));
    let minimum: Vec<_> = found.iter().filter(|e| e.keyword == "minimum").collect();
    assert_eq!(minimum.len(), 1);
    assert_eq!(minimum[0].params, json!({"$data": "1/min"}));
    assert_eq!(minimum[0].message, "minimum value from $data should be number");
}

#[test]
fn absolute_reference_and_key_lookup() {
    let schema = json!({
        "properties": {
            "limits": {"type": "object"},
            "items": {
                "type": "array",
                "maxItems": {"$data": "/limits/count"}
            }
        }
    });
    assert!(errors(&schema, &json!({"limits": {"count": 2}, "items": [1, 2]})).is_empty());
    assert_eq!(
        errors(&schema, &json!({"limits": {"count": 2}, "items": [1, 2, 3]}))[0].keyword,
        "maxItems"
    );

    // `1#` is the property name of the parent location.
    let schema = json!({
        "additionalProperties": {
            "properties": {"name": {"const": {"$data": "1#"}}}
        }
    });
    assert!(errors(&schema, &json!({"alpha": {"name": "alpha"}})).is_empty());
    assert_eq!(
        errors(&schema, &json!({"alpha": {"name": "beta"}}))[0].data_path,
        "/alpha/name"
    );
}

#[test]
fn data_object_is_literal_when_option_is_off() {
    let compiler = SchemaCompiler::default();
    let err = compiler.compile(&min_schema()).unwrap_err();
    assert!(matches!(err, SchemaError::Compilation { ref keyword, .. } if keyword == "minimum"));

    // `const` accepts any value, so the reference object is compared literally.
    let validator = compiler
        .compile(&json!({"const": {"$data": "/x"}}))
        .unwrap();
    assert!(validator.is_valid(&json!({"$data": "/x"})));
}

#[test]
fn keywords_without_data_support_treat_reference_as_literal() {
    let err = compiler()
        .compile(&json!({"required": {"$data": "/fields"}}))
        .unwrap_err();
    assert!(matches!(err, SchemaError::Compilation { ref keyword, .. } if keyword == "required"));
}

#[test]
fn enum_and_pattern_from_data() {
    let schema = json!({
        "properties": {
            "choice": {"enum": {"$data": "1/allowed"}},
            "code": {"pattern": {"$data": "1/format"}}
        }
    });
    let data = json!({
        "allowed": ["red", "green"],
        "choice": "green",
        "format": "^[A-Z]{3}$",
        "code": "ABC"
    });
    assert!(errors(&schema, &data).is_empty());

    let data = json!({
        "allowed": ["red"],
        "choice": "green",
        "format": "^[A-Z]{3}$",
        "code": "abc"
    });
    let keywords: Vec<_> = errors(&schema, &data).into_iter().map(|e| e.keyword).collect();
    assert_eq!(keywords, vec!["enum", "pattern"]);
}

#[test]
fn non_positive_divisor_from_data_fails() {
    let schema = json!({
        "properties": {
            "d": {},
            "n": {"multipleOf": {"$data": "1/d"}}
        }
    });
    for divisor in [json!(0), json!(-2), json!(0.0)] {
        let found = errors(&schema, &json!({"d": divisor, "n": 4}));
        assert_eq!(found.len(), 1, "divisor {divisor}");
        assert_eq!(found[0].keyword, "multipleOf");
        assert_eq!(found[0].data_path, "/n");
    }
    assert!(errors(&schema, &json!({"d": 2, "n": 4})).is_empty());
}
