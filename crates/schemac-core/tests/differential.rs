//! Validity agrees with the `jsonschema` crate (draft 7) on a fixed corpus.

use schemac_core::{Options, SchemaCompiler};
use serde_json::{json, Value};

fn corpus() -> Vec<(Value, Vec<Value>)> {
    vec![
        (
            json!({"type": "integer", "minimum": 1, "maximum": 10, "multipleOf": 3}),
            vec![json!(3), json!(9), json!(4), json!(12), json!(0), json!(3.0), json!("3")],
        ),
        (
            json!({"exclusiveMinimum": 0, "exclusiveMaximum": 1}),
            vec![json!(0), json!(0.5), json!(1), json!(null)],
        ),
        (
            json!({"type": ["string", "null"], "minLength": 2, "maxLength": 4, "pattern": "^a"}),
            vec![json!("ab"), json!("abcd"), json!("a"), json!("abcde"), json!("ba"), json!(null), json!(1)],
        ),
        (
            json!({"type": "array", "items": [{"type": "integer"}, {"type": "string"}], "additionalItems": false}),
            vec![json!([]), json!([1]), json!([1, "a"]), json!([1, "a", 2]), json!(["a"])],
        ),
        (
            json!({"items": [{"type": "integer"}], "additionalItems": {"type": "boolean"}}),
            vec![json!([1, true, false]), json!([1, true, 2]), json!(["x"])],
        ),
        (
            json!({"items": {"enum": [1, "two", null]}, "uniqueItems": true, "minItems": 1, "maxItems": 3}),
            vec![json!([1, "two"]), json!([1, 1.0]), json!([]), json!([1, "two", null, 1]), json!([2])],
        ),
        (
            json!({"contains": {"const": {"a": 1}}}),
            vec![json!([{"a": 1}]), json!([{"a": 2}, {"a": 1.0}]), json!([]), json!("not array")],
        ),
        (
            json!({
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"type": "string"}, "tags": {"type": "array", "items": {"type": "string"}}},
                "patternProperties": {"^x-": true},
                "additionalProperties": false,
                "minProperties": 1,
                "maxProperties": 3
            }),
            vec![
                json!({"id": "a"}),
                json!({"id": "a", "tags": ["t"], "x-any": 1}),
                json!({"id": 1}),
                json!({"tags": []}),
                json!({"id": "a", "other": 1}),
                json!({"id": "a", "tags": [], "x-1": 1, "x-2": 2}),
            ],
        ),
        (
            json!({"propertyNames": {"pattern": "^[a-z]+$"}, "dependencies": {"a": ["b"], "c": {"required": ["d"]}}}),
            vec![
                json!({}),
                json!({"a": 1, "b": 2}),
                json!({"a": 1}),
                json!({"c": 1, "d": 2}),
                json!({"c": 1}),
                json!({"A": 1}),
            ],
        ),
        (
            json!({"anyOf": [{"type": "string"}, {"minimum": 5}], "not": {"const": 7}}),
            vec![json!("x"), json!(6), json!(7), json!(4), json!(null)],
        ),
        (
            json!({"oneOf": [{"multipleOf": 2}, {"multipleOf": 3}], "allOf": [{"type": "integer"}]}),
            vec![json!(4), json!(9), json!(6), json!(5), json!(2.5)],
        ),
        (
            json!({"if": {"properties": {"kind": {"const": "a"}}}, "then": {"required": ["a"]}, "else": {"required": ["b"]}}),
            vec![
                json!({"kind": "a", "a": 1}),
                json!({"kind": "a"}),
                json!({"kind": "b", "b": 1}),
                json!({"kind": "b", "a": 1}),
            ],
        ),
        (
            json!({
                "definitions": {"node": {"type": "object", "properties": {"next": {"$ref": "#/definitions/node"}, "v": {"type": "number"}}}},
                "$ref": "#/definitions/node"
            }),
            vec![
                json!({"v": 1, "next": {"v": 2, "next": {}}}),
                json!({"v": 1, "next": {"v": "two"}}),
                json!([]),
            ],
        ),
        (
            json!({"enum": [[1, 2], {"a": null}], "const": [1, 2]}),
            vec![json!([1, 2]), json!([1.0, 2]), json!({"a": null}), json!([2, 1])],
        ),
        (
            json!({"type": "string", "format": "date"}),
            vec![json!("2024-02-29"), json!("2023-02-29"), json!("24-01-01")],
        ),
        (
            json!({"format": "ipv4"}),
            vec![json!("10.0.0.1"), json!("10.0.0"), json!(10)],
        ),
        (
            json!({"properties": {"a": false, "b": true}}),
            vec![json!({"b": 1}), json!({"a": 1}), json!(1)],
        ),
    ]
}

#[test]
fn validity_matches_reference_implementation() {
    for all_errors in [false, true] {
        let compiler = SchemaCompiler::new(Options {
            all_errors,
            ..Options::default()
        });
        for (schema, instances) in corpus() {
            let ours = compiler.compile(&schema).unwrap();
            let reference = jsonschema::draft7::options()
                .should_validate_formats(true)
                .build(&schema)
                .unwrap();
            for instance in instances {
                assert_eq!(
                    ours.is_valid(&instance),
                    reference.is_valid(&instance),
                    "schema {schema} instance {instance}"
                );
                assert_eq!(
                    ours.validate(&instance).is_ok(),
                    reference.is_valid(&instance),
                    "schema {schema} instance {instance} (all_errors: {all_errors})"
                );
            }
        }
    }
}
