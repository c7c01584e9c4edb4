use regex::Regex;
use serde_json::{json, Value};

use crate::compile::ir::{Node, PropertyAction, PropertyFilter, Step};
use crate::context::KeywordCx;
use crate::error::{Result, SchemaError};
use crate::report::escape_token;

pub(super) fn max_properties(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |limit, _| format!("should NOT have more than {limit} properties"),
        |limit, _| json!({ "limit": limit }),
    );
    cx.fail(|data, limit| match (data.as_object(), limit.as_f64()) {
        (Some(map), Some(limit)) => map.len() as f64 > limit,
        _ => false,
    });
    Ok(())
}

pub(super) fn min_properties(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |limit, _| format!("should NOT have fewer than {limit} properties"),
        |limit, _| json!({ "limit": limit }),
    );
    cx.fail(|data, limit| match (data.as_object(), limit.as_f64()) {
        (Some(map), Some(limit)) => (map.len() as f64) < limit,
        _ => false,
    });
    Ok(())
}

pub(super) fn required(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let names = property_list(cx, cx.schema())?;
    for name in names {
        let site = cx.site_for(
            "required",
            cx.schema().clone(),
            {
                let name = name.clone();
                move |_, _| format!("should have required property '{name}'")
            },
            {
                let name = name.clone();
                move |_, _| json!({ "missingProperty": name })
            },
        );
        let check = cx.literal_check(
            Value::String(name),
            |data, name| match (data.as_object(), name.as_str()) {
                (Some(map), Some(name)) => !map.contains_key(name),
                _ => false,
            },
            site,
        );
        cx.push(check);
    }
    Ok(())
}

pub(super) fn dependencies(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let Some(map) = cx.schema().as_object() else {
        return Ok(());
    };
    for (property, dependency) in map {
        let body = match dependency {
            Value::Array(_) => {
                let deps = property_list(cx, dependency)?;
                let listed = deps.join(", ");
                let count = deps.len();
                let mut checks = Vec::with_capacity(count);
                for missing in deps {
                    let site = cx.site_for(
                        "dependencies",
                        dependency.clone(),
                        {
                            let (property, missing) = (property.clone(), missing.clone());
                            move |_, _| {
                                format!(
                                    "should have property {missing} when property {property} is present"
                                )
                            }
                        },
                        {
                            let params = json!({
                                "property": property,
                                "missingProperty": missing,
                                "depsCount": count,
                                "deps": listed,
                            });
                            move |_, _| params.clone()
                        },
                    );
                    checks.push(cx.literal_check(
                        Value::String(missing),
                        |data, name| match (data.as_object(), name.as_str()) {
                            (Some(map), Some(name)) => !map.contains_key(name),
                            _ => false,
                        },
                        site,
                    ));
                }
                Node::all(checks)
            }
            schema => cx.subschema(
                schema,
                &format!("dependencies/{}", escape_token(property)),
                None,
            )?,
        };
        if !matches!(body, Node::Pass) {
            cx.push(Node::IfPresent {
                name: property.clone(),
                body: Box::new(body),
            });
        }
    }
    Ok(())
}

pub(super) fn property_names(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let schema = cx.schema();
    let body = cx.key_subschema(schema, "propertyNames")?;
    if matches!(body, Node::Pass) {
        return Ok(());
    }
    cx.set_error(
        |_, name| format!("property name '{}' is invalid", name.as_str().unwrap_or_default()),
        |_, name| json!({ "propertyName": name }),
    );
    let site = cx.site();
    cx.push(Node::PropertyNames {
        body: Box::new(body),
        site,
    });
    Ok(())
}

/// `properties`, together with `patternProperties` and `additionalProperties`.
pub(super) fn properties(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let parent = cx.parent_schema();
    let empty = serde_json::Map::new();
    let properties = parent.get("properties").and_then(Value::as_object).unwrap_or(&empty);
    let patterns = match parent.get("patternProperties") {
        None => &empty,
        Some(Value::Object(patterns)) => patterns,
        Some(_) => {
            return Err(SchemaError::compilation(
                "patternProperties",
                &format!("{}/patternProperties", parent_path(cx)),
                "value should be object",
            ))
        }
    };

    for (name, schema) in properties {
        let body = cx.subschema(
            schema,
            &format!("properties/{}", escape_token(name)),
            Some(&format!("/{}", escape_token(name))),
        )?;
        if !matches!(body, Node::Pass) {
            cx.push(Node::Descend {
                step: Step::Key(name.clone()),
                body: Box::new(body),
            });
        }
    }

    let mut compiled = Vec::with_capacity(patterns.len());
    for (pattern, schema) in patterns {
        let re = Regex::new(pattern).map_err(|source| SchemaError::InvalidRegex {
            pattern: pattern.clone(),
            schema_path: format!("{}/patternProperties", parent_path(cx)),
            source,
        })?;
        let body = cx.subschema(
            schema,
            &format!("patternProperties/{}", escape_token(pattern)),
            Some("/{key}"),
        )?;
        if !matches!(body, Node::Pass) {
            cx.push(Node::Properties {
                filter: PropertyFilter::Pattern(re.clone()),
                action: PropertyAction::Validate(Box::new(body)),
            });
        }
        compiled.push(re);
    }

    let action = match parent.get("additionalProperties") {
        None | Some(Value::Bool(true)) => None,
        Some(Value::Bool(false)) => Some(PropertyAction::Deny(cx.site_for(
            "additionalProperties",
            Value::Bool(false),
            |_, _| "should NOT have additional properties".to_string(),
            |_, name| json!({ "additionalProperty": name }),
        ))),
        Some(schema) => {
            let body = cx.subschema(schema, "additionalProperties", Some("/{key}"))?;
            (!matches!(body, Node::Pass)).then(|| PropertyAction::Validate(Box::new(body)))
        }
    };
    if let Some(action) = action {
        cx.push(Node::Properties {
            filter: PropertyFilter::Additional {
                known: properties.keys().cloned().collect(),
                patterns: compiled,
            },
            action,
        });
    }
    Ok(())
}

fn parent_path(cx: &KeywordCx<'_, '_>) -> String {
    let path = cx.schema_path();
    path.strip_suffix(&format!("/{}", cx.keyword()))
        .unwrap_or(&path)
        .to_string()
}

/// A list of property names (`required`, property dependencies).
fn property_list(cx: &KeywordCx<'_, '_>, value: &Value) -> Result<Vec<String>> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| cx.error("items should be strings"))
        })
        .collect()
}
