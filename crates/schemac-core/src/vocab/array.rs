use serde_json::{json, Value};

use crate::compile::ir::{Node, Step};
use crate::context::KeywordCx;
use crate::error::Result;
use crate::types::json_equal;

pub(super) fn max_items(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |limit, _| format!("should NOT have more than {limit} items"),
        |limit, _| json!({ "limit": limit }),
    );
    cx.fail(|data, limit| match (data.as_array(), limit.as_f64()) {
        (Some(items), Some(limit)) => items.len() as f64 > limit,
        _ => false,
    });
    Ok(())
}

pub(super) fn min_items(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |limit, _| format!("should NOT have fewer than {limit} items"),
        |limit, _| json!({ "limit": limit }),
    );
    cx.fail(|data, limit| match (data.as_array(), limit.as_f64()) {
        (Some(items), Some(limit)) => (items.len() as f64) < limit,
        _ => false,
    });
    Ok(())
}

/// `items`, together with its sibling `additionalItems`.
///
/// A single schema applies to every element. A tuple applies positionally;
/// `additionalItems: false` then fails once for an array longer than the tuple
/// (checked before the positions), and an `additionalItems` schema applies to
/// the remaining elements.
pub(super) fn items(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    if let Some(additional) = cx.parent_schema().get("additionalItems") {
        if !additional.is_boolean() && !additional.is_object() {
            return Err(cx.sibling_error("additionalItems", "value should be object,boolean"));
        }
    }

    let schema = cx.schema();
    match schema {
        // Only `additionalItems` is present; it has no effect without a tuple.
        Value::Null => {}
        Value::Array(tuple) => {
            let len = tuple.len();
            let additional = cx.parent_schema().get("additionalItems");

            if let Some(Value::Bool(false)) = additional {
                let site = cx.site_for(
                    "additionalItems",
                    Value::Bool(false),
                    move |_, _| format!("should NOT have more than {len} items"),
                    move |_, _| json!({ "limit": len }),
                );
                let check = cx.literal_check(
                    json!(len),
                    move |data, _| data.as_array().is_some_and(|items| items.len() > len),
                    site,
                );
                cx.push(check);
            }

            for (index, item) in tuple.iter().enumerate() {
                let body = cx.subschema(item, &format!("items/{index}"), Some(&format!("/{index}")))?;
                if !matches!(body, Node::Pass) {
                    cx.push(Node::Descend {
                        step: Step::Index(index),
                        body: Box::new(body),
                    });
                }
            }

            if let Some(additional) = additional.filter(|a| a.is_object()) {
                let body = cx.subschema(additional, "additionalItems", Some("/{index}"))?;
                if !matches!(body, Node::Pass) {
                    cx.push(Node::Items {
                        from: len,
                        body: Box::new(body),
                    });
                }
            }
        }
        single => {
            let body = cx.subschema(single, "items", Some("/{index}"))?;
            if !matches!(body, Node::Pass) {
                cx.push(Node::Items {
                    from: 0,
                    body: Box::new(body),
                });
            }
        }
    }
    Ok(())
}

pub(super) fn contains(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let schema = cx.schema();
    let body = cx.subschema(schema, "contains", Some("/{index}"))?;
    cx.set_error(
        |_, _| "should contain a valid item".to_string(),
        |_, _| json!({}),
    );
    let site = cx.site();
    cx.push(Node::Contains {
        body: Box::new(body),
        site,
    });
    Ok(())
}

pub(super) fn unique_items(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |_, data| match duplicate(data) {
            Some((i, j)) => {
                format!("should NOT have duplicate items (items ## {j} and {i} are identical)")
            }
            None => "should NOT have duplicate items".to_string(),
        },
        |_, data| match duplicate(data) {
            Some((i, j)) => json!({ "i": i, "j": j }),
            None => json!({}),
        },
    );
    cx.fail(|data, unique| unique.as_bool() == Some(true) && duplicate(data).is_some());
    Ok(())
}

/// Indices `(i, j)` with `j < i` of the last pair of equal elements.
fn duplicate(data: &Value) -> Option<(usize, usize)> {
    let items = data.as_array()?;
    (0..items.len())
        .rev()
        .find_map(|i| (0..i).rev().find(|j| json_equal(&items[i], &items[*j])).map(|j| (i, j)))
}
