use serde_json::{json, Value};

use crate::compile::ir::Node;
use crate::context::KeywordCx;
use crate::error::Result;

pub(super) fn reference(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let reference = cx.schema().as_str().unwrap_or_default();
    let id = cx.reference(reference)?;
    cx.push(Node::Call(id));
    Ok(())
}

pub(super) fn not(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let schema = cx.schema();
    let body = cx.subschema(schema, "not", None)?;
    cx.set_error(|_, _| "should NOT be valid".to_string(), |_, _| json!({}));
    let site = cx.site();
    cx.push(Node::Not {
        body: Box::new(body),
        site,
    });
    Ok(())
}

pub(super) fn any_of(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let branches = branches(cx)?;
    cx.set_error(
        |_, _| "should match some schema in anyOf".to_string(),
        |_, _| json!({}),
    );
    let site = cx.site();
    cx.push(Node::AnyOf { branches, site });
    Ok(())
}

pub(super) fn one_of(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let branches = branches(cx)?;
    cx.set_error(
        |_, _| "should match exactly one schema in oneOf".to_string(),
        |_, _| json!({}),
    );
    let site = cx.site();
    cx.push(Node::OneOf { branches, site });
    Ok(())
}

pub(super) fn all_of(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    for branch in branches(cx)? {
        cx.push(branch);
    }
    Ok(())
}

fn branches(cx: &mut KeywordCx<'_, '_>) -> Result<Vec<Node>> {
    let keyword = cx.keyword().to_string();
    let schemas = cx.schema().as_array().map(Vec::as_slice).unwrap_or_default();
    if schemas.is_empty() {
        return Err(cx.error("value should be a non-empty array of schemas"));
    }
    schemas
        .iter()
        .enumerate()
        .map(|(index, schema)| cx.subschema(schema, &format!("{keyword}/{index}"), None))
        .collect()
}

/// `if` with its siblings `then` and `else`.
pub(super) fn if_then_else(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let condition = match cx.schema() {
        // `then`/`else` without `if` have no effect.
        Value::Null => return Ok(()),
        schema => schema,
    };
    let parent = cx.parent_schema();
    let (then, otherwise) = (parent.get("then"), parent.get("else"));
    if then.is_none() && otherwise.is_none() {
        return Ok(());
    }

    let condition = cx.subschema(condition, "if", None)?;
    let then = then
        .map(|schema| cx.subschema(schema, "then", None))
        .transpose()?
        .map(Box::new);
    let otherwise = otherwise
        .map(|schema| cx.subschema(schema, "else", None))
        .transpose()?
        .map(Box::new);

    cx.set_error(
        |_, _| "should match \"then\" schema".to_string(),
        |_, _| json!({ "failingKeyword": "then" }),
    );
    let site = cx.site();
    cx.push(Node::IfThenElse {
        condition: Box::new(condition),
        then,
        otherwise,
        site,
    });
    Ok(())
}
