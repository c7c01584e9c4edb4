use regex::Regex;
use serde_json::{json, Value};

use crate::context::KeywordCx;
use crate::error::{Result, SchemaError};

pub(super) fn max_length(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |limit, _| format!("should NOT be longer than {limit} characters"),
        |limit, _| json!({ "limit": limit }),
    );
    cx.fail(|data, limit| match (length(data), limit.as_f64()) {
        (Some(len), Some(limit)) => len as f64 > limit,
        _ => false,
    });
    Ok(())
}

pub(super) fn min_length(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |limit, _| format!("should NOT be shorter than {limit} characters"),
        |limit, _| json!({ "limit": limit }),
    );
    cx.fail(|data, limit| match (length(data), limit.as_f64()) {
        (Some(len), Some(limit)) => (len as f64) < limit,
        _ => false,
    });
    Ok(())
}

/// Length in Unicode scalar values.
fn length(data: &Value) -> Option<usize> {
    data.as_str().map(|s| s.chars().count())
}

pub(super) fn pattern(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |pattern, _| format!("should match pattern \"{}\"", pattern.as_str().unwrap_or_default()),
        |pattern, _| json!({ "pattern": pattern }),
    );

    if cx.is_data() {
        cx.fail(|data, pattern| {
            let compiled = pattern.as_str().and_then(|p| Regex::new(p).ok());
            match (data.as_str(), compiled) {
                (Some(s), Some(re)) => !re.is_match(s),
                _ => false,
            }
        });
        return Ok(());
    }

    let source = cx.schema().as_str().unwrap_or_default();
    let re = Regex::new(source).map_err(|source_error| SchemaError::InvalidRegex {
        pattern: source.to_string(),
        schema_path: cx.schema_path(),
        source: source_error,
    })?;
    cx.fail(move |data, _| data.as_str().is_some_and(|s| !re.is_match(s)));
    Ok(())
}
