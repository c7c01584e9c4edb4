use serde_json::{json, Value};

use crate::context::KeywordCx;
use crate::error::Result;

pub(super) fn maximum(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    limit(cx, "<=");
    Ok(())
}

pub(super) fn minimum(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    limit(cx, ">=");
    Ok(())
}

pub(super) fn exclusive_maximum(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    limit(cx, "<");
    Ok(())
}

pub(super) fn exclusive_minimum(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    limit(cx, ">");
    Ok(())
}

fn limit(cx: &mut KeywordCx<'_, '_>, comparison: &'static str) {
    cx.set_error(
        move |limit, _| format!("should be {comparison} {limit}"),
        move |limit, _| json!({ "comparison": comparison, "limit": limit }),
    );
    cx.ok(move |data, limit| match (data.as_f64(), limit.as_f64()) {
        (Some(x), Some(limit)) => match comparison {
            "<=" => x <= limit,
            ">=" => x >= limit,
            "<" => x < limit,
            _ => x > limit,
        },
        _ => true,
    });
}

pub(super) fn multiple_of(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    if !cx.is_data() && !cx.schema().as_f64().is_some_and(|m| m > 0.0) {
        return Err(cx.error("value should be greater than 0"));
    }
    cx.set_error(
        |divisor, _| format!("should be multiple of {divisor}"),
        |divisor, _| json!({ "multipleOf": divisor }),
    );
    cx.ok(is_multiple);
    Ok(())
}

fn is_multiple(data: &Value, divisor: &Value) -> bool {
    if let (Some(x), Some(m)) = (data.as_i64(), divisor.as_i64()) {
        if m > 0 {
            return x % m == 0;
        }
    }
    match (data.as_f64(), divisor.as_f64()) {
        // Only reachable through `$data`; literal divisors are checked at compile time.
        (Some(_), Some(m)) if m <= 0.0 => false,
        (Some(x), Some(m)) => (x / m).fract() == 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiples_use_integer_arithmetic_when_possible() {
        assert!(is_multiple(&json!(9007199254740993_i64), &json!(1)));
        assert!(is_multiple(&json!(10), &json!(5)));
        assert!(!is_multiple(&json!(7), &json!(2)));
        assert!(is_multiple(&json!(7.5), &json!(2.5)));
        assert!(!is_multiple(&json!(7.5), &json!(2)));
    }

    #[test]
    fn non_positive_divisors_never_match() {
        assert!(!is_multiple(&json!(0), &json!(0)));
        assert!(!is_multiple(&json!(4), &json!(-2)));
        assert!(!is_multiple(&json!(4.0), &json!(-0.5)));
        assert!(is_multiple(&json!("not a number"), &json!(0)));
    }
}
