use serde_json::json;

use crate::context::KeywordCx;
use crate::error::Result;
use crate::types::json_equal;

pub(super) fn constant(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |_, _| "should be equal to constant".to_string(),
        |allowed, _| json!({ "allowedValue": allowed }),
    );
    cx.ok(|data, allowed| json_equal(data, allowed));
    Ok(())
}

pub(super) fn enumeration(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    cx.set_error(
        |_, _| "should be equal to one of the allowed values".to_string(),
        |allowed, _| json!({ "allowedValues": allowed }),
    );
    cx.ok(|data, allowed| {
        allowed
            .as_array()
            .is_some_and(|values| values.iter().any(|value| json_equal(data, value)))
    });
    Ok(())
}
