use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single validation failure.
///
/// Field names (`keyword`, `dataPath`, `schemaPath`, `params`, `message`) are
/// stable and part of the serialized contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorObject {
    /// Keyword that failed, e.g. `minimum` or `additionalItems`.
    pub keyword: String,
    /// JSON pointer to the failing location in the validated data (`""` is the root).
    pub data_path: String,
    /// Location of the failing keyword in the schema, e.g. `#/items/0/type`.
    pub schema_path: String,
    /// Keyword-specific structured details.
    pub params: Value,
    /// Human readable description.
    pub message: String,
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data{} {}", self.data_path, self.message)
    }
}

/// Render errors the way they are shown in diagnostics: `data/a should be ..., data ...`.
pub fn errors_text(errors: &[ErrorObject]) -> String {
    if errors.is_empty() {
        return "No errors".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The failures of one validator invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", errors_text(.0))]
pub struct ValidationErrors(pub(crate) Vec<ErrorObject>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ErrorObject] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_errors(self) -> Vec<ErrorObject> {
        self.0
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ErrorObject;
    type IntoIter = std::vec::IntoIter<ErrorObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ErrorObject;
    type IntoIter = std::slice::Iter<'a, ErrorObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-invocation error accumulator.
#[derive(Debug)]
pub(crate) struct Reporter {
    all_errors: bool,
    errors: Vec<ErrorObject>,
}

impl Reporter {
    pub(crate) fn new(all_errors: bool) -> Self {
        Self {
            all_errors,
            errors: Vec::new(),
        }
    }

    /// True when evaluation should stop at the first failure.
    pub(crate) fn fail_fast(&self) -> bool {
        !self.all_errors
    }

    pub(crate) fn report(&mut self, error: ErrorObject) {
        self.errors.push(error);
    }

    pub(crate) fn count(&self) -> usize {
        self.errors.len()
    }

    /// Drop errors recorded after `count`, e.g. by a passing `anyOf` branch.
    pub(crate) fn reset(&mut self, count: usize) {
        self.errors.truncate(count);
    }

    pub(crate) fn finish(self) -> Vec<ErrorObject> {
        self.errors
    }
}

/// Escape a JSON pointer reference token (`~` -> `~0`, `/` -> `~1`).
pub(crate) fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn error(data_path: &str, message: &str) -> ErrorObject {
        ErrorObject {
            keyword: "minimum".to_string(),
            data_path: data_path.to_string(),
            schema_path: "#/minimum".to_string(),
            params: json!({"comparison": ">=", "limit": 5}),
            message: message.to_string(),
        }
    }

    #[test]
    fn serializes_stable_field_names() {
        let value = serde_json::to_value(error("/value", "should be >= 5")).unwrap();
        assert_eq!(
            value,
            json!({
                "keyword": "minimum",
                "dataPath": "/value",
                "schemaPath": "#/minimum",
                "params": {"comparison": ">=", "limit": 5},
                "message": "should be >= 5"
            })
        );
    }

    #[test]
    fn errors_text_joins_records() {
        let errors = vec![error("/a", "should be >= 5"), error("", "should be object")];
        assert_eq!(
            errors_text(&errors),
            "data/a should be >= 5, data should be object"
        );
        assert_eq!(errors_text(&[]), "No errors");
    }

    #[test]
    fn reporter_reset_discards_later_errors() {
        let mut reporter = Reporter::new(true);
        reporter.report(error("/a", "one"));
        let mark = reporter.count();
        reporter.report(error("/b", "two"));
        reporter.reset(mark);
        assert_eq!(reporter.finish().len(), 1);
    }

    #[test]
    fn escapes_pointer_tokens() {
        assert_eq!(escape_token("a/b~c"), "a~1b~0c");
    }
}
