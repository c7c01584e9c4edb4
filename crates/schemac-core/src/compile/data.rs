//! `$data` references: pointers into the validated data, resolved at run time.
//!
//! Two pointer forms are accepted:
//! - absolute JSON pointers (`""`, `/a/0`), resolved from the data root;
//! - relative JSON pointers (`0`, `1/min`, `2#`), resolved by walking up
//!   from the data location the keyword applies to.

use std::borrow::Cow;

use serde_json::Value;

use crate::compile::eval::{Cursor, StepRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataRef {
    Absolute {
        pointer: String,
        tokens: Vec<String>,
    },
    Relative {
        pointer: String,
        up: usize,
        tokens: Vec<String>,
        /// Trailing `#`: yields the key or index of the location instead of its value.
        key: bool,
    },
}

impl DataRef {
    /// Parse the string of a `{"$data": ...}` object.
    pub(crate) fn parse(pointer: &str) -> Option<Self> {
        if pointer.is_empty() || pointer.starts_with('/') {
            return Some(DataRef::Absolute {
                pointer: pointer.to_string(),
                tokens: parse_tokens(pointer)?,
            });
        }

        let digits = pointer
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(pointer.len());
        let (number, rest) = pointer.split_at(digits);
        if number.is_empty() || (number.len() > 1 && number.starts_with('0')) {
            return None;
        }
        let up = number.parse().ok()?;

        let (tokens, key) = match rest {
            "#" => (Vec::new(), true),
            rest if rest.is_empty() || rest.starts_with('/') => (parse_tokens(rest)?, false),
            _ => return None,
        };
        Some(DataRef::Relative {
            pointer: pointer.to_string(),
            up,
            tokens,
            key,
        })
    }

    pub(crate) fn pointer(&self) -> &str {
        match self {
            DataRef::Absolute { pointer, .. } | DataRef::Relative { pointer, .. } => pointer,
        }
    }

    /// Resolve against the data location `at`; `None` when nothing is there.
    pub(crate) fn resolve<'v>(&self, at: &Cursor<'_, 'v>) -> Option<Cow<'v, Value>> {
        match self {
            DataRef::Absolute { tokens, .. } => follow(at.root_value(), tokens).map(Cow::Borrowed),
            DataRef::Relative { up, tokens, key, .. } => {
                let target = at.ancestor(*up)?;
                if *key {
                    return match target.step()? {
                        StepRef::Key(name) => Some(Cow::Owned(Value::String(name.to_string()))),
                        StepRef::Index(index) => Some(Cow::Owned(Value::from(index))),
                    };
                }
                follow(target.value(), tokens).map(Cow::Borrowed)
            }
        }
    }
}

/// Recognize `{"$data": "<pointer>"}` and return the pointer string.
pub(crate) fn data_pointer(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("$data")?.as_str(),
        _ => None,
    }
}

/// Split a JSON pointer (`""` or `/a/b`) into unescaped reference tokens.
pub(crate) fn parse_tokens(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    let rest = pointer.strip_prefix('/')?;
    rest.split('/').map(unescape_token).collect()
}

fn unescape_token(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next()? {
                '0' => out.push('~'),
                '1' => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Follow reference tokens from `value`.
pub(crate) fn follow<'v>(value: &'v Value, tokens: &[String]) -> Option<&'v Value> {
    tokens.iter().try_fold(value, |current, token| match current {
        Value::Object(map) => map.get(token),
        Value::Array(items) => {
            if token.len() > 1 && token.starts_with('0') {
                return None;
            }
            items.get(token.parse::<usize>().ok()?)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_absolute_pointers() {
        assert_eq!(
            DataRef::parse("/a~1b/0"),
            Some(DataRef::Absolute {
                pointer: "/a~1b/0".to_string(),
                tokens: vec!["a/b".to_string(), "0".to_string()],
            })
        );
        assert!(matches!(DataRef::parse(""), Some(DataRef::Absolute { .. })));
    }

    #[test]
    fn parses_relative_pointers() {
        assert_eq!(
            DataRef::parse("1/min"),
            Some(DataRef::Relative {
                pointer: "1/min".to_string(),
                up: 1,
                tokens: vec!["min".to_string()],
                key: false,
            })
        );
        assert!(matches!(
            DataRef::parse("2#"),
            Some(DataRef::Relative { up: 2, key: true, .. })
        ));
    }

    #[test]
    fn rejects_malformed_pointers() {
        assert_eq!(DataRef::parse("01/a"), None);
        assert_eq!(DataRef::parse("1x"), None);
        assert_eq!(DataRef::parse("a/b"), None);
        assert_eq!(DataRef::parse("/a~2"), None);
    }

    #[test]
    fn recognizes_data_objects() {
        assert_eq!(data_pointer(&json!({"$data": "1/min"})), Some("1/min"));
        assert_eq!(data_pointer(&json!({"$data": "1/min", "x": 1})), None);
        assert_eq!(data_pointer(&json!(5)), None);
    }

    #[test]
    fn resolves_relative_to_parent() {
        let data = json!({"min": 5, "value": 4});
        let root = Cursor::root(&data);
        let child = root.child(StepRef::Key("value"), &data["value"]);

        let min = DataRef::parse("1/min").unwrap();
        assert_eq!(min.resolve(&child).as_deref(), Some(&json!(5)));

        let name = DataRef::parse("0#").unwrap();
        assert_eq!(name.resolve(&child).as_deref(), Some(&json!("value")));

        let too_far = DataRef::parse("2/min").unwrap();
        assert_eq!(too_far.resolve(&child), None);

        let absolute = DataRef::parse("/min").unwrap();
        assert_eq!(absolute.resolve(&child).as_deref(), Some(&json!(5)));
    }

    #[test]
    fn follow_rejects_leading_zero_indices() {
        let data = json!([10, 20]);
        assert_eq!(follow(&data, &["1".to_string()]), Some(&json!(20)));
        assert_eq!(follow(&data, &["01".to_string()]), None);
    }
}
