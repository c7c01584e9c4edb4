//! The `format` keyword and the format registry.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Value};
use tracing::warn;

use crate::context::KeywordCx;
use crate::error::{Result, SchemaError};

/// A named format check.
///
/// String formats ignore non-string data; number formats ignore non-numbers.
#[derive(Clone)]
pub enum Format {
    Pattern(Regex),
    String(Arc<dyn Fn(&str) -> bool + Send + Sync>),
    Number(Arc<dyn Fn(f64) -> bool + Send + Sync>),
}

impl Format {
    pub fn pattern(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(Format::Pattern)
    }

    pub fn string(check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Format::String(Arc::new(check))
    }

    pub fn number(check: impl Fn(f64) -> bool + Send + Sync + 'static) -> Self {
        Format::Number(Arc::new(check))
    }

    pub fn accepts(&self, data: &Value) -> bool {
        match (self, data) {
            (Format::Pattern(re), Value::String(s)) => re.is_match(s),
            (Format::String(check), Value::String(s)) => check(s),
            (Format::Number(check), Value::Number(n)) => n.as_f64().is_none_or(|x| check(x)),
            _ => true,
        }
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Format::String(_) => f.write_str("String(<fn>)"),
            Format::Number(_) => f.write_str("Number(<fn>)"),
        }
    }
}

/// Formats known to a compiler, by name.
#[derive(Debug, Clone, Default)]
pub struct Formats {
    formats: HashMap<String, Format>,
}

impl Formats {
    /// The draft-07 formats.
    pub fn builtin() -> Self {
        let mut formats = Self::default();
        formats.insert("date", Format::string(date));
        formats.insert("time", Format::string(|s| time(s, false)));
        formats.insert("date-time", Format::string(date_time));
        formats.insert("email", Format::string(email));
        formats.insert("hostname", Format::string(hostname));
        formats.insert("ipv4", Format::string(|s| s.parse::<Ipv4Addr>().is_ok()));
        formats.insert("ipv6", Format::string(|s| s.parse::<Ipv6Addr>().is_ok()));
        formats.insert("uri", Format::string(|s| url::Url::parse(s).is_ok()));
        formats.insert("uuid", Format::string(uuid));
        formats.insert("regex", Format::string(|s| Regex::new(s).is_ok()));
        formats.insert("json-pointer", Format::string(json_pointer));
        formats.insert("relative-json-pointer", Format::string(relative_json_pointer));
        formats
    }

    pub fn insert(&mut self, name: impl Into<String>, format: Format) {
        self.formats.insert(name.into(), format);
    }

    pub fn get(&self, name: &str) -> Option<&Format> {
        self.formats.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }
}

pub(super) fn format(cx: &mut KeywordCx<'_, '_>) -> Result<()> {
    let name = cx.schema().as_str().unwrap_or_default();
    let Some(format) = cx.formats().get(name).cloned() else {
        if cx.options().ignore_unknown_formats {
            warn!(format = name, schema_path = %cx.schema_path(), "unknown format ignored");
            return Ok(());
        }
        return Err(SchemaError::UnknownFormat {
            format: name.to_string(),
            schema_path: cx.schema_path(),
        });
    };

    cx.set_error(
        |name, _| format!("should match format \"{}\"", name.as_str().unwrap_or_default()),
        |name, _| json!({ "format": name }),
    );
    cx.ok(move |data, _| format.accepts(data));
    Ok(())
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str, s: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

fn date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let number = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = s.get(range)?;
        part.bytes().all(|b| b.is_ascii_digit()).then(|| part.parse().ok())?
    };
    let (Some(year), Some(month), Some(day)) = (number(0..4), number(5..7), number(8..10)) else {
        return false;
    };
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days).contains(&day)
}

fn time(s: &str, require_zone: bool) -> bool {
    static TIME: OnceLock<Option<Regex>> = OnceLock::new();
    let re = TIME.get_or_init(|| {
        Regex::new(r"(?i)^(\d\d):(\d\d):(\d\d)(\.\d+)?(z|[+-]\d\d(?::?\d\d)?)?$").ok()
    });
    let Some(captures) = re.as_ref().and_then(|re| re.captures(s)) else {
        return false;
    };
    let field = |i: usize| -> u32 {
        captures
            .get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(99)
    };
    let (hour, minute, second) = (field(1), field(2), field(3));
    let leap_second = hour == 23 && minute == 59 && second == 60;
    hour <= 23
        && minute <= 59
        && (second <= 59 || leap_second)
        && (!require_zone || captures.get(5).is_some())
}

fn date_time(s: &str) -> bool {
    match s.split_once(['T', 't', ' ']) {
        Some((day, clock)) => date(day) && time(clock, true),
        None => false,
    }
}

fn email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(
        &EMAIL,
        r#"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$"#,
        s,
    )
}

fn hostname(s: &str) -> bool {
    static LABEL: OnceLock<Option<Regex>> = OnceLock::new();
    let trimmed = s.strip_suffix('.').unwrap_or(s);
    !trimmed.is_empty()
        && trimmed.len() <= 253
        && trimmed
            .split('.')
            .all(|label| cached(&LABEL, r"(?i)^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$", label))
}

fn uuid(s: &str) -> bool {
    static UUID: OnceLock<Option<Regex>> = OnceLock::new();
    cached(
        &UUID,
        r"(?i)^(?:urn:uuid:)?[0-9a-f]{8}-(?:[0-9a-f]{4}-){3}[0-9a-f]{12}$",
        s,
    )
}

fn json_pointer(s: &str) -> bool {
    static POINTER: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&POINTER, r"^(?:/(?:[^~/]|~0|~1)*)*$", s)
}

fn relative_json_pointer(s: &str) -> bool {
    static RELATIVE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(
        &RELATIVE,
        r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^~/]|~0|~1)*)*)$",
        s,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_check_calendar() {
        assert!(date("2024-02-29"));
        assert!(!date("2023-02-29"));
        assert!(!date("2024-13-01"));
        assert!(!date("2024-1-01"));
    }

    #[test]
    fn date_times_require_zone() {
        assert!(date_time("2024-05-01T12:30:00Z"));
        assert!(date_time("2024-05-01t12:30:00.25+02:00"));
        assert!(!date_time("2024-05-01T12:30:00"));
        assert!(time("12:30:00", false));
        assert!(!time("24:00:00", false));
    }

    #[test]
    fn network_formats() {
        let formats = Formats::builtin();
        let accepts = |name: &str, value: &str| formats.get(name).unwrap().accepts(&json!(value));
        assert!(accepts("ipv4", "192.168.0.1"));
        assert!(!accepts("ipv4", "256.0.0.1"));
        assert!(accepts("ipv6", "::1"));
        assert!(accepts("hostname", "api.example.com"));
        assert!(!accepts("hostname", "-bad-.example"));
        assert!(accepts("email", "ops@example.com"));
        assert!(!accepts("email", "ops@"));
        assert!(accepts("uri", "https://example.com/a?b=c"));
        assert!(!accepts("uri", "not a uri"));
    }

    #[test]
    fn pointer_formats() {
        assert!(json_pointer(""));
        assert!(json_pointer("/a~1b/0"));
        assert!(!json_pointer("a"));
        assert!(relative_json_pointer("1/min"));
        assert!(relative_json_pointer("0#"));
        assert!(!relative_json_pointer("01"));
    }

    #[test]
    fn string_formats_ignore_other_types() {
        let formats = Formats::builtin();
        assert!(formats.get("uuid").unwrap().accepts(&json!(42)));
        assert!(Format::number(|x| x >= 0.0).accepts(&json!("text")));
        assert!(!Format::number(|x| x >= 0.0).accepts(&json!(-1)));
    }
}
