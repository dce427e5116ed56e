//! Tolerant field access over heterogeneous raw listing payloads.
//!
//! Providers disagree on field names; every accessor here takes a list of
//! alternates and returns the first present value. Absent optional fields are
//! never an error.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// First non-empty string under any of the given top-level keys.
pub fn str_field<'a>(value: &'a JsonValue, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .find(|s| !s.trim().is_empty())
}

/// String at a nested path, e.g. `["company", "name"]`.
pub fn nested_str<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    cur.as_str().filter(|s| !s.trim().is_empty())
}

/// First number under any of the given keys; numeric strings are accepted.
pub fn f64_field(value: &JsonValue, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number_of(value.get(*key)?))
}

/// Number at a nested path.
pub fn nested_f64(value: &JsonValue, path: &[&str]) -> Option<f64> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    number_of(cur)
}

fn number_of(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First string list under any of the given keys. Entries may be plain
/// strings or objects carrying a `name` field.
pub fn string_list(value: &JsonValue, keys: &[&str]) -> Vec<String> {
    for key in keys {
        let Some(items) = value.get(*key).and_then(|v| v.as_array()) else {
            continue;
        };
        let names: Vec<String> = items
            .iter()
            .filter_map(|item| {
                item.as_str()
                    .or_else(|| item.get("name").and_then(|v| v.as_str()))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
            })
            .collect();
        if !names.is_empty() {
            return names;
        }
    }
    Vec::new()
}

/// First RFC 3339 timestamp under any of the given keys.
pub fn datetime_field(value: &JsonValue, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter().find_map(|key| {
        let raw = value.get(*key)?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
