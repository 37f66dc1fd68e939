//! Input Sanitizer
//!
//! Best-effort denylist cleaning of JSON request bodies: script blocks,
//! `javascript:` prefixes and inline `on<event>=` handlers are removed from every
//! string, keys included. This is not an HTML parser and will miss vectors that
//! do not match these patterns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("static regex"));
static JAVASCRIPT_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript:").expect("static regex"));
static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on\w+\s*=").expect("static regex"));

/// Clean a single string
pub fn sanitize_str(input: &str) -> String {
    let cleaned = SCRIPT_BLOCK.replace_all(input, "");
    let cleaned = JAVASCRIPT_URI.replace_all(&cleaned, "");
    let cleaned = EVENT_HANDLER.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Recursively clean a JSON value, keeping its shape.
///
/// Two keys that clean to the same string collapse into one; the later value wins.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => {
            let mut cleaned = Map::with_capacity(map.len());
            for (key, value) in map {
                cleaned.insert(sanitize_str(&key), sanitize_value(value));
            }
            Value::Object(cleaned)
        }
        other => other,
    }
}
