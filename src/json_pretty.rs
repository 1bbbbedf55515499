//! Plain-text rendering of JSON payloads: view results, event data and
//! account resources.

use serde_json::Value;

/// Pretty-print with two-space indentation.
pub fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| "{}".to_string())
}

/// Pretty-print, cutting the output at the last full line before `max_bytes`.
///
/// Module resources can be several megabytes; this keeps terminal output sane.
pub fn pretty_safe(v: &Value, max_bytes: usize) -> String {
    let formatted = pretty(v);
    if formatted.len() <= max_bytes {
        return formatted;
    }

    let mut cut = max_bytes;
    while !formatted.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &formatted[..cut];
    let clean = match head.rfind('\n') {
        Some(pos) => &head[..pos],
        None => head,
    };
    format!(
        "{}\n... (truncated, {} bytes total)",
        clean,
        formatted.len()
    )
}

/// Recursively decode strings that hold serialized JSON objects or arrays.
///
/// Event payloads from the indexer are sometimes stored as a JSON document
/// inside a string column. `max_depth` bounds the recursion.
pub fn auto_parse_nested_json(value: Value, max_depth: usize, current_depth: usize) -> Value {
    if current_depth >= max_depth {
        return value;
    }

    match value {
        Value::Array(arr) => Value::Array(
            arr.into_iter()
                .map(|v| auto_parse_nested_json(v, max_depth, current_depth + 1))
                .collect(),
        ),
        Value::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, v)| (k, auto_parse_nested_json(v, max_depth, current_depth + 1)))
                .collect(),
        ),
        Value::String(s) => {
            let trimmed = s.trim();
            let looks_structured = (trimmed.starts_with('{') && trimmed.ends_with('}'))
                || (trimmed.starts_with('[') && trimmed.ends_with(']'));
            if looks_structured {
                if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                    return auto_parse_nested_json(parsed, max_depth, current_depth + 1);
                }
            }
            Value::String(s)
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_small_value_untouched() {
        let v = json!({"a": 1});
        assert_eq!(pretty_safe(&v, 1024), pretty(&v));
    }

    #[test]
    fn test_pretty_safe_truncates_on_line_boundary() {
        let v = json!((0..200).collect::<Vec<u32>>());
        let out = pretty_safe(&v, 64);
        assert!(out.contains("truncated"));
        let body = out.split("\n...").next().unwrap();
        assert!(body.len() <= 64);
        assert!(!body.ends_with(' '));
    }

    #[test]
    fn test_nested_json_string() {
        let input = json!({"data": "{\"inner\":\"[1,2]\"}"});
        let output = auto_parse_nested_json(input, 5, 0);
        assert_eq!(output, json!({"data": {"inner": [1, 2]}}));
    }

    #[test]
    fn test_plain_string_kept() {
        let input = json!({"memo": "{not json"});
        assert_eq!(auto_parse_nested_json(input.clone(), 5, 0), input);
    }

    #[test]
    fn test_depth_limit() {
        let input = json!("{\"a\":\"{\\\"b\\\":1}\"}");
        let output = auto_parse_nested_json(input, 1, 0);
        assert_eq!(output, json!({"a": "{\"b\":1}"}));
    }
}
