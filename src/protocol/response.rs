//! Payload interpretation.
//!
//! The codec hands back raw strings. These helpers turn the payloads of
//! specific verbs into typed values.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::NodeId;

// ============================================================================
// Constants
// ============================================================================

/// Separator between header name and value.
const HEADER_SEPARATOR: &str = ": ";

// ============================================================================
// Parsers
// ============================================================================

/// Splits a comma-joined id list into node handles.
///
/// An empty payload yields no ids. Duplicates are dropped, keeping the
/// first occurrence so document order is preserved.
#[must_use]
pub fn parse_node_ids(payload: &str) -> Vec<NodeId> {
    let mut seen = FxHashSet::default();
    payload
        .split(',')
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(NodeId::new)
        .collect()
}

/// Parses a `Key: Value` block.
///
/// Each line is split on the first `": "` only. Later duplicates win.
/// Lines without a separator are skipped.
#[must_use]
pub fn parse_headers(payload: &str) -> FxHashMap<String, String> {
    payload
        .split('\n')
        .filter_map(|line| line.split_once(HEADER_SEPARATOR))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Parses the newline-joined cookie list, dropping blank lines.
#[must_use]
pub fn parse_cookies(payload: &str) -> Vec<String> {
    payload
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Boolean queries answer with the literal string `true`.
#[inline]
#[must_use]
pub fn parse_bool(payload: &str) -> bool {
    payload == "true"
}

/// Decodes an `Evaluate` result.
///
/// The server sends a bare JSON value, or nothing for `undefined`. Wrapping
/// it in an array envelope makes both cases valid JSON; an empty envelope
/// decodes to `Value::Null`.
pub fn parse_evaluate(payload: &str) -> Result<Value> {
    let envelope: Vec<Value> = serde_json::from_str(&format!("[{payload}]"))
        .map_err(|e| Error::script(format!("cannot decode evaluate result: {e}")))?;
    Ok(envelope.into_iter().next().unwrap_or(Value::Null))
}

/// Parses the numeric HTTP status.
pub fn parse_status(payload: &str) -> Result<u16> {
    payload
        .trim()
        .parse()
        .map_err(|_| Error::protocol(format!("invalid status code: {payload:?}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_empty_id_list_is_empty() {
        assert!(parse_node_ids("").is_empty());
    }

    #[test]
    fn test_id_list_keeps_order() {
        let ids = parse_node_ids("4,2,9");
        let ids: Vec<&str> = ids.iter().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["4", "2", "9"]);
    }

    #[test]
    fn test_id_list_drops_duplicates_and_blanks() {
        let ids = parse_node_ids("4,,2,4,");
        let ids: Vec<&str> = ids.iter().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["4", "2"]);
    }

    #[test]
    fn test_headers_split_on_first_separator() {
        let headers = parse_headers("Content-Type: text/html\nSet-Cookie: a=b; x=y");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Content-Type"], "text/html");
        assert_eq!(headers["Set-Cookie"], "a=b; x=y");
    }

    #[test]
    fn test_headers_value_may_contain_separator() {
        let headers = parse_headers("X-Note: a: b");
        assert_eq!(headers["X-Note"], "a: b");
    }

    #[test]
    fn test_headers_last_write_wins() {
        let headers = parse_headers("Vary: a\nVary: b");
        assert_eq!(headers["Vary"], "b");
    }

    #[test]
    fn test_headers_empty_payload() {
        assert!(parse_headers("").is_empty());
    }

    #[test]
    fn test_cookies_strip_blank_lines() {
        let cookies = parse_cookies("a=1; path=/\n\n  b=2 \n");
        assert_eq!(cookies, vec!["a=1; path=/", "b=2"]);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("True"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_evaluate_scalars_and_objects() {
        assert_eq!(parse_evaluate("42").unwrap(), json!(42));
        assert_eq!(parse_evaluate("\"hi\"").unwrap(), json!("hi"));
        assert_eq!(parse_evaluate("{\"a\":[1,2]}").unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_evaluate_empty_is_null() {
        assert_eq!(parse_evaluate("").unwrap(), Value::Null);
    }

    #[test]
    fn test_evaluate_garbage_is_script_error() {
        assert!(matches!(parse_evaluate("{"), Err(Error::Script { .. })));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("200").unwrap(), 200);
        assert!(parse_status("").is_err());
    }
}
