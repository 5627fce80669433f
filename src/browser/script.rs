//! JavaScript snippets and literal rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::NodeId;

// ============================================================================
// JsLiteral
// ============================================================================

/// A value that can be spliced into a script as a literal.
///
/// Only strings, numbers and booleans are supported; anything richer has
/// to be built by the caller as script text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsLiteral {
    /// String literal, JSON-escaped.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// `true` / `false`.
    Bool(bool),
}

impl JsLiteral {
    /// Renders the literal as JavaScript source.
    #[must_use]
    pub fn to_js(&self) -> String {
        match self {
            Self::Str(s) => json_string(s),
            Self::Int(n) => n.to_string(),
            Self::Float(n) if n.is_finite() => n.to_string(),
            Self::Float(n) if n.is_nan() => "NaN".to_string(),
            Self::Float(n) if *n > 0.0 => "Infinity".to_string(),
            Self::Float(_) => "-Infinity".to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for JsLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js())
    }
}

impl From<&str> for JsLiteral {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for JsLiteral {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for JsLiteral {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for JsLiteral {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for JsLiteral {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for JsLiteral {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for JsLiteral {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escapes a string for safe use in JavaScript.
pub(crate) fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Binds `node` to the server-side node before running `js`.
pub(crate) fn bind_node(id: &NodeId, js: &str) -> String {
    format!(
        "var node = Capybara.nodes[{}]; {};",
        json_string(id.as_str()),
        js
    )
}

/// Dispatches a bubbling, non-cancelable mouse event on `node`.
pub(crate) fn mouse_event(event_name: &str) -> String {
    format!(
        "var ev = document.createEvent('MouseEvents'); \
         ev.initEvent({}, true, false); \
         node.dispatchEvent(ev)",
        json_string(event_name)
    )
}

/// Calls `node.setAttribute(name, value)`.
pub(crate) fn set_attribute(name: &str, value: &JsLiteral) -> String {
    format!("node.setAttribute({}, {})", json_string(name), value.to_js())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(JsLiteral::from("it's \"q\"").to_js(), r#""it's \"q\"""#);
        assert_eq!(JsLiteral::from(12).to_js(), "12");
        assert_eq!(JsLiteral::from(1.5).to_js(), "1.5");
        assert_eq!(JsLiteral::from(true).to_js(), "true");
        assert_eq!(JsLiteral::from(f64::NAN).to_js(), "NaN");
        assert_eq!(JsLiteral::from(f64::NEG_INFINITY).to_js(), "-Infinity");
    }

    #[test]
    fn test_bind_node_prologue() {
        let script = bind_node(&NodeId::new("7"), "node.click()");
        assert_eq!(script, "var node = Capybara.nodes[\"7\"]; node.click();");
    }

    #[test]
    fn test_set_attribute_script() {
        let script = set_attribute("style", &JsLiteral::from("position: absolute"));
        assert_eq!(script, "node.setAttribute(\"style\", \"position: absolute\")");
    }

    #[test]
    fn test_mouse_event_script() {
        let script = mouse_event("mousedown");
        assert!(script.contains("ev.initEvent(\"mousedown\", true, false)"));
        assert!(script.ends_with("node.dispatchEvent(ev)"));
    }
}
