//! Type-safe identifiers for server-side entities.
//!
//! Newtype wrappers prevent mixing a node handle with arbitrary strings
//! at compile time.
//!
//! | Type | Wraps | Origin |
//! |------|-------|--------|
//! | [`NodeId`] | `String` | Assigned by the server, opaque |
//! | [`SessionId`] | `Uuid` | Assigned locally, one per client |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ============================================================================
// NodeId
// ============================================================================

/// Opaque server-side handle of a DOM node.
///
/// The server hands these out as decimal strings but nothing here relies
/// on that. Two handles are the same node iff the strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Creates a node ID from a server handle.
    #[inline]
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the raw handle.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Process-wide unique identifier of one [`Client`](crate::Client).
///
/// Only used locally, for correlating log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh session ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_equality_is_by_handle() {
        assert_eq!(NodeId::new("12"), NodeId::from("12"));
        assert_ne!(NodeId::new("12"), NodeId::new("13"));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new("42").to_string(), "42");
        assert_eq!(NodeId::new("42").as_str(), "42");
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::next(), SessionId::next());
    }

    #[test]
    fn test_node_id_serializes_as_string() {
        let json = serde_json::to_string(&NodeId::new("7")).unwrap();
        assert_eq!(json, "\"7\"");
    }

    #[test]
    fn test_node_id_deserializes_from_string() {
        let id: NodeId = serde_json::from_str("\"19\"").unwrap();
        assert_eq!(id, NodeId::new("19"));
    }
}
