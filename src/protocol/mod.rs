//! Wire protocol of the automation server.
//!
//! This module defines the command model, the byte framing, and the
//! interpretation of response payloads.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`Command`] | Client → Server | Verb plus string arguments |
//! | response | Server → Client | `ok` + payload, or error status + message |
//!
//! Every command yields exactly one response. Commands are never
//! pipelined on a connection.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Verbs, node sub-commands, [`Command`] |
//! | `codec` | Request/response framing |
//! | `response` | Payload parsers |

// ============================================================================
// Submodules
// ============================================================================

/// Verbs and command construction.
pub mod command;

/// Length-prefixed framing.
pub mod codec;

/// Payload parsers.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{read_command, read_response, write_command, write_response};
pub use command::{Command, NodeOp, Verb};
