//! Error types for the webkit driver.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webkit_driver::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     client.visit("https://example.com").await?;
//!     if let Some(button) = client.at_css_with_retry("#submit").await? {
//!         button.click().await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::ServerNotFound`] |
//! | Server process | [`Error::ProcessLaunchFailed`], [`Error::NoX11`] |
//! | Protocol | [`Error::NoResponse`], [`Error::InvalidResponse`], [`Error::EndOfStream`], [`Error::Protocol`] |
//! | Node | [`Error::Node`] |
//! | Execution | [`Error::WaitTimeout`], [`Error::Script`], [`Error::Resize`] |
//! | External | [`Error::Connection`], [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client or server configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Server binary not found at path.
    #[error("webkit_server not found at: {path}")]
    ServerNotFound {
        /// Path where the binary was expected.
        path: PathBuf,
    },

    // ========================================================================
    // Server Process Errors
    // ========================================================================
    /// Failed to launch the automation server process.
    #[error("Failed to launch webkit_server: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// The server did not announce a listening port.
    ///
    /// Almost always means the server could not open a display.
    /// Running under `xvfb-run` usually fixes it.
    #[error("Cannot connect to X: {message}")]
    NoX11 {
        /// What the server printed instead of its port banner.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The server closed the socket before sending a status line.
    #[error("No response received from server")]
    NoResponse,

    /// The server answered with a non-`ok` status.
    ///
    /// `message` is the exact payload the server sent.
    #[error("Server error: {message}")]
    InvalidResponse {
        /// Error text reported by the server.
        message: String,
    },

    /// The socket closed in the middle of a frame.
    #[error("Unexpected end of stream")]
    EndOfStream,

    /// A frame could not be parsed.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the malformed frame.
        message: String,
    },

    /// Could not open a socket to the server.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    // ========================================================================
    // Node Errors
    // ========================================================================
    /// A node operation was called in a state that does not allow it.
    #[error("Node error: {message}")]
    Node {
        /// Description of the violated precondition.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// A polled condition never held within its budget.
    #[error("Wait timed out after {timeout_ms}ms: {operation}")]
    WaitTimeout {
        /// Description of what was being waited for.
        operation: String,
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    /// A script result could not be decoded.
    #[error("Script error: {message}")]
    Script {
        /// Description of the failure.
        message: String,
    },

    /// The image resize helper failed.
    #[error("Resize failed: {message}")]
    Resize {
        /// Exit status and stderr of the helper.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a server not found error.
    #[inline]
    pub fn server_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ServerNotFound { path: path.into() }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a missing display error.
    #[inline]
    pub fn no_x11(message: impl Into<String>) -> Self {
        Self::NoX11 {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[inline]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a node error.
    #[inline]
    pub fn node(message: impl Into<String>) -> Self {
        Self::Node {
            message: message.into(),
        }
    }

    /// Creates a wait timeout error.
    #[inline]
    pub fn wait_timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::WaitTimeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Creates a resize error.
    #[inline]
    pub fn resize(message: impl Into<String>) -> Self {
        Self::Resize {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a wait timeout.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }

    /// Returns `true` if the server reported an error for the command.
    #[inline]
    #[must_use]
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse { .. })
    }

    /// Returns `true` for failures of the command/response exchange itself.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::NoResponse | Self::InvalidResponse { .. } | Self::EndOfStream
        )
    }

    /// Returns `true` for any failure raised while talking to the server.
    ///
    /// These are the errors suppressed when error tolerance is enabled,
    /// including the broken-connection error every later command gets.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        self.is_protocol_error()
            || matches!(
                self,
                Self::Connection { .. } | Self::Io(_) | Self::Protocol { .. }
            )
    }

    /// Returns `true` if the session is unusable after this error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::NoResponse | Self::EndOfStream | Self::Io(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed when the calling step is retried.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. } | Self::InvalidResponse { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_response("Unable to load URL");
        assert_eq!(err.to_string(), "Server error: Unable to load URL");
    }

    #[test]
    fn test_no_x11_display() {
        let err = Error::no_x11("bad banner");
        assert_eq!(err.to_string(), "Cannot connect to X: bad banner");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::wait_timeout("at_css(#login)", 5000);
        let other_err = Error::invalid_response("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_protocol_error() {
        assert!(Error::NoResponse.is_protocol_error());
        assert!(Error::EndOfStream.is_protocol_error());
        assert!(Error::invalid_response("x").is_protocol_error());
        assert!(!Error::node("x").is_protocol_error());
        assert!(!Error::wait_timeout("x", 1).is_protocol_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::NoResponse.is_transport_error());
        assert!(Error::invalid_response("x").is_transport_error());
        assert!(Error::connection("broken").is_transport_error());
        assert!(Error::protocol("bad size").is_transport_error());
        assert!(Error::Io(IoError::new(ErrorKind::BrokenPipe, "pipe")).is_transport_error());
        assert!(!Error::node("x").is_transport_error());
        assert!(!Error::wait_timeout("x", 1).is_transport_error());
        assert!(!Error::config("x").is_transport_error());
    }

    #[test]
    fn test_timeout_and_invalid_response_are_distinguishable() {
        let timeout_err = Error::wait_timeout("x", 1);
        let server_err = Error::invalid_response("x");

        assert!(timeout_err.is_timeout() && !timeout_err.is_invalid_response());
        assert!(server_err.is_invalid_response() && !server_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::EndOfStream.is_connection_error());
        assert!(Error::connection("refused").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::wait_timeout("test", 1000).is_recoverable());
        assert!(!Error::config("test").is_recoverable());
        assert!(!Error::EndOfStream.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
