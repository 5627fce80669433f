//! webkit driver - client for the `webkit_server` browser automation protocol.
//!
//! This library drives a headless WebKit browser running in a separate
//! `webkit_server` process, over a line-oriented, length-prefixed socket
//! protocol.
//!
//! # Architecture
//!
//! The driver follows a client-server model:
//!
//! - **Local End (Rust)**: Sends one command at a time, reads one response
//! - **Remote End (`webkit_server`)**: Embeds the browser, executes commands
//!
//! Key design principles:
//!
//! - Each [`Client`] owns one connection; commands are never pipelined
//! - DOM nodes live on the server; a [`Node`] is only a handle
//! - Nothing is cached locally; every accessor is a round trip
//! - Page asynchrony is handled by explicit polling ([`Waiter`])
//!
//! # Quick Start
//!
//! ```no_run
//! use webkit_driver::{Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Starts webkit_server from PATH on first use
//!     let client = Client::new().await?;
//!
//!     client.visit("https://example.com").await?;
//!
//!     if let Some(link) = client.at_css_with_retry("a").await? {
//!         println!("First link: {}", link.text().await?);
//!         link.left_click().await?;
//!     }
//!
//!     client.render("example.png").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Session entities: [`Client`], [`Node`], [`Waiter`] |
//! | [`driver`] | Builder and options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire format and command vocabulary |
//! | [`resize`] | External image resizer |
//! | [`transport`] | Server process and socket connection |

// ============================================================================
// Modules
// ============================================================================

/// Session entities: Client, Node, Selector, Waiter.
///
/// This module contains the core types for browser automation:
///
/// - [`Client`] - One browser session
/// - [`Node`] - Remote DOM node reference
/// - [`Waiter`] - Poll-until-ready helper
pub mod browser;

/// Client builder and configuration.
///
/// Use [`Client::builder()`] to create a configured session.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for sessions and nodes.
pub mod identifiers;

/// Wire protocol framing and command vocabulary.
pub mod protocol;

/// Image resizing through an external helper.
pub mod resize;

/// Server process and socket connection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{
    Attempt, By, Client, DefaultNodeFactory, JsLiteral, Node, NodeFactory, NodeValue, ProxyConfig,
    Recorder, Selector, Waiter,
};

// Driver types
pub use driver::{ClientBuilder, ServerOptions, WaitOptions};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{NodeId, SessionId};

// Resizer types
pub use resize::{ExternalResizer, ImageResizer};

// Transport types
pub use transport::{Connection, Server};
