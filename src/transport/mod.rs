//! Socket transport layer.
//!
//! This module owns the automation server process and the TCP
//! connections to it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │                              │  webkit_server  │
//! │                 │      length-prefixed TCP     │  (child process)│
//! │  Connection     │◄────────────────────────────►│                 │
//! │                 │     127.0.0.1:PORT           │  browser engine │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Server::start` - Spawn the process, parse `port: N` from stdout
//! 2. `Server::connect` - Open a socket (any number of times)
//! 3. `Connection::issue_command` - One request, one response, in order
//! 4. `Connection::shutdown` / `Server::kill` - Tear down
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Sequential command/response exchange |
//! | `server` | Process spawning, port discovery, default instance |

// ============================================================================
// Submodules
// ============================================================================

/// Sequential command/response connection.
pub mod connection;

/// Automation server process management.
pub mod server;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use server::Server;
