//! Session configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClientBuilder`] | Fluent session builder |
//! | [`ServerOptions`] | Automation server launch options |
//! | [`WaitOptions`] | Polling interval and timeouts |
//!
//! # Example
//!
//! ```no_run
//! use webkit_driver::{Client, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder()
//!     .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
//!     .build()
//!     .await?;
//!
//! client.visit("https://example.com").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Server launch options and wait timing.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, DEFAULT_USER_AGENT};
pub use options::{ServerOptions, WaitOptions};
