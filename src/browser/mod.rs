//! Browser session, nodes and polling.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | One browser session: navigation, scripts, cookies, queries |
//! | [`Node`] | Proxy for one server-side DOM node |
//! | [`Selector`] | CSS/XPath queries scoped to the document or a node |
//! | [`Waiter`] | Poll-until-ready with timeout |
//! | [`NodeFactory`] | Construction policy for returned nodes |
//! | [`Recorder`] | Step logging with optional page snapshots |
//!
//! # Example
//!
//! ```no_run
//! use webkit_driver::{Attempt, Client, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::new().await?;
//! client.visit("https://example.com").await?;
//!
//! let session = &client;
//! let heading = client
//!     .wait_for("heading", move || async move {
//!         Attempt::from(session.at_css("h1").await)
//!     })
//!     .await?;
//!
//! println!("{}", heading.text().await?);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Session facade.
pub mod client;

/// Node construction policy.
pub mod factory;

/// Form-filling helpers.
pub mod form;

/// Remote DOM node proxy.
pub mod node;

/// Proxy configuration.
pub mod proxy;

/// Debug snapshots.
pub mod recorder;

/// Script snippets and literals.
pub mod script;

/// CSS and XPath queries.
pub mod selector;

/// Polling with timeout.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use factory::{DefaultNodeFactory, NodeFactory};
pub use node::{Node, NodeValue};
pub use proxy::ProxyConfig;
pub use recorder::Recorder;
pub use script::JsLiteral;
pub use selector::{By, Selector};
pub use wait::{Attempt, Waiter};
