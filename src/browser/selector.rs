//! CSS and XPath queries.
//!
//! A [`Selector`] resolves queries either against the whole document or
//! below one node. Results are in document order with duplicate handles
//! removed.
//!
//! | Query | Document scope | Node scope |
//! |-------|----------------|------------|
//! | CSS | `FindCss <q>` | `Node findCssWithin <id> <q>` |
//! | XPath | `FindXpath <q>` | `Node findXpathWithin <id> <q>` |
//!
//! # Example
//!
//! ```ignore
//! use webkit_driver::By;
//!
//! let rows = client.css("table#results tr").await?;
//! let first_cell = rows[0].at_xpath("./td[1]").await?;
//! let submit = client.at(&By::css("button[type=submit]")).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::NodeId;
use crate::protocol::{Command, NodeOp};

use super::client::Client;
use super::node::Node;
use super::wait::Attempt;

// ============================================================================
// By
// ============================================================================

/// Query language and expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value")]
pub enum By {
    /// CSS selector.
    #[serde(rename = "css")]
    Css(String),

    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath(String),
}

impl By {
    /// Creates a CSS query.
    #[inline]
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an XPath query.
    #[inline]
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Returns the query text.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        match self {
            Self::Css(q) | Self::XPath(q) => q,
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(q) => write!(f, "css({q})"),
            Self::XPath(q) => write!(f, "xpath({q})"),
        }
    }
}

// ============================================================================
// Selector
// ============================================================================

#[derive(Debug, Clone)]
enum Scope {
    Document,
    Within(NodeId),
}

/// Query runner bound to a scope.
#[derive(Clone)]
pub struct Selector {
    client: Client,
    scope: Scope,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl Selector {
    /// Queries the whole document.
    #[inline]
    pub(crate) fn document(client: Client) -> Self {
        Self {
            client,
            scope: Scope::Document,
        }
    }

    /// Queries below the node `id`.
    #[inline]
    pub(crate) fn within(client: Client, id: NodeId) -> Self {
        Self {
            client,
            scope: Scope::Within(id),
        }
    }

    fn command(&self, by: &By) -> Command {
        match (&self.scope, by) {
            (Scope::Document, By::Css(q)) => Command::find_css(q),
            (Scope::Document, By::XPath(q)) => Command::find_xpath(q),
            (Scope::Within(id), By::Css(q)) => Command::node(NodeOp::FindCssWithin, id).arg(q),
            (Scope::Within(id), By::XPath(q)) => {
                Command::node(NodeOp::FindXpathWithin, id).arg(q)
            }
        }
    }
}

// ============================================================================
// Selector - Immediate Queries
// ============================================================================

impl Selector {
    /// Returns every match.
    pub async fn find(&self, by: &By) -> Result<Vec<Node>> {
        let payload = self.client.issue(self.command(by)).await?;
        Ok(self.client.wrap_nodes(&payload))
    }

    /// Returns the first match, if any.
    pub async fn at(&self, by: &By) -> Result<Option<Node>> {
        Ok(self.find(by).await?.into_iter().next())
    }

    /// Returns every node matching a CSS selector.
    pub async fn css(&self, selector: &str) -> Result<Vec<Node>> {
        self.find(&By::css(selector)).await
    }

    /// Returns every node matching an XPath expression.
    pub async fn xpath(&self, expr: &str) -> Result<Vec<Node>> {
        self.find(&By::xpath(expr)).await
    }

    /// Returns the first node matching a CSS selector.
    pub async fn at_css(&self, selector: &str) -> Result<Option<Node>> {
        self.at(&By::css(selector)).await
    }

    /// Returns the first node matching an XPath expression.
    pub async fn at_xpath(&self, expr: &str) -> Result<Option<Node>> {
        self.at(&By::xpath(expr)).await
    }
}

// ============================================================================
// Selector - Presence Queries
// ============================================================================

impl Selector {
    /// Polls for the first match until `timeout`.
    ///
    /// Failed and empty queries are retried. Returns `None` when nothing
    /// showed up in time.
    pub async fn at_with_retry(&self, by: &By, timeout: Duration) -> Result<Option<Node>> {
        let operation = format!("at {by}");
        let selector = self;

        self.client
            .presence_waiter()
            .with_timeout(timeout)
            .wait_for_safe(&operation, move || async move {
                Attempt::from(selector.at(by).await)
            })
            .await
    }

    /// Polls for a CSS match with the presence timeout.
    pub async fn at_css_with_retry(&self, selector: &str) -> Result<Option<Node>> {
        let timeout = self.client.wait_options().presence_timeout;
        self.at_with_retry(&By::css(selector), timeout).await
    }

    /// Polls for an XPath match with the presence timeout.
    pub async fn at_xpath_with_retry(&self, expr: &str) -> Result<Option<Node>> {
        let timeout = self.client.wait_options().presence_timeout;
        self.at_with_retry(&By::xpath(expr), timeout).await
    }
}

// ============================================================================
// Tests
// ============================================================================
