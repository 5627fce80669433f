//! Remote DOM node proxy.
//!
//! A [`Node`] holds nothing but the server's handle and the owning
//! [`Client`]. Every accessor is a round trip; nothing is cached, so a
//! node removed from the page shows up as an empty or failed result.
//!
//! # Example
//!
//! ```ignore
//! let email = client.at_css_with_retry("input[name=email]").await?.unwrap();
//! email.set("user@example.com").await?;
//!
//! let country = client.at_css("select#country").await?.unwrap();
//! country.at_xpath(".//option[@value='fr']").await?.unwrap().select_option().await?;
//!
//! client.at_css("form#signup").await?.unwrap().submit().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::protocol::response::parse_bool;
use crate::protocol::{Command, NodeOp};

use super::client::Client;
use super::script::{self, JsLiteral};
use super::selector::{By, Selector};
use super::wait::Attempt;

// ============================================================================
// NodeValue
// ============================================================================

/// Result of [`Node::value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    /// Value of an ordinary form control.
    Single(String),
    /// Values of the selected options of a multi-select, in document order.
    Multiple(Vec<String>),
}

impl NodeValue {
    /// Returns the scalar value, or `None` for a multi-select.
    #[inline]
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v),
            Self::Multiple(_) => None,
        }
    }

    /// Flattens into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(v) => vec![v],
            Self::Multiple(vs) => vs,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a node.
pub(crate) struct NodeInner {
    /// Server-side handle.
    pub id: NodeId,

    /// Owning session.
    pub client: Client,

    /// Free-form tag set by a node factory.
    pub label: Option<Arc<str>>,
}

// ============================================================================
// Node
// ============================================================================

/// A handle to a DOM node held by the automation server.
///
/// Two nodes are equal when their handles are equal.
#[derive(Clone)]
pub struct Node {
    pub(crate) inner: Arc<NodeInner>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("session_id", &self.inner.client.session_id())
            .finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Node {}

// ============================================================================
// Node - Constructor
// ============================================================================

impl Node {
    /// Creates a proxy for `id`.
    ///
    /// Normally called by a [`NodeFactory`](super::NodeFactory).
    #[must_use]
    pub fn new(client: Client, id: NodeId) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id,
                client,
                label: None,
            }),
        }
    }

    /// Returns a copy carrying `label`.
    #[must_use]
    pub fn with_label(self, label: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: self.inner.id.clone(),
                client: self.inner.client.clone(),
                label: Some(label.into()),
            }),
        }
    }
}

// ============================================================================
// Node - Accessors
// ============================================================================

impl Node {
    /// Returns the server handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.inner.id
    }

    /// Returns the owning client.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Returns the factory label, if any.
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Returns a selector scoped below this node.
    #[must_use]
    pub fn selector(&self) -> Selector {
        Selector::within(self.inner.client.clone(), self.inner.id.clone())
    }
}

// ============================================================================
// Node - Protocol Helpers
// ============================================================================

impl Node {
    /// Issues `Node <op> <id> [args...]`.
    async fn invoke(&self, op: NodeOp, args: &[&str]) -> Result<String> {
        debug!(node_id = %self.inner.id, op = op.as_str(), "Node command");
        let command = Command::node(op, &self.inner.id).args(args.iter().copied());
        self.inner.client.issue(command).await
    }

    async fn invoke_bool(&self, op: NodeOp) -> Result<bool> {
        Ok(parse_bool(&self.invoke(op, &[]).await?))
    }
}

// ============================================================================
// Node - Properties
// ============================================================================

impl Node {
    /// Returns the rendered inner text.
    pub async fn text(&self) -> Result<String> {
        self.invoke(NodeOp::Text, &[]).await
    }

    /// Returns an attribute value.
    ///
    /// The server answers an empty payload for a missing attribute, which
    /// is reported as `None`.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let value = self.invoke(NodeOp::Attribute, &[name]).await?;
        Ok((!value.is_empty()).then_some(value))
    }

    /// Reads a boolean attribute.
    ///
    /// True when the lower-cased value is `"true"` or equals `name`, so
    /// both `checked="true"` and `checked="checked"` count.
    pub async fn bool_attribute(&self, name: &str) -> Result<bool> {
        let Some(value) = self.attribute(name).await? else {
            return Ok(false);
        };
        let value = value.to_lowercase();
        Ok(value == "true" || value == name.to_lowercase())
    }

    /// Sets an attribute through the DOM.
    pub async fn set_attribute(&self, name: &str, value: impl Into<JsLiteral>) -> Result<()> {
        let js = script::set_attribute(name, &value.into());
        self.exec_script(&js).await
    }

    /// Returns the element tag name.
    pub async fn tag_name(&self) -> Result<String> {
        self.invoke(NodeOp::TagName, &[]).await
    }

    /// Returns a locator path for display.
    ///
    /// Not stable across document mutations.
    pub async fn path(&self) -> Result<String> {
        self.invoke(NodeOp::Path, &[]).await
    }

    pub async fn is_visible(&self) -> Result<bool> {
        self.invoke_bool(NodeOp::Visible).await
    }

    pub async fn is_attached(&self) -> Result<bool> {
        self.invoke_bool(NodeOp::IsAttached).await
    }

    pub async fn is_selected(&self) -> Result<bool> {
        self.bool_attribute("selected").await
    }

    pub async fn is_checked(&self) -> Result<bool> {
        self.bool_attribute("checked").await
    }

    pub async fn is_disabled(&self) -> Result<bool> {
        self.bool_attribute("disabled").await
    }

    /// Returns `true` for `<select multiple>`.
    pub async fn is_multi_select(&self) -> Result<bool> {
        Ok(self.tag_name().await?.eq_ignore_ascii_case("select")
            && self.bool_attribute("multiple").await?)
    }
}

// ============================================================================
// Node - Value
// ============================================================================

impl Node {
    /// Returns the form value.
    ///
    /// For a multi-select, the values of its selected options.
    pub async fn value(&self) -> Result<NodeValue> {
        if !self.is_multi_select().await? {
            return Ok(NodeValue::Single(self.invoke(NodeOp::Value, &[]).await?));
        }

        let mut selected = Vec::new();
        for option in self.xpath(".//option").await? {
            if option.is_selected().await? {
                selected.push(option.invoke(NodeOp::Value, &[]).await?);
            }
        }
        Ok(NodeValue::Multiple(selected))
    }

    /// Sets the form value, retrying until the server accepts it once.
    ///
    /// The resulting DOM value is not read back; see
    /// [`set_verified`](Self::set_verified).
    pub async fn set(&self, value: &str) -> Result<()> {
        let node = self;
        self.inner
            .client
            .waiter()
            .wait_for("set", move || async move {
                Attempt::from_result(node.invoke(NodeOp::Set, &[value]).await.map(drop))
            })
            .await
    }

    /// Sets the form value and polls until [`value`](Self::value) reads
    /// back exactly `value`.
    ///
    /// File inputs report a browser-mangled path and never verify.
    pub async fn set_verified(&self, value: &str) -> Result<()> {
        self.set(value).await?;

        let node = self;
        self.inner
            .client
            .waiter()
            .wait_until("set read-back", move || async move {
                node.value()
                    .await
                    .map(|current| current.as_single() == Some(value))
            })
            .await
    }
}

// ============================================================================
// Node - Scripts
// ============================================================================

impl Node {
    /// Evaluates `js` with `node` bound to this node.
    pub async fn eval_script(&self, js: &str) -> Result<Value> {
        self.inner
            .client
            .eval_script(&script::bind_node(&self.inner.id, js))
            .await
    }

    /// Executes `js` with `node` bound to this node.
    pub async fn exec_script(&self, js: &str) -> Result<()> {
        self.inner
            .client
            .exec_script(&script::bind_node(&self.inner.id, js))
            .await
    }

    /// Submits the node (normally a form) from script.
    pub async fn submit(&self) -> Result<()> {
        self.eval_script("node.submit()").await.map(drop)
    }
}

// ============================================================================
// Node - Interaction
// ============================================================================

impl Node {
    /// Calls `node.click()` directly, with no mouse simulation.
    pub async fn click(&self) -> Result<()> {
        debug!(node_id = %self.inner.id, "Clicking node");
        self.exec_script("node.click()").await
    }

    /// Dispatches a synthetic mouse event named `event_name`.
    pub async fn mouse_event(&self, event_name: &str) -> Result<()> {
        self.exec_script(&script::mouse_event(event_name)).await
    }

    /// Simulates a full mouse click.
    ///
    /// Fires `mousedown`, `mouseup` and a native click, retrying until the
    /// whole sequence succeeds once.
    pub async fn left_click(&self) -> Result<()> {
        let node = self;
        self.inner
            .client
            .waiter()
            .wait_for("left_click", move || async move {
                Attempt::from_result(node.left_click_once().await)
            })
            .await
    }

    async fn left_click_once(&self) -> Result<()> {
        self.mouse_event("mousedown").await?;
        self.mouse_event("mouseup").await?;
        self.invoke(NodeOp::LeftClick, &[]).await.map(drop)
    }

    /// Double-clicks, retrying until the server accepts it once.
    pub async fn double_click(&self) -> Result<()> {
        let node = self;
        self.inner
            .client
            .waiter()
            .wait_for("double_click", move || async move {
                Attempt::from_result(node.invoke(NodeOp::DoubleClick, &[]).await.map(drop))
            })
            .await
    }

    /// Drags this node onto `target`.
    pub async fn drag_to(&self, target: &Node) -> Result<()> {
        self.invoke(NodeOp::DragTo, &[target.id().as_str()])
            .await
            .map(drop)
    }

    /// Selects this `<option>`.
    pub async fn select_option(&self) -> Result<()> {
        self.invoke(NodeOp::SelectOption, &[]).await.map(drop)
    }

    /// Unselects this `<option>`.
    ///
    /// # Errors
    ///
    /// [`Error::Node`] unless the option sits inside a multi-select.
    pub async fn unselect_option(&self) -> Result<()> {
        let Some(select) = self.at_xpath("ancestor::select").await? else {
            return Err(Error::node("Unselect not allowed: option is not inside a select"));
        };

        if !select.is_multi_select().await? {
            return Err(Error::node("Unselect not allowed: select is not multiple"));
        }

        self.invoke(NodeOp::UnselectOption, &[]).await.map(drop)
    }
}

// ============================================================================
// Node - Traversal
// ============================================================================

impl Node {
    pub async fn css(&self, selector: &str) -> Result<Vec<Node>> {
        self.selector().css(selector).await
    }

    pub async fn xpath(&self, expr: &str) -> Result<Vec<Node>> {
        self.selector().xpath(expr).await
    }

    pub async fn at_css(&self, selector: &str) -> Result<Option<Node>> {
        self.selector().at_css(selector).await
    }

    pub async fn at_xpath(&self, expr: &str) -> Result<Option<Node>> {
        self.selector().at_xpath(expr).await
    }

    /// Polls below this node for a CSS match with the presence timeout.
    pub async fn at_css_with_retry(&self, selector: &str) -> Result<Option<Node>> {
        self.selector().at_css_with_retry(selector).await
    }

    /// Polls below this node for an XPath match with the presence timeout.
    pub async fn at_xpath_with_retry(&self, expr: &str) -> Result<Option<Node>> {
        self.selector().at_xpath_with_retry(expr).await
    }

    /// Polls below this node with an explicit timeout.
    pub async fn at_with_retry(&self, by: &By, timeout: Duration) -> Result<Option<Node>> {
        self.selector().at_with_retry(by, timeout).await
    }

    /// Returns the parent node.
    pub async fn parent(&self) -> Result<Option<Node>> {
        self.at_xpath("..").await
    }

    /// Returns the element children.
    pub async fn children(&self) -> Result<Vec<Node>> {
        self.xpath("*").await
    }

    /// Returns the enclosing form.
    pub async fn form(&self) -> Result<Option<Node>> {
        self.at_xpath("ancestor::form").await
    }
}

// ============================================================================
// Tests
// ============================================================================
