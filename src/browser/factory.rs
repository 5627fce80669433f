//! Node construction policy.
//!
//! Every handle the server returns goes through the client's
//! [`NodeFactory`] before reaching the caller. Replacing the factory lets
//! an application tag or track the nodes it hands out.
//!
//! # Example
//!
//! ```ignore
//! use webkit_driver::{Client, Node, NodeFactory, NodeId};
//!
//! struct Labelled;
//!
//! impl NodeFactory for Labelled {
//!     fn create(&self, client: &Client, id: NodeId) -> Node {
//!         Node::new(client.clone(), id).with_label("checkout")
//!     }
//! }
//!
//! let client = Client::builder().node_factory(Labelled).build().await?;
//! ```

use crate::identifiers::NodeId;

use super::client::Client;
use super::node::Node;

// ============================================================================
// NodeFactory
// ============================================================================

/// Maps a server handle to a [`Node`].
pub trait NodeFactory: Send + Sync {
    /// Builds the proxy for `id`, owned by `client`.
    fn create(&self, client: &Client, id: NodeId) -> Node;
}

impl<F> NodeFactory for F
where
    F: Fn(&Client, NodeId) -> Node + Send + Sync,
{
    fn create(&self, client: &Client, id: NodeId) -> Node {
        self(client, id)
    }
}

/// Plain [`Node`] for every handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeFactory;

impl NodeFactory for DefaultNodeFactory {
    #[inline]
    fn create(&self, client: &Client, id: NodeId) -> Node {
        Node::new(client.clone(), id)
    }
}
