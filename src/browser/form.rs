//! Form-filling helpers.
//!
//! Thin routines on top of [`Node`] for pages whose inputs react to
//! `change` events rather than to simulated typing.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

use super::node::Node;
use super::script::json_string;

/// Assigns `node.value` from script and fires a bubbling `change` event.
///
/// Empty values are skipped, leaving the field untouched.
pub async fn fill_element(node: &Node, value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }

    debug!(node_id = %node.id(), len = value.len(), "Filling element");

    let js = format!(
        "node.value = {}; \
         var event = document.createEvent('HTMLEvents'); \
         event.initEvent('change', true, true); \
         node.dispatchEvent(event)",
        json_string(value)
    );
    node.eval_script(&js).await.map(drop)
}

/// Fills `nodes[i]` with `values[i]`, skipping empty values.
///
/// # Errors
///
/// [`Error::Node`] if a non-empty value has no node at its position.
pub async fn fill<S: AsRef<str>>(nodes: &[Node], values: &[S]) -> Result<()> {
    for (index, value) in values.iter().enumerate() {
        let value = value.as_ref();
        if value.is_empty() {
            continue;
        }

        let node = nodes.get(index).ok_or_else(|| {
            Error::node(format!(
                "No field at position {index} ({} fields for {} values)",
                nodes.len(),
                values.len()
            ))
        })?;
        fill_element(node, value).await?;
    }
    Ok(())
}

/// Puts `path` into a file input, even a hidden one.
///
/// Inputs styled away by the page are made positionable first so the
/// server can interact with them.
pub async fn upload_file(input: &Node, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_string_lossy();
    debug!(node_id = %input.id(), %path, "Uploading file");

    input.set_attribute("style", "position: absolute").await?;
    input.set(&path).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::NodeId;
    use crate::transport::mock::FakeServer;

    #[tokio::test]
    async fn test_fill_element_escapes_value() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let node = Node::new(server.client().await, NodeId::new("4"));

        fill_element(&node, "line one\nsays \"hi\"").await.unwrap();

        let script = &server.commands()[0].args[0];
        assert!(script.contains(r#"node.value = "line one\nsays \"hi\"";"#));
        assert!(script.contains("event.initEvent('change', true, true)"));
    }

    #[tokio::test]
    async fn test_fill_skips_empty_values() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let client = server.client().await;
        let nodes = vec![
            Node::new(client.clone(), NodeId::new("1")),
            Node::new(client.clone(), NodeId::new("2")),
            Node::new(client, NodeId::new("3")),
        ];

        fill(&nodes, &["a", "", "c"]).await.unwrap();

        let scripts: Vec<_> = server.commands().into_iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].contains("Capybara.nodes[\"1\"]"));
        assert!(scripts[1].contains("Capybara.nodes[\"3\"]"));
    }

    #[tokio::test]
    async fn test_fill_with_missing_field() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let nodes = vec![Node::new(server.client().await, NodeId::new("1"))];

        let err = fill(&nodes, &["a", "b"]).await.unwrap_err();
        assert!(matches!(err, Error::Node { .. }));
    }

    #[tokio::test]
    async fn test_upload_file_reveals_input_then_sets() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let input = Node::new(server.client().await, NodeId::new("9"));

        upload_file(&input, "/tmp/app.apk").await.unwrap();

        let commands = server.commands();
        assert_eq!(commands[0].verb, "Execute");
        assert!(commands[0].args[0].contains("node.setAttribute(\"style\", \"position: absolute\")"));
        assert_eq!(commands[1].args, ["set", "9", "/tmp/app.apk"]);
    }
}
