//! End-to-end session tests against a scripted loopback server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use webkit_driver::protocol::{Command, read_command, write_response};
use webkit_driver::{Client, Error, NodeValue, Server, WaitOptions};

/// Minimal page model: node id -> (tag, attributes, value).
type Page = HashMap<&'static str, (&'static str, Vec<(&'static str, &'static str)>, &'static str)>;

fn page() -> Page {
    HashMap::from([
        ("1", ("select", vec![("multiple", "multiple")], "")),
        ("2", ("option", vec![("selected", "true")], "a")),
        ("3", ("option", vec![], "b")),
        ("4", ("option", vec![("selected", "selected")], "c")),
        ("5", ("input", vec![("checked", "checked"), ("name", "agree")], "on")),
    ])
}

fn answer(page: &Page, cmd: &Command) -> Result<String, String> {
    match (cmd.verb.as_str(), cmd.args.as_slice()) {
        ("FindCss", [q]) if q == "select" => Ok("1".into()),
        ("FindCss", [q]) if q == "input" => Ok("5,5".into()),
        ("FindCss", _) => Ok(String::new()),
        ("Node", [op, id, rest @ ..]) => {
            let Some((tag, attrs, value)) = page.get(id.as_str()) else {
                return Err(format!("unknown node {id}"));
            };
            match (op.as_str(), rest) {
                ("tagName", []) => Ok(tag.to_string()),
                ("value", []) => Ok(value.to_string()),
                ("attribute", [name]) => Ok(attrs
                    .iter()
                    .find(|(n, _)| *n == name.as_str())
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()),
                ("findXpathWithin", [q]) if q == ".//option" => Ok("2,3,4".into()),
                ("visible", []) => Ok("true".into()),
                _ => Ok(String::new()),
            }
        }
        ("Visit", [url]) if url.starts_with("http") => Ok(String::new()),
        ("Visit", _) => Err("Unable to load URL".into()),
        _ => Ok(String::new()),
    }
}

async fn serve() -> anyhow::Result<(u16, Arc<Mutex<Vec<Command>>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let log = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&log);

    tokio::spawn(async move {
        let page = page();
        while let Ok((stream, _)) = listener.accept().await {
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            while let Ok(Some(cmd)) = read_command(&mut reader).await {
                let reply = answer(&page, &cmd);
                seen.lock().push(cmd);
                if write_response(&mut write_half, &reply).await.is_err() {
                    break;
                }
            }
        }
    });

    Ok((port, log))
}

async fn client(port: u16) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .server(Arc::new(Server::attach(port)))
        .wait_options(
            WaitOptions::new()
                .with_interval(Duration::from_millis(10))
                .with_presence_timeout(Duration::from_millis(50)),
        )
        .build()
        .await?)
}

#[tokio::test]
async fn multi_select_reports_selected_values_in_order() -> anyhow::Result<()> {
    let (port, _) = serve().await?;
    let client = client(port).await?;

    let select = client.at_css("select").await?.expect("select present");
    assert!(select.is_multi_select().await?);
    assert_eq!(
        select.value().await?,
        NodeValue::Multiple(vec!["a".into(), "c".into()])
    );
    Ok(())
}

#[tokio::test]
async fn duplicate_handles_are_collapsed() -> anyhow::Result<()> {
    let (port, _) = serve().await?;
    let client = client(port).await?;

    let inputs = client.css("input").await?;
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].is_checked().await?);
    assert!(inputs[0].is_visible().await?);
    assert_eq!(inputs[0].attribute("name").await?.as_deref(), Some("agree"));
    Ok(())
}

#[tokio::test]
async fn server_errors_and_absence_are_distinct() -> anyhow::Result<()> {
    let (port, log) = serve().await?;
    let client = client(port).await?;

    let err = client.visit("ftp://nowhere").await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { ref message } if message == "Unable to load URL"));
    assert!(!err.is_timeout());

    assert!(client.at_css_with_retry("#missing").await?.is_none());

    let first = log.lock()[0].clone();
    assert_eq!(first.verb, "Header");
    assert_eq!(first.args[0], "User-Agent");
    Ok(())
}
