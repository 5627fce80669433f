//! Basic session: start the server, load a page, inspect it.
//!
//! Usage:
//!   cargo run --example 001_basic_visit -- [--debug] [URL]
//!
//! Requires `webkit_server` on PATH and a display (`xvfb-run` works).

mod common;

use anyhow::Context;
use webkit_driver::{Client, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = common::Args::parse("https://example.com");
    common::init_logging(args.debug);

    let client = Client::new().await.context("starting webkit_server")?;

    println!("[1] Visiting {}", args.url);
    client.visit(&args.url).await?;
    client.wait_for_page_load().await?;

    println!("[2] Landed on {} ({})", client.url().await?, client.status_code().await?);

    for (name, value) in client.headers().await? {
        println!("        {name}: {value}");
    }

    let title = client.eval_script("document.title").await?;
    println!("[3] Title: {title}");

    let links = client.css("a[href]").await?;
    println!("[4] {} links", links.len());
    for link in links.iter().take(5) {
        let href = link.attribute("href").await?.unwrap_or_default();
        println!("        {} -> {href}", link.text().await?.trim());
    }

    client.render("001_basic_visit.png").await?;
    println!("[5] Rendered to 001_basic_visit.png");

    client.close().await?;
    Server::shutdown_default().await;
    Ok(())
}
