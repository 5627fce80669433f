//! Form filling with retries and debug snapshots.
//!
//! Usage:
//!   cargo run --example 002_form_fill -- [--debug] [--snapshots DIR] [URL]
//!
//! The default URL points at a public echo form.

mod common;

use std::time::Duration;

use anyhow::{Context, bail};
use webkit_driver::browser::form;
use webkit_driver::{Attempt, Client, Recorder, Server, WaitOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = common::Args::parse("https://httpbin.org/forms/post");
    common::init_logging(args.debug);

    let client = Client::builder()
        .wait_options(WaitOptions::new().with_timeout(Duration::from_secs(20)))
        .build()
        .await
        .context("starting webkit_server")?;

    let recorder = match &args.snapshots {
        Some(dir) => Recorder::with_dir(client.clone(), dir),
        None => Recorder::new(client.clone()),
    };

    client.visit(&args.url).await?;
    recorder.record("form", "opened").await?;

    let Some(form_node) = client.at_css_with_retry("form").await? else {
        bail!("no form on {}", args.url);
    };

    let inputs = form_node.css("input[type=text], input[type=tel], input[type=email]").await?;
    form::fill(&inputs, &["Ada Lovelace", "555-0100", "ada@example.com"]).await?;
    recorder.record("form", "filled").await?;

    if let Some(topping) = form_node.at_xpath(".//input[@value='cheese']").await? {
        topping.left_click().await?;
        println!("Cheese checked: {}", topping.is_checked().await?);
    }

    let start_url = client.url().await?;
    form_node.submit().await?;

    let session = &client;
    let start = start_url.as_str();
    let landed = client
        .wait_for("navigation after submit", move || async move {
            match session.url().await {
                Ok(url) if url != start => Attempt::Ready(url),
                Ok(_) => Attempt::Pending,
                Err(e) => Attempt::Retry(e),
            }
        })
        .await?;
    recorder.record("form", "submitted").await?;

    println!("Submitted, now at {landed}");
    println!("{}", client.body().await?.chars().take(400).collect::<String>());

    client.close().await?;
    Server::shutdown_default().await;
    Ok(())
}
