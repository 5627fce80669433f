//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization

#![allow(dead_code)]

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub url: String,
    pub snapshots: Option<PathBuf>,
}

impl Args {
    /// Parses `[--debug] [--snapshots DIR] [URL]`.
    pub fn parse(default_url: &str) -> Self {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            debug: false,
            url: default_url.to_string(),
            snapshots: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" => parsed.debug = true,
                "--snapshots" => parsed.snapshots = args.next().map(PathBuf::from),
                _ => parsed.url = arg,
            }
        }

        parsed
    }
}

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "webkit_driver=trace"
    } else {
        "webkit_driver=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
