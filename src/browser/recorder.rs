//! Step-by-step debug snapshots.
//!
//! A [`Recorder`] logs `action : state` for each step of a long script
//! and, when given a directory, renders the page after each step as
//! `<unix-time>-<action>-<state>.png`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::error::Result;

use super::client::Client;

/// Debug snapshot writer bound to a session.
#[derive(Debug, Clone)]
pub struct Recorder {
    client: Client,
    dir: Option<PathBuf>,
}

impl Recorder {
    /// Logs steps without rendering.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client, dir: None }
    }

    /// Renders every step into `dir`, created on first use.
    #[must_use]
    pub fn with_dir(client: Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: Some(dir.into()),
        }
    }

    /// Returns the snapshot directory, if any.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Records one step. Returns the snapshot path when one was written.
    pub async fn record(&self, action: &str, state: &str) -> Result<Option<PathBuf>> {
        info!(session_id = %self.client.session_id(), "{action} : {state}");

        let Some(dir) = &self.dir else {
            return Ok(None);
        };

        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(snapshot_name(action, state, SystemTime::now()));
        self.client.render(&path).await?;
        Ok(Some(path))
    }
}

fn snapshot_name(action: &str, state: &str, at: SystemTime) -> String {
    let secs = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    format!("{secs:.3}-{}-{}.png", file_part(action), file_part(state))
}

/// Replaces path separators so a label stays one file name.
fn file_part(label: &str) -> String {
    label
        .chars()
        .map(|c| if std::path::is_separator(c) || c == '\0' { '_' } else { c })
        .collect()
}
