//! Image resizing through an external program.
//!
//! The crate does no image processing itself. [`ExternalResizer`] runs a
//! helper executable as
//!
//! ```text
//! <binary> <input> <output> <width> <height>
//! ```
//!
//! and treats a non-zero exit as failure.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Binary name looked up through `PATH` when none is configured.
pub const DEFAULT_RESIZER_BINARY: &str = "image_resizer";

// ============================================================================
// ImageResizer
// ============================================================================

/// Produces a resized copy of an image file.
#[async_trait]
pub trait ImageResizer: Send + Sync {
    /// Writes `input` scaled to `width`x`height` into `output`.
    async fn resize(&self, input: &Path, output: &Path, width: u32, height: u32) -> Result<()>;
}

// ============================================================================
// ExternalResizer
// ============================================================================

/// [`ImageResizer`] backed by a subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalResizer {
    binary: PathBuf,
}

impl Default for ExternalResizer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZER_BINARY)
    }
}

impl ExternalResizer {
    /// Uses `binary` as the helper.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the helper path.
    #[inline]
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl ImageResizer for ExternalResizer {
    async fn resize(&self, input: &Path, output: &Path, width: u32, height: u32) -> Result<()> {
        debug!(
            binary = %self.binary.display(),
            input = %input.display(),
            output = %output.display(),
            width,
            height,
            "Resizing image"
        );

        let result = Command::new(&self.binary)
            .arg(input)
            .arg(output)
            .arg(width.to_string())
            .arg(height.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(Error::process_launch_failed)?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        Err(Error::resize(format!(
            "{} exited with {}: {}",
            self.binary.display(),
            result.status,
            stderr.trim()
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
