//! Server launch options and wait timing.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use webkit_driver::{ServerOptions, WaitOptions};
//!
//! let server = ServerOptions::new()
//!     .with_binary("/opt/webkit/webkit_server")
//!     .with_startup_timeout(Duration::from_secs(20));
//!
//! assert_eq!(server.to_args(), vec!["--ignore-ssl-errors"]);
//!
//! let wait = WaitOptions::new().with_timeout(Duration::from_secs(60));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Binary name looked up through `PATH` when none is configured.
pub const DEFAULT_SERVER_BINARY: &str = "webkit_server";

/// How long to wait for the port banner.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between two polling attempts.
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_millis(500);

/// Budget of a generic wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget of an element-presence wait.
pub const DEFAULT_PRESENCE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ServerOptions
// ============================================================================

/// How to launch the automation server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Executable path, or a bare name resolved through `PATH`.
    pub binary: PathBuf,

    /// Pass `--ignore-ssl-errors` (on by default).
    pub ignore_ssl_errors: bool,

    /// Additional command-line arguments, appended last.
    pub extra_args: Vec<String>,

    /// Upper bound on waiting for the port banner.
    pub startup_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ServerOptions - Builder Methods
// ============================================================================

impl ServerOptions {
    /// Creates options for the `webkit_server` found on `PATH`.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_SERVER_BINARY),
            ignore_ssl_errors: true,
            extra_args: Vec::new(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Sets the server executable.
    #[inline]
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Enables or disables `--ignore-ssl-errors`.
    #[inline]
    #[must_use]
    pub fn with_ignore_ssl_errors(mut self, ignore: bool) -> Self {
        self.ignore_ssl_errors = ignore;
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds multiple custom command-line arguments.
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the banner timeout.
    #[inline]
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

// ============================================================================
// ServerOptions - Conversion
// ============================================================================

impl ServerOptions {
    /// Converts options to server command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(1 + self.extra_args.len());

        if self.ignore_ssl_errors {
            args.push("--ignore-ssl-errors".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Validates the configuration.
    ///
    /// A binary given as a path (anything with a separator) must exist.
    /// Bare names are left to `PATH` resolution at spawn time.
    ///
    /// # Errors
    ///
    /// - [`Error::ServerNotFound`] if an explicit path does not exist
    /// - [`Error::Config`] if the startup timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.binary.components().count() > 1 && !self.binary.exists() {
            return Err(Error::server_not_found(&self.binary));
        }

        if self.startup_timeout.is_zero() {
            return Err(Error::config("startup timeout must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// WaitOptions
// ============================================================================

/// Timing of the polling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Pause between attempts.
    pub interval: Duration,

    /// Budget for generic waits.
    pub timeout: Duration,

    /// Budget for element-presence waits (`*_with_retry` queries).
    pub presence_timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitOptions {
    /// Creates the default timing: 0.5s interval, 10s timeout, 5s presence.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: DEFAULT_WAIT_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
            presence_timeout: DEFAULT_PRESENCE_TIMEOUT,
        }
    }

    /// Sets the polling interval.
    #[inline]
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the generic timeout.
    #[inline]
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the presence timeout.
    #[inline]
    #[must_use]
    pub const fn with_presence_timeout(mut self, timeout: Duration) -> Self {
        self.presence_timeout = timeout;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_default() {
        let options = ServerOptions::new();
        assert_eq!(options.binary, PathBuf::from("webkit_server"));
        assert!(options.ignore_ssl_errors);
        assert!(options.extra_args.is_empty());
        assert_eq!(options.startup_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_to_args_default() {
        assert_eq!(ServerOptions::new().to_args(), vec!["--ignore-ssl-errors"]);
    }

    #[test]
    fn test_to_args_extra_args_come_last() {
        let options = ServerOptions::new().with_arg("--verbose").with_args(["-a", "-b"]);
        assert_eq!(
            options.to_args(),
            vec!["--ignore-ssl-errors", "--verbose", "-a", "-b"]
        );
    }

    #[test]
    fn test_to_args_without_ssl_flag() {
        let options = ServerOptions::new().with_ignore_ssl_errors(false).with_arg("-x");
        assert_eq!(options.to_args(), vec!["-x"]);
    }

    #[test]
    fn test_validate_bare_name() {
        assert!(ServerOptions::new().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_path() {
        let options = ServerOptions::new().with_binary("/definitely/not/here/webkit_server");
        assert!(matches!(
            options.validate(),
            Err(Error::ServerNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let options = ServerOptions::new().with_startup_timeout(Duration::ZERO);
        assert!(matches!(options.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_wait_defaults() {
        let wait = WaitOptions::default();
        assert_eq!(wait.interval, Duration::from_millis(500));
        assert_eq!(wait.timeout, Duration::from_secs(10));
        assert_eq!(wait.presence_timeout, Duration::from_secs(5));
    }
}
