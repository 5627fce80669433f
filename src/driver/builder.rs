//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] sessions.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use webkit_driver::{Client, Server, ServerOptions, WaitOptions};
//!
//! # async fn example() -> webkit_driver::Result<()> {
//! let server = Arc::new(Server::start(ServerOptions::new()).await?);
//!
//! let client = Client::builder()
//!     .server(Arc::clone(&server))
//!     .wait_options(WaitOptions::new().with_timeout(Duration::from_secs(30)))
//!     .error_tolerant(true)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::browser::{Client, DefaultNodeFactory, NodeFactory};
use crate::error::{Error, Result};
use crate::transport::{Connection, Server};

use super::options::WaitOptions;

// ============================================================================
// Constants
// ============================================================================

/// `User-Agent` sent by new sessions unless disabled.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_0) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/31.0.1650.57 Safari/537.36";

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`].
///
/// Use [`Client::builder()`] to create a new builder.
pub struct ClientBuilder {
    /// Server to connect to.
    server: Option<Arc<Server>>,
    /// Ready-made connection; wins over `server`.
    connection: Option<Connection>,
    /// Node construction policy.
    factory: Option<Arc<dyn NodeFactory>>,
    /// Polling timing.
    wait: WaitOptions,
    /// Header sent on construction.
    user_agent: Option<String>,
    /// Enable error tolerance on construction.
    error_tolerant: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("server", &self.server.as_ref().map(|s| s.port()))
            .field("connection", &self.connection.as_ref().map(Connection::peer_addr))
            .field("custom_factory", &self.factory.is_some())
            .field("wait", &self.wait)
            .field("user_agent", &self.user_agent)
            .field("error_tolerant", &self.error_tolerant)
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder for the default server and default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            server: None,
            connection: None,
            factory: None,
            wait: WaitOptions::new(),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            error_tolerant: false,
        }
    }

    /// Connects to `server` instead of the default one.
    #[inline]
    #[must_use]
    pub fn server(mut self, server: Arc<Server>) -> Self {
        self.server = Some(server);
        self
    }

    /// Uses an already open connection.
    #[inline]
    #[must_use]
    pub fn connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Replaces the node construction policy.
    #[inline]
    #[must_use]
    pub fn node_factory(mut self, factory: impl NodeFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets polling timing.
    #[inline]
    #[must_use]
    pub fn wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Overrides the `User-Agent` header.
    #[inline]
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Leaves the server's own `User-Agent` in place.
    #[inline]
    #[must_use]
    pub fn no_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }

    /// Enables error tolerance right away.
    #[inline]
    #[must_use]
    pub fn error_tolerant(mut self, tolerant: bool) -> Self {
        self.error_tolerant = tolerant;
        self
    }

    /// Opens the session.
    ///
    /// Without a server or connection, starts (or reuses) the process-wide
    /// default server.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the wait interval is zero
    /// - server startup and connection errors
    /// - errors from the initial header or error-tolerance commands
    pub async fn build(self) -> Result<Client> {
        self.validate()?;

        let (connection, server) = match (self.connection, self.server) {
            (Some(connection), server) => (connection, server),
            (None, Some(server)) => (server.connect().await?, Some(server)),
            (None, None) => {
                let server = Server::default_instance().await?;
                (server.connect().await?, Some(server))
            }
        };

        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(DefaultNodeFactory));

        let client = Client::from_parts(connection, factory, self.wait, server, false);

        if let Some(user_agent) = &self.user_agent {
            client.set_header("User-Agent", user_agent).await?;
        }

        if self.error_tolerant {
            client.set_error_tolerant(true).await?;
        }

        Ok(client)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    fn validate(&self) -> Result<()> {
        if self.wait.interval.is_zero() {
            return Err(Error::config(
                "Wait interval must be greater than zero.\n\
                 Example: WaitOptions::new().with_interval(Duration::from_millis(100))",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::transport::mock::FakeServer;

    #[test]
    fn test_new_has_defaults() {
        let builder = ClientBuilder::new();
        assert!(builder.server.is_none());
        assert!(builder.connection.is_none());
        assert!(!builder.error_tolerant);
        assert_eq!(builder.user_agent.as_deref(), Some(DEFAULT_USER_AGENT));
        assert_eq!(builder.wait, WaitOptions::new());
    }

    #[test]
    fn test_no_user_agent_clears_header() {
        let builder = ClientBuilder::new().user_agent("bot/1.0").no_user_agent();
        assert!(builder.user_agent.is_none());
    }

    #[tokio::test]
    async fn test_build_sends_user_agent() {
        let server = FakeServer::start(|_| Ok(String::new())).await;

        let client = ClientBuilder::new()
            .server(Arc::new(Server::attach(server.port())))
            .build()
            .await
            .unwrap();

        let commands = server.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].verb, "Header");
        assert_eq!(commands[0].args, ["User-Agent", DEFAULT_USER_AGENT]);
        assert!(!client.is_error_tolerant());
    }

    #[tokio::test]
    async fn test_build_with_connection_and_tolerance() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let connection = Connection::connect(server.addr()).await.unwrap();

        let client = ClientBuilder::new()
            .connection(connection)
            .user_agent("bot/1.0")
            .error_tolerant(true)
            .build()
            .await
            .unwrap();

        assert!(client.is_error_tolerant());
        assert!(client.server().is_none());
        assert_eq!(server.count("Header", "User-Agent"), 1);
        assert_eq!(server.count("SetErrorTolerance", "true"), 1);
    }

    #[tokio::test]
    async fn test_build_rejects_zero_interval() {
        let result = ClientBuilder::new()
            .wait_options(WaitOptions::new().with_interval(Duration::ZERO))
            .build()
            .await;

        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_build_fails_on_refused_connection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = ClientBuilder::new()
            .server(Arc::new(Server::attach(port)))
            .build()
            .await;

        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
