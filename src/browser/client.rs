//! Browser session facade.
//!
//! A [`Client`] owns one connection to the automation server and is the
//! entry point for navigation, scripting, cookies, rendering and
//! document-wide queries.
//!
//! Clients are cheap to clone; clones share the session. Commands from
//! all clones and all [`Node`]s of a session go through one connection,
//! one complete exchange at a time.
//!
//! # Example
//!
//! ```no_run
//! use webkit_driver::{Client, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::new().await?;
//!
//! client.visit("https://example.com/login").await?;
//! client.wait_for_page_load().await?;
//!
//! if let Some(user) = client.at_css_with_retry("#user").await? {
//!     user.set("alice").await?;
//! }
//!
//! println!("{} -> {}", client.url().await?, client.status_code().await?);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::driver::{ClientBuilder, WaitOptions};
use crate::error::Result;
use crate::identifiers::SessionId;
use crate::protocol::response::{
    parse_cookies, parse_evaluate, parse_headers, parse_node_ids, parse_status,
};
use crate::protocol::{Command, Verb};
use crate::transport::{Connection, Server};

use super::factory::NodeFactory;
use super::node::Node;
use super::proxy::ProxyConfig;
use super::selector::{By, Selector};
use super::wait::{Attempt, Waiter};

// ============================================================================
// Constants
// ============================================================================

/// Viewport size used by [`Client::render`].
pub const DEFAULT_RENDER_SIZE: (u32, u32) = (1024, 1024);

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    /// Log correlation ID.
    pub session_id: SessionId,

    /// The session's only connection.
    pub connection: AsyncMutex<Connection>,

    /// Construction policy for returned nodes.
    pub factory: Arc<dyn NodeFactory>,

    /// Polling timing.
    pub wait: WaitOptions,

    /// Suppress protocol errors.
    pub error_tolerant: AtomicBool,

    /// Keeps a caller-supplied or default server alive.
    pub server: Option<Arc<Server>>,
}

// ============================================================================
// Client
// ============================================================================

/// A browser session on the automation server.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("session_id", &self.inner.session_id)
            .field("port", &self.inner.server.as_ref().map(|s| s.port()))
            .field("error_tolerant", &self.is_error_tolerant())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructors
// ============================================================================

impl Client {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client on the default server with default settings.
    ///
    /// # Errors
    ///
    /// Fails if the default server cannot be started or reached.
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    pub(crate) fn from_parts(
        connection: Connection,
        factory: Arc<dyn NodeFactory>,
        wait: WaitOptions,
        server: Option<Arc<Server>>,
        error_tolerant: bool,
    ) -> Self {
        let session_id = SessionId::next();
        debug!(%session_id, peer = %connection.peer_addr(), "Session opened");

        Self {
            inner: Arc::new(ClientInner {
                session_id,
                connection: AsyncMutex::new(connection),
                factory,
                wait,
                error_tolerant: AtomicBool::new(error_tolerant),
                server,
            }),
        }
    }
}

// ============================================================================
// Client - Accessors
// ============================================================================

impl Client {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id
    }

    /// Returns the server this session was opened on, if known.
    #[inline]
    #[must_use]
    pub fn server(&self) -> Option<&Arc<Server>> {
        self.inner.server.as_ref()
    }

    /// Returns the polling timing.
    #[inline]
    #[must_use]
    pub fn wait_options(&self) -> &WaitOptions {
        &self.inner.wait
    }

    /// Returns `true` if protocol errors are being suppressed.
    #[inline]
    #[must_use]
    pub fn is_error_tolerant(&self) -> bool {
        self.inner.error_tolerant.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Client - Commands
// ============================================================================

impl Client {
    /// Sends one command and returns its payload.
    ///
    /// Holds the connection for the whole exchange. With error tolerance
    /// on, transport errors are logged and turned into an empty payload,
    /// including on a connection that broke earlier.
    pub async fn issue(&self, command: Command) -> Result<String> {
        let result = {
            let mut connection = self.inner.connection.lock().await;
            connection.issue_command(&command).await
        };

        match result {
            Err(e) if e.is_transport_error() && self.is_error_tolerant() => {
                warn!(
                    session_id = %self.inner.session_id,
                    verb = %command.verb,
                    error = %e,
                    "Suppressed error"
                );
                Ok(String::new())
            }
            other => other,
        }
    }

    /// Builds nodes from a comma-separated handle list.
    pub(crate) fn wrap_nodes(&self, payload: &str) -> Vec<Node> {
        parse_node_ids(payload)
            .into_iter()
            .map(|id| self.inner.factory.create(self, id))
            .collect()
    }
}

// ============================================================================
// Client - Navigation
// ============================================================================

impl Client {
    /// Navigates to `url`.
    pub async fn visit(&self, url: &str) -> Result<()> {
        info!(session_id = %self.inner.session_id, url, "Visiting");
        self.issue(Command::visit(url)).await.map(drop)
    }

    /// Waits for the current page load to finish.
    ///
    /// Fails with the server's description when the load failed.
    pub async fn wait_for_page_load(&self) -> Result<()> {
        self.issue(Command::new(Verb::Wait)).await.map(drop)
    }

    /// Returns the current HTML.
    pub async fn body(&self) -> Result<String> {
        self.issue(Command::new(Verb::Body)).await
    }

    /// Returns the current location.
    pub async fn url(&self) -> Result<String> {
        self.issue(Command::new(Verb::CurrentUrl)).await
    }

    /// Sets a request header for subsequent requests.
    pub async fn set_header(&self, key: &str, value: &str) -> Result<()> {
        self.issue(Command::header(key, value)).await.map(drop)
    }

    /// Resets session state: cookies, headers, page.
    pub async fn reset(&self) -> Result<()> {
        self.issue(Command::new(Verb::Reset)).await.map(drop)
    }

    /// Returns the HTTP status of the last response.
    ///
    /// Reports 0 when error tolerance swallowed the answer.
    pub async fn status_code(&self) -> Result<u16> {
        let payload = self.issue(Command::new(Verb::Status)).await?;
        if payload.is_empty() && self.is_error_tolerant() {
            return Ok(0);
        }
        parse_status(&payload)
    }

    /// Returns the headers of the last response.
    ///
    /// On duplicate names the last one wins.
    pub async fn headers(&self) -> Result<FxHashMap<String, String>> {
        Ok(parse_headers(&self.issue(Command::new(Verb::Headers)).await?))
    }
}

// ============================================================================
// Client - Scripts
// ============================================================================

impl Client {
    /// Evaluates an expression and decodes its JSON result.
    pub async fn eval_script(&self, expr: &str) -> Result<Value> {
        parse_evaluate(&self.issue(Command::evaluate(expr)).await?)
    }

    /// Executes a script, discarding any result.
    pub async fn exec_script(&self, script: &str) -> Result<()> {
        self.issue(Command::execute(script)).await.map(drop)
    }
}

// ============================================================================
// Client - Rendering
// ============================================================================

impl Client {
    /// Renders the page to an image at `path`, 1024x1024.
    pub async fn render(&self, path: impl AsRef<Path>) -> Result<()> {
        let (width, height) = DEFAULT_RENDER_SIZE;
        self.render_with_size(path, width, height).await
    }

    /// Renders the page to an image at `path` with the given viewport.
    pub async fn render_with_size(
        &self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let path = path.as_ref().to_string_lossy();
        debug!(session_id = %self.inner.session_id, %path, width, height, "Rendering");
        self.issue(Command::render(&path, width, height)).await.map(drop)
    }
}

// ============================================================================
// Client - Cookies
// ============================================================================

impl Client {
    /// Adds a cookie in `Set-Cookie` syntax.
    pub async fn set_cookie(&self, cookie: &str) -> Result<()> {
        self.issue(Command::set_cookie(cookie)).await.map(drop)
    }

    /// Deletes every cookie.
    pub async fn clear_cookies(&self) -> Result<()> {
        self.issue(Command::new(Verb::ClearCookies)).await.map(drop)
    }

    /// Returns every cookie in `Set-Cookie` syntax.
    pub async fn cookies(&self) -> Result<Vec<String>> {
        Ok(parse_cookies(&self.issue(Command::new(Verb::GetCookies)).await?))
    }
}

// ============================================================================
// Client - Session Settings
// ============================================================================

impl Client {
    /// Toggles error tolerance on the server and in this client.
    ///
    /// While on, protocol errors degrade to empty results instead of
    /// failing the call.
    pub async fn set_error_tolerant(&self, tolerant: bool) -> Result<()> {
        self.issue(Command::set_error_tolerance(tolerant)).await?;
        self.inner.error_tolerant.store(tolerant, Ordering::Relaxed);
        debug!(session_id = %self.inner.session_id, tolerant, "Error tolerance changed");
        Ok(())
    }

    /// Routes traffic through an HTTP proxy.
    pub async fn set_proxy(&self, proxy: &ProxyConfig) -> Result<()> {
        debug!(session_id = %self.inner.session_id, host = %proxy.host, port = proxy.port, "Setting proxy");
        let command = Command::set_proxy(
            &proxy.host,
            proxy.port,
            proxy.username.as_deref().unwrap_or_default(),
            proxy.password.as_deref().unwrap_or_default(),
        );
        self.issue(command).await.map(drop)
    }

    /// Goes back to direct connections.
    pub async fn clear_proxy(&self) -> Result<()> {
        self.issue(Command::new(Verb::ClearProxy)).await.map(drop)
    }

    /// Ends the session by closing the connection.
    ///
    /// Later commands from any clone fail with a connection error. The
    /// server itself keeps running.
    pub async fn close(&self) -> Result<()> {
        let mut connection = self.inner.connection.lock().await;
        if connection.is_poisoned() {
            return Ok(());
        }
        info!(session_id = %self.inner.session_id, "Closing session");
        connection.shutdown().await
    }
}

// ============================================================================
// Client - Selection
// ============================================================================

impl Client {
    /// Returns a document-wide selector.
    #[must_use]
    pub fn selector(&self) -> Selector {
        Selector::document(self.clone())
    }

    pub async fn find(&self, by: &By) -> Result<Vec<Node>> {
        self.selector().find(by).await
    }

    pub async fn at(&self, by: &By) -> Result<Option<Node>> {
        self.selector().at(by).await
    }

    pub async fn css(&self, selector: &str) -> Result<Vec<Node>> {
        self.selector().css(selector).await
    }

    pub async fn xpath(&self, expr: &str) -> Result<Vec<Node>> {
        self.selector().xpath(expr).await
    }

    pub async fn at_css(&self, selector: &str) -> Result<Option<Node>> {
        self.selector().at_css(selector).await
    }

    pub async fn at_xpath(&self, expr: &str) -> Result<Option<Node>> {
        self.selector().at_xpath(expr).await
    }

    /// Polls for a CSS match with the presence timeout.
    ///
    /// `None` if nothing matched in time.
    pub async fn at_css_with_retry(&self, selector: &str) -> Result<Option<Node>> {
        self.selector().at_css_with_retry(selector).await
    }

    /// Polls for an XPath match with the presence timeout.
    pub async fn at_xpath_with_retry(&self, expr: &str) -> Result<Option<Node>> {
        self.selector().at_xpath_with_retry(expr).await
    }

    /// Polls for a match with an explicit timeout.
    pub async fn at_with_retry(&self, by: &By, timeout: Duration) -> Result<Option<Node>> {
        self.selector().at_with_retry(by, timeout).await
    }
}

// ============================================================================
// Client - Waiting
// ============================================================================

impl Client {
    /// Returns a waiter with the generic timeout.
    #[inline]
    #[must_use]
    pub fn waiter(&self) -> Waiter {
        Waiter::from_options(&self.inner.wait)
    }

    /// Returns a waiter with the presence timeout.
    #[inline]
    #[must_use]
    pub fn presence_waiter(&self) -> Waiter {
        Waiter::presence(&self.inner.wait)
    }

    /// Polls `condition` with the generic timeout.
    ///
    /// See [`Waiter::wait_for`].
    pub async fn wait_for<T, F, Fut>(&self, operation: &str, condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        self.waiter().wait_for(operation, condition).await
    }

    /// Polls `condition` with an explicit timeout.
    pub async fn wait_for_timeout<T, F, Fut>(
        &self,
        operation: &str,
        timeout: Duration,
        condition: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        self.waiter()
            .with_timeout(timeout)
            .wait_for(operation, condition)
            .await
    }

    /// Polls `condition`, yielding `None` on timeout.
    pub async fn wait_for_safe<T, F, Fut>(&self, operation: &str, condition: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        self.waiter().wait_for_safe(operation, condition).await
    }

    /// Polls while `condition` holds.
    pub async fn wait_while<F, Fut>(&self, operation: &str, condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.waiter().wait_while(operation, condition).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use crate::identifiers::NodeId;
    use crate::transport::mock::FakeServer;

    #[tokio::test]
    async fn test_visit_and_url() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "CurrentUrl" => Ok("https://example.com/".into()),
            _ => Ok(String::new()),
        })
        .await;
        let client = server.client().await;

        client.visit("https://example.com").await.unwrap();
        assert_eq!(client.url().await.unwrap(), "https://example.com/");
        assert_eq!(server.count("Visit", "https://example.com"), 1);
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = FakeServer::start(|_| Err("Unable to load URL".into())).await;
        let client = server.client().await;

        let err = client.visit("http://nowhere").await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse { ref message } if message == "Unable to load URL"));
    }

    #[tokio::test]
    async fn test_error_tolerance_suppresses_protocol_errors() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "SetErrorTolerance" => Ok(String::new()),
            _ => Err("boom".into()),
        })
        .await;
        let client = server.client().await;

        client.set_error_tolerant(true).await.unwrap();
        assert!(client.is_error_tolerant());
        assert_eq!(server.count("SetErrorTolerance", "true"), 1);

        assert_eq!(client.body().await.unwrap(), "");
        assert_eq!(client.status_code().await.unwrap(), 0);
        assert_eq!(client.eval_script("1").await.unwrap(), Value::Null);
        assert!(client.css("a").await.unwrap().is_empty());

        client.set_error_tolerant(false).await.unwrap();
        assert!(client.body().await.is_err());
    }

    #[tokio::test]
    async fn test_error_tolerance_survives_server_hang_up() {
        use tokio::io::BufReader;
        use tokio::net::TcpListener;

        use crate::protocol::{read_command, write_response};
        use crate::transport::mock::fast_waits;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hang_up = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let command = read_command(&mut reader).await.unwrap().unwrap();
            assert_eq!(command.verb, "SetErrorTolerance");
            write_response(&mut write_half, &Ok(String::new())).await.unwrap();
        });

        let client = Client::builder()
            .server(Arc::new(Server::attach(port)))
            .no_user_agent()
            .wait_options(fast_waits())
            .build()
            .await
            .unwrap();
        client.set_error_tolerant(true).await.unwrap();
        hang_up.await.unwrap();

        assert_eq!(client.body().await.unwrap(), "");
        assert_eq!(client.body().await.unwrap(), "");
        assert_eq!(client.status_code().await.unwrap(), 0);
        assert!(client.css("a").await.unwrap().is_empty());

        client.set_error_tolerant(false).await.unwrap();
        assert!(matches!(client.body().await, Err(Error::Connection { .. })));
    }

    #[tokio::test]
    async fn test_headers_scenario() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "Headers" => Ok("Content-Type: text/html\nSet-Cookie: a=b; x=y".into()),
            _ => Ok(String::new()),
        })
        .await;
        let client = server.client().await;

        let headers = client.headers().await.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Content-Type"], "text/html");
        assert_eq!(headers["Set-Cookie"], "a=b; x=y");
    }

    #[tokio::test]
    async fn test_status_and_eval() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "Status" => Ok("404".into()),
            "Evaluate" => Ok(r#"{"a":[1,2]}"#.into()),
            _ => Ok(String::new()),
        })
        .await;
        let client = server.client().await;

        assert_eq!(client.status_code().await.unwrap(), 404);
        assert_eq!(
            client.eval_script("x").await.unwrap(),
            serde_json::json!({"a": [1, 2]})
        );
    }

    #[tokio::test]
    async fn test_cookies_round_trip_commands() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "GetCookies" => Ok("a=1; path=/\n\nb=2; path=/\n".into()),
            _ => Ok(String::new()),
        })
        .await;
        let client = server.client().await;

        client.set_cookie("a=1; path=/").await.unwrap();
        client.clear_cookies().await.unwrap();
        assert_eq!(client.cookies().await.unwrap(), ["a=1; path=/", "b=2; path=/"]);
        assert_eq!(server.count("SetCookie", "a=1; path=/"), 1);
    }

    #[tokio::test]
    async fn test_render_default_size() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let client = server.client().await;

        client.render("/tmp/page.png").await.unwrap();

        let render = server.commands().pop().unwrap();
        assert_eq!(render.verb, "Render");
        assert_eq!(render.args, ["/tmp/page.png", "1024", "1024"]);
    }

    #[tokio::test]
    async fn test_set_proxy_sends_credentials() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let client = server.client().await;

        let proxy = ProxyConfig::new("10.0.0.1", 3128).with_credentials("u", "p");
        client.set_proxy(&proxy).await.unwrap();
        client.set_proxy(&ProxyConfig::default()).await.unwrap();
        client.clear_proxy().await.unwrap();

        let commands = server.commands();
        assert_eq!(commands[0].args, ["10.0.0.1", "3128", "u", "p"]);
        assert_eq!(commands[1].args, ["localhost", "0", "", ""]);
        assert_eq!(commands[2].verb, "ClearProxy");
    }

    #[tokio::test]
    async fn test_custom_node_factory() {
        let server = FakeServer::start(|_| Ok("1,2".into())).await;
        let client = Client::builder()
            .server(Arc::new(Server::attach(server.port())))
            .no_user_agent()
            .node_factory(|client: &Client, id: NodeId| Node::new(client.clone(), id).with_label("row"))
            .build()
            .await
            .unwrap();

        let nodes = client.css("tr").await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.label() == Some("row")));
    }

    #[tokio::test]
    async fn test_close_rejects_later_commands() {
        let server = FakeServer::start(|_| Ok(String::new())).await;
        let client = server.client().await;
        let other = client.clone();

        client.close().await.unwrap();
        client.close().await.unwrap();

        assert!(matches!(other.body().await, Err(Error::Connection { .. })));
    }

    #[tokio::test]
    async fn test_clones_share_one_ordered_connection() {
        let server = FakeServer::start(|cmd| Ok(cmd.args.first().cloned().unwrap_or_default())).await;
        let client = server.client().await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                let key = format!("k{i}");
                let echoed = client.issue(Command::header(&key, "v")).await.unwrap();
                assert_eq!(echoed, key);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(server.commands().len(), 8);
    }

    #[tokio::test]
    async fn test_wait_for_page_load_uses_wait_verb() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "Wait" => Err("Page failed to load".into()),
            _ => Ok(String::new()),
        })
        .await;
        let client = server.client().await;

        let err = client.wait_for_page_load().await.unwrap_err();
        assert!(err.is_invalid_response());
    }
}
