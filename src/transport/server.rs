//! Automation server process management.
//!
//! A [`Server`] is one `webkit_server` process listening on an ephemeral
//! localhost port. The port is discovered from the first line the process
//! prints on stdout.
//!
//! # Startup Flow
//!
//! 1. Spawn `<binary> --ignore-ssl-errors [extra args]` with piped stdio
//! 2. Read the first stdout line (bounded by the startup timeout)
//! 3. Extract the port from `port: <digits>`, or fail with [`Error::NoX11`]
//! 4. Forward the rest of stdout/stderr to `trace!` in background tasks
//! 5. Hand out any number of [`Connection`]s via [`Server::connect`]
//!
//! The process is killed when the [`Server`] is dropped, or explicitly via
//! [`Server::kill`].
//!
//! # Default Server
//!
//! [`Server::default_instance`] shares one process between every client
//! that does not bring its own. The registry keeps only a weak reference,
//! so the process dies with the last [`Client`](crate::Client) using it,
//! including when `main` returns. A later call starts a fresh process.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::Stdio;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::browser::wait::saturating_millis;
use crate::driver::ServerOptions;
use crate::error::{Error, Result};

use super::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Host every server listens on.
const SERVER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Banner pattern announcing the listening port.
const PORT_PATTERN: &str = r"port: (\d+)";

/// Process-wide default server, started on first demand.
///
/// Holds no strong reference; clients keep the process alive.
static DEFAULT_SERVER: AsyncMutex<Weak<Server>> = AsyncMutex::const_new(Weak::new());

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a child process and ensures it is killed when dropped.
struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    /// Creates a new process guard.
    fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Takes the child out, leaving the guard empty.
    fn take(&mut self) -> Option<Child> {
        self.child.take()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// Handle to an automation server.
///
/// Either owns the process (see [`Server::start`]) or merely points at a
/// server someone else manages (see [`Server::attach`]).
///
/// # Example
///
/// ```no_run
/// use webkit_driver::{Server, ServerOptions};
///
/// # async fn example() -> webkit_driver::Result<()> {
/// let server = Server::start(ServerOptions::new().with_binary("/opt/webkit_server")).await?;
/// let connection = server.connect().await?;
/// server.kill().await;
/// # Ok(())
/// # }
/// ```
pub struct Server {
    /// Listening port on localhost.
    port: u16,
    /// Process ID, if the process is owned.
    pid: Option<u32>,
    /// Owned process, `None` when attached.
    process: Mutex<Option<ProcessGuard>>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("port", &self.port)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Server - Constructors
// ============================================================================

impl Server {
    /// Spawns a server process and waits for its port banner.
    ///
    /// # Errors
    ///
    /// - [`Error::ServerNotFound`] if an explicit binary path does not exist
    /// - [`Error::ProcessLaunchFailed`] if the process cannot be spawned
    /// - [`Error::NoX11`] if the first stdout line carries no port, or none
    ///   arrives within the startup timeout
    pub async fn start(options: ServerOptions) -> Result<Self> {
        options.validate()?;

        let mut cmd = Command::new(&options.binary);
        cmd.args(options.to_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(Error::process_launch_failed)?;
        let pid = child.id();
        debug!(?pid, binary = %options.binary.display(), "Server process spawned");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::protocol("server stdout was not captured"))?;
        let stderr = child.stderr.take();
        let guard = ProcessGuard::new(child);

        let mut stdout = BufReader::new(stdout);
        let banner = match timeout(options.startup_timeout, read_banner(&mut stdout)).await {
            Ok(line) => line?,
            Err(_) => {
                let timeout_ms = saturating_millis(options.startup_timeout);
                warn!(?pid, timeout_ms, "No banner from server");
                return Err(Error::no_x11(format!(
                    "no port announced within {timeout_ms}ms"
                )));
            }
        };

        let port = parse_port(&banner)?;

        spawn_drain(stdout, "stdout");
        if let Some(stderr) = stderr {
            spawn_drain(BufReader::new(stderr), "stderr");
        }

        info!(?pid, port, "Server started");

        Ok(Self {
            port,
            pid,
            process: Mutex::new(Some(guard)),
        })
    }

    /// Points at a server that is already listening on `port`.
    ///
    /// The returned handle does not own a process; [`kill`](Self::kill)
    /// is a no-op.
    #[must_use]
    pub fn attach(port: u16) -> Self {
        Self {
            port,
            pid: None,
            process: Mutex::new(None),
        }
    }

    /// Returns the process-wide default server, starting it on demand.
    ///
    /// Concurrent callers share one process. The process is killed when
    /// the last handle returned here is dropped; the next call after that,
    /// or after [`shutdown_default`](Self::shutdown_default), starts a new
    /// one.
    pub async fn default_instance() -> Result<Arc<Self>> {
        shared(&DEFAULT_SERVER, ServerOptions::default()).await
    }

    /// Kills the default server if one is alive.
    ///
    /// Clients still holding it get connection errors from then on.
    pub async fn shutdown_default() {
        let server = DEFAULT_SERVER.lock().await.upgrade();
        if let Some(server) = server {
            server.kill().await;
        }
    }
}

// ============================================================================
// Server - Public API
// ============================================================================

impl Server {
    /// Returns the listening port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the process ID, if this handle owns the process.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Returns the socket address of the server.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(SERVER_HOST, self.port)
    }

    /// Returns `true` while an owned process has not been killed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.process.lock().as_ref().is_some_and(|g| g.child.is_some())
    }

    /// Opens a new, independent connection to the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the socket cannot be opened.
    pub async fn connect(&self) -> Result<Connection> {
        Connection::connect(self.addr()).await
    }

    /// Kills the process and waits for it to exit.
    ///
    /// Idempotent; a no-op for attached servers.
    pub async fn kill(&self) {
        let child = self.process.lock().as_mut().and_then(ProcessGuard::take);

        if let Some(mut child) = child {
            debug!(pid = ?self.pid, "Killing server process");
            if let Err(e) = child.kill().await {
                debug!(pid = ?self.pid, error = %e, "Failed to kill process");
            }
            if let Err(e) = child.wait().await {
                debug!(pid = ?self.pid, error = %e, "Failed to wait for process");
            }
            info!(pid = ?self.pid, "Server terminated");
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the live server registered in `slot`, or starts and registers one.
async fn shared(slot: &AsyncMutex<Weak<Server>>, options: ServerOptions) -> Result<Arc<Server>> {
    let mut current = slot.lock().await;
    if let Some(server) = current.upgrade()
        && server.is_running()
    {
        return Ok(server);
    }

    debug!("Starting shared server");
    let server = Arc::new(Server::start(options).await?);
    *current = Arc::downgrade(&server);
    Ok(server)
}

/// Reads the first stdout line.
async fn read_banner<R>(stdout: &mut BufReader<R>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    let read = stdout.read_line(&mut line).await?;
    if read == 0 {
        return Err(Error::no_x11("server exited before announcing a port"));
    }
    Ok(line)
}

/// Extracts the port from the startup banner.
fn parse_port(banner: &str) -> Result<u16> {
    let pattern = Regex::new(PORT_PATTERN).map_err(|e| Error::config(e.to_string()))?;

    pattern
        .captures(banner)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| {
            Error::no_x11(format!(
                "unexpected banner {:?}; try running under xvfb-run",
                banner.trim_end()
            ))
        })
}

/// Forwards a server output stream to the log until it closes.
fn spawn_drain<R>(reader: BufReader<R>, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(stream, %line, "webkit_server output");
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
