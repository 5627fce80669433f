//! Socket connection to an automation server.
//!
//! A [`Connection`] owns one TCP stream and performs strictly sequential
//! command/response exchanges on it.
//!
//! # Ordering
//!
//! [`Connection::issue_command`] takes `&mut self`, so a second command
//! cannot be written before the previous response has been read in full.
//! Callers sharing a connection between tasks must serialize access
//! themselves; [`Client`](crate::Client) does so with an async mutex.
//!
//! # Poisoning
//!
//! A failure in the middle of a frame leaves the byte stream at an unknown
//! position. After such a failure the connection refuses further commands
//! with [`Error::Connection`] instead of misreading later responses.
//! Server-reported errors ([`Error::InvalidResponse`]) are complete frames
//! and do not poison the connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Command, read_response, write_command};

// ============================================================================
// Connection
// ============================================================================

/// One socket to one automation server.
pub struct Connection {
    /// Buffered read half.
    reader: BufReader<OwnedReadHalf>,
    /// Write half.
    writer: OwnedWriteHalf,
    /// Server address.
    peer: SocketAddr,
    /// Set once the byte stream can no longer be trusted.
    poisoned: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Constructors
// ============================================================================

impl Connection {
    /// Opens a connection to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the socket cannot be opened.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::connection(format!("{addr}: {e}")))?;

        debug!(%addr, "Connected to server");
        Self::from_stream(stream)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            poisoned: false,
        })
    }
}

// ============================================================================
// Connection - Public API
// ============================================================================

impl Connection {
    /// Returns the server address.
    #[inline]
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Returns `true` if a framing failure made the connection unusable.
    #[inline]
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Sends a command and reads its response payload.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidResponse`] with the server's message for a non-`ok` status
    /// - [`Error::NoResponse`] / [`Error::EndOfStream`] if the server hung up
    /// - [`Error::Connection`] if the connection was poisoned earlier
    pub async fn issue_command(&mut self, command: &Command) -> Result<String> {
        if self.poisoned {
            return Err(Error::connection(format!(
                "connection to {} is broken, cannot send {}",
                self.peer, command.verb
            )));
        }

        trace!(verb = %command.verb, argc = command.args.len(), "Issuing command");

        let result = match write_command(&mut self.writer, command).await {
            Ok(()) => read_response(&mut self.reader).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(payload) => {
                trace!(verb = %command.verb, len = payload.len(), "Command succeeded");
            }
            Err(Error::InvalidResponse { message }) => {
                debug!(verb = %command.verb, %message, "Server reported error");
            }
            Err(e) => {
                warn!(verb = %command.verb, error = %e, "Connection failed mid-command");
                self.poisoned = true;
            }
        }

        result
    }

    /// Closes the write side of the socket.
    ///
    /// The server sees end-of-stream and drops the session.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.poisoned = true;
        self.writer.shutdown().await?;
        debug!(peer = %self.peer, "Connection shut down");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use crate::protocol::Verb;
    use crate::transport::mock::FakeServer;

    #[tokio::test]
    async fn test_issue_command_ok() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "CurrentUrl" => Ok("http://example.com/".to_string()),
            _ => Ok(String::new()),
        })
        .await;

        let mut conn = Connection::connect(server.addr()).await.unwrap();
        let payload = conn.issue_command(&Command::new(Verb::CurrentUrl)).await.unwrap();

        assert_eq!(payload, "http://example.com/");
        assert_eq!(server.commands()[0].verb, "CurrentUrl");
    }

    #[tokio::test]
    async fn test_server_error_keeps_connection_usable() {
        let server = FakeServer::start(|cmd| match cmd.verb.as_str() {
            "Visit" => Err("Unable to load URL".to_string()),
            _ => Ok("ok body".to_string()),
        })
        .await;

        let mut conn = Connection::connect(server.addr()).await.unwrap();
        let err = conn
            .issue_command(&Command::visit("http://nowhere.invalid"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidResponse { ref message } if message == "Unable to load URL"));
        assert!(!conn.is_poisoned());

        let body = conn.issue_command(&Command::new(Verb::Body)).await.unwrap();
        assert_eq!(body, "ok body");
    }

    #[tokio::test]
    async fn test_commands_are_sequential() {
        let server = FakeServer::start(|cmd| Ok(cmd.args.join("|"))).await;
        let mut conn = Connection::connect(server.addr()).await.unwrap();

        for i in 0..5 {
            let payload = conn
                .issue_command(&Command::execute(&format!("step {i}")))
                .await
                .unwrap();
            assert_eq!(payload, format!("step {i}"));
        }

        assert_eq!(server.commands().len(), 5);
    }

    #[tokio::test]
    async fn test_hangup_is_no_response_and_poisons() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut conn = Connection::connect(addr).await.unwrap();
        let err = conn.issue_command(&Command::new(Verb::Body)).await.unwrap_err();

        assert!(err.is_connection_error());
        assert!(conn.is_poisoned());

        let err = conn.issue_command(&Command::new(Verb::Body)).await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_end_of_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;
            stream.write_all(b"ok\n100\npartial").await.unwrap();
        });

        let mut conn = Connection::connect(addr).await.unwrap();
        let err = conn.issue_command(&Command::new(Verb::Body)).await.unwrap_err();
        assert!(matches!(err, Error::EndOfStream));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Connection::connect(addr).await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }
}
