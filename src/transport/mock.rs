//! In-process fake automation server for tests.
//!
//! Speaks the real wire protocol over a loopback listener. Every received
//! command is recorded and answered by a caller-supplied handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::browser::Client;
use crate::driver::WaitOptions;
use crate::protocol::{Command, read_command, write_response};
use crate::transport::Server;

/// Reply produced by a handler: payload or error message.
pub(crate) type Reply = std::result::Result<String, String>;

/// Fake server bound to an ephemeral localhost port.
pub(crate) struct FakeServer {
    addr: SocketAddr,
    log: Arc<Mutex<Vec<Command>>>,
    accept_task: JoinHandle<()>,
}

impl FakeServer {
    /// Binds and starts serving connections with `handler`.
    pub(crate) async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Command) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let accept_log = Arc::clone(&log);
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = Arc::clone(&accept_log);
                let handler = Arc::clone(&handler);

                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = BufReader::new(read_half);

                    while let Ok(Some(command)) = read_command(&mut reader).await {
                        let reply = handler(&command);
                        log.lock().push(command);
                        if write_response(&mut write_half, &reply).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self {
            addr,
            log,
            accept_task,
        }
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connects a client with short waits and no default header.
    pub(crate) async fn client(&self) -> Client {
        Client::builder()
            .server(Arc::new(Server::attach(self.port())))
            .no_user_agent()
            .wait_options(fast_waits())
            .build()
            .await
            .unwrap()
    }

    /// Every command received so far, in arrival order.
    pub(crate) fn commands(&self) -> Vec<Command> {
        self.log.lock().clone()
    }

    /// Commands with the given verb whose first argument is `first`.
    pub(crate) fn count(&self, verb: &str, first: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|c| c.verb == verb && c.args.first().map(String::as_str) == Some(first))
            .count()
    }
}

/// Wait timing scaled down for tests.
pub(crate) fn fast_waits() -> WaitOptions {
    WaitOptions::new()
        .with_interval(Duration::from_millis(10))
        .with_timeout(Duration::from_millis(200))
        .with_presence_timeout(Duration::from_millis(100))
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}
