use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::GameCodec;
use crate::error::AnglerError;
use crate::message::Command;

pub type CommandSender = mpsc::Sender<Command>;

/// A connection to the game server.
///
/// Reading and writing happen on two background tasks; callers talk to
/// them through channels. When either side fails the whole connection is
/// torn down: `recv` returns `None` and the channel behind
/// [`GameConnection::sender`] closes.
#[derive(Debug)]
pub struct GameConnection {
    // Channel to send commands to background writer task
    tx: mpsc::Sender<Command>,
    // Channel to receive text chunks from background reader task
    rx: mpsc::Receiver<String>,
    closed: CancellationToken,
}

impl GameConnection {
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut net_writer, mut net_reader) = Framed::new(stream, GameCodec::new()).split();
        let closed = CancellationToken::new();

        // User -> Network
        let (user_tx, mut network_rx) = mpsc::channel::<Command>(100);

        // Network -> User
        let (network_tx, user_rx) = mpsc::channel::<String>(100);

        // Writer task: User -> Network
        let writer_closed = closed.clone();
        tokio::spawn(async move {
            loop {
                let command = tokio::select! {
                    c = network_rx.recv() => c,
                    _ = writer_closed.cancelled() => None,
                };
                let Some(command) = command else { break };
                debug!(%command, "write");
                if let Err(e) = net_writer.send(command).await {
                    warn!("network write error: {e}");
                    break;
                }
            }
            writer_closed.cancel();
        });

        // Reader task: Network -> User
        let reader_closed = closed.clone();
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    r = net_reader.next() => r,
                    _ = reader_closed.cancelled() => None,
                };
                match next {
                    Some(Ok(chunk)) => {
                        if network_tx.send(chunk).await.is_err() {
                            // user_rx was dropped, stop reading
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("network read error: {e}");
                        break;
                    }
                    None => break,
                }
            }
            reader_closed.cancel();
        });

        Self {
            tx: user_tx,
            rx: user_rx,
            closed,
        }
    }

    /// Next inbound text chunk, or `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn sender(&self) -> CommandSender {
        self.tx.clone()
    }

    /// Tear down both background tasks.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub async fn connect(conn_info: &ConnectionInfo, timeout: Duration) -> Result<Self, AnglerError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(conn_info.to_string()))
            .await
            .map_err(|_| AnglerError::Timeout(timeout))??;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl Drop for GameConnection {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
