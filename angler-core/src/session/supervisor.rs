//! Connection lifecycle: connect, pump events, back off, reconnect.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{OperatorInput, Session};
use crate::error::AnglerError;
use crate::network::{ConnectionInfo, GameConnection};

/// Opens a fresh transport for each connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<GameConnection, AnglerError>;
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    info: ConnectionInfo,
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(info: ConnectionInfo, timeout: Duration) -> Self {
        Self { info, timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<GameConnection, AnglerError> {
        info!(server = %self.info, "connecting");
        GameConnection::connect(&self.info, self.timeout).await
    }
}

// ── ReconnectSupervisor ──────────────────────────────────────────

pub struct ReconnectSupervisor {
    session: Arc<Session>,
    connector: Arc<dyn Connector>,
    shutdown: CancellationToken,
}

impl ReconnectSupervisor {
    pub fn new(session: Arc<Session>, connector: Arc<dyn Connector>) -> Self {
        Self {
            session,
            connector,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancelling this token makes [`run`](Self::run) return after the
    /// current connection is closed.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// A uniformly random wait within the configured reconnect window.
    pub fn backoff(&self) -> Duration {
        let settings = self.session.settings();
        let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        let lo = millis(settings.reconnect_min.min(settings.reconnect_max));
        let hi = millis(settings.reconnect_min.max(settings.reconnect_max));
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    /// Connect and reconnect until shut down. Transport faults never end
    /// the loop.
    pub async fn run(&self, mut operator: mpsc::Receiver<OperatorInput>) {
        info!("supervisor started");
        while !self.shutdown.is_cancelled() {
            self.serve_once(&mut operator).await;
            self.session.on_disconnected();
            if self.shutdown.is_cancelled() {
                break;
            }

            let delay = self.backoff();
            info!(?delay, "reconnecting after backoff");
            tokio::select! {
                _ = self.session.clock().sleep(delay) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }
        info!("supervisor stopped");
    }

    /// One connection, from attempt to teardown.
    async fn serve_once(&self, operator: &mut mpsc::Receiver<OperatorInput>) {
        if let Err(e) = self.session.on_connecting() {
            warn!("cannot connect: {e}");
            return;
        }

        let attempt = tokio::select! {
            r = self.connector.connect() => r,
            _ = self.shutdown.cancelled() => return,
        };
        let mut conn = match attempt {
            Ok(conn) => conn,
            Err(e) => {
                warn!("connection failed: {e}");
                return;
            }
        };
        let link = match self.session.on_connected(conn.sender()) {
            Ok(link) => link,
            Err(e) => {
                warn!("{e}");
                return;
            }
        };
        let severed = link.token();

        loop {
            tokio::select! {
                chunk = conn.recv() => match chunk {
                    Some(chunk) => self.session.handle_chunk(&chunk).await,
                    None => {
                        info!("connection closed");
                        break;
                    }
                },
                Some(input) = operator.recv() => self.session.handle_operator(input).await,
                _ = severed.cancelled() => {
                    info!("connection lost");
                    break;
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
        conn.close();
    }
}
