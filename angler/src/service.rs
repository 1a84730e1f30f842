//! Wires config, advisor, session and supervisor together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use angler_core::{
    AnglerError, ConnectionInfo, LeaderboardSource, OperatorInput, ReconnectSupervisor, Session,
    TcpConnector, TokioClock,
};

use crate::config::AnglerConfig;
use crate::leaderboard::HttpLeaderboard;
use crate::rules::RuleAdvisor;

const LEADERBOARD_TIMEOUT: Duration = Duration::from_secs(10);

// ── AnglerService ────────────────────────────────────────────────

/// The top-level client: one session, reconnected forever until stopped.
pub struct AnglerService {
    server: ConnectionInfo,
    supervisor: ReconnectSupervisor,
}

impl AnglerService {
    pub fn new(config: &AnglerConfig) -> Result<Self, AnglerError> {
        let leaderboard: Option<Arc<dyn LeaderboardSource>> =
            if config.advisor.leaderboard_url.is_empty() {
                None
            } else {
                Some(Arc::new(HttpLeaderboard::new(
                    config.advisor.leaderboard_url.clone(),
                    LEADERBOARD_TIMEOUT,
                )?))
            };
        let advisor = Arc::new(RuleAdvisor::new(config, leaderboard));
        let session = Session::new(config.to_session_settings(), advisor, Arc::new(TokioClock));

        let server = ConnectionInfo::new(config.network.host.clone(), config.network.port);
        let connector = Arc::new(TcpConnector::new(
            server.clone(),
            Duration::from_millis(config.network.connect_timeout_ms),
        ));

        Ok(Self {
            server,
            supervisor: ReconnectSupervisor::new(session, connector),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        self.supervisor.session()
    }

    /// Stop after the current connection is closed. Callable from any task.
    pub fn stop_handle(&self) -> impl Fn() + Send + Sync + 'static {
        let token = self.supervisor.shutdown_handle();
        move || token.cancel()
    }

    /// Run until stopped. Operator lines arrive on `operator`.
    pub async fn run(&self, operator: mpsc::Receiver<OperatorInput>) {
        info!(server = %self.server, "angler starting");
        self.supervisor.run(operator).await;
        info!(
            actions = self.session().action_count(),
            "angler stopped"
        );
    }
}
