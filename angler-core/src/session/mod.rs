//! The session engine.
//!
//! A [`Session`] is the single context object every component works
//! against: connection status, per-connection flags, cooldown, game
//! state and the outbound [`Link`] all live here and are reached through
//! an `Arc<Session>` rather than globals.
//!
//! - `machine`: reacts to segmented server events and operator input
//! - `action_loop`: the self-paced `/fish` driver
//! - `handlers`: inventory and market report handling
//! - `supervisor`: connect / reconnect lifecycle

mod action_loop;
mod handlers;
mod machine;
pub mod supervisor;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::advisor::Advisor;
use crate::clock::Clock;
use crate::error::AnglerError;
use crate::game::{GameState, Mode};
use crate::message::Command;
use crate::network::CommandSender;
use crate::segmenter::{EventSegmenter, Markers};
use crate::state::{ConnectionStatus, SessionPhase};

pub use supervisor::{Connector, ReconnectSupervisor, TcpConnector};

// ── SessionSettings ──────────────────────────────────────────────

/// Tunables for one session. Built from the binary's config file.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub invite_code: String,
    pub markers: Markers,
    /// Primary actions per burst.
    pub burst_size: u32,
    /// Pause after every primary action.
    pub action_delay: Duration,
    /// Inter-burst pause until the server announces one.
    pub default_cooldown: Duration,
    /// Request an inventory report every this many actions.
    pub inventory_every: u64,
    /// Request a market report every this many actions.
    pub market_every: u64,
    /// Pause between follow-up commands (eat, sell, advisor output).
    pub command_delay: Duration,
    /// Longest wait for one advisor decision before treating it as no action.
    pub advisor_timeout: Duration,
    /// How often the running loop logs its progress.
    pub status_interval: Duration,
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
    pub mode: Mode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            invite_code: String::new(),
            markers: Markers::default(),
            burst_size: 3,
            action_delay: Duration::from_millis(1000),
            default_cooldown: Duration::from_millis(30_000),
            inventory_every: 30,
            market_every: 45,
            command_delay: Duration::from_millis(500),
            advisor_timeout: Duration::from_secs(30),
            status_interval: Duration::from_secs(5 * 60),
            reconnect_min: Duration::from_secs(31),
            reconnect_max: Duration::from_secs(45),
            mode: Mode::Selling,
        }
    }
}

// ── Link ─────────────────────────────────────────────────────────

/// Outbound half of one connection, cloned into every task that writes.
///
/// Severing a link tells the supervisor the connection is dead; a
/// severed link refuses further sends.
#[derive(Debug, Clone)]
pub struct Link {
    generation: u64,
    tx: CommandSender,
    token: CancellationToken,
}

impl Link {
    pub fn new(generation: u64, tx: CommandSender) -> Self {
        Self {
            generation,
            tx,
            token: CancellationToken::new(),
        }
    }

    pub async fn send(&self, command: Command) -> Result<(), AnglerError> {
        if self.token.is_cancelled() {
            return Err(AnglerError::ChannelClosed);
        }
        self.tx.send(command).await?;
        Ok(())
    }

    pub fn sever(&self) {
        self.token.cancel();
    }

    pub fn is_severed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ── OperatorInput ────────────────────────────────────────────────

/// A line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    StartLoop,
    StopLoop,
    Forward(String),
}

impl OperatorInput {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "" => None,
            "/fish" => Some(Self::StartLoop),
            "/stop" => Some(Self::StopLoop),
            other => Some(Self::Forward(other.to_string())),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────

pub struct Session {
    settings: SessionSettings,
    advisor: Arc<dyn Advisor>,
    clock: Arc<dyn Clock>,

    status: Mutex<ConnectionStatus>,
    phase: Mutex<SessionPhase>,
    link: Mutex<Option<Link>>,
    next_generation: AtomicU64,
    /// Set once the invitation code has been sent on any connection.
    authenticated: AtomicBool,

    segmenter: Mutex<EventSegmenter>,
    cooldown_ms: AtomicU64,
    game: Mutex<GameState>,

    loop_active: AtomicBool,
    loop_epoch: AtomicU64,
    action_count: AtomicU64,
    inventory_in_progress: AtomicBool,
    skip_sent: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("status", &*lock(&self.status))
            .field("phase", &*lock(&self.phase))
            .field("cooldown_ms", &self.cooldown_ms.load(Ordering::SeqCst))
            .field("loop_active", &self.loop_active.load(Ordering::SeqCst))
            .field("action_count", &self.action_count.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        settings: SessionSettings,
        advisor: Arc<dyn Advisor>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let cooldown_ms = u64::try_from(settings.default_cooldown.as_millis()).unwrap_or(u64::MAX);
        let segmenter = EventSegmenter::new(settings.markers.clone());
        let game = GameState::new(settings.mode);
        Arc::new(Self {
            settings,
            advisor,
            clock,
            status: Mutex::new(ConnectionStatus::default()),
            phase: Mutex::new(SessionPhase::default()),
            link: Mutex::new(None),
            next_generation: AtomicU64::new(1),
            authenticated: AtomicBool::new(false),
            segmenter: Mutex::new(segmenter),
            cooldown_ms: AtomicU64::new(cooldown_ms),
            game: Mutex::new(game),
            loop_active: AtomicBool::new(false),
            loop_epoch: AtomicU64::new(0),
            action_count: AtomicU64::new(0),
            inventory_in_progress: AtomicBool::new(false),
            skip_sent: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ── Status ───────────────────────────────────────────────────

    pub fn status(&self) -> ConnectionStatus {
        lock(&self.status).clone()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.status).is_connected()
    }

    pub fn phase(&self) -> SessionPhase {
        *lock(&self.phase)
    }

    /// The current connection's link, if any.
    pub fn link(&self) -> Option<Link> {
        lock(&self.link).clone()
    }

    // ── Cooldown ─────────────────────────────────────────────────

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms.load(Ordering::SeqCst))
    }

    pub fn set_cooldown(&self, millis: u64) {
        self.cooldown_ms.store(millis, Ordering::SeqCst);
    }

    // ── Game state ───────────────────────────────────────────────

    /// Cloned view for readers; may be stale by the time it is used.
    pub fn snapshot(&self) -> GameState {
        lock(&self.game).clone()
    }

    // ── Action loop flags ────────────────────────────────────────

    pub fn is_loop_active(&self) -> bool {
        self.loop_active.load(Ordering::SeqCst)
    }

    pub fn action_count(&self) -> u64 {
        self.action_count.load(Ordering::SeqCst)
    }

    pub fn is_inventory_in_progress(&self) -> bool {
        self.inventory_in_progress.load(Ordering::SeqCst)
    }

    /// Raw buffer contents, for diagnostics.
    pub fn buffered_text(&self) -> String {
        lock(&self.segmenter).buffer().to_string()
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Tear down after a write failure on `link`. No-op for a link that
    /// is no longer current.
    fn lose_link(&self, link: &Link, err: &AnglerError) {
        link.sever();
        let current = lock(&self.link)
            .as_ref()
            .is_some_and(|l| l.generation() == link.generation());
        if current {
            if err.is_transport_fault() {
                tracing::warn!(generation = link.generation(), "connection lost: {err}");
            } else {
                tracing::error!(generation = link.generation(), "write failed: {err}");
            }
            lock(&self.status).force_disconnect();
            self.loop_active.store(false, Ordering::SeqCst);
        }
    }
}

/// Lock a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
