//! # angler-core
//!
//! Session engine for an automated client of a text-based fishing game
//! played over a raw TCP stream.
//!
//! This crate contains:
//! - **Codec**: `GameCodec`, UTF-8 safe chunk decoding and newline-terminated commands
//! - **Network**: `GameConnection`, a managed transport with reader/writer tasks
//! - **Segmenter**: `EventSegmenter`, raw text to typed `SessionEvent`s
//! - **Report**: inventory and market report parsers
//! - **Game**: `GameState`, the client's model of the player's economy
//! - **Session**: state machine, action loop, report handlers, reconnect supervisor
//! - **Advisor / Leaderboard**: boundaries to external decision makers
//! - **Clock**: injectable time source
//! - **Error**: `AnglerError`, typed `thiserror`-based errors

pub mod advisor;
pub mod clock;
pub mod codec;
pub mod error;
pub mod game;
pub mod leaderboard;
pub mod message;
pub mod network;
pub mod report;
pub mod segmenter;
pub mod session;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use advisor::{Advice, Advisor, Intent, NO_ACTION_SENTINEL, NoopAdvisor};
pub use clock::{Clock, InstantClock, TokioClock};
pub use codec::GameCodec;
pub use error::AnglerError;
pub use game::{FishRecord, GameState, MarketItem, Mode, Rarity};
pub use leaderboard::{LeaderboardEntry, LeaderboardSource, fetch_or_empty};
pub use message::Command;
pub use network::{CommandSender, ConnectionInfo, GameConnection};
pub use report::{InventoryReport, parse_inventory, parse_market};
pub use segmenter::{EventSegmenter, Markers, Segment, SessionEvent};
pub use session::{
    Connector, Link, OperatorInput, ReconnectSupervisor, Session, SessionSettings, TcpConnector,
};
pub use state::{ConnectionStatus, SessionPhase};
