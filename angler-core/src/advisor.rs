//! Boundary to the external decision maker.
//!
//! The engine hands the advisor a snapshot of [`GameState`] and an
//! [`Intent`]; whatever commands come back are written verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnglerError;
use crate::game::GameState;

/// Literal reply meaning "do nothing this cycle".
pub const NO_ACTION_SENTINEL: &str = "no";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Purchase,
    Sale,
    Eat,
    Poison,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Purchase => write!(f, "purchase"),
            Intent::Sale => write!(f, "sale"),
            Intent::Eat => write!(f, "eat"),
            Intent::Poison => write!(f, "poison"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    /// Commands to write, in order.
    Commands(Vec<String>),
    NoAction,
}

impl Advice {
    /// Interpret a free-text reply: the sentinel or a blank reply means
    /// no action, otherwise one command per non-empty line.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.is_empty() || reply.eq_ignore_ascii_case(NO_ACTION_SENTINEL) {
            return Advice::NoAction;
        }
        let commands: Vec<String> = reply
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Advice::Commands(commands)
    }

    pub fn commands(&self) -> &[String] {
        match self {
            Advice::Commands(c) => c,
            Advice::NoAction => &[],
        }
    }

    pub fn is_no_action(&self) -> bool {
        self.commands().is_empty()
    }
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, snapshot: &GameState, intent: Intent) -> Result<Advice, AnglerError>;
}

/// Advisor that never acts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdvisor;

#[async_trait]
impl Advisor for NoopAdvisor {
    async fn advise(&self, _snapshot: &GameState, _intent: Intent) -> Result<Advice, AnglerError> {
        Ok(Advice::NoAction)
    }
}
