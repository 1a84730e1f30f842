//! Outbound command vocabulary.
//!
//! Every command the engine writes is a single newline-terminated text
//! line, except the animation-skip keystroke which is sent bare.

use std::fmt;

// ── Command ──────────────────────────────────────────────────────

/// All commands the session engine writes to the game server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    // ── Loop ─────────────────────────────────────────────────────
    /// The primary action.
    Fish,
    /// Request an inventory report.
    Inventory,
    /// Request a market report.
    Market,

    // ── Session ──────────────────────────────────────────────────
    /// Answer to the credential prompt.
    InviteCode(String),
    /// Single keystroke that skips the intro animation.
    SkipAnimation,

    // ── Items ────────────────────────────────────────────────────
    /// Activate an owned item by its identifier.
    Use(String),
    /// Eat `quantity` fish of a base species.
    Eat { name: String, quantity: u32 },
    /// Sell `quantity` fish of a base species.
    Sell { name: String, quantity: u32 },
    /// Buy the market entry at `index`.
    Buy(u32),
    /// Poison another player.
    Poison { target: String, kind: String },

    /// Operator or advisor text forwarded verbatim.
    Raw(String),
}

impl Command {
    /// Encode as the exact text written to the socket.
    pub fn to_wire(&self) -> String {
        match self {
            Command::SkipAnimation => "s".to_string(),
            other => format!("{other}\n"),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Fish => write!(f, "/fish"),
            Command::Inventory => write!(f, "/inventory"),
            Command::Market => write!(f, "/market"),
            Command::InviteCode(code) => write!(f, "{code}"),
            Command::SkipAnimation => write!(f, "s"),
            Command::Use(id) => write!(f, "/use {id}"),
            Command::Eat { name, quantity } => write!(f, "/eat {name} {quantity}"),
            Command::Sell { name, quantity } => write!(f, "/sell {name} {quantity}"),
            Command::Buy(index) => write!(f, "/buy {index}"),
            Command::Poison { target, kind } => write!(f, "/poison {target} {kind}"),
            Command::Raw(text) => write!(f, "{}", text.trim_end_matches(['\r', '\n'])),
        }
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Command::Raw(text.to_string())
    }
}

impl From<String> for Command {
    fn from(text: String) -> Self {
        Command::Raw(text)
    }
}
