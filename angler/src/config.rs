//! Configuration for the angler client.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use angler_core::{Markers, Mode, SessionSettings};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnglerConfig {
    /// Game server address.
    pub network: NetworkConfig,
    /// Identity and pacing.
    pub session: SessionConfig,
    /// Backoff window after a lost connection.
    pub reconnect: ReconnectConfig,
    /// Texts the server uses to announce prompts and reports.
    pub markers: MarkersConfig,
    /// Rule-based advisor tuning.
    pub advisor: AdvisorConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Invitation code sent when the server asks for it.
    pub invite_code: String,
    /// In-game username; completes the inventory header and locates
    /// the player on the leaderboard.
    pub player: String,
    pub burst_size: u32,
    pub action_delay_ms: u64,
    /// Inter-burst wait used until the server announces one.
    pub cooldown_ms: u64,
    /// Request an inventory report every N actions (0 disables).
    pub inventory_every: u64,
    /// Request a market report every N actions (0 disables).
    pub market_every: u64,
    pub command_delay_ms: u64,
    /// Longest wait for one advisor decision.
    pub advisor_timeout_ms: u64,
    pub status_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub min_secs: u64,
    pub max_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkersConfig {
    pub credential_prompt: String,
    pub skip_animation: String,
    pub market_header: String,
    /// Followed by the player name when `session.player` is set.
    pub inventory_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// "selling" or "buying".
    pub mode: Mode,
    /// No purchases below this much gold.
    pub min_purchase_gold: u64,
    /// Empty disables poisoning.
    pub leaderboard_url: String,
    /// Players never poisoned.
    pub alliance: Vec<String>,
    /// Poison type argument, e.g. "Delay" or "Leveling".
    pub poison_kind: String,
    /// Minimum time before the same player is poisoned again.
    pub poison_cooldown_secs: u64,
    /// Item name → highest acceptable price.
    pub price_caps: BTreeMap<String, u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "game.bloque.app".into(),
            port: 2812,
            connect_timeout_ms: 10_000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            invite_code: String::new(),
            player: String::new(),
            burst_size: 3,
            action_delay_ms: 1000,
            cooldown_ms: 30_000,
            inventory_every: 30,
            market_every: 45,
            command_delay_ms: 500,
            advisor_timeout_ms: 30_000,
            status_interval_secs: 300,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_secs: 31,
            max_secs: 45,
        }
    }
}

impl Default for MarkersConfig {
    fn default() -> Self {
        let markers = Markers::default();
        Self {
            credential_prompt: markers.credential_prompt,
            skip_animation: markers.skip_animation,
            market_header: markers.market_header,
            inventory_header: markers.inventory_header,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Selling,
            min_purchase_gold: 15_000,
            leaderboard_url: "https://api-game.bloque.app/game/leaderboard".into(),
            alliance: Vec::new(),
            poison_kind: "Delay".into(),
            poison_cooldown_secs: 600,
            price_caps: BTreeMap::from([("Poison of Recovery".to_string(), 70_000)]),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl AnglerConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Convert into the engine's `SessionSettings`.
    pub fn to_session_settings(&self) -> SessionSettings {
        let s = &self.session;
        let inventory_header = if s.player.is_empty() {
            self.markers.inventory_header.clone()
        } else {
            format!("{} {}", self.markers.inventory_header, s.player)
        };
        SessionSettings {
            invite_code: s.invite_code.clone(),
            markers: Markers {
                credential_prompt: self.markers.credential_prompt.clone(),
                skip_animation: self.markers.skip_animation.clone(),
                market_header: self.markers.market_header.clone(),
                inventory_header,
            },
            burst_size: s.burst_size.max(1),
            action_delay: Duration::from_millis(s.action_delay_ms),
            default_cooldown: Duration::from_millis(s.cooldown_ms),
            inventory_every: s.inventory_every,
            market_every: s.market_every,
            command_delay: Duration::from_millis(s.command_delay_ms),
            advisor_timeout: Duration::from_millis(s.advisor_timeout_ms.max(1)),
            status_interval: Duration::from_secs(s.status_interval_secs.max(1)),
            reconnect_min: Duration::from_secs(self.reconnect.min_secs),
            reconnect_max: Duration::from_secs(self.reconnect.max_secs),
            mode: self.advisor.mode,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
