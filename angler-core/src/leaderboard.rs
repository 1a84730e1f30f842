//! Boundary to the external leaderboard.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AnglerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub level: u32,
}

#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    /// Players ordered by rank, best first.
    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, AnglerError>;
}

/// Fetch, treating any failure as an empty board.
pub async fn fetch_or_empty(source: &dyn LeaderboardSource) -> Vec<LeaderboardEntry> {
    match source.fetch().await {
        Ok(mut players) => {
            players.sort_by_key(|p| p.rank);
            players
        }
        Err(e) => {
            warn!("leaderboard unavailable: {e}");
            Vec::new()
        }
    }
}
