//! Leaderboard fetched over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use angler_core::{AnglerError, LeaderboardEntry, LeaderboardSource};

#[derive(Debug, Deserialize)]
struct Board {
    #[serde(default)]
    players: Vec<LeaderboardEntry>,
}

/// Parse a `{ "players": [...] }` document.
pub fn parse_board(body: &str) -> Result<Vec<LeaderboardEntry>, AnglerError> {
    let board: Board =
        serde_json::from_str(body).map_err(|e| AnglerError::Leaderboard(e.to_string()))?;
    Ok(board.players)
}

pub struct HttpLeaderboard {
    url: String,
    client: reqwest::Client,
}

impl HttpLeaderboard {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AnglerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnglerError::Leaderboard(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl LeaderboardSource for HttpLeaderboard {
    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, AnglerError> {
        let leaderboard_err = |e: reqwest::Error| AnglerError::Leaderboard(e.to_string());
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(leaderboard_err)?
            .text()
            .await
            .map_err(leaderboard_err)?;
        parse_board(&body)
    }
}
