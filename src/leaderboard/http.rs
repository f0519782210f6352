//! Blocking HTTP leaderboard client
//!
//! Endpoints:
//! - `POST /api/scores` with `{playerName, score, level}`
//! - `GET /api/leaderboard?limit=N`
//! - `GET /api/player/{name}`
//! - `GET /health`
//!
//! Calls block, so this service is meant to run on the dispatcher's worker
//! thread.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{LeaderboardEntry, LeaderboardError, LeaderboardService, PlayerBest, SubmitOutcome};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    player_name: &'a str,
    score: u64,
    level: u32,
}

#[derive(Deserialize)]
struct SubmitReply {
    rank: u32,
}

#[derive(Deserialize)]
struct BoardReply {
    #[serde(default)]
    leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Deserialize)]
struct PlayerReply {
    score: Option<LeaderboardEntry>,
    rank: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: Option<String>,
}

/// Leaderboard reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpLeaderboard {
    client: Client,
    base: Url,
}

impl HttpLeaderboard {
    pub fn new(base_url: &str) -> Result<Self, LeaderboardError> {
        let base = Url::parse(base_url)
            .map_err(|e| LeaderboardError::Unavailable(format!("bad base URL: {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LeaderboardError::Unavailable(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Base URL with `segments` appended as path segments
    fn url(&self, segments: &[&str]) -> Result<Url, LeaderboardError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LeaderboardError::Unavailable("base URL cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, LeaderboardError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .map_err(|e| LeaderboardError::Malformed(e.to_string()));
        }
        let message = response
            .json::<ErrorReply>()
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| status.to_string());
        if status == StatusCode::BAD_REQUEST {
            Err(LeaderboardError::Rejected(message))
        } else {
            Err(LeaderboardError::Unavailable(message))
        }
    }
}

fn transport(e: reqwest::Error) -> LeaderboardError {
    LeaderboardError::Unavailable(e.to_string())
}

impl LeaderboardService for HttpLeaderboard {
    fn submit_score(
        &mut self,
        player_name: &str,
        score: u64,
        level: u32,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        let body = SubmitBody {
            player_name: player_name.trim(),
            score,
            level,
        };
        let response = self
            .client
            .post(self.url(&["api", "scores"])?)
            .json(&body)
            .send()
            .map_err(transport)?;
        let reply: SubmitReply = Self::decode(response)?;
        Ok(SubmitOutcome { rank: reply.rank })
    }

    fn get_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let response = self
            .client
            .get(self.url(&["api", "leaderboard"])?)
            .query(&[("limit", limit)])
            .send()
            .map_err(transport)?;
        let reply: BoardReply = Self::decode(response)?;
        Ok(reply.leaderboard)
    }

    fn get_player_best(&mut self, player_name: &str) -> Result<Option<PlayerBest>, LeaderboardError> {
        let response = self
            .client
            .get(self.url(&["api", "player", player_name.trim()])?)
            .send()
            .map_err(transport)?;
        let reply: PlayerReply = Self::decode(response)?;
        match (reply.score, reply.rank) {
            (Some(entry), Some(rank)) => Ok(Some(PlayerBest { entry, rank })),
            (Some(_), None) => Err(LeaderboardError::Malformed("score without rank".into())),
            (None, _) => Ok(None),
        }
    }

    fn health(&mut self) -> bool {
        let Ok(url) = self.url(&["health"]) else {
            return false;
        };
        self.client
            .get(url)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
