//! Remote leaderboard
//!
//! The game talks to a [`LeaderboardService`] only through the
//! [`LeaderboardDispatcher`], which keeps network latency off the frame loop.
//! Services:
//! - [`InMemoryLeaderboard`]: local ranking with the backend's rules
//! - `HttpLeaderboard`: blocking HTTP client (`http-leaderboard` feature)
//! - [`OfflineLeaderboard`]: always unavailable

pub mod dispatch;
#[cfg(feature = "http-leaderboard")]
pub mod http;
pub mod memory;

pub use dispatch::{
    DispatchMode, Epochs, LeaderboardDispatcher, LeaderboardReply, LeaderboardRequest,
    LeaderboardResponse,
};
#[cfg(feature = "http-leaderboard")]
pub use http::HttpLeaderboard;
pub use memory::InMemoryLeaderboard;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest score the service accepts
pub const MAX_SCORE: u64 = 10_000_000;
/// Highest level the service accepts
pub const MAX_LEVEL: u32 = 10_000;

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub score: u64,
    pub level: u32,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// 1-based global rank of the submitted score
    pub rank: u32,
}

/// A player's best entry and its rank
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBest {
    pub entry: LeaderboardEntry,
    pub rank: u32,
}

/// Leaderboard failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeaderboardError {
    /// Service unreachable or failed
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
    /// Service refused the request
    #[error("leaderboard rejected request: {0}")]
    Rejected(String),
    /// Response could not be understood
    #[error("malformed leaderboard response: {0}")]
    Malformed(String),
}

/// Leaderboard backend
pub trait LeaderboardService {
    fn submit_score(
        &mut self,
        player_name: &str,
        score: u64,
        level: u32,
    ) -> Result<SubmitOutcome, LeaderboardError>;

    /// Top `limit` entries, best first
    fn get_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;

    fn get_player_best(&mut self, player_name: &str) -> Result<Option<PlayerBest>, LeaderboardError>;

    /// Whether the service is reachable
    fn health(&mut self) -> bool {
        true
    }
}

impl<S: LeaderboardService + ?Sized> LeaderboardService for Box<S> {
    fn submit_score(
        &mut self,
        player_name: &str,
        score: u64,
        level: u32,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        (**self).submit_score(player_name, score, level)
    }

    fn get_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        (**self).get_leaderboard(limit)
    }

    fn get_player_best(&mut self, player_name: &str) -> Result<Option<PlayerBest>, LeaderboardError> {
        (**self).get_player_best(player_name)
    }

    fn health(&mut self) -> bool {
        (**self).health()
    }
}

/// Service used when no leaderboard is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLeaderboard;

impl LeaderboardService for OfflineLeaderboard {
    fn submit_score(&mut self, _: &str, _: u64, _: u32) -> Result<SubmitOutcome, LeaderboardError> {
        Err(LeaderboardError::Unavailable("offline".into()))
    }

    fn get_leaderboard(&mut self, _: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Err(LeaderboardError::Unavailable("offline".into()))
    }

    fn get_player_best(&mut self, _: &str) -> Result<Option<PlayerBest>, LeaderboardError> {
        Err(LeaderboardError::Unavailable("offline".into()))
    }

    fn health(&mut self) -> bool {
        false
    }
}
