//! Lifetime play metrics

use serde::{Deserialize, Serialize};

/// Aggregates across every finished game. Field names match the stored JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metrics {
    pub total_games_played: u64,
    /// Milliseconds
    pub total_play_time: u64,
    pub average_score: f64,
    pub average_level: f64,
    /// Unix ms at which the current game started
    pub current_game_start_time: i64,
    pub total_score_earned: u64,
}

impl Metrics {
    /// Mark the start of a game
    pub fn begin_game(&mut self, now_ms: i64) {
        self.current_game_start_time = now_ms;
    }

    /// Fold a finished game into the aggregates
    pub fn record_game(&mut self, score: u64, level: u32, now_ms: i64) {
        let duration = now_ms.saturating_sub(self.current_game_start_time).max(0) as u64;
        self.total_games_played += 1;
        self.total_play_time += duration;

        let n = self.total_games_played as f64;
        self.average_score = (self.average_score * (n - 1.0) + score as f64) / n;
        self.average_level = (self.average_level * (n - 1.0) + level as f64) / n;
        self.total_score_earned += score;
    }

    /// Total play time in whole minutes, rounded
    pub fn total_play_minutes(&self) -> u64 {
        (self.total_play_time as f64 / 60_000.0).round() as u64
    }
}
