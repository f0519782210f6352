//! Player settings and preferences
//!
//! Persisted separately from lifetime data and kept across a data reset.

use serde::{Deserialize, Serialize};

/// Default number of leaderboard rows fetched
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 100;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Visual Effects ===
    /// Screen shake on hits
    pub screen_shake: bool,
    /// Flash on level up
    pub level_flash: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses shake and flashes)
    pub reduced_motion: bool,

    // === Leaderboard ===
    /// Base URL of the remote leaderboard, `None` to stay offline
    pub leaderboard_url: Option<String>,
    /// Rows requested when the leaderboard is shown
    pub leaderboard_limit: usize,
    /// Submit finished games to the leaderboard
    pub submit_scores: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_shake: true,
            level_flash: true,
            reduced_motion: false,
            leaderboard_url: None,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            submit_scores: true,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective level flash (respects reduced_motion)
    pub fn effective_level_flash(&self) -> bool {
        self.level_flash && !self.reduced_motion
    }

    /// Leaderboard limit clamped to a sane range
    pub fn effective_leaderboard_limit(&self) -> usize {
        self.leaderboard_limit.clamp(1, DEFAULT_LEADERBOARD_LIMIT)
    }
}
