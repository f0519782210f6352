//! Persistence of lifetime player data
//!
//! [`Persistence`] wraps a [`KeyValueStore`] and never fails to its caller:
//! missing or unreadable values load as defaults, failed writes are logged
//! and dropped.

pub mod metrics;

pub use metrics::Metrics;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::achievements::AchievementBook;
use crate::platform::KeyValueStore;
use crate::settings::Settings;

/// Storage keys
pub mod keys {
    pub const HIGH_SCORE: &str = "spaceDodgerHighScore";
    pub const METRICS: &str = "spaceDodgerMetrics";
    pub const PLAYER_NAME: &str = "spaceDodgerPlayerName";
    pub const ACHIEVEMENTS: &str = "spaceDodgerAchievements";
    pub const SETTINGS: &str = "spaceDodgerSettings";
}

/// Longest player name accepted
pub const MAX_PLAYER_NAME_LEN: usize = 20;
/// Name used when none has been saved
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// Trim and truncate a player name. Returns `None` if nothing is left.
pub fn sanitize_player_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_PLAYER_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() { None } else { Some(name) }
}

/// Typed, infallible facade over a key-value store
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

impl Persistence {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Raw string value, `None` on a missing key or a storage failure
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            log::warn!("Failed to write {key}: {e}");
        }
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.read(key) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding malformed {key}: {e}");
                T::default()
            }
        }
    }

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write(key, &json),
            Err(e) => log::warn!("Failed to serialize {key}: {e}"),
        }
    }

    pub fn load_high_score(&self) -> u64 {
        self.read(keys::HIGH_SCORE)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn save_high_score(&mut self, score: u64) {
        self.write(keys::HIGH_SCORE, &score.to_string());
    }

    pub fn load_metrics(&self) -> Metrics {
        self.read_json(keys::METRICS)
    }

    pub fn save_metrics(&mut self, metrics: &Metrics) {
        self.write_json(keys::METRICS, metrics);
    }

    pub fn load_achievements(&self) -> AchievementBook {
        self.read_json(keys::ACHIEVEMENTS)
    }

    pub fn save_achievements(&mut self, book: &AchievementBook) {
        self.write_json(keys::ACHIEVEMENTS, book);
    }

    /// Saved player name, or the default if none is stored
    pub fn load_player_name(&self) -> String {
        self.read(keys::PLAYER_NAME)
            .and_then(|raw| sanitize_player_name(&raw))
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string())
    }

    /// Save a sanitized name and return what was stored
    pub fn save_player_name(&mut self, raw: &str) -> String {
        let name = sanitize_player_name(raw).unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());
        self.write(keys::PLAYER_NAME, &name);
        name
    }

    pub fn load_settings(&self) -> Settings {
        self.read_json(keys::SETTINGS)
    }

    pub fn save_settings(&mut self, settings: &Settings) {
        self.write_json(keys::SETTINGS, settings);
    }

    /// Forget every lifetime value. Settings are kept.
    pub fn reset_all(&mut self) {
        for key in [
            keys::HIGH_SCORE,
            keys::METRICS,
            keys::PLAYER_NAME,
            keys::ACHIEVEMENTS,
        ] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to remove {key}: {e}");
            }
        }
        log::info!("Player data reset");
    }
}
