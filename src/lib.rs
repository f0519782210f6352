//! Space Dodger - an arcade survival game core
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (entities, boss attacks, collisions, game state)
//! - `game`: Session handle wiring the simulation to its collaborators
//! - `driver`: Owned frame loop with delta-time clamping
//! - `achievements`: Achievement catalog and unlock rules
//! - `leaderboard`: Remote leaderboard service and background dispatch
//! - `persistence`: High score, metrics and achievement storage
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance
//! - `view`: Serializable frame snapshot for drawing
//! - `web`: Browser entry point (wasm32 only)

pub mod achievements;
pub mod driver;
pub mod game;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod view;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use game::{Game, GameOverSummary};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (pixels)
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 700.0;

    /// Speeds are expressed in pixels per frame at this reference rate
    pub const NOMINAL_FPS: f32 = 60.0;

    /// Largest delta time a single frame may advance (30 FPS)
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

    /// Number of background stars
    pub const STAR_COUNT: usize = 100;
}

/// Scale a per-nominal-frame quantity by the real frame duration
#[inline]
pub fn per_frame(value: f32, dt: f32) -> f32 {
    value * dt * consts::NOMINAL_FPS
}

/// Clamp a raw frame delta to a usable slice.
///
/// Returns `None` for zero, negative or non-finite deltas (the frame should be
/// skipped), otherwise the delta capped at [`consts::MAX_FRAME_DT`].
#[inline]
pub fn clamp_frame_dt(dt: f32) -> Option<f32> {
    if !dt.is_finite() || dt <= 0.0 {
        return None;
    }
    Some(dt.min(consts::MAX_FRAME_DT))
}
