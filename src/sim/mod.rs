//! Frame-driven simulation module
//!
//! All gameplay logic lives here. This module stays free of platform and
//! storage concerns:
//! - Seeded RNG only
//! - Delta time is clamped before anything moves
//! - Side effects leave as [`FrameEvent`]s for the session owner to handle

pub mod boss_attacks;
pub mod collision;
pub mod state;
pub mod tick;

pub use boss_attacks::{Attack, AttackPattern, BossAttackMachine, Warning, WarningKind};
pub use collision::Rect;
pub use state::{
    ActiveEffects, Boss, Explosion, FrameEvent, GamePhase, GameState, Obstacle, ObstacleKind,
    Player, PowerUp, PowerUpKind, ScreenShake, SessionStats, Star,
};
pub use tick::{TickInput, tick};
