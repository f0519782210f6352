//! Drawable snapshot of a game
//!
//! Presentation layers that live outside Rust (the browser page) receive the
//! whole frame as one serializable [`Snapshot`] instead of walking the
//! simulation's types.

use glam::Vec2;
use serde::Serialize;

use crate::game::{Game, LeaderboardView};
use crate::leaderboard::LeaderboardEntry;
use crate::sim::{Attack, GamePhase, ObstacleKind, PowerUpKind, Rect, Warning, WarningKind};

/// Hazard geometry, shared by warnings and live attacks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum HazardView {
    /// Deadly vertical band
    Band { rect: Rect },
    /// Deadly outside `[left, right]`
    Walls { left: f32, right: f32 },
    /// Deadly outside the rectangle
    SafeZone { rect: Rect },
    Circle { center: Vec2, radius: f32 },
}

impl HazardView {
    pub fn of_warning(warning: &Warning) -> Self {
        match warning.kind {
            WarningKind::Spike | WarningKind::Wall => HazardView::Band { rect: warning.rect },
            WarningKind::MovingSafe { .. } => HazardView::SafeZone { rect: warning.rect },
            WarningKind::GiantObstacle { radius } => HazardView::Circle {
                center: warning.rect.pos + Vec2::splat(radius),
                radius,
            },
        }
    }

    /// `None` for attacks without geometry
    pub fn of_attack(attack: &Attack) -> Option<Self> {
        Some(match attack {
            Attack::Spike { rect, .. } => HazardView::Band { rect: *rect },
            Attack::Wall { left, right, .. } => HazardView::Walls {
                left: *left,
                right: *right,
            },
            Attack::MovingSafe { band, .. } => HazardView::SafeZone { rect: *band },
            Attack::GiantObstacle { center, radius, .. } => HazardView::Circle {
                center: *center,
                radius: *radius,
            },
            Attack::DoubleObstacles { .. } => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleView {
    pub kind: ObstacleKind,
    pub rect: Rect,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpView {
    pub kind: PowerUpKind,
    pub rect: Rect,
    pub rotation: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplosionView {
    pub pos: Vec2,
    pub size: f32,
    pub life: f32,
    pub color: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossView {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub score: u64,
    pub level: u32,
    pub high_score: u64,
    pub new_high_score: bool,
    pub perfect_run: bool,
    pub leaderboard_rank: Option<u32>,
}

/// Everything needed to draw one frame and its HUD
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub high_score: u64,
    pub player: Rect,
    pub shield: bool,
    pub invincible: bool,
    pub shake: Vec2,
    pub level_flash: bool,
    pub slow_down: bool,
    pub stars: Vec<Vec2>,
    pub obstacles: Vec<ObstacleView>,
    pub power_ups: Vec<PowerUpView>,
    pub explosions: Vec<ExplosionView>,
    pub boss: Option<BossView>,
    pub warnings: Vec<HazardView>,
    pub attacks: Vec<HazardView>,
    pub summary: Option<SummaryView>,
    /// `None` while the panel is hidden or loading
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
    pub leaderboard_unavailable: bool,
}

impl Snapshot {
    pub fn of(game: &Game) -> Self {
        let state = game.state();
        let (leaderboard, leaderboard_unavailable) = match game.leaderboard_view() {
            LeaderboardView::Entries(entries) => (Some(entries.clone()), false),
            LeaderboardView::Unavailable => (None, true),
            LeaderboardView::Hidden | LeaderboardView::Loading => (None, false),
        };

        Self {
            phase: state.phase,
            score: game.score(),
            lives: game.lives(),
            level: game.level(),
            high_score: game.high_score(),
            player: state.player.rect(),
            shield: state.player.has_shield,
            invincible: state.player.invincible,
            shake: game.shake_offset(),
            level_flash: game.level_flash_active(),
            slow_down: state.effects.slow_down_active,
            stars: state.stars.iter().map(|s| s.pos).collect(),
            obstacles: state
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    kind: o.kind,
                    rect: o.rect,
                })
                .collect(),
            power_ups: state
                .power_ups
                .iter()
                .map(|p| PowerUpView {
                    kind: p.kind,
                    rect: p.rect,
                    rotation: p.rotation,
                })
                .collect(),
            explosions: state
                .explosions
                .iter()
                .map(|e| ExplosionView {
                    pos: e.pos,
                    size: e.size,
                    life: e.life,
                    color: e.color,
                })
                .collect(),
            boss: state.boss.as_ref().map(|b| BossView {
                pos: b.pos,
                radius: b.radius,
            }),
            warnings: state
                .boss_attacks
                .warnings()
                .iter()
                .map(HazardView::of_warning)
                .collect(),
            attacks: state
                .boss_attacks
                .attacks()
                .iter()
                .filter_map(HazardView::of_attack)
                .collect(),
            summary: game.summary().map(|s| SummaryView {
                score: s.score,
                level: s.level,
                high_score: s.high_score,
                new_high_score: s.new_high_score,
                perfect_run: s.perfect_run,
                leaderboard_rank: s.leaderboard_rank,
            }),
            leaderboard,
            leaderboard_unavailable,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
