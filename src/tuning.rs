//! Data-driven game balance
//!
//! Every gameplay number the simulation reads lives here so a run can be
//! re-balanced from a JSON file without touching code. Missing fields fall
//! back to the shipped defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::CANVAS_WIDTH;

/// Errors produced while loading a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    /// Fraction of the remaining distance to the pointer covered each frame
    pub follow_blend: f32,
    /// Grace window after losing a life (seconds)
    pub invincibility_duration: f32,
    pub initial_lives: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            follow_blend: 0.3,
            invincibility_duration: 1.0,
            initial_lives: 3,
        }
    }
}

/// Ambient falling obstacles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    /// Spawn probability per nominal frame at level 1
    pub spawn_rate: f32,
    /// Fall speed (pixels per nominal frame) at level 1
    pub base_speed: f32,
    pub width: f32,
    pub height: f32,
    /// Probability that a spawned obstacle is an asteroid rather than a block
    pub asteroid_chance: f32,
    /// Random extra speed added on spawn, in `[0, speed_variance)`
    pub speed_variance: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            spawn_rate: 0.05,
            base_speed: 5.0,
            width: 30.0,
            height: 30.0,
            asteroid_chance: 0.7,
            speed_variance: 2.0,
        }
    }
}

/// Score and level progression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub score_per_second: u64,
    /// Seconds per level
    pub level_duration: f32,
    pub spawn_rate_increase: f32,
    pub speed_increase: f32,
    pub max_spawn_rate: f32,
    pub max_speed: f32,
    /// Every n-th level is a boss level
    pub boss_level_interval: u32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            score_per_second: 10,
            level_duration: 10.0,
            spawn_rate_increase: 0.01,
            speed_increase: 1.0,
            max_spawn_rate: 2.0,
            max_speed: 200.0,
            boss_level_interval: 4,
        }
    }
}

/// Boss presence and attack pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Minimum seconds between attacks
    pub attack_cooldown: f32,
    /// Seconds the boss stays before the level resolves
    pub level_duration: f32,
    /// No new attacks are launched after this many seconds
    pub attack_window_end: f32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            x: 400.0,
            y: 100.0,
            radius: 60.0,
            attack_cooldown: 4.0,
            level_duration: 10.0,
            attack_window_end: 8.0,
        }
    }
}

/// Per-pattern boss attack geometry and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossAttackTuning {
    pub warning_duration: f32,
    pub spike_count: u32,
    pub spike_width: f32,
    pub spike_attack_duration: f32,
    pub double_spike_count: u32,
    /// Random spikes keep this far from either canvas edge
    pub double_spike_margin: f32,
    pub wall_target_gap: f32,
    /// Pixels per nominal frame, per wall
    pub wall_collapse_speed: f32,
    pub moving_safe_width: f32,
    pub moving_safe_speed: f32,
    pub giant_radius: f32,
    pub giant_start_y: f32,
    pub giant_fall_speed: f32,
    /// Extra distance below the canvas before a giant obstacle expires
    pub giant_exit_margin: f32,
    pub double_obstacles_duration: f32,
    pub double_obstacles_multiplier: f32,
    /// Seconds after boss start before a scheduled gravity effect fires
    pub gravity_trigger_delay: f32,
    pub gravity_duration: f32,
    pub gravity_speed_multiplier: f32,
}

impl Default for BossAttackTuning {
    fn default() -> Self {
        Self {
            warning_duration: 1.0,
            spike_count: 3,
            spike_width: 20.0,
            spike_attack_duration: 5.0,
            double_spike_count: 5,
            double_spike_margin: 50.0,
            wall_target_gap: 200.0,
            wall_collapse_speed: 1.0,
            moving_safe_width: 400.0,
            moving_safe_speed: 2.0,
            giant_radius: 200.0,
            giant_start_y: -200.0,
            giant_fall_speed: 3.0,
            giant_exit_margin: 100.0,
            double_obstacles_duration: 5.0,
            double_obstacles_multiplier: 2.0,
            gravity_trigger_delay: 5.0,
            gravity_duration: 3.0,
            gravity_speed_multiplier: 5.0,
        }
    }
}

/// Power-up drops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// Spawn probability per nominal frame
    pub spawn_rate: f32,
    pub width: f32,
    pub height: f32,
    pub fall_speed: f32,
    /// Radians per second
    pub rotation_speed: f32,
    pub shield_duration: f32,
    pub slow_down_duration: f32,
    /// Fraction of obstacle speed removed while slow-down is active
    pub slow_down_reduction: f32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            spawn_rate: 0.0005,
            width: 25.0,
            height: 25.0,
            fall_speed: 1.5,
            rotation_speed: 2.0,
            shield_duration: 10.0,
            slow_down_duration: 10.0,
            slow_down_reduction: 0.2,
        }
    }
}

/// Cosmetic effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsTuning {
    pub explosion_initial_size: f32,
    /// Explosion life in nominal frames
    pub explosion_life: f32,
    pub explosion_growth_rate: f32,
    /// 0xRRGGBB
    pub explosion_color: u32,
    pub screen_shake_intensity: f32,
    pub screen_shake_duration: f32,
    pub level_flash_duration: f32,
    pub star_min_speed: f32,
    pub star_max_speed: f32,
}

impl Default for EffectsTuning {
    fn default() -> Self {
        Self {
            explosion_initial_size: 20.0,
            explosion_life: 15.0,
            explosion_growth_rate: 0.5,
            explosion_color: 0xff0000,
            screen_shake_intensity: 10.0,
            screen_shake_duration: 0.3,
            level_flash_duration: 0.1,
            star_min_speed: 0.5,
            star_max_speed: 2.5,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub obstacle: ObstacleTuning,
    pub progression: ProgressionTuning,
    pub boss: BossTuning,
    pub boss_attacks: BossAttackTuning,
    pub power_ups: PowerUpTuning,
    pub effects: EffectsTuning,
}

impl Tuning {
    /// Parse and validate a tuning table
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let pl = &self.player;
        positive("player.width", pl.width)?;
        positive("player.height", pl.height)?;
        unit("player.follow_blend", pl.follow_blend)?;
        positive("player.invincibility_duration", pl.invincibility_duration)?;
        ensure(pl.initial_lives >= 1, "player.initial_lives must be >= 1")?;

        let o = &self.obstacle;
        non_negative("obstacle.spawn_rate", o.spawn_rate)?;
        non_negative("obstacle.base_speed", o.base_speed)?;
        positive("obstacle.width", o.width)?;
        positive("obstacle.height", o.height)?;
        unit("obstacle.asteroid_chance", o.asteroid_chance)?;
        non_negative("obstacle.speed_variance", o.speed_variance)?;

        let p = &self.progression;
        positive("progression.level_duration", p.level_duration)?;
        ensure(
            p.boss_level_interval >= 1,
            "progression.boss_level_interval must be >= 1",
        )?;
        non_negative("progression.spawn_rate_increase", p.spawn_rate_increase)?;
        non_negative("progression.speed_increase", p.speed_increase)?;
        non_negative("progression.max_spawn_rate", p.max_spawn_rate)?;
        non_negative("progression.max_speed", p.max_speed)?;

        let b = &self.boss;
        ensure(b.x.is_finite() && b.y.is_finite(), "boss position must be finite")?;
        positive("boss.radius", b.radius)?;
        positive("boss.attack_cooldown", b.attack_cooldown)?;
        positive("boss.level_duration", b.level_duration)?;
        non_negative("boss.attack_window_end", b.attack_window_end)?;
        ensure(
            b.attack_window_end <= b.level_duration,
            "boss.attack_window_end cannot exceed boss.level_duration",
        )?;

        let a = &self.boss_attacks;
        positive("boss_attacks.warning_duration", a.warning_duration)?;
        positive("boss_attacks.spike_width", a.spike_width)?;
        positive("boss_attacks.spike_attack_duration", a.spike_attack_duration)?;
        non_negative("boss_attacks.double_spike_margin", a.double_spike_margin)?;
        ensure(
            a.double_spike_margin * 2.0 < CANVAS_WIDTH,
            "boss_attacks.double_spike_margin too large",
        )?;
        ensure(
            a.wall_target_gap.is_finite() && a.wall_target_gap >= pl.width,
            "boss_attacks.wall_target_gap must leave room for the player",
        )?;
        positive("boss_attacks.wall_collapse_speed", a.wall_collapse_speed)?;
        ensure(
            a.moving_safe_width.is_finite() && a.moving_safe_width >= pl.width,
            "boss_attacks.moving_safe_width must fit the player",
        )?;
        positive("boss_attacks.moving_safe_speed", a.moving_safe_speed)?;
        positive("boss_attacks.giant_radius", a.giant_radius)?;
        ensure(
            a.giant_radius * 2.0 <= CANVAS_WIDTH,
            "boss_attacks.giant_radius wider than the canvas",
        )?;
        ensure(a.giant_start_y.is_finite(), "boss_attacks.giant_start_y must be finite")?;
        positive("boss_attacks.giant_fall_speed", a.giant_fall_speed)?;
        non_negative("boss_attacks.giant_exit_margin", a.giant_exit_margin)?;
        positive("boss_attacks.double_obstacles_duration", a.double_obstacles_duration)?;
        non_negative("boss_attacks.double_obstacles_multiplier", a.double_obstacles_multiplier)?;
        non_negative("boss_attacks.gravity_trigger_delay", a.gravity_trigger_delay)?;
        positive("boss_attacks.gravity_duration", a.gravity_duration)?;
        non_negative("boss_attacks.gravity_speed_multiplier", a.gravity_speed_multiplier)?;

        let u = &self.power_ups;
        non_negative("power_ups.spawn_rate", u.spawn_rate)?;
        positive("power_ups.width", u.width)?;
        positive("power_ups.height", u.height)?;
        positive("power_ups.fall_speed", u.fall_speed)?;
        ensure(u.rotation_speed.is_finite(), "power_ups.rotation_speed must be finite")?;
        positive("power_ups.shield_duration", u.shield_duration)?;
        positive("power_ups.slow_down_duration", u.slow_down_duration)?;
        unit("power_ups.slow_down_reduction", u.slow_down_reduction)?;

        let e = &self.effects;
        non_negative("effects.explosion_initial_size", e.explosion_initial_size)?;
        positive("effects.explosion_life", e.explosion_life)?;
        non_negative("effects.explosion_growth_rate", e.explosion_growth_rate)?;
        non_negative("effects.screen_shake_intensity", e.screen_shake_intensity)?;
        non_negative("effects.screen_shake_duration", e.screen_shake_duration)?;
        non_negative("effects.level_flash_duration", e.level_flash_duration)?;
        non_negative("effects.star_min_speed", e.star_min_speed)?;
        non_negative("effects.star_max_speed", e.star_max_speed)?;
        ensure(
            e.star_min_speed <= e.star_max_speed,
            "effects.star_min_speed > effects.star_max_speed",
        )?;
        Ok(())
    }

    /// Level length in whole microseconds (the simulation's time base)
    pub fn level_duration_us(&self) -> u64 {
        secs_to_us(self.progression.level_duration)
    }

    /// Boss level length in whole microseconds
    pub fn boss_duration_us(&self) -> u64 {
        secs_to_us(self.boss.level_duration)
    }
}

fn ensure(ok: bool, msg: &str) -> Result<(), TuningError> {
    if ok {
        Ok(())
    } else {
        Err(TuningError::Invalid(msg.to_string()))
    }
}

fn positive(name: &str, v: f32) -> Result<(), TuningError> {
    ensure(v.is_finite() && v > 0.0, &format!("{name} must be finite and > 0"))
}

fn non_negative(name: &str, v: f32) -> Result<(), TuningError> {
    ensure(v.is_finite() && v >= 0.0, &format!("{name} must be finite and >= 0"))
}

/// Fractions in `[0, 1]`
fn unit(name: &str, v: f32) -> Result<(), TuningError> {
    ensure((0.0..=1.0).contains(&v), &format!("{name} must be within [0, 1]"))
}

/// Convert seconds to whole microseconds, rounding to nearest
#[inline]
pub fn secs_to_us(secs: f32) -> u64 {
    (secs as f64 * 1_000_000.0).round().max(0.0) as u64
}
