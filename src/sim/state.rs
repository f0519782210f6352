//! Game state and core simulation types
//!
//! All state the frame pipeline mutates lives here. Entities are plain value
//! records owned by [`GameState`]; nothing holds a reference back into it.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss_attacks::{AttackPattern, BossAttackMachine};
use super::collision::{Rect, circle_contains_point};
use crate::consts::*;
use crate::tuning::{PlayerTuning, Tuning};

/// Top-level phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Main menu, nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Run ended, waiting for restart or menu
    GameOver,
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub invincible: bool,
    pub invincibility_timer: f32,
    pub has_shield: bool,
    pub shield_timer: f32,
}

impl Player {
    pub fn new(tuning: &PlayerTuning) -> Self {
        let size = Vec2::new(tuning.width, tuning.height);
        Self {
            pos: Vec2::new((CANVAS_WIDTH - size.x) / 2.0, CANVAS_HEIGHT - size.y),
            size,
            invincible: false,
            invincibility_timer: 0.0,
            has_shield: false,
            shield_timer: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Blend toward the pointer's x, then clamp to the canvas and pin to the ground line
    pub fn follow(&mut self, target_x: f32, blend: f32) {
        if target_x.is_finite() {
            self.pos.x += (target_x - self.pos.x) * blend;
        }
        self.clamp_to_canvas();
    }

    pub fn clamp_to_canvas(&mut self) {
        if !self.pos.x.is_finite() {
            self.pos.x = (CANVAS_WIDTH - self.size.x) / 2.0;
        }
        self.pos.x = self.pos.x.clamp(0.0, CANVAS_WIDTH - self.size.x);
        self.pos.y = CANVAS_HEIGHT - self.size.y;
    }
}

/// Obstacle shapes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Asteroid,
    Block,
    /// Round obstacle hit-tested by distance from the player's center
    Giant { radius: f32 },
}

/// A falling obstacle
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub rect: Rect,
    /// Pixels per nominal frame
    pub speed: f32,
    pub kind: ObstacleKind,
    /// Remaining gravity effect (seconds), if affected
    pub gravity_timer: Option<f32>,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, x: f32, y: f32, size: Vec2, speed: f32) -> Self {
        Self {
            rect: Rect { pos: Vec2::new(x, y), size },
            speed,
            kind,
            gravity_timer: None,
        }
    }

    /// Giant obstacle whose bounding box has its top-left at `(x, y)`
    pub fn giant(x: f32, y: f32, radius: f32, speed: f32) -> Self {
        Self::new(
            ObstacleKind::Giant { radius },
            x,
            y,
            Vec2::splat(radius * 2.0),
            speed,
        )
    }

    pub fn gravity_affected(&self) -> bool {
        self.gravity_timer.is_some()
    }

    /// Shape-appropriate hit test against the player
    pub fn hits(&self, player: &Player) -> bool {
        match self.kind {
            ObstacleKind::Giant { radius } => {
                circle_contains_point(self.rect.center(), radius, player.center())
            }
            ObstacleKind::Asteroid | ObstacleKind::Block => self.rect.overlaps(&player.rect()),
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    SlowDown,
}

/// A falling power-up
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub rect: Rect,
    pub kind: PowerUpKind,
    /// Radians, cosmetic
    pub rotation: f32,
    pub speed: f32,
}

/// Cosmetic explosion
#[derive(Debug, Clone)]
pub struct Explosion {
    pub pos: Vec2,
    pub size: f32,
    /// Remaining life in nominal frames
    pub life: f32,
    pub color: u32,
}

/// Background star
#[derive(Debug, Clone)]
pub struct Star {
    pub pos: Vec2,
    pub speed: f32,
}

/// The boss of a boss level
#[derive(Debug, Clone)]
pub struct Boss {
    /// Level that spawned this boss
    pub level: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub attack_timer: f32,
    pub attack_cooldown: f32,
    /// Session time (µs) at which the boss appeared
    pub level_start_us: u64,
}

/// Screen shake state
#[derive(Debug, Clone, Default)]
pub struct ScreenShake {
    pub intensity: f32,
    pub duration: f32,
    pub offset: Vec2,
}

/// Timed effects other than the player's own
#[derive(Debug, Clone, Default)]
pub struct ActiveEffects {
    pub slow_down_active: bool,
    pub slow_down_timer: f32,
    pub level_flash_timer: f32,
    pub screen_shake: ScreenShake,
}

/// Per-session counters read by the achievement evaluator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub powerups_collected: u32,
    /// Patterns survived without losing a life during their boss level
    pub boss_patterns_defeated: BTreeSet<AttackPattern>,
    /// A shield absorbed a hit while on the last life
    pub shield_saved_life: bool,
    /// A life was lost while the current boss was active
    pub life_lost_during_boss: bool,
}

/// Something that happened during a frame, drained by the session owner
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    ScoreChanged { score: u64 },
    LevelUp { level: u32 },
    PlayerHit { lives_left: u32 },
    ShieldAbsorbed { saved_life: bool },
    PowerUpCollected { kind: PowerUpKind },
    BossSpawned { level: u32 },
    BossAttack { pattern: AttackPattern },
    GravityTriggered { affected: usize },
    BossResolved {
        level: u32,
        flawless: bool,
        patterns: Vec<AttackPattern>,
    },
    GameOver { score: u64, level: u32 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Balance table this session runs with
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    /// Elapsed play time in whole microseconds
    pub elapsed_us: u64,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub power_ups: Vec<PowerUp>,
    pub explosions: Vec<Explosion>,
    pub stars: Vec<Star>,
    pub boss: Option<Boss>,
    /// Last level number that spawned a boss
    pub last_boss_level: u32,
    pub boss_attacks: BossAttackMachine,
    /// Obstacle spawn probability per nominal frame
    pub obstacle_spawn_rate: f32,
    /// Base obstacle fall speed
    pub obstacle_speed: f32,
    pub effects: ActiveEffects,
    pub stats: SessionStats,
    game_over_latched: bool,
    events: Vec<FrameEvent>,
}

impl GameState {
    /// Create a state sitting in the menu. A table that fails
    /// [`Tuning::validate`] is replaced by the defaults.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("{e}, using default tuning");
                Tuning::default()
            }
        };
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            elapsed_us: 0,
            score: 0,
            lives: tuning.player.initial_lives,
            level: 1,
            player: Player::new(&tuning.player),
            obstacles: Vec::new(),
            power_ups: Vec::new(),
            explosions: Vec::new(),
            stars: Vec::with_capacity(STAR_COUNT),
            boss: None,
            last_boss_level: 0,
            boss_attacks: BossAttackMachine::new(tuning.boss_attacks.clone()),
            obstacle_spawn_rate: tuning.obstacle.spawn_rate,
            obstacle_speed: tuning.obstacle.base_speed,
            effects: ActiveEffects::default(),
            stats: SessionStats::default(),
            game_over_latched: false,
            events: Vec::new(),
            tuning,
        };
        state.create_stars();
        state
    }

    fn create_stars(&mut self) {
        let (min, max) = (
            self.tuning.effects.star_min_speed,
            self.tuning.effects.star_max_speed,
        );
        self.stars.clear();
        for _ in 0..STAR_COUNT {
            let pos = Vec2::new(
                self.rng.random::<f32>() * CANVAS_WIDTH,
                self.rng.random::<f32>() * CANVAS_HEIGHT,
            );
            let speed = min + self.rng.random::<f32>() * (max - min);
            self.stars.push(Star { pos, speed });
        }
    }

    /// Reset every per-session value and enter `Playing`
    pub fn start(&mut self) {
        self.reset();
        self.phase = GamePhase::Playing;
        log::info!("Session started (seed {})", self.seed);
    }

    /// Reset every per-session value without changing phase
    pub fn reset(&mut self) {
        self.clear_transient();
        self.elapsed_us = 0;
        self.score = 0;
        self.lives = self.tuning.player.initial_lives;
        self.level = 1;
        self.player = Player::new(&self.tuning.player);
        self.obstacle_spawn_rate = self.tuning.obstacle.spawn_rate;
        self.obstacle_speed = self.tuning.obstacle.base_speed;
        self.stats = SessionStats::default();
        self.game_over_latched = false;
        self.events.clear();
    }

    /// Leave any session and show the menu
    pub fn enter_menu(&mut self) {
        self.phase = GamePhase::Menu;
        self.clear_transient();
        self.events.clear();
    }

    /// Drop transient entities and timed effects
    pub fn clear_transient(&mut self) {
        self.obstacles.clear();
        self.explosions.clear();
        self.power_ups.clear();
        self.boss = None;
        self.boss_attacks.reset();
        self.last_boss_level = 0;
        self.player.invincible = false;
        self.player.invincibility_timer = 0.0;
        self.player.has_shield = false;
        self.player.shield_timer = 0.0;
        self.effects = ActiveEffects::default();
    }

    /// End the run. Only the first call has any effect.
    pub fn end_session(&mut self) {
        if self.game_over_latched {
            return;
        }
        self.game_over_latched = true;
        self.phase = GamePhase::GameOver;
        self.clear_transient();
        self.recompute_score();
        log::info!("Game over: score {} at level {}", self.score, self.level);
        self.events.push(FrameEvent::GameOver {
            score: self.score,
            level: self.level,
        });
    }

    /// Elapsed play time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_us as f64 / 1_000_000.0
    }

    /// Score as a pure function of elapsed time
    pub fn recompute_score(&mut self) -> u64 {
        self.score = self.elapsed_us * self.tuning.progression.score_per_second / 1_000_000;
        self.score
    }

    /// Level as a pure function of elapsed time
    pub fn level_for_elapsed(&self) -> u32 {
        let per_level = self.tuning.level_duration_us().max(1);
        (self.elapsed_us / per_level) as u32 + 1
    }

    pub fn is_boss_level(&self) -> bool {
        self.level
            .checked_rem(self.tuning.progression.boss_level_interval)
            .is_some_and(|r| r == 0)
    }

    /// Add an obstacle to the store
    pub fn spawn_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Add a power-up at `x` just above the canvas
    pub fn spawn_power_up(&mut self, kind: PowerUpKind, x: f32) {
        let t = &self.tuning.power_ups;
        self.power_ups.push(PowerUp {
            rect: Rect::new(x, -t.height, t.width, t.height),
            kind,
            rotation: 0.0,
            speed: t.fall_speed,
        });
    }

    pub(crate) fn push_event(&mut self, event: FrameEvent) {
        self.events.push(event);
    }

    /// Events raised since the last drain
    pub fn events(&self) -> &[FrameEvent] {
        &self.events
    }

    /// Drain events raised since the last call
    pub fn take_events(&mut self) -> Vec<FrameEvent> {
        std::mem::take(&mut self.events)
    }
}
