//! Per-frame simulation update
//!
//! One call to [`tick`] advances a `Playing` session by a clamped delta time.
//! The stage order is fixed; later stages observe the results of earlier ones.

use glam::Vec2;
use rand::Rng;

use super::boss_attacks::AttackPattern;
use super::state::{
    Boss, Explosion, FrameEvent, GamePhase, GameState, Obstacle, ObstacleKind, PowerUpKind,
};
use crate::consts::*;
use crate::tuning::secs_to_us;
use crate::{clamp_frame_dt, per_frame};

/// Input sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest pointer position in canvas coordinates, if any has been seen
    pub pointer: Option<Vec2>,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }
    let Some(dt) = clamp_frame_dt(dt) else {
        return;
    };

    // Time and score
    state.elapsed_us += secs_to_us(dt);
    let previous_score = state.score;
    if state.recompute_score() != previous_score {
        state.push_event(FrameEvent::ScoreChanged { score: state.score });
    }

    // Player follows the pointer
    match input.pointer {
        Some(pointer) => {
            let target = pointer.x - state.player.size.x / 2.0;
            let blend = state.tuning.player.follow_blend;
            state.player.follow(target, blend);
        }
        None => state.player.clamp_to_canvas(),
    }

    update_timers(state, dt);

    update_obstacles(state, dt);
    update_power_ups(state, dt);
    update_explosions(state, dt);
    update_stars(state, dt);

    check_boss_level(state);
    update_boss(state, dt);
    state.boss_attacks.update(dt);

    spawn_obstacles(state, dt);
    spawn_power_ups(state, dt);

    check_collisions(state);
    if state.phase != GamePhase::Playing {
        return;
    }
    check_power_up_pickups(state);
    update_level(state);
}

/// Count down every timed effect independently
fn update_timers(state: &mut GameState, dt: f32) {
    let player = &mut state.player;
    if player.invincible {
        player.invincibility_timer -= dt;
        if player.invincibility_timer <= 0.0 {
            player.invincible = false;
            player.invincibility_timer = 0.0;
        }
    }
    if player.has_shield {
        player.shield_timer -= dt;
        if player.shield_timer <= 0.0 {
            player.has_shield = false;
            player.shield_timer = 0.0;
        }
    }

    let effects = &mut state.effects;
    let shake = &mut effects.screen_shake;
    if shake.duration > 0.0 {
        shake.duration -= dt;
        if shake.duration > 0.0 {
            let i = shake.intensity;
            shake.offset = Vec2::new(
                state.rng.random_range(-1.0f32..=1.0) * i,
                state.rng.random_range(-1.0f32..=1.0) * i,
            );
        } else {
            shake.duration = 0.0;
            shake.intensity = 0.0;
            shake.offset = Vec2::ZERO;
        }
    }

    if effects.level_flash_timer > 0.0 {
        effects.level_flash_timer = (effects.level_flash_timer - dt).max(0.0);
    }

    if effects.slow_down_active {
        effects.slow_down_timer -= dt;
        if effects.slow_down_timer <= 0.0 {
            effects.slow_down_active = false;
            effects.slow_down_timer = 0.0;
        }
    }
}

fn update_obstacles(state: &mut GameState, dt: f32) {
    let slow = if state.effects.slow_down_active {
        1.0 - state.tuning.power_ups.slow_down_reduction
    } else {
        1.0
    };
    let gravity = state.tuning.boss_attacks.gravity_speed_multiplier;

    state.obstacles.retain_mut(|o| {
        let mult = if o.gravity_affected() { gravity } else { 1.0 };
        o.rect.pos.y += per_frame(o.speed * slow * mult, dt);
        if let Some(timer) = o.gravity_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                o.gravity_timer = None;
            }
        }
        o.rect.is_finite() && o.rect.top() <= CANVAS_HEIGHT
    });
}

fn update_power_ups(state: &mut GameState, dt: f32) {
    let spin = state.tuning.power_ups.rotation_speed;
    state.power_ups.retain_mut(|p| {
        p.rect.pos.y += per_frame(p.speed, dt);
        p.rotation += spin * dt;
        p.rect.is_finite() && p.rect.top() <= CANVAS_HEIGHT
    });
}

fn update_explosions(state: &mut GameState, dt: f32) {
    let growth = state.tuning.effects.explosion_growth_rate;
    state.explosions.retain_mut(|e| {
        e.life -= per_frame(1.0, dt);
        e.size += per_frame(growth, dt);
        e.life > 0.0 && e.pos.is_finite()
    });
}

fn update_stars(state: &mut GameState, dt: f32) {
    for star in &mut state.stars {
        star.pos.y += per_frame(star.speed, dt);
        if star.pos.y > CANVAS_HEIGHT || !star.pos.y.is_finite() {
            star.pos.y = 0.0;
            star.pos.x = state.rng.random::<f32>() * CANVAS_WIDTH;
        }
    }
}

/// Spawn the boss on entering a boss level, once per level
fn check_boss_level(state: &mut GameState) {
    if !state.is_boss_level() || state.boss.is_some() || state.last_boss_level == state.level {
        return;
    }
    let t = &state.tuning.boss;
    state.boss = Some(Boss {
        level: state.level,
        pos: Vec2::new(t.x, t.y),
        radius: t.radius,
        attack_timer: 0.0,
        attack_cooldown: t.attack_cooldown,
        level_start_us: state.elapsed_us,
    });
    state.last_boss_level = state.level;
    state.stats.life_lost_during_boss = false;
    state.boss_attacks.reset();
    log::info!("Boss appeared on level {}", state.level);
    state.push_event(FrameEvent::BossSpawned { level: state.level });
}

fn update_boss(state: &mut GameState, dt: f32) {
    let Some(start_us) = state.boss.as_ref().map(|b| b.level_start_us) else {
        return;
    };
    let since_us = state.elapsed_us.saturating_sub(start_us);

    if since_us >= state.tuning.boss_duration_us() {
        resolve_boss(state);
        return;
    }

    let since = since_us as f32 / 1_000_000.0;
    if state.boss_attacks.take_due_gravity(since) {
        let duration = state.tuning.boss_attacks.gravity_duration;
        for obstacle in &mut state.obstacles {
            obstacle.gravity_timer = Some(duration);
        }
        let affected = state.obstacles.len();
        log::debug!("Gravity hit {affected} obstacles");
        state.push_event(FrameEvent::GravityTriggered { affected });
    }

    if since >= state.tuning.boss.attack_window_end {
        return;
    }

    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    boss.attack_timer += dt;
    if boss.attack_timer >= boss.attack_cooldown && state.boss_attacks.is_idle() {
        boss.attack_timer = 0.0;
        let pattern = state.boss_attacks.boss_attack(&mut state.rng);
        state.push_event(FrameEvent::BossAttack { pattern });
    }
}

/// End the boss level: credit patterns if flawless, then clear everything boss-related
fn resolve_boss(state: &mut GameState) {
    let Some(boss) = state.boss.take() else {
        return;
    };
    let flawless = !state.stats.life_lost_during_boss;
    let patterns: Vec<AttackPattern> = state.boss_attacks.patterns_used().iter().copied().collect();
    if flawless {
        state.stats.boss_patterns_defeated.extend(patterns.iter().copied());
    }
    log::info!(
        "Boss level {} resolved ({}, {} patterns)",
        boss.level,
        if flawless { "flawless" } else { "life lost" },
        patterns.len()
    );

    state.boss_attacks.reset();
    for obstacle in &mut state.obstacles {
        obstacle.gravity_timer = None;
    }
    state.push_event(FrameEvent::BossResolved {
        level: boss.level,
        flawless,
        patterns,
    });
}

/// Roll against a per-nominal-frame probability scaled to this frame
fn roll<R: Rng + ?Sized>(rng: &mut R, per_nominal_frame: f32, dt: f32) -> bool {
    let p = per_frame(per_nominal_frame, dt).clamp(0.0, 1.0);
    rng.random::<f32>() < p
}

fn spawn_obstacles(state: &mut GameState, dt: f32) {
    let rate = state.obstacle_spawn_rate * state.boss_attacks.spawn_rate_modifier();
    if !roll(&mut state.rng, rate, dt) {
        return;
    }
    let t = &state.tuning.obstacle;
    let size = Vec2::new(t.width, t.height);
    let x = state.rng.random::<f32>() * (CANVAS_WIDTH - size.x);
    let speed = state.obstacle_speed + state.rng.random::<f32>() * t.speed_variance;
    let kind = if state.rng.random::<f32>() < t.asteroid_chance {
        ObstacleKind::Asteroid
    } else {
        ObstacleKind::Block
    };
    state.spawn_obstacle(Obstacle::new(kind, x, -size.y, size, speed));
}

fn spawn_power_ups(state: &mut GameState, dt: f32) {
    if state.boss.is_some() || !state.power_ups.is_empty() {
        return;
    }
    if !roll(&mut state.rng, state.tuning.power_ups.spawn_rate, dt) {
        return;
    }
    let kind = if state.rng.random_bool(0.5) {
        PowerUpKind::Shield
    } else {
        PowerUpKind::SlowDown
    };
    let x = state.rng.random::<f32>() * (CANVAS_WIDTH - state.tuning.power_ups.width);
    state.spawn_power_up(kind, x);
}

fn check_collisions(state: &mut GameState) {
    if state.player.invincible {
        return;
    }

    let mut i = 0;
    while i < state.obstacles.len() {
        if !state.obstacles[i].hits(&state.player) {
            i += 1;
            continue;
        }
        let obstacle = state.obstacles.remove(i);
        let at = (obstacle.rect.center() + state.player.center()) * 0.5;
        spawn_explosion(state, at);
        apply_hit(state);
        if state.phase != GamePhase::Playing || state.player.invincible {
            return;
        }
    }

    if state.boss_attacks.check_player_collision(&state.player.rect()) {
        let at = state.player.center();
        spawn_explosion(state, at);
        apply_hit(state);
    }
}

fn spawn_explosion(state: &mut GameState, pos: Vec2) {
    let t = &state.tuning.effects;
    state.explosions.push(Explosion {
        pos,
        size: t.explosion_initial_size,
        life: t.explosion_life,
        color: t.explosion_color,
    });
    state.effects.screen_shake.intensity = t.screen_shake_intensity;
    state.effects.screen_shake.duration = t.screen_shake_duration;
}

/// A shield absorbs the hit, otherwise a life is lost
fn apply_hit(state: &mut GameState) {
    if state.player.has_shield {
        state.player.has_shield = false;
        state.player.shield_timer = 0.0;
        let saved_life = state.lives == 1;
        if saved_life {
            state.stats.shield_saved_life = true;
        }
        state.push_event(FrameEvent::ShieldAbsorbed { saved_life });
        return;
    }
    lose_life(state);
}

fn lose_life(state: &mut GameState) {
    if state.boss.is_some() {
        state.stats.life_lost_during_boss = true;
    }
    state.lives = state.lives.saturating_sub(1);
    state.push_event(FrameEvent::PlayerHit {
        lives_left: state.lives,
    });
    if state.lives == 0 {
        state.end_session();
    } else {
        state.player.invincible = true;
        state.player.invincibility_timer = state.tuning.player.invincibility_duration;
    }
}

fn check_power_up_pickups(state: &mut GameState) {
    let player = state.player.rect();
    let (collected, remaining): (Vec<_>, Vec<_>) = state
        .power_ups
        .drain(..)
        .partition(|p| p.rect.overlaps(&player));
    state.power_ups = remaining;

    for power_up in collected {
        state.stats.powerups_collected += 1;
        let t = &state.tuning.power_ups;
        match power_up.kind {
            PowerUpKind::Shield => {
                state.player.has_shield = true;
                state.player.shield_timer = t.shield_duration;
            }
            PowerUpKind::SlowDown => {
                state.effects.slow_down_active = true;
                state.effects.slow_down_timer = t.slow_down_duration;
            }
        }
        state.push_event(FrameEvent::PowerUpCollected {
            kind: power_up.kind,
        });
    }
}

/// Derive the level from elapsed time and ramp difficulty on increase
fn update_level(state: &mut GameState) {
    let level = state.level_for_elapsed();
    if level <= state.level {
        return;
    }
    let p = &state.tuning.progression;
    state.level = level;
    state.obstacle_spawn_rate = (state.obstacle_spawn_rate + p.spawn_rate_increase).min(p.max_spawn_rate);
    state.obstacle_speed = (state.obstacle_speed + p.speed_increase).min(p.max_speed);
    state.effects.level_flash_timer = state.tuning.effects.level_flash_duration;
    log::info!("Level {level}");
    state.push_event(FrameEvent::LevelUp { level });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boss_attacks::Attack;
    use crate::sim::state::PowerUpKind;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    /// Tuning with ambient spawning disabled so tests control every entity
    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.obstacle.spawn_rate = 0.0;
        tuning.progression.spawn_rate_increase = 0.0;
        tuning.power_ups.spawn_rate = 0.0;
        tuning
    }

    fn playing(tuning: Tuning) -> GameState {
        let mut state = GameState::new(42, tuning);
        state.start();
        state
    }

    fn block_on_player(state: &GameState) -> Obstacle {
        let p = state.player.pos;
        Obstacle::new(ObstacleKind::Block, p.x, p.y, Vec2::splat(30.0), 0.0)
    }

    #[test]
    fn test_tick_noop_outside_playing() {
        let mut state = GameState::new(1, Tuning::default());
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.elapsed_us, 0);
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_bad_dt_skips_frame() {
        let mut state = playing(Tuning::default());
        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            tick(&mut state, &TickInput::default(), dt);
        }
        assert_eq!(state.elapsed_us, 0);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = playing(quiet_tuning());
        tick(&mut state, &TickInput::default(), 5.0);
        assert_eq!(state.elapsed_us, secs_to_us(MAX_FRAME_DT));
        assert_eq!(state.level, 1);
    }

    #[test]
    fn test_player_follows_pointer() {
        let mut state = playing(quiet_tuning());
        let input = TickInput {
            pointer: Some(Vec2::new(700.0, 300.0)),
        };
        for _ in 0..120 {
            tick(&mut state, &input, DT);
        }
        assert!((state.player.center().x - 700.0).abs() < 0.5);
        assert_eq!(state.player.pos.y, CANVAS_HEIGHT - state.player.size.y);
    }

    #[test]
    fn test_hit_costs_life_and_grants_invincibility() {
        let mut state = playing(quiet_tuning());
        let block = block_on_player(&state);
        state.spawn_obstacle(block);
        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.lives, 2);
        assert!(state.player.invincible);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.explosions.len(), 1);
        assert!(state.effects.screen_shake.duration > 0.0);

        // Invincible: the next obstacle passes through
        let block = block_on_player(&state);
        state.spawn_obstacle(block);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.lives, 2);
        assert_eq!(state.obstacles.len(), 1);

        // Invincibility runs out after one second
        state.obstacles.clear();
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(!state.player.invincible);
        assert_eq!(state.player.invincibility_timer, 0.0);
    }

    #[test]
    fn test_two_obstacles_same_frame_cost_one_life() {
        let mut state = playing(quiet_tuning());
        let a = block_on_player(&state);
        let b = block_on_player(&state);
        state.spawn_obstacle(a);
        state.spawn_obstacle(b);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.lives, 2);
        assert_eq!(state.obstacles.len(), 1);
    }

    #[test]
    fn test_shield_absorbs_without_invincibility() {
        let mut state = playing(quiet_tuning());
        state.player.has_shield = true;
        state.player.shield_timer = 10.0;
        let block = block_on_player(&state);
        state.spawn_obstacle(block);
        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.lives, 3);
        assert!(!state.player.has_shield);
        assert!(!state.player.invincible);
        assert!(!state.stats.shield_saved_life);
    }

    #[test]
    fn test_last_life_ends_session() {
        let mut state = playing(quiet_tuning());
        state.lives = 1;
        let block = block_on_player(&state);
        state.spawn_obstacle(block);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.obstacles.is_empty());
        assert!(state.explosions.is_empty());

        // Further ticks do nothing
        let elapsed = state.elapsed_us;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.elapsed_us, elapsed);
    }

    #[test]
    fn test_obstacles_leave_canvas() {
        let mut state = playing(quiet_tuning());
        state.player.pos.x = 0.0;
        state.spawn_obstacle(Obstacle::new(
            ObstacleKind::Asteroid,
            600.0,
            CANVAS_HEIGHT - 2.0,
            Vec2::splat(30.0),
            5.0,
        ));
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_non_finite_obstacle_removed() {
        let mut state = playing(quiet_tuning());
        state.spawn_obstacle(Obstacle::new(
            ObstacleKind::Asteroid,
            f32::NAN,
            0.0,
            Vec2::splat(30.0),
            5.0,
        ));
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn test_slow_down_and_gravity_multipliers() {
        let mut state = playing(quiet_tuning());
        state.player.pos.x = 0.0;
        let make = || Obstacle::new(ObstacleKind::Asteroid, 400.0, 0.0, Vec2::splat(30.0), 5.0);
        state.spawn_obstacle(make());
        let mut heavy = make();
        heavy.gravity_timer = Some(3.0);
        state.spawn_obstacle(heavy);
        state.effects.slow_down_active = true;
        state.effects.slow_down_timer = 10.0;

        tick(&mut state, &TickInput::default(), DT);
        assert!((state.obstacles[0].rect.top() - 4.0).abs() < 1e-3);
        assert!((state.obstacles[1].rect.top() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_power_up_pickup() {
        let mut state = playing(quiet_tuning());
        let x = state.player.pos.x;
        state.spawn_power_up(PowerUpKind::SlowDown, x);
        state.power_ups[0].rect.pos.y = state.player.pos.y;
        tick(&mut state, &TickInput::default(), DT);

        assert!(state.power_ups.is_empty());
        assert!(state.effects.slow_down_active);
        assert_eq!(state.stats.powerups_collected, 1);
        assert!(
            state
                .take_events()
                .contains(&FrameEvent::PowerUpCollected {
                    kind: PowerUpKind::SlowDown
                })
        );
    }

    #[test]
    fn test_power_ups_exclusive_and_suppressed_by_boss() {
        let mut tuning = quiet_tuning();
        tuning.power_ups.spawn_rate = 1.0;
        let mut state = playing(tuning);
        state.player.pos.x = CANVAS_WIDTH - state.player.size.x;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
            assert!(state.power_ups.len() <= 1);
        }

        state.power_ups.clear();
        state.boss = Some(Boss {
            level: 1,
            pos: Vec2::new(400.0, 100.0),
            radius: 60.0,
            attack_timer: 0.0,
            attack_cooldown: 4.0,
            level_start_us: state.elapsed_us,
        });
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_level_up_ramps_difficulty() {
        let mut state = playing(quiet_tuning());
        state.tuning.progression.spawn_rate_increase = 0.01;
        state.elapsed_us = 10_000_000 - 1;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.level, 2);
        assert_eq!(state.obstacle_speed, 6.0);
        assert!((state.obstacle_spawn_rate - 0.01).abs() < 1e-6);
        assert!(state.effects.level_flash_timer > 0.0);
    }

    #[test]
    fn test_boss_lifecycle() {
        let mut state = playing(quiet_tuning());
        state.lives = 1000;
        // Jump straight to level 4
        state.elapsed_us = 30_000_000 - 1;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.level, 4);
        // Boss spawns on the tick after the level changes
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.boss.is_some());
        assert_eq!(state.last_boss_level, 4);
        assert!(state.power_ups.is_empty());

        let mut attacks = 0;
        let mut saw_boss_end = false;
        for _ in 0..(11 * 60) {
            tick(&mut state, &TickInput::default(), DT);
            for event in state.take_events() {
                match event {
                    FrameEvent::BossAttack { .. } => {
                        // New attacks only start from an idle machine
                        attacks += 1;
                    }
                    FrameEvent::BossResolved { level, .. } => {
                        assert_eq!(level, 4);
                        saw_boss_end = true;
                    }
                    _ => {}
                }
            }
            if state.boss.is_none() {
                break;
            }
        }
        assert!(saw_boss_end);
        assert!(attacks >= 1);
        assert!(state.boss.is_none());
        assert!(state.boss_attacks.is_idle());
    }

    #[test]
    fn test_one_boss_per_level() {
        let mut state = playing(quiet_tuning());
        state.level = 4;
        check_boss_level(&mut state);
        assert!(state.boss.is_some());
        check_boss_level(&mut state);
        assert_eq!(state.events().len(), 1);

        state.boss = None;
        check_boss_level(&mut state);
        assert!(state.boss.is_none());

        state.level = 5;
        check_boss_level(&mut state);
        assert!(state.boss.is_none());
    }

    #[test]
    fn test_attack_waits_for_idle_machine() {
        let mut state = playing(quiet_tuning());
        state.player.invincible = true;
        state.player.invincibility_timer = 1000.0;
        state.level = 4;
        state.elapsed_us = 30_000_000;
        check_boss_level(&mut state);
        // Spikes occupy the machine for 6 seconds
        state.boss_attacks.launch(AttackPattern::Spikes, &mut state.rng);
        for _ in 0..(5 * 60) {
            tick(&mut state, &TickInput::default(), DT);
            assert!(
                !state
                    .take_events()
                    .iter()
                    .any(|e| matches!(e, FrameEvent::BossAttack { .. }))
            );
        }
    }

    #[test]
    fn test_gravity_marks_and_clears_obstacles() {
        let mut state = playing(quiet_tuning());
        state.player.pos.x = 0.0;
        state.level = 4;
        state.elapsed_us = 30_000_000;
        check_boss_level(&mut state);
        state.boss_attacks.launch(AttackPattern::Gravity, &mut state.rng);
        state.elapsed_us += 5_000_000;
        state.spawn_obstacle(Obstacle::new(
            ObstacleKind::Block,
            600.0,
            -500.0,
            Vec2::splat(30.0),
            0.0,
        ));
        // Keep the boss alive while gravity is inspected
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.obstacles[0].gravity_affected());
        assert!(!state.boss_attacks.gravity_scheduled());

        // Resolution strips the effect
        state.elapsed_us += 6_000_000;
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.boss.is_none());
        assert!(state.obstacles.iter().all(|o| !o.gravity_affected()));
    }

    #[test]
    fn test_boss_hazard_hits_player() {
        let mut state = playing(quiet_tuning());
        state.level = 4;
        state.elapsed_us = 30_000_000;
        check_boss_level(&mut state);
        state.boss_attacks.launch(AttackPattern::MovingSafe, &mut state.rng);
        state.player.pos.x = CANVAS_WIDTH - state.player.size.x;
        for _ in 0..61 {
            tick(&mut state, &TickInput::default(), DT);
            if state.lives < 3 {
                break;
            }
        }
        assert!(matches!(
            state.boss_attacks.attacks()[0],
            Attack::MovingSafe { .. }
        ));
        assert_eq!(state.lives, 2);
        assert!(state.stats.life_lost_during_boss);
    }

    proptest! {
        #[test]
        fn prop_score_independent_of_partition(
            frames in proptest::collection::vec(1u32..=33_000, 1..200)
        ) {
            let mut state = playing(quiet_tuning());
            state.player.invincible = true;
            state.player.invincibility_timer = f32::MAX;
            let mut total_us = 0u64;
            for us in &frames {
                let dt = *us as f32 / 1_000_000.0;
                tick(&mut state, &TickInput::default(), dt);
                total_us += secs_to_us(dt);
            }
            prop_assert_eq!(state.elapsed_us, total_us);
            prop_assert_eq!(state.score, total_us * 10 / 1_000_000);
        }

        #[test]
        fn prop_level_monotonic(
            frames in proptest::collection::vec(0.0f32..0.05, 1..400)
        ) {
            let mut state = playing(quiet_tuning());
            state.player.invincible = true;
            state.player.invincibility_timer = f32::MAX;
            let mut last = state.level;
            for dt in frames {
                tick(&mut state, &TickInput::default(), dt);
                prop_assert!(state.level >= last);
                prop_assert_eq!(state.level, state.level_for_elapsed());
                last = state.level;
            }
        }
    }
}
