//! Boss attack patterns
//!
//! Attacks run in two phases. A [`Warning`] is a purely visual precursor that
//! counts down to maturity; when it matures it becomes exactly one live
//! [`Attack`]. Two patterns skip the spatial pipeline: `DoubleObstacles` goes
//! straight to the attack list as a spawn-rate modifier, and `Gravity` only
//! arms a flag that the boss lifecycle fires later against the obstacle store.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, circle_contains_point, within_span};
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::per_frame;
use crate::tuning::BossAttackTuning;

/// The seven scripted boss patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackPattern {
    Spikes,
    DoubleSpikes,
    Wall,
    MovingSafe,
    GiantObstacle,
    DoubleObstacles,
    Gravity,
}

impl AttackPattern {
    pub const ALL: [AttackPattern; 7] = [
        AttackPattern::Spikes,
        AttackPattern::DoubleSpikes,
        AttackPattern::Wall,
        AttackPattern::MovingSafe,
        AttackPattern::GiantObstacle,
        AttackPattern::DoubleObstacles,
        AttackPattern::Gravity,
    ];

    /// Stable identifier (used in achievement keys)
    pub fn key(&self) -> &'static str {
        match self {
            AttackPattern::Spikes => "spikes",
            AttackPattern::DoubleSpikes => "double_spikes",
            AttackPattern::Wall => "wall",
            AttackPattern::MovingSafe => "moving_safe",
            AttackPattern::GiantObstacle => "giant_obstacle",
            AttackPattern::DoubleObstacles => "double_obstacles",
            AttackPattern::Gravity => "gravity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AttackPattern::Spikes => "Spikes",
            AttackPattern::DoubleSpikes => "Double Spikes",
            AttackPattern::Wall => "Wall Restriction",
            AttackPattern::MovingSafe => "Moving Safe Zone",
            AttackPattern::GiantObstacle => "Giant Obstacle",
            AttackPattern::DoubleObstacles => "Double Obstacles",
            AttackPattern::Gravity => "Gravity Attack",
        }
    }
}

/// What a warning turns into when it matures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WarningKind {
    /// Vertical band (spikes and double spikes)
    Spike,
    /// Full-canvas warning before the walls start closing
    Wall,
    /// Safe band that will start moving
    MovingSafe { speed: f32 },
    /// Bounding box of a falling circle
    GiantObstacle { radius: f32 },
}

/// A timed, non-collidable precursor to an attack
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub rect: Rect,
    pub timer: f32,
    pub duration: f32,
    pub kind: WarningKind,
}

/// A live hazard
#[derive(Debug, Clone, PartialEq)]
pub enum Attack {
    /// Static deadly band
    Spike { rect: Rect, timer: f32 },
    /// Walls closing in from both edges; deadly outside `[left, right]`
    Wall {
        left: f32,
        right: f32,
        target_gap: f32,
        collapse_speed: f32,
    },
    /// Safe band sweeping right; deadly outside the band
    MovingSafe { band: Rect, speed: f32 },
    /// Falling circle
    GiantObstacle {
        center: Vec2,
        radius: f32,
        fall_speed: f32,
    },
    /// No geometry, doubles ambient obstacle spawning while alive
    DoubleObstacles { timer: f32 },
}

impl Attack {
    /// Whether this attack can touch the player
    pub fn is_spatial(&self) -> bool {
        !matches!(self, Attack::DoubleObstacles { .. })
    }

    /// Pattern-specific hit test against the player's box
    pub fn hits(&self, player: &Rect) -> bool {
        match self {
            Attack::Spike { rect, .. } => rect.overlaps(player),
            Attack::Wall { left, right, .. } => !within_span(player, *left, *right),
            Attack::MovingSafe { band, .. } => !band.contains(player),
            Attack::GiantObstacle { center, radius, .. } => {
                circle_contains_point(*center, *radius, player.center())
            }
            Attack::DoubleObstacles { .. } => false,
        }
    }

    /// Advance one frame. Returns false once the attack has expired.
    fn advance(&mut self, dt: f32, tuning: &BossAttackTuning) -> bool {
        match self {
            Attack::Spike { timer, .. } => {
                *timer += dt;
                *timer <= tuning.spike_attack_duration
            }
            Attack::DoubleObstacles { timer } => {
                *timer += dt;
                *timer <= tuning.double_obstacles_duration
            }
            Attack::Wall {
                left,
                right,
                target_gap,
                collapse_speed,
            } => {
                let remaining = (*right - *left) - *target_gap;
                if remaining > 0.0 {
                    let step = per_frame(*collapse_speed, dt);
                    if step * 2.0 >= remaining {
                        // Land exactly on the target gap
                        *left += remaining / 2.0;
                        *right = *left + *target_gap;
                    } else {
                        *left += step;
                        *right -= step;
                    }
                }
                // Walls hold until the boss level resolves
                true
            }
            Attack::MovingSafe { band, speed } => {
                band.pos.x += per_frame(*speed, dt);
                band.right() <= CANVAS_WIDTH
            }
            Attack::GiantObstacle {
                center,
                radius,
                fall_speed,
            } => {
                center.y += per_frame(*fall_speed, dt);
                center.y <= CANVAS_HEIGHT + *radius + tuning.giant_exit_margin
            }
        }
    }
}

/// Warning/attack queues for one boss level
#[derive(Debug, Clone)]
pub struct BossAttackMachine {
    tuning: BossAttackTuning,
    warnings: Vec<Warning>,
    attacks: Vec<Attack>,
    gravity_scheduled: bool,
    patterns_used: BTreeSet<AttackPattern>,
}

impl BossAttackMachine {
    pub fn new(tuning: BossAttackTuning) -> Self {
        Self {
            tuning,
            warnings: Vec::new(),
            attacks: Vec::new(),
            gravity_scheduled: false,
            patterns_used: BTreeSet::new(),
        }
    }

    /// Drop every warning, attack, pending gravity effect and the used-pattern set
    pub fn reset(&mut self) {
        self.warnings.clear();
        self.attacks.clear();
        self.gravity_scheduled = false;
        self.patterns_used.clear();
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn attacks(&self) -> &[Attack] {
        &self.attacks
    }

    pub fn patterns_used(&self) -> &BTreeSet<AttackPattern> {
        &self.patterns_used
    }

    pub fn gravity_scheduled(&self) -> bool {
        self.gravity_scheduled
    }

    /// No pending warnings and no live attacks
    pub fn is_idle(&self) -> bool {
        self.warnings.is_empty() && self.attacks.is_empty()
    }

    /// Multiplier applied to the ambient obstacle spawn rate
    pub fn spawn_rate_modifier(&self) -> f32 {
        if self
            .attacks
            .iter()
            .any(|a| matches!(a, Attack::DoubleObstacles { .. }))
        {
            self.tuning.double_obstacles_multiplier
        } else {
            1.0
        }
    }

    /// Pick a pattern uniformly at random and launch it
    pub fn boss_attack<R: Rng + ?Sized>(&mut self, rng: &mut R) -> AttackPattern {
        let pattern = AttackPattern::ALL[rng.random_range(0..AttackPattern::ALL.len())];
        self.launch(pattern, rng);
        pattern
    }

    /// Launch a specific pattern
    pub fn launch<R: Rng + ?Sized>(&mut self, pattern: AttackPattern, rng: &mut R) {
        log::debug!("Boss attack: {}", pattern.key());
        self.patterns_used.insert(pattern);

        let t = self.tuning.clone();
        match pattern {
            AttackPattern::Spikes => {
                let gap = CANVAS_WIDTH / (t.spike_count + 1) as f32;
                for i in 0..t.spike_count {
                    let x = gap * (i + 1) as f32 - t.spike_width / 2.0;
                    self.push_spike_warning(x);
                }
            }
            AttackPattern::DoubleSpikes => {
                let span = CANVAS_WIDTH - 2.0 * t.double_spike_margin;
                for _ in 0..t.double_spike_count {
                    let x = rng.random::<f32>() * span + t.double_spike_margin;
                    self.push_spike_warning(x);
                }
            }
            AttackPattern::Wall => {
                self.warnings.push(Warning {
                    rect: Rect::new(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT),
                    timer: 0.0,
                    duration: t.warning_duration,
                    kind: WarningKind::Wall,
                });
            }
            AttackPattern::MovingSafe => {
                self.warnings.push(Warning {
                    rect: Rect::new(0.0, 0.0, t.moving_safe_width, CANVAS_HEIGHT),
                    timer: 0.0,
                    duration: t.warning_duration,
                    kind: WarningKind::MovingSafe {
                        speed: t.moving_safe_speed,
                    },
                });
            }
            AttackPattern::GiantObstacle => {
                let r = t.giant_radius;
                let center_x = rng.random::<f32>() * (CANVAS_WIDTH - 2.0 * r) + r;
                self.warnings.push(Warning {
                    rect: Rect::new(center_x - r, t.giant_start_y, r * 2.0, r * 2.0),
                    timer: 0.0,
                    duration: t.warning_duration,
                    kind: WarningKind::GiantObstacle { radius: r },
                });
            }
            AttackPattern::DoubleObstacles => {
                self.attacks.push(Attack::DoubleObstacles { timer: 0.0 });
            }
            AttackPattern::Gravity => {
                self.gravity_scheduled = true;
            }
        }
    }

    fn push_spike_warning(&mut self, x: f32) {
        self.warnings.push(Warning {
            rect: Rect::new(x, 0.0, self.tuning.spike_width, CANVAS_HEIGHT),
            timer: 0.0,
            duration: self.tuning.warning_duration,
            kind: WarningKind::Spike,
        });
    }

    /// Advance warnings (maturing them into attacks), then attacks
    pub fn update(&mut self, dt: f32) {
        let mut matured = Vec::new();
        self.warnings.retain_mut(|w| {
            w.timer += dt;
            if w.timer >= w.duration {
                matured.push(w.clone());
                false
            } else {
                true
            }
        });
        for warning in &matured {
            let attack = self.convert(warning);
            self.attacks.push(attack);
        }

        let tuning = &self.tuning;
        self.attacks.retain_mut(|a| a.advance(dt, tuning));
    }

    fn convert(&self, warning: &Warning) -> Attack {
        match warning.kind {
            WarningKind::Spike => Attack::Spike {
                rect: warning.rect,
                timer: 0.0,
            },
            WarningKind::Wall => Attack::Wall {
                left: 0.0,
                right: CANVAS_WIDTH,
                target_gap: self.tuning.wall_target_gap,
                collapse_speed: self.tuning.wall_collapse_speed,
            },
            WarningKind::MovingSafe { speed } => Attack::MovingSafe {
                band: warning.rect,
                speed,
            },
            WarningKind::GiantObstacle { radius } => Attack::GiantObstacle {
                center: warning.rect.pos + Vec2::splat(radius),
                radius,
                fall_speed: self.tuning.giant_fall_speed,
            },
        }
    }

    /// Fire a scheduled gravity effect once `since_boss_start` reaches the
    /// trigger delay. Returns true exactly once per scheduling.
    pub fn take_due_gravity(&mut self, since_boss_start: f32) -> bool {
        if self.gravity_scheduled && since_boss_start >= self.tuning.gravity_trigger_delay {
            self.gravity_scheduled = false;
            true
        } else {
            false
        }
    }

    /// True if any live spatial hazard touches the player. One hit per call.
    pub fn check_player_collision(&self, player: &Rect) -> bool {
        self.attacks
            .iter()
            .filter(|a| a.is_spatial())
            .any(|a| a.hits(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn machine() -> (BossAttackMachine, Pcg32) {
        (
            BossAttackMachine::new(BossAttackTuning::default()),
            Pcg32::seed_from_u64(7),
        )
    }

    fn player_at(x: f32) -> Rect {
        Rect::new(x, CANVAS_HEIGHT - 20.0, 20.0, 20.0)
    }

    /// Run until every warning has matured
    fn mature(m: &mut BossAttackMachine) {
        while !m.warnings().is_empty() {
            m.update(DT);
        }
    }

    #[test]
    fn test_spikes_evenly_spaced() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::Spikes, &mut rng);
        assert_eq!(m.warnings().len(), 3);
        let xs: Vec<f32> = m.warnings().iter().map(|w| w.rect.center().x).collect();
        assert_eq!(xs, vec![200.0, 400.0, 600.0]);
        assert!(m.warnings().iter().all(|w| w.rect.size.y == CANVAS_HEIGHT));
        // Warnings are not collidable
        assert!(!m.check_player_collision(&player_at(390.0)));
    }

    #[test]
    fn test_warning_converts_one_to_one() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::DoubleSpikes, &mut rng);
        assert_eq!(m.warnings().len(), 5);
        for w in m.warnings() {
            assert!(w.rect.left() >= 50.0 && w.rect.left() < CANVAS_WIDTH - 50.0);
        }
        // Not yet mature after half the warning
        for _ in 0..30 {
            m.update(DT);
        }
        assert_eq!(m.warnings().len(), 5);
        assert!(m.attacks().is_empty());

        mature(&mut m);
        assert!(m.warnings().is_empty());
        assert_eq!(m.attacks().len(), 5);
        assert!(
            m.attacks()
                .iter()
                .all(|a| matches!(a, Attack::Spike { .. }))
        );
    }

    #[test]
    fn test_spike_hits_and_expires() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::Spikes, &mut rng);
        mature(&mut m);
        assert!(m.check_player_collision(&player_at(395.0)));
        assert!(!m.check_player_collision(&player_at(300.0)));

        // 5 seconds of attack, then gone
        for _ in 0..310 {
            m.update(DT);
        }
        assert!(m.attacks().is_empty());
        assert!(m.is_idle());
    }

    #[test]
    fn test_wall_collapses_to_target_gap() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::Wall, &mut rng);
        mature(&mut m);

        let mut last_gap = f32::MAX;
        for _ in 0..1000 {
            m.update(DT);
            let Attack::Wall { left, right, .. } = m.attacks()[0] else {
                panic!("expected wall");
            };
            let gap = right - left;
            assert!(gap <= last_gap);
            assert!(gap >= 200.0 - 1e-3, "gap undershot: {gap}");
            last_gap = gap;
        }
        assert!((last_gap - 200.0).abs() < 1e-3);
        // Walls never self-expire
        assert_eq!(m.attacks().len(), 1);
        assert!(!m.is_idle());
    }

    #[test]
    fn test_wall_collision_outside_gap() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::Wall, &mut rng);
        mature(&mut m);
        for _ in 0..1000 {
            m.update(DT);
        }
        // Gap is [300, 500]
        assert!(!m.check_player_collision(&player_at(390.0)));
        assert!(m.check_player_collision(&player_at(295.0)));
        assert!(m.check_player_collision(&player_at(490.0)));
    }

    #[test]
    fn test_moving_safe_band() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::MovingSafe, &mut rng);
        mature(&mut m);

        // Inside the band is safe, outside is deadly
        assert!(!m.check_player_collision(&player_at(100.0)));
        assert!(m.check_player_collision(&player_at(600.0)));
        // Partially outside counts as a hit
        assert!(m.check_player_collision(&player_at(395.0)));

        // Band moves right and expires when its leading edge leaves the canvas
        let mut frames = 0;
        while !m.attacks().is_empty() {
            m.update(DT);
            frames += 1;
            assert!(frames < 1000);
        }
        // 400 px at 2 px per frame
        assert!((199..=202).contains(&frames), "frames = {frames}");
    }

    #[test]
    fn test_giant_obstacle_falls_and_expires() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::GiantObstacle, &mut rng);
        let w = m.warnings()[0].clone();
        assert_eq!(w.rect.top(), -200.0);
        let cx = w.rect.center().x;
        assert!((200.0..=600.0).contains(&cx));

        mature(&mut m);
        let Attack::GiantObstacle { center, radius, .. } = m.attacks()[0] else {
            panic!("expected giant obstacle");
        };
        assert_eq!(radius, 200.0);
        assert!(center.y.abs() < 5.0);

        // Falls onto the player eventually
        let under = player_at(cx - 10.0);
        let mut hit = false;
        for _ in 0..400 {
            m.update(DT);
            hit |= m.check_player_collision(&under);
        }
        assert!(hit);

        while !m.attacks().is_empty() {
            m.update(DT);
        }
        assert!(m.is_idle());
    }

    #[test]
    fn test_double_obstacles_modifier() {
        let (mut m, mut rng) = machine();
        assert_eq!(m.spawn_rate_modifier(), 1.0);
        m.launch(AttackPattern::DoubleObstacles, &mut rng);
        assert!(m.warnings().is_empty());
        assert_eq!(m.spawn_rate_modifier(), 2.0);
        // Non-spatial: never collides
        assert!(!m.check_player_collision(&player_at(0.0)));

        for _ in 0..310 {
            m.update(DT);
        }
        assert_eq!(m.spawn_rate_modifier(), 1.0);
        assert!(m.is_idle());
    }

    #[test]
    fn test_gravity_is_a_flag() {
        let (mut m, mut rng) = machine();
        m.launch(AttackPattern::Gravity, &mut rng);
        assert!(m.is_idle());
        assert!(m.gravity_scheduled());
        assert!(!m.take_due_gravity(4.9));
        assert!(m.take_due_gravity(5.0));
        assert!(!m.take_due_gravity(6.0));
    }

    #[test]
    fn test_random_pattern_recorded_and_reset() {
        let (mut m, mut rng) = machine();
        for _ in 0..200 {
            let p = m.boss_attack(&mut rng);
            assert!(m.patterns_used().contains(&p));
        }
        assert_eq!(m.patterns_used().len(), 7);
        m.reset();
        assert!(m.is_idle());
        assert!(m.patterns_used().is_empty());
        assert!(!m.gravity_scheduled());
    }

    #[test]
    fn test_idle_iff_both_queues_empty() {
        let (mut m, mut rng) = machine();
        assert!(m.is_idle());
        m.launch(AttackPattern::Spikes, &mut rng);
        assert!(!m.is_idle());
        mature(&mut m);
        assert!(m.warnings().is_empty());
        assert!(!m.is_idle());
    }
}
