//! Owned frame loop
//!
//! [`FrameDriver`] turns clock readings into clamped frame deltas and calls
//! `Game::update` then the renderer once per frame. It stops itself when the
//! session leaves `Playing`.

use crate::clamp_frame_dt;
use crate::game::Game;
use crate::platform::Clock;
use crate::sim::GamePhase;

/// Presentation hook called after every frame
pub trait Renderer {
    fn render(&mut self, game: &Game);
}

impl<F: FnMut(&Game)> Renderer for F {
    fn render(&mut self, game: &Game) {
        self(game)
    }
}

/// Drives a [`Game`] from a clock
#[derive(Debug)]
pub struct FrameDriver<C: Clock> {
    clock: C,
    last_ms: Option<f64>,
    running: bool,
    frames: u64,
    skipped: u64,
}

impl<C: Clock> FrameDriver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_ms: None,
            running: false,
            frames: 0,
            skipped: 0,
        }
    }

    /// Start the loop; the first frame measures from now
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.last_ms = now.is_finite().then_some(now);
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames that advanced the game
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames skipped for an unusable delta
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one frame. Returns whether the loop should keep going.
    pub fn frame(&mut self, game: &mut Game, renderer: &mut impl Renderer) -> bool {
        if !self.running {
            return false;
        }

        let now = self.clock.now_ms();
        let dt = match (self.last_ms, now.is_finite()) {
            (Some(last), true) => clamp_frame_dt(((now - last) / 1000.0) as f32),
            _ => None,
        };
        if now.is_finite() {
            self.last_ms = Some(now);
        }

        match dt {
            Some(dt) => {
                game.update(dt);
                self.frames += 1;
            }
            None => {
                self.skipped += 1;
                log::trace!("Skipping frame with unusable delta");
            }
        }
        renderer.render(game);

        if game.phase() != GamePhase::Playing {
            log::debug!("Frame loop stopping after {} frames", self.frames);
            self.running = false;
        }
        self.running
    }

    /// Run frames until the loop stops or `max_frames` have been attempted,
    /// calling `pace` between frames (sleep, advance a manual clock, ...)
    pub fn run(
        &mut self,
        game: &mut Game,
        renderer: &mut impl Renderer,
        max_frames: u64,
        mut pace: impl FnMut(),
    ) {
        for _ in 0..max_frames {
            if !self.frame(game, renderer) {
                break;
            }
            pace();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardDispatcher;
    use crate::persistence::Persistence;
    use crate::platform::{ManualClock, MemoryStore};
    use crate::tuning::Tuning;

    fn game() -> Game {
        let mut tuning = Tuning::default();
        tuning.obstacle.spawn_rate = 0.0;
        tuning.power_ups.spawn_rate = 0.0;
        Game::new(
            tuning,
            3,
            Persistence::new(MemoryStore::new()),
            LeaderboardDispatcher::offline(),
        )
    }

    #[test]
    fn test_frames_use_clamped_delta() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(clock.clone());
        let mut game = game();
        game.start();
        driver.start();

        clock.advance(16.0);
        assert!(driver.frame(&mut game, &mut |_: &Game| {}));
        assert_eq!(game.state().elapsed_us, 16_000);

        // A long stall advances at most one clamped slice
        clock.advance(5_000.0);
        driver.frame(&mut game, &mut |_: &Game| {});
        assert_eq!(game.state().elapsed_us, 16_000 + 33_333);
    }

    #[test]
    fn test_bad_deltas_skip() {
        let clock = ManualClock::new(100.0);
        let mut driver = FrameDriver::new(clock.clone());
        let mut game = game();
        game.start();
        driver.start();

        // Same timestamp and a clock going backwards
        driver.frame(&mut game, &mut |_: &Game| {});
        clock.set(50.0);
        driver.frame(&mut game, &mut |_: &Game| {});
        clock.set(f64::NAN);
        driver.frame(&mut game, &mut |_: &Game| {});
        assert_eq!(driver.skipped(), 3);
        assert_eq!(game.state().elapsed_us, 0);

        clock.set(66.0);
        driver.frame(&mut game, &mut |_: &Game| {});
        assert_eq!(game.state().elapsed_us, 16_000);
    }

    #[test]
    fn test_stops_when_not_playing() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(clock.clone());
        let mut game = game();
        driver.start();
        let mut rendered = 0;
        // Game still in the menu: one frame, then stop
        let keep_going = driver.frame(&mut game, &mut |_: &Game| rendered += 1);
        assert!(!keep_going);
        assert!(!driver.is_running());
        assert_eq!(rendered, 1);
        assert!(!driver.frame(&mut game, &mut |_: &Game| rendered += 1));
        assert_eq!(rendered, 1);
    }

    #[test]
    fn test_run_paces_frames() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(clock.clone());
        let mut game = game();
        game.start();
        driver.start();
        let pacer = clock.clone();
        driver.run(&mut game, &mut |_: &Game| {}, 60, || pacer.advance(1000.0 / 60.0));
        // First frame has a zero delta
        assert_eq!(driver.frames(), 59);
        assert!(game.state().elapsed_us > 950_000);
    }
}
