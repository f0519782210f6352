//! Space Dodger entry point
//!
//! The native build is a headless runner: it plays sessions with a simple
//! autopilot, persists the profile to disk and logs each outcome. The browser
//! build enters through `space_dodger::web`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::env;
    use std::time::Duration;

    use space_dodger::consts::*;
    use space_dodger::driver::FrameDriver;
    use space_dodger::game::LeaderboardView;
    use space_dodger::leaderboard::{InMemoryLeaderboard, LeaderboardDispatcher};
    use space_dodger::persistence::Persistence;
    use space_dodger::platform::{self, FileStore, KeyValueStore, ManualClock, MemoryStore};
    use space_dodger::settings::Settings;
    use space_dodger::sim::{Attack, GameState, ObstacleKind, WarningKind};
    use space_dodger::{Game, Tuning};

    const DEFAULT_DATA_DIR: &str = ".space-dodger";
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Ten minutes of play per session at most
    const MAX_FRAMES: u64 = 60 * 60 * 10;
    const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

    fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn load_tuning() -> Tuning {
        let Ok(path) = env::var("SPACE_DODGER_TUNING") else {
            return Tuning::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {path}");
                    tuning
                }
                Err(e) => {
                    log::warn!("Ignoring tuning {path}: {e}");
                    Tuning::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read tuning {path}: {e}");
                Tuning::default()
            }
        }
    }

    fn open_store() -> Box<dyn KeyValueStore> {
        let dir = env::var("SPACE_DODGER_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
        match FileStore::open(&dir) {
            Ok(store) => {
                log::info!("Profile stored in {dir}");
                Box::new(store)
            }
            Err(e) => {
                log::warn!("Cannot open {dir} ({e}), profile will not be saved");
                Box::new(MemoryStore::new())
            }
        }
    }

    #[cfg(feature = "http-leaderboard")]
    fn leaderboard(settings: &Settings) -> LeaderboardDispatcher {
        use space_dodger::leaderboard::HttpLeaderboard;

        let url = env::var("SPACE_DODGER_LEADERBOARD_URL")
            .ok()
            .or_else(|| settings.leaderboard_url.clone());
        if let Some(url) = url {
            match HttpLeaderboard::new(&url) {
                Ok(service) => {
                    log::info!("Using leaderboard at {url}");
                    return LeaderboardDispatcher::threaded(service);
                }
                Err(e) => log::warn!("Leaderboard {url} unusable: {e}"),
            }
        }
        LeaderboardDispatcher::threaded(InMemoryLeaderboard::new())
    }

    #[cfg(not(feature = "http-leaderboard"))]
    fn leaderboard(settings: &Settings) -> LeaderboardDispatcher {
        if settings.leaderboard_url.is_some() {
            log::warn!("Built without http-leaderboard, using a local leaderboard");
        }
        LeaderboardDispatcher::threaded(InMemoryLeaderboard::new())
    }

    /// Danger of standing with the ship's left edge at `x`
    fn danger_at(state: &GameState, x: f32) -> f32 {
        let player = &state.player;
        let (left, right) = (x, x + player.size.x);
        let ground = player.pos.y;
        let mut danger = 0.0;

        for o in &state.obstacles {
            let r = &o.rect;
            let margin = 8.0;
            if r.bottom() < ground - 260.0 {
                continue;
            }
            let overlap = match o.kind {
                ObstacleKind::Giant { radius } => {
                    (r.center().x - (left + right) / 2.0).abs() < radius + margin
                }
                _ => r.left() < right + margin && r.right() > left - margin,
            };
            if overlap {
                // Closer obstacles matter more
                danger += 1.0 + (r.bottom() - (ground - 260.0)) / 26.0;
            }
        }

        for w in state.boss_attacks.warnings() {
            let blocked = match w.kind {
                WarningKind::Spike => w.rect.left() < right + 4.0 && w.rect.right() > left - 4.0,
                WarningKind::MovingSafe { .. } => left < w.rect.left() || right > w.rect.right(),
                WarningKind::GiantObstacle { .. } => {
                    w.rect.left() < right + 4.0 && w.rect.right() > left - 4.0
                }
                WarningKind::Wall => {
                    let mid = CANVAS_WIDTH / 2.0;
                    (left + right) / 2.0 < mid - 60.0 || (left + right) / 2.0 > mid + 60.0
                }
            };
            if blocked {
                danger += 20.0;
            }
        }

        for a in state.boss_attacks.attacks() {
            let blocked = match a {
                Attack::Spike { rect, .. } => rect.left() < right + 4.0 && rect.right() > left - 4.0,
                Attack::Wall { left: l, right: r, .. } => left < *l + 10.0 || right > *r - 10.0,
                Attack::MovingSafe { band, .. } => {
                    // Stay toward the leading edge of the band
                    left < band.left() + band.size.x * 0.4 || right > band.right() - 10.0
                }
                Attack::GiantObstacle { center, radius, .. } => {
                    (center.x - (left + right) / 2.0).abs() < radius + 10.0
                }
                Attack::DoubleObstacles { .. } => false,
            };
            if blocked {
                danger += 50.0;
            }
        }
        danger
    }

    /// Pointer x that steers the ship toward the least dangerous column
    fn autopilot(state: &GameState) -> f32 {
        let width = state.player.size.x;
        let current = state.player.pos.x;
        let mut best = (f32::MAX, current);
        let mut x = 0.0;
        while x <= CANVAS_WIDTH - width {
            let cost = danger_at(state, x) + (x - current).abs() * 0.002;
            if cost < best.0 {
                best = (cost, x);
            }
            x += 10.0;
        }
        best.1 + width / 2.0
    }

    pub fn run() {
        platform::init_logging();
        log::info!("Space Dodger (headless) starting...");

        let tuning = load_tuning();
        let seed = env_parse("SPACE_DODGER_SEED", platform::unix_time_ms() as u64);
        let games: u32 = env_parse("SPACE_DODGER_GAMES", 1);

        let persistence = Persistence::new(open_store());
        let settings = persistence.load_settings();
        let dispatcher = leaderboard(&settings);
        let mut game = Game::new(tuning, seed, persistence, dispatcher);
        if let Ok(name) = env::var("SPACE_DODGER_PLAYER") {
            game.set_player_name(&name);
        }
        log::info!("Seed {seed}, playing {games} game(s) as {}", game.player_name());

        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(clock.clone());
        let mut hud = |g: &Game| {
            log::trace!("level {} score {} lives {}", g.level(), g.score(), g.lives());
        };

        for round in 1..=games {
            game.start();
            driver.start();
            let mut frames = 0;
            while frames < MAX_FRAMES {
                let target = autopilot(game.state());
                let y = game.state().player.center().y;
                game.set_pointer(target, y);
                if !driver.frame(&mut game, &mut hud) {
                    break;
                }
                clock.advance(FRAME_MS);
                frames += 1;
            }
            if driver.is_running() {
                log::warn!("Session {round} hit the frame cap, abandoning it");
                driver.stop();
                game.return_to_menu();
                continue;
            }
            if game.settings().submit_scores && !game.wait_for_leaderboard(REPLY_TIMEOUT) {
                log::warn!("No leaderboard reply for game {round}");
            }

            if let Some(summary) = game.summary() {
                log::info!(
                    "Game {round}: score {} level {} (high score {}{}){}",
                    summary.score,
                    summary.level,
                    summary.high_score,
                    if summary.new_high_score { ", new!" } else { "" },
                    summary
                        .leaderboard_rank
                        .map(|r| format!(", global rank #{r}"))
                        .unwrap_or_default()
                );
            }
            for id in game.take_unlocked() {
                log::info!("{} {}", id.icon(), id.name());
            }
        }

        game.show_leaderboard();
        game.wait_for_leaderboard(REPLY_TIMEOUT);
        match game.leaderboard_view() {
            LeaderboardView::Entries(entries) => {
                for (i, e) in entries.iter().take(5).enumerate() {
                    log::info!("{}. {} - {} pts (level {})", i + 1, e.player_name, e.score, e.level);
                }
            }
            LeaderboardView::Unavailable => log::warn!("Leaderboard unavailable"),
            _ => {}
        }

        let m = game.metrics();
        log::info!(
            "Lifetime: {} games, avg score {:.0}, avg level {:.1}, {} achievements",
            m.total_games_played,
            m.average_score,
            m.average_level,
            game.achievements().unlocked_count()
        );
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use space_dodger::sim::Obstacle;

        fn quiet_state() -> GameState {
            let mut tuning = Tuning::default();
            tuning.obstacle.spawn_rate = 0.0;
            tuning.power_ups.spawn_rate = 0.0;
            let mut state = GameState::new(1, tuning);
            state.start();
            state
        }

        #[test]
        fn test_autopilot_sidesteps_falling_block() {
            let mut state = quiet_state();
            let player = state.player.rect();
            let block = Obstacle::new(
                ObstacleKind::Block,
                player.left(),
                player.top() - 100.0,
                glam::Vec2::splat(player.size.x),
                5.0,
            );
            let block_rect = block.rect;
            state.spawn_obstacle(block);

            let target = autopilot(&state);
            let left = target - player.size.x / 2.0;
            let right = left + player.size.x;
            assert!(right <= block_rect.left() || left >= block_rect.right());
        }

        #[test]
        fn test_autopilot_stays_put_when_clear() {
            let state = quiet_state();
            let target = autopilot(&state);
            assert!((target - state.player.center().x).abs() <= 10.0);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // `space_dodger::web::wasm_main` runs on module load
}
