//! Game session handle
//!
//! [`Game`] owns the simulation and its collaborators. Presentation calls
//! `start`, `restart`, `return_to_menu` and `reset_all` on it, feeds pointer
//! input, and drives `update(dt)` once per frame. Game-over side effects
//! (metrics, high score, achievements, leaderboard submission) happen here,
//! never inside the simulation.

use glam::Vec2;

use crate::achievements::{AchievementBook, AchievementId, AchievementSnapshot, is_perfect_run};
use crate::leaderboard::{
    Epochs, LeaderboardDispatcher, LeaderboardEntry, LeaderboardReply, LeaderboardRequest,
    LeaderboardResponse, PlayerBest,
};
use crate::persistence::{Metrics, Persistence};
use crate::platform::{Clock, UnixClock};
use crate::settings::Settings;
use crate::sim::{FrameEvent, GamePhase, GameState, TickInput, tick};
use crate::tuning::Tuning;

/// Everything the game-over screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverSummary {
    pub score: u64,
    pub level: u32,
    /// High score after this game
    pub high_score: u64,
    pub previous_high_score: u64,
    pub new_high_score: bool,
    pub perfect_run: bool,
    /// Global rank, once the submission has been answered
    pub leaderboard_rank: Option<u32>,
}

/// State of the leaderboard panel
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LeaderboardView {
    #[default]
    Hidden,
    Loading,
    Unavailable,
    Entries(Vec<LeaderboardEntry>),
}

/// A game session and its collaborators
pub struct Game {
    state: GameState,
    input: TickInput,
    settings: Settings,
    persistence: Persistence,
    leaderboard: LeaderboardDispatcher,
    wall_clock: Box<dyn Clock>,
    high_score: u64,
    metrics: Metrics,
    achievements: AchievementBook,
    player_name: String,
    epochs: Epochs,
    summary: Option<GameOverSummary>,
    leaderboard_view: LeaderboardView,
    player_best: Option<PlayerBest>,
    /// Unlocks not yet shown to the player
    unlocked: Vec<AchievementId>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.state.phase)
            .field("score", &self.state.score)
            .field("epochs", &self.epochs)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Load lifetime data and sit in the menu
    pub fn new(
        tuning: Tuning,
        seed: u64,
        persistence: Persistence,
        leaderboard: LeaderboardDispatcher,
    ) -> Self {
        let settings = persistence.load_settings();
        let high_score = persistence.load_high_score();
        let metrics = persistence.load_metrics();
        let achievements = persistence.load_achievements();
        let player_name = persistence.load_player_name();
        log::info!(
            "Loaded profile: high score {high_score}, {} games, {} achievements",
            metrics.total_games_played,
            achievements.unlocked_count()
        );
        Self {
            state: GameState::new(seed, tuning),
            input: TickInput::default(),
            settings,
            persistence,
            leaderboard,
            wall_clock: Box::new(UnixClock),
            high_score,
            metrics,
            achievements,
            player_name,
            epochs: Epochs::default(),
            summary: None,
            leaderboard_view: LeaderboardView::Hidden,
            player_best: None,
            unlocked: Vec::new(),
        }
    }

    /// Replace the wall clock used for metrics and unlock timestamps
    pub fn with_wall_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.wall_clock = Box::new(clock);
        self
    }

    fn now_ms(&self) -> i64 {
        let now = self.wall_clock.now_ms();
        if now.is_finite() { now as i64 } else { 0 }
    }

    // === Phase transitions ===

    /// Begin a fresh session from any phase
    pub fn start(&mut self) {
        self.epochs.session += 1;
        self.summary = None;
        self.leaderboard_view = LeaderboardView::Hidden;
        let now = self.now_ms();
        self.metrics.begin_game(now);
        self.state.start();
    }

    /// Start again after a game over
    pub fn restart(&mut self) {
        log::info!("Restarting");
        self.start();
    }

    /// Abandon any session and show the menu
    pub fn return_to_menu(&mut self) {
        self.epochs.session += 1;
        self.summary = None;
        self.leaderboard_view = LeaderboardView::Hidden;
        self.player_best = None;
        self.state.enter_menu();
    }

    /// Wipe lifetime data and return to the menu
    pub fn reset_all(&mut self) {
        self.epochs.profile += 1;
        self.return_to_menu();
        self.persistence.reset_all();
        self.high_score = 0;
        self.metrics = Metrics::default();
        self.achievements = AchievementBook::default();
        self.player_name = self.persistence.load_player_name();
        self.unlocked.clear();
    }

    // === Input ===

    /// Latest pointer position in canvas coordinates
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.input.pointer = Some(Vec2::new(x, y));
    }

    pub fn set_player_name(&mut self, raw: &str) {
        self.player_name = self.persistence.save_player_name(raw);
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.persistence.save_settings(&settings);
        self.settings = settings;
    }

    // === Frame ===

    /// Advance one frame: merge leaderboard replies, tick, handle events
    pub fn update(&mut self, dt: f32) {
        self.poll_leaderboard();
        tick(&mut self.state, &self.input, dt);

        let mut check = false;
        for event in self.state.take_events() {
            match event {
                FrameEvent::ScoreChanged { .. }
                | FrameEvent::PowerUpCollected { .. }
                | FrameEvent::BossResolved { .. }
                | FrameEvent::ShieldAbsorbed { saved_life: true } => check = true,
                FrameEvent::GameOver { score, level } => self.finish_game(score, level),
                _ => {}
            }
        }
        if check {
            self.check_achievements();
        }
    }

    fn check_achievements(&mut self) {
        let now = self.now_ms();
        let snapshot = AchievementSnapshot {
            score: self.state.score,
            session: &self.state.stats,
            lifetime: &self.metrics,
        };
        let newly = self.achievements.evaluate(&snapshot, now);
        if !newly.is_empty() {
            self.persistence.save_achievements(&self.achievements);
            self.unlocked.extend(newly);
        }
    }

    fn unlock(&mut self, id: AchievementId) {
        let now = self.now_ms();
        if self.achievements.unlock(id, now) {
            self.persistence.save_achievements(&self.achievements);
            self.unlocked.push(id);
        }
    }

    /// Game-over side effects, run once per session
    fn finish_game(&mut self, score: u64, level: u32) {
        let now = self.now_ms();
        self.metrics.record_game(score, level, now);
        self.persistence.save_metrics(&self.metrics);
        self.check_achievements();

        let perfect_run = is_perfect_run(score);
        if perfect_run {
            self.unlock(AchievementId::PerfectRun);
        }

        let previous_high_score = self.high_score;
        let new_high_score = score > previous_high_score;
        if new_high_score {
            self.high_score = score;
            self.persistence.save_high_score(score);
            log::info!("New high score: {score} (previous {previous_high_score})");
        }

        if self.settings.submit_scores {
            self.leaderboard.request(
                self.epochs,
                LeaderboardRequest::Submit {
                    player_name: self.player_name.clone(),
                    score,
                    level,
                },
            );
        }

        self.summary = Some(GameOverSummary {
            score,
            level,
            high_score: self.high_score,
            previous_high_score,
            new_high_score,
            perfect_run,
            leaderboard_rank: None,
        });
    }

    // === Leaderboard ===

    /// Ask for the top entries; the view shows `Loading` until they arrive
    pub fn show_leaderboard(&mut self) {
        self.leaderboard_view = LeaderboardView::Loading;
        let limit = self.settings.effective_leaderboard_limit();
        self.leaderboard
            .request(self.epochs, LeaderboardRequest::Fetch { limit });
    }

    /// Ask for the current player's best entry
    pub fn request_player_best(&mut self) {
        self.leaderboard.request(
            self.epochs,
            LeaderboardRequest::PlayerBest {
                player_name: self.player_name.clone(),
            },
        );
    }

    /// Merge every ready leaderboard reply. Called by `update`; presentation
    /// may call it directly while no session is running.
    pub fn poll_leaderboard(&mut self) {
        for reply in self.leaderboard.poll() {
            self.apply_reply(reply);
        }
    }

    /// Block until one leaderboard reply arrives (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait_for_leaderboard(&mut self, timeout: std::time::Duration) -> bool {
        match self.leaderboard.wait(timeout) {
            Some(reply) => {
                self.apply_reply(reply);
                true
            }
            None => false,
        }
    }

    fn apply_reply(&mut self, reply: LeaderboardReply) {
        let same_profile = reply.epochs.profile == self.epochs.profile;
        let same_session = reply.epochs == self.epochs;
        if !same_session {
            log::debug!("Stale leaderboard reply for {:?}", reply.epochs);
        }

        match reply.result {
            Ok(LeaderboardResponse::Submitted(outcome)) => {
                if same_profile {
                    self.unlock(AchievementId::LeaderboardRanked);
                    if outcome.rank == 1 {
                        self.unlock(AchievementId::LeaderboardTop1);
                    }
                }
                if same_session {
                    if let Some(summary) = self.summary.as_mut() {
                        summary.leaderboard_rank = Some(outcome.rank);
                    }
                }
            }
            Ok(LeaderboardResponse::Entries(entries)) => {
                if same_session {
                    self.leaderboard_view = LeaderboardView::Entries(entries);
                }
            }
            Ok(LeaderboardResponse::PlayerBest(best)) => {
                if same_session {
                    self.player_best = best;
                }
            }
            Err(_) => {
                if same_session && matches!(reply.request, LeaderboardRequest::Fetch { .. }) {
                    self.leaderboard_view = LeaderboardView::Unavailable;
                }
            }
        }
    }

    // === Accessors ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn lives(&self) -> u32 {
        self.state.lives
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn achievements(&self) -> &AchievementBook {
        &self.achievements
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn epochs(&self) -> Epochs {
        self.epochs
    }

    pub fn summary(&self) -> Option<&GameOverSummary> {
        self.summary.as_ref()
    }

    pub fn leaderboard_view(&self) -> &LeaderboardView {
        &self.leaderboard_view
    }

    pub fn player_best(&self) -> Option<&PlayerBest> {
        self.player_best.as_ref()
    }

    /// Drain achievements unlocked since the last call, for notifications
    pub fn take_unlocked(&mut self) -> Vec<AchievementId> {
        std::mem::take(&mut self.unlocked)
    }

    /// Camera offset to apply this frame, zero if shake is disabled
    pub fn shake_offset(&self) -> Vec2 {
        if self.settings.effective_screen_shake() {
            self.state.effects.screen_shake.offset
        } else {
            Vec2::ZERO
        }
    }

    /// Whether the level-up flash should be drawn
    pub fn level_flash_active(&self) -> bool {
        self.settings.effective_level_flash() && self.state.effects.level_flash_timer > 0.0
    }

    /// Direct state access for scripted scenarios
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}
