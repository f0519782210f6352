//! Browser entry point
//!
//! The page owns the canvas and its event listeners. It builds one
//! [`WebGame`], forwards pointer moves and button presses to it, calls
//! `frame()` from `requestAnimationFrame` and draws the JSON `snapshot()`.

use wasm_bindgen::prelude::*;

use crate::driver::FrameDriver;
use crate::game::Game;
use crate::leaderboard::{InMemoryLeaderboard, LeaderboardDispatcher};
use crate::persistence::Persistence;
use crate::platform::{self, KeyValueStore, LocalStorage, MemoryStore, SystemClock};
use crate::tuning::Tuning;
use crate::view::Snapshot;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    platform::init_logging();
    log::info!("Space Dodger (web) starting...");
}

fn open_store() -> Box<dyn KeyValueStore> {
    match LocalStorage::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("localStorage unavailable ({e}), profile will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

/// Game handle exported to JavaScript
#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    driver: FrameDriver<SystemClock>,
}

#[wasm_bindgen]
impl WebGame {
    /// Pass a tuning table as JSON, or nothing for the default balance
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> WebGame {
        let tuning = match tuning_json.as_deref().map(str::trim) {
            None | Some("") => Tuning::default(),
            Some(json) => Tuning::from_json(json).unwrap_or_else(|e| {
                log::warn!("Ignoring tuning: {e}");
                Tuning::default()
            }),
        };
        let seed = js_sys::Date::now() as u64;
        let game = Game::new(
            tuning,
            seed,
            Persistence::new(open_store()),
            LeaderboardDispatcher::inline(InMemoryLeaderboard::new()),
        );
        WebGame {
            game,
            driver: FrameDriver::new(SystemClock::new()),
        }
    }

    pub fn start(&mut self) {
        self.game.start();
        self.driver.start();
    }

    pub fn restart(&mut self) {
        self.game.restart();
        self.driver.start();
    }

    #[wasm_bindgen(js_name = returnToMenu)]
    pub fn return_to_menu(&mut self) {
        self.driver.stop();
        self.game.return_to_menu();
    }

    #[wasm_bindgen(js_name = resetAll)]
    pub fn reset_all(&mut self) {
        self.driver.stop();
        self.game.reset_all();
    }

    /// Pointer position in canvas coordinates
    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.game.set_pointer(x, y);
    }

    #[wasm_bindgen(js_name = setPlayerName)]
    pub fn set_player_name(&mut self, name: &str) {
        self.game.set_player_name(name);
    }

    #[wasm_bindgen(js_name = showLeaderboard)]
    pub fn show_leaderboard(&mut self) {
        self.game.show_leaderboard();
    }

    /// Run one frame. Returns false once no session is running; leaderboard
    /// replies keep merging either way.
    pub fn frame(&mut self) -> bool {
        if !self.driver.is_running() {
            self.game.poll_leaderboard();
            return false;
        }
        self.driver.frame(&mut self.game, &mut |_: &Game| {})
    }

    /// The current frame as JSON
    pub fn snapshot(&self) -> String {
        Snapshot::of(&self.game).to_json().unwrap_or_else(|e| {
            log::warn!("Snapshot failed: {e}");
            String::from("{}")
        })
    }

    /// Names of achievements unlocked since the last call, as a JSON array
    #[wasm_bindgen(js_name = takeUnlocked)]
    pub fn take_unlocked(&mut self) -> String {
        let names: Vec<String> = self
            .game
            .take_unlocked()
            .into_iter()
            .map(|id| format!("{} {}", id.icon(), id.name()))
            .collect();
        serde_json::to_string(&names).unwrap_or_else(|_| String::from("[]"))
    }
}
