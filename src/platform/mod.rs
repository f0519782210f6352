//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Wall-clock time
//! - Key-value storage (LocalStorage on web, files on native)

pub mod storage;
pub mod time;

pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use time::{Clock, ManualClock, SystemClock, UnixClock, unix_time_ms};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;

/// Install the platform logger. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Install the console logger and panic hook. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
