//! Time sources

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic millisecond clock used by the frame driver
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Real clock for the current platform
#[derive(Debug, Clone)]
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Wall clock in Unix milliseconds, used for timestamps rather than frame timing
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixClock;

impl Clock for UnixClock {
    fn now_ms(&self) -> f64 {
        unix_time_ms() as f64
    }
}

/// Hand-advanced clock for tests and scripted runs. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.0.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

/// Milliseconds since the Unix epoch
pub fn unix_time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
