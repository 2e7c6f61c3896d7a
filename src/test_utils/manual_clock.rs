use std::cell::Cell;
use std::cell::RefCell;
use std::time::Duration;
use std::time::Instant;

use crate::Clock;

/// Virtual clock whose `sleep` advances time instantly.
///
/// Probes that borrow the clock can call `advance` to simulate their own cost.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(
        &self,
        by: Duration,
    ) {
        self.offset.set(self.offset.get() + by);
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn sleep(
        &self,
        duration: Duration,
    ) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}
