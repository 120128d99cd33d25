use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use super::{SECONDS_IN_DAY, TimeOfDay, WallClock};
use crate::clock_log;

/// Simulated wall clock for demos: starts at a random time of day and runs
/// `speedup` times faster than real time.
pub struct MockClock {
    start_seconds: u32,
    started: Instant,
    speedup: u32,
}

impl MockClock {
    pub fn new(speedup: u32) -> Self {
        let mut rng = SmallRng::from_entropy();
        let start_seconds = rng.gen_range(0..SECONDS_IN_DAY);
        clock_log!(
            log::Level::Info,
            "Mock clock starting at {}s past midnight, {}x speed",
            start_seconds, speedup
        );
        Self {
            start_seconds,
            started: Instant::now(),
            speedup: speedup.max(1),
        }
    }
}

impl WallClock for MockClock {
    fn now(&self) -> TimeOfDay {
        let elapsed = self.started.elapsed().as_secs() * self.speedup as u64;
        let seconds = (self.start_seconds as u64 + elapsed) % SECONDS_IN_DAY as u64;
        TimeOfDay::from_seconds(seconds as u32)
    }
}
