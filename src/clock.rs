use chrono::Timelike;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::logging::CLOCK_NAMESPACE;
use log::{debug, trace};

#[cfg(feature = "mock_clock")]
pub mod mock;

pub const SECONDS_IN_DAY: u32 = 86_400;
const NANOS_IN_DAY: u64 = SECONDS_IN_DAY as u64 * 1_000_000_000;

/// Resync at least this often, whatever the configuration asks for.
pub const MAX_RESYNC_INTERVAL: u32 = 64;

/// Number of ticks a day is divided into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum TickPeriod {
    /// 65536 ticks per day, so a full day fills all 16 bits.
    #[default]
    Full,
    /// 65535 ticks per day; the counter never reaches `0xFFFF`.
    Short,
}

impl TickPeriod {
    pub fn ticks_per_day(self) -> u32 {
        match self {
            TickPeriod::Full => 65_536,
            TickPeriod::Short => 65_535,
        }
    }

    pub fn max_value(self) -> u16 {
        (self.ticks_per_day() - 1) as u16
    }
}

impl TryFrom<u32> for TickPeriod {
    type Error = String;

    fn try_from(ticks: u32) -> Result<Self, Self::Error> {
        match ticks {
            65_536 => Ok(TickPeriod::Full),
            65_535 => Ok(TickPeriod::Short),
            other => Err(format!("tick_period must be 65536 or 65535, got {}", other)),
        }
    }
}

/// Local wall-clock time, whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Returns `None` outside 00:00:00..=23:59:59.
    pub fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(Self { hour, minute, second })
    }

    /// Wraps at the day boundary.
    pub fn from_seconds(seconds: u32) -> Self {
        let seconds = seconds % SECONDS_IN_DAY;
        Self {
            hour: (seconds / 3600) as u8,
            minute: (seconds / 60 % 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    pub fn seconds_since_midnight(&self) -> u32 {
        self.second as u32 + self.minute as u32 * 60 + self.hour as u32 * 3600
    }
}

/// Supplies the local time of day on demand.
pub trait WallClock: Send {
    fn now(&self) -> TimeOfDay;
}

/// Local time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> TimeOfDay {
        let now = chrono::Local::now();
        TimeOfDay {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
        }
    }
}

/// A wall clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct FixedClock(Arc<AtomicU32>);

impl FixedClock {
    pub fn at(seconds_since_midnight: u32) -> Self {
        Self(Arc::new(AtomicU32::new(seconds_since_midnight % SECONDS_IN_DAY)))
    }

    pub fn set(&self, seconds_since_midnight: u32) {
        self.0.store(seconds_since_midnight % SECONDS_IN_DAY, Ordering::SeqCst);
    }

    pub fn seconds(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> TimeOfDay {
        TimeOfDay::from_seconds(self.seconds())
    }
}

/// Maps a time of day onto the 16-bit tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEncoder {
    period: TickPeriod,
    tick_length: Duration,
}

impl TimeEncoder {
    pub fn new(period: TickPeriod) -> Self {
        Self {
            period,
            tick_length: Duration::from_nanos(NANOS_IN_DAY / period.ticks_per_day() as u64),
        }
    }

    pub fn period(&self) -> TickPeriod {
        self.period
    }

    /// Interval between two counter steps. Both the scheduler and the
    /// encoder read this one value.
    pub fn tick_length(&self) -> Duration {
        self.tick_length
    }

    pub fn tick_length_millis(&self) -> f64 {
        SECONDS_IN_DAY as f64 / self.period.ticks_per_day() as f64 * 1000.0
    }

    /// `floor(seconds_since_midnight / tick_seconds) mod period`.
    ///
    /// Evaluated as `seconds * period / 86400` in integers, which is the
    /// same quotient without floating point rounding.
    pub fn encode(&self, hour: u8, minute: u8, second: u8) -> u16 {
        let seconds = second as u64 + minute as u64 * 60 + hour as u64 * 3600;
        let ticks = self.period.ticks_per_day() as u64;
        (seconds * ticks / SECONDS_IN_DAY as u64 % ticks) as u16
    }

    pub fn encode_time(&self, time: TimeOfDay) -> u16 {
        self.encode(time.hour, time.minute, time.second)
    }

    /// Next counter value, wrapping at the period.
    pub fn increment(&self, value: u16) -> u16 {
        ((value as u32 + 1) % self.period.ticks_per_day()) as u16
    }
}

impl Default for TimeEncoder {
    fn default() -> Self {
        Self::new(TickPeriod::default())
    }
}

/// The live clock value: incremented once per tick and recomputed from the
/// wall clock every `resync_interval` ticks.
#[derive(Debug, Clone)]
pub struct ClockCounter {
    encoder: TimeEncoder,
    value: u16,
    ticks_since_resync: u32,
    resync_interval: u32,
    synced: bool,
}

impl ClockCounter {
    /// `resync_interval` is clamped to `1..=MAX_RESYNC_INTERVAL`.
    pub fn new(encoder: TimeEncoder, resync_interval: u32) -> Self {
        Self {
            encoder,
            value: 0,
            ticks_since_resync: 0,
            resync_interval: resync_interval.clamp(1, MAX_RESYNC_INTERVAL),
            synced: false,
        }
    }

    pub fn encoder(&self) -> &TimeEncoder {
        &self.encoder
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn ticks_since_resync(&self) -> u32 {
        self.ticks_since_resync
    }

    pub fn resync_interval(&self) -> u32 {
        self.resync_interval
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn resync(&mut self, clock: &dyn WallClock) -> u16 {
        let now = clock.now();
        self.value = self.encoder.encode_time(now);
        self.ticks_since_resync = 0;
        self.synced = true;
        debug!(
            target: CLOCK_NAMESPACE,
            "Resynced to {:02}:{:02}:{:02} -> {} ({:016b})",
            now.hour, now.minute, now.second, self.value, self.value
        );
        self.value
    }

    /// Advances by one tick. The first call after construction always reads
    /// the wall clock.
    pub fn advance(&mut self, clock: &dyn WallClock) -> u16 {
        if !self.synced || self.ticks_since_resync + 1 >= self.resync_interval {
            return self.resync(clock);
        }
        self.value = self.encoder.increment(self.value);
        self.ticks_since_resync += 1;
        trace!(target: CLOCK_NAMESPACE, "Tick -> {}", self.value);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_encodes_to_zero() {
        let encoder = TimeEncoder::default();
        assert_eq!(encoder.encode(0, 0, 0), 0);
        assert_eq!(TimeEncoder::new(TickPeriod::Short).encode(0, 0, 0), 0);
    }

    #[test]
    fn tick_length_matches_day_fraction() {
        let full = TimeEncoder::new(TickPeriod::Full);
        assert_eq!(full.tick_length(), Duration::from_nanos(1_318_359_375));
        assert!((full.tick_length_millis() - 1318.359375).abs() < 1e-9);

        let short = TimeEncoder::new(TickPeriod::Short);
        assert!(short.tick_length() > full.tick_length());
    }

    #[test]
    fn encode_matches_floating_formula() {
        let encoder = TimeEncoder::default();
        let tick_seconds = encoder.tick_length_millis() / 1000.0;
        for seconds in (0..SECONDS_IN_DAY).step_by(997) {
            let t = TimeOfDay::from_seconds(seconds);
            let expected = (seconds as f64 / tick_seconds).floor() as u32 % 65_536;
            assert_eq!(encoder.encode_time(t) as u32, expected, "at {}s", seconds);
        }
    }

    #[test]
    fn whole_day_is_monotonic_and_in_range() {
        for period in [TickPeriod::Full, TickPeriod::Short] {
            let encoder = TimeEncoder::new(period);
            let mut previous = 0u16;
            for seconds in 0..SECONDS_IN_DAY {
                let value = encoder.encode_time(TimeOfDay::from_seconds(seconds));
                assert!(value >= previous, "decreased at {}s", seconds);
                assert!(value <= period.max_value());
                previous = value;
            }
            // the day boundary is the single wrap back to zero
            assert_eq!(encoder.encode_time(TimeOfDay::from_seconds(SECONDS_IN_DAY)), 0);
        }
    }

    #[test]
    fn last_second_of_day_is_near_max() {
        assert_eq!(TimeEncoder::new(TickPeriod::Full).encode(23, 59, 59), 65_535);
        assert_eq!(TimeEncoder::new(TickPeriod::Short).encode(23, 59, 59), 65_534);
    }

    #[test]
    fn increment_wraps_at_period() {
        assert_eq!(TimeEncoder::new(TickPeriod::Full).increment(65_535), 0);
        assert_eq!(TimeEncoder::new(TickPeriod::Short).increment(65_534), 0);
        assert_eq!(TimeEncoder::new(TickPeriod::Short).increment(41), 42);
    }

    #[test]
    fn period_from_config_value() {
        assert_eq!(TickPeriod::try_from(65_536), Ok(TickPeriod::Full));
        assert_eq!(TickPeriod::try_from(65_535), Ok(TickPeriod::Short));
        assert!(TickPeriod::try_from(60).is_err());
    }

    #[test]
    fn time_of_day_rejects_out_of_range() {
        assert!(TimeOfDay::new(24, 0, 0).is_none());
        assert!(TimeOfDay::new(0, 60, 0).is_none());
        assert_eq!(TimeOfDay::new(12, 0, 0).map(|t| t.seconds_since_midnight()), Some(43_200));
    }

    #[test]
    fn first_advance_resyncs() {
        let clock = FixedClock::at(43_199);
        let mut counter = ClockCounter::new(TimeEncoder::default(), 64);
        assert_eq!(counter.advance(&clock), 32_767);
        assert_eq!(counter.ticks_since_resync(), 0);
    }

    #[test]
    fn resyncs_every_interval() {
        let clock = FixedClock::at(1_000);
        let mut counter = ClockCounter::new(TimeEncoder::default(), 4);
        let start = counter.advance(&clock);
        assert_eq!(counter.advance(&clock), start + 1);
        assert_eq!(counter.advance(&clock), start + 2);
        assert_eq!(counter.advance(&clock), start + 3);
        // fourth tick since the resync reads the (frozen) wall clock again
        assert_eq!(counter.advance(&clock), start);
        assert_eq!(counter.ticks_since_resync(), 0);
    }

    #[test]
    fn resync_interval_is_bounded() {
        let encoder = TimeEncoder::default();
        assert_eq!(ClockCounter::new(encoder, 0).resync_interval(), 1);
        assert_eq!(ClockCounter::new(encoder, 1_000).resync_interval(), 64);
    }

    #[test]
    fn increments_stay_within_one_tick_of_wall_clock() {
        let encoder = TimeEncoder::default();
        let tick = encoder.tick_length_millis() / 1000.0;
        for start in [0u32, 777, 43_200, 86_000] {
            let clock = FixedClock::at(start);
            let mut counter = ClockCounter::new(encoder, 64);
            counter.advance(&clock);
            for k in 1..=63u32 {
                let elapsed = (start as f64 + k as f64 * tick).floor() as u32;
                clock.set(elapsed);
                let incremented = counter.advance(&clock) as i64;
                let fresh = encoder.encode_time(clock.now()) as i64;
                let diff = (incremented - fresh).rem_euclid(65_536);
                assert!(diff <= 1 || diff == 65_535, "k={} start={}", k, start);
            }
        }
    }

    #[test]
    fn counter_wraps_across_midnight() {
        let clock = FixedClock::at(SECONDS_IN_DAY - 1);
        let mut counter = ClockCounter::new(TimeEncoder::default(), 64);
        assert_eq!(counter.advance(&clock), 65_535);
        assert_eq!(counter.advance(&clock), 0);
    }
}
