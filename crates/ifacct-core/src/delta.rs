//! Counter samples and wraparound-corrected deltas.
//!
//! Kernel interface counters are monotonic until they overflow. On 32-bit
//! platforms `/proc/net/dev` wraps at 2^32−1, which a busy link reaches in
//! well under an hour, so every decrease between two samples is read as a
//! single wrap of the counter.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Cumulative rx/tx byte counters observed at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub rx: u64,
    pub tx: u64,
}

impl Sample {
    pub fn new(rx: u64, tx: u64) -> Self {
        Self { rx, tx }
    }
}

/// Bytes transferred between two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub rx: u64,
    pub tx: u64,
}

impl Delta {
    /// True when neither direction moved.
    pub fn is_zero(&self) -> bool {
        self.rx == 0 && self.tx == 0
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rx={} tx={}", self.rx, self.tx)
    }
}

/// Width of the counters exposed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterWidth {
    Bits32,
    Bits64,
}

impl CounterWidth {
    /// Width of `unsigned long` on the build target, which is what procfs
    /// prints.
    pub fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }

    /// Largest value a counter of this width can hold.
    pub fn max(self) -> u64 {
        match self {
            Self::Bits32 => u64::from(u32::MAX),
            Self::Bits64 => u64::MAX,
        }
    }
}

impl Default for CounterWidth {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for CounterWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits32 => write!(f, "32"),
            Self::Bits64 => write!(f, "64"),
        }
    }
}

impl FromStr for CounterWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "32" => Ok(Self::Bits32),
            "64" => Ok(Self::Bits64),
            "native" => Ok(Self::native()),
            other => Err(format!("unknown counter width '{other}' (expected 32, 64 or native)")),
        }
    }
}

/// Delta of a single counter, treating any decrease as exactly one wrap.
///
/// A wrap counts the steps up to `counter_max`, the step back to zero and
/// then `current`: `max - 5` followed by `3` is 9 bytes.
///
/// `previous` can exceed `counter_max` when the configured width is
/// narrower than what the source reports; only `current` is counted then.
pub fn counter_delta(previous: u64, current: u64, counter_max: u64) -> u64 {
    if current >= previous {
        return current - previous;
    }
    match counter_max.checked_sub(previous) {
        // previous > current, so the sum is at most counter_max.
        Some(remaining) => remaining + current + 1,
        None => current,
    }
}

/// Per-direction delta between two samples.
pub fn delta(previous: Sample, current: Sample, counter_max: u64) -> Delta {
    Delta {
        rx: counter_delta(previous.rx, current.rx, counter_max),
        tx: counter_delta(previous.tx, current.tx, counter_max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX32: u64 = u32::MAX as u64;

    #[test]
    fn test_delta_no_wrap() {
        let d = delta(Sample::new(100, 2_000), Sample::new(350, 2_500), MAX32);
        assert_eq!(d, Delta { rx: 250, tx: 500 });
    }

    #[test]
    fn test_delta_equal_samples_is_zero() {
        let s = Sample::new(42, 42);
        let d = delta(s, s, MAX32);
        assert!(d.is_zero());
    }

    #[test]
    fn test_delta_wrap_32bit() {
        let prev = Sample::new(MAX32 - 5, 10);
        let cur = Sample::new(3, 10);
        let d = delta(prev, cur, MAX32);
        assert_eq!(d.rx, 9);
        assert_eq!(d.tx, 0);
    }

    #[test]
    fn test_delta_wrap_is_per_direction() {
        let prev = Sample::new(10, MAX32 - 1);
        let cur = Sample::new(20, 4);
        let d = delta(prev, cur, MAX32);
        assert_eq!(d, Delta { rx: 10, tx: 6 });
    }

    #[test]
    fn test_delta_wrap_64bit_does_not_overflow() {
        let d = counter_delta(u64::MAX, 0, u64::MAX);
        assert_eq!(d, 1);
        let d = counter_delta(u64::MAX - 1, u64::MAX - 2, u64::MAX);
        assert_eq!(d, u64::MAX);
    }

    #[test]
    fn test_delta_wrap_from_max_to_zero_is_one_step() {
        assert_eq!(counter_delta(MAX32, 0, MAX32), 1);
        assert_eq!(counter_delta(MAX32, 2, MAX32), 3);
    }

    #[test]
    fn test_delta_previous_above_width_saturates() {
        // A 64-bit reading against a 32-bit width cannot underflow.
        let d = counter_delta(MAX32 + 100, 7, MAX32);
        assert_eq!(d, 7);
    }

    #[test]
    fn test_counter_width_parse() {
        assert_eq!("32".parse::<CounterWidth>().unwrap(), CounterWidth::Bits32);
        assert_eq!("64".parse::<CounterWidth>().unwrap(), CounterWidth::Bits64);
        assert_eq!(
            "native".parse::<CounterWidth>().unwrap(),
            CounterWidth::native()
        );
        assert!("16".parse::<CounterWidth>().is_err());
    }

    #[test]
    fn test_counter_width_max() {
        assert_eq!(CounterWidth::Bits32.max(), 4_294_967_295);
        assert_eq!(CounterWidth::Bits64.max(), u64::MAX);
    }
}
