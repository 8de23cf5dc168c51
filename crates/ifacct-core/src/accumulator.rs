//! The daemon control loop: sample, compute, commit, repeat.
//!
//! Each tick walks `Idle → Sampling → Computing → Committing → Idle`.
//! Shutdown is only honored at the `Idle → Sampling` boundary, so a tick
//! that has started always finishes and a commit is never torn.
//!
//! Traffic is attributed to the local date read at commit time, not at
//! sample time. A tick that straddles midnight books the whole interval on
//! the new day.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDate};

use crate::calendar::MonthKey;
use crate::config::AcctConfig;
use crate::delta::{Delta, Sample, delta};
use crate::error::{AcctError, Result};
use crate::source::CounterSource;
use crate::store::RecordStore;

/// Granularity of the interruptible sleep. Signal handlers only store to
/// the atomic, so the sleeper polls it.
const SLEEP_POLL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// Orderly stop requested by the operator (SIGTERM, SIGQUIT).
    Operator,
    /// Interactive interrupt (SIGINT).
    Interrupt,
}

impl ShutdownCause {
    /// Process exit status for this cause.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Operator => 0,
            Self::Interrupt => 1,
        }
    }

    fn as_raw(self) -> u8 {
        match self {
            Self::Operator => 1,
            Self::Interrupt => 2,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Operator),
            2 => Some(Self::Interrupt),
            _ => None,
        }
    }
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Interrupt => write!(f, "interrupt"),
        }
    }
}

/// Cancellation token shared between signal handlers and the loop.
///
/// `request` is a single atomic compare-exchange, so it may be called from
/// a signal handler. The first request wins.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    state: Arc<AtomicU8>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, cause: ShutdownCause) {
        let _ = self
            .state
            .compare_exchange(0, cause.as_raw(), Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn cause(&self) -> Option<ShutdownCause> {
        ShutdownCause::from_raw(self.state.load(Ordering::SeqCst))
    }

    pub fn is_requested(&self) -> bool {
        self.cause().is_some()
    }

    /// Sleep for `duration` unless shutdown is requested first. Returns
    /// `true` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_POLL.min(deadline - now));
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the date used to pick the day bucket.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Where the loop currently is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sampling,
    Computing,
    Committing,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No previous sample existed; this one only seeds the next delta.
    Seeded(Sample),
    /// Counters did not move; nothing was written.
    Unchanged,
    /// `delta` was added to `day` of `month`.
    Committed {
        month: MonthKey,
        day: u32,
        delta: Delta,
    },
}

/// Samples one interface and folds the deltas into the record store.
pub struct Accumulator<S, C = LocalClock> {
    source: S,
    store: RecordStore,
    clock: C,
    counter_max: u64,
    interval: Duration,
    previous: Option<Sample>,
    phase: Phase,
}

impl<S: CounterSource> Accumulator<S, LocalClock> {
    pub fn new(config: &AcctConfig, source: S) -> Self {
        Self::with_clock(config, source, LocalClock)
    }
}

impl<S: CounterSource, C: Clock> Accumulator<S, C> {
    pub fn with_clock(config: &AcctConfig, source: S, clock: C) -> Self {
        Self {
            source,
            store: RecordStore::from_config(config),
            clock,
            counter_max: config.counter_width.max(),
            interval: config.interval,
            previous: None,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn previous(&self) -> Option<Sample> {
        self.previous
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Take the initial sample. It is never committed.
    pub fn seed(&mut self) -> Result<Sample> {
        let sample = self.source.sample()?;
        self.previous = Some(sample);
        Ok(sample)
    }

    /// Run one tick without sleeping.
    ///
    /// A failed sample leaves the previous sample in place, so the next
    /// successful tick covers the combined interval. A vanished interface
    /// clears it instead: when the interface returns its counters restart
    /// from zero and must be re-seeded rather than read as a wrap.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.phase = Phase::Sampling;
        let current = match self.source.sample() {
            Ok(sample) => sample,
            Err(e) => {
                if matches!(e, AcctError::InterfaceNotFound(_)) {
                    self.previous = None;
                }
                self.phase = Phase::Idle;
                return Err(e);
            }
        };

        self.phase = Phase::Computing;
        let Some(previous) = self.previous else {
            self.previous = Some(current);
            self.phase = Phase::Idle;
            return Ok(TickOutcome::Seeded(current));
        };
        let delta = delta(previous, current, self.counter_max);
        log::trace!(
            "sample rx={} tx={} (prev rx={} tx={}) delta {delta}",
            current.rx,
            current.tx,
            previous.rx,
            previous.tx
        );
        if delta.is_zero() {
            self.previous = Some(current);
            self.phase = Phase::Idle;
            return Ok(TickOutcome::Unchanged);
        }

        self.phase = Phase::Committing;
        let result = self.commit(delta);
        self.phase = Phase::Idle;
        let outcome = result?;
        self.previous = Some(current);
        Ok(outcome)
    }

    fn commit(&mut self, delta: Delta) -> Result<TickOutcome> {
        let today = self.clock.today();
        let month = MonthKey::from_date(today).ok_or(AcctError::DateOutOfRange(today))?;
        let day = today.day();
        self.store.accumulate(month, day, delta)?;
        Ok(TickOutcome::Committed { month, day, delta })
    }

    /// Loop until `shutdown` is requested.
    ///
    /// Transient counter failures skip a tick; every other error, store
    /// failures included, ends the loop and is returned to the caller.
    pub fn run(&mut self, shutdown: &ShutdownToken) -> Result<ShutdownCause> {
        if self.previous.is_none() {
            let seed = self.seed()?;
            log::debug!("seed sample rx={} tx={}", seed.rx, seed.tx);
        }
        log::info!(
            "accounting {} every {}s into {}",
            self.source.interface(),
            self.interval.as_secs(),
            self.store.root().display()
        );

        loop {
            if let Some(cause) = shutdown.cause() {
                log::info!("shutdown requested ({cause}), stopping");
                return Ok(cause);
            }

            if !shutdown.sleep(self.interval) {
                log::info!("sleep interrupted by shutdown request, finishing tick");
            }

            match self.tick() {
                Ok(TickOutcome::Committed { month, day, delta }) => {
                    log::debug!("committed {delta} to {month} day {day}");
                }
                Ok(TickOutcome::Seeded(_)) => log::info!("counters available again, re-seeded"),
                Ok(TickOutcome::Unchanged) => {}
                Err(e @ AcctError::CounterSourceUnavailable { .. })
                | Err(e @ AcctError::InterfaceNotFound(_)) => {
                    log::warn!("{e}; skipping tick");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
