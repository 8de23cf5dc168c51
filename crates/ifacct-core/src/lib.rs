//! # ifacct-core
//!
//! **Per-day traffic accounting for one network interface.**
//!
//! The daemon samples the cumulative rx/tx byte counters of an interface,
//! turns consecutive samples into wraparound-corrected deltas and folds
//! them into a month file with one bucket per day. Reporting tools read
//! the same files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ifacct_core::{AcctConfig, Accumulator, ShutdownToken, platform_source};
//!
//! let config = AcctConfig::default();
//! let source = platform_source(&config.interface);
//! let mut acc = Accumulator::new(&config, source);
//!
//! let shutdown = ShutdownToken::new();
//! let cause = acc.run(&shutdown).expect("accounting failed");
//! println!("stopped: {cause}");
//! ```
//!
//! ## Architecture
//!
//! Counter source → Delta → Record store
//!
//! - [`CounterSource`] supplies [`Sample`]s (procfs on Linux).
//! - [`delta()`] corrects for 32- or 64-bit counter wraparound.
//! - [`RecordStore`] owns the big-endian month files and their locking.
//! - [`Accumulator`] runs the sample/compute/commit loop.
//! - [`Report`] renders a loaded [`MonthlyRecord`].

pub mod accumulator;
pub mod calendar;
pub mod config;
pub mod delta;
pub mod error;
pub mod lock;
pub mod record;
pub mod report;
pub mod source;
pub mod sources;
pub mod store;

pub use accumulator::{
    Accumulator, Clock, LocalClock, Phase, ShutdownCause, ShutdownToken, TickOutcome,
};
pub use calendar::{MonthKey, days_in_month, is_leap};
pub use config::{AcctConfig, system_hostname};
pub use delta::{CounterWidth, Delta, Sample, counter_delta, delta};
pub use error::{AcctError, Result};
pub use lock::{FileLock, LockMode};
pub use record::{DayBucket, MonthlyRecord};
pub use report::{ByteUnit, DayRange, Report, ReportRow};
pub use source::CounterSource;
pub use sources::{ProcNetDevSource, platform_source};
pub use store::{RecordStore, path_for, read_for_report};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
