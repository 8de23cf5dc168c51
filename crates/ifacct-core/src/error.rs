//! Error type shared by every ifacct operation.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, AcctError>;

/// Every failure the accounting core can surface.
///
/// The core never swallows an error; callers decide whether a failure is
/// fatal (the daemon treats store failures that way) or user-visible (the
/// report command prints it and exits non-zero).
#[derive(Debug, Error)]
pub enum AcctError {
    /// The counter source could not produce a sample this tick.
    #[error("counters for interface {interface} unavailable: {reason}")]
    CounterSourceUnavailable { interface: String, reason: String },

    /// The named interface has no counters at all.
    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    /// Persisted record does not match the layout its header declares.
    #[error("corrupt record {}: {reason}", .path.display())]
    CorruptRecord { path: PathBuf, reason: String },

    /// Day index outside `1..=days_in_month`.
    #[error("day {day} out of range for a {days_in_month}-day month")]
    InvalidDay { day: u32, days_in_month: u32 },

    /// The wall clock reports a date no record header can hold.
    #[error("date {0} is outside the representable record range")]
    DateOutOfRange(NaiveDate),

    /// The lock syscall itself failed.
    #[error("unable to lock {}: {source}", .path.display())]
    LockUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A bounded lock wait expired.
    #[error("timed out waiting for lock on {}", .path.display())]
    LockTimeout { path: PathBuf },

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcctError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
