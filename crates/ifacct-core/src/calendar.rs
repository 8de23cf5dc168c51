//! Month keys and the days-in-month rule shared by writer and reader.
//!
//! The on-disk header stores the year as years since 1900 and the month
//! 0-based, so a record written in March 2026 carries `(126, 2)`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};

/// Base of the header year field.
pub const HEADER_YEAR_BASE: i32 = 1900;

const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap-year rule.
pub fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Number of days in `month0` (0-based) of calendar `year`.
///
/// February follows the leap-year rule; it is never pinned at 29.
pub fn days_in_month(year: i32, month0: u8) -> u32 {
    let idx = usize::from(month0.min(11));
    if idx == 1 && is_leap(year) {
        29
    } else {
        MONTH_DAYS[idx]
    }
}

/// One calendar month, the unit a record file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month0: u8,
}

impl MonthKey {
    /// Build a key from a calendar year and 0-based month. Returns `None`
    /// when the month is out of range or the year cannot be represented in
    /// the header.
    pub fn new(year: i32, month0: u8) -> Option<Self> {
        let offset = year.checked_sub(HEADER_YEAR_BASE)?;
        if month0 > 11 || !(0..=i32::from(u16::MAX)).contains(&offset) {
            return None;
        }
        Some(Self { year, month0 })
    }

    /// Key for the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month0() as u8)
    }

    /// Key for the current local month.
    pub fn current() -> Option<Self> {
        Self::from_date(Local::now().date_naive())
    }

    /// Decode the `(year, month)` pair stored in a record header.
    pub fn from_header(header_year: u16, header_month: u8) -> Option<Self> {
        Self::new(HEADER_YEAR_BASE + i32::from(header_year), header_month)
    }

    /// Calendar year, e.g. 2026.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// 0-based month, 0 = January.
    pub fn month0(&self) -> u8 {
        self.month0
    }

    /// 1-based month, 1 = January.
    pub fn month(&self) -> u32 {
        u32::from(self.month0) + 1
    }

    /// Year as stored in the header.
    pub fn header_year(&self) -> u16 {
        // Range checked in `new`.
        (self.year - HEADER_YEAR_BASE) as u16
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month0)
    }

    /// `YYYYMM` stamp used in file names.
    pub fn file_stamp(&self) -> String {
        format!("{:04}{:02}", self.year, self.month())
    }

    /// Parse a `YYYYMM` file stamp.
    pub fn from_file_stamp(stamp: &str) -> Option<Self> {
        if stamp.len() != 6 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year: i32 = stamp[..4].parse().ok()?;
        let month: u8 = stamp[4..].parse().ok()?;
        Self::new(year, month.checked_sub(1)?)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month())
    }
}

impl FromStr for MonthKey {
    type Err = String;

    /// Parses `YYYY-MM` with a 1-based month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("invalid month '{s}' (expected YYYY-MM)");
        let (y, m) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = y.parse().map_err(|_| err())?;
        let month: u8 = m.parse().map_err(|_| err())?;
        let month0 = month.checked_sub(1).ok_or_else(err)?;
        Self::new(year, month0).ok_or_else(err)
    }
}
