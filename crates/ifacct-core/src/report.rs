//! Monthly report rows and their text rendering.
//!
//! A [`Report`] is built from an already-loaded [`MonthlyRecord`]; the day
//! range filter never touches the file. Totals cover the rows shown.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use crate::record::{DayBucket, MonthlyRecord};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

/// Unit used to print byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteUnit {
    Bytes,
    KiB,
    MiB,
    GiB,
    /// Pick a unit per value.
    #[default]
    Human,
}

impl ByteUnit {
    /// Column header suffix, empty for per-cell units.
    fn header_suffix(self) -> &'static str {
        match self {
            Self::Bytes => " (B)",
            Self::KiB => " (KiB)",
            Self::MiB => " (MiB)",
            Self::GiB => " (GiB)",
            Self::Human => "",
        }
    }

    /// Render `bytes` in this unit.
    pub fn format(self, bytes: u64) -> String {
        let b = bytes as f64;
        match self {
            Self::Bytes => bytes.to_string(),
            Self::KiB => format!("{:.2}", b / KIB),
            Self::MiB => format!("{:.2}", b / MIB),
            Self::GiB => format!("{:.2}", b / GIB),
            Self::Human => {
                if b < KIB {
                    format!("{bytes} B")
                } else if b < MIB {
                    format!("{:.2} KiB", b / KIB)
                } else if b < GIB {
                    format!("{:.2} MiB", b / MIB)
                } else if b < TIB {
                    format!("{:.2} GiB", b / GIB)
                } else {
                    format!("{:.2} TiB", b / TIB)
                }
            }
        }
    }
}

impl FromStr for ByteUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "bytes" => Ok(Self::Bytes),
            "k" | "kib" => Ok(Self::KiB),
            "m" | "mib" => Ok(Self::MiB),
            "g" | "gib" => Ok(Self::GiB),
            "h" | "human" => Ok(Self::Human),
            other => Err(format!(
                "unknown unit '{other}' (expected bytes, kib, mib, gib or human)"
            )),
        }
    }
}

/// Inclusive, 1-based day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    start: u32,
    end: u32,
}

impl DayRange {
    pub fn new(start: u32, end: u32) -> Result<Self, String> {
        if start == 0 {
            return Err("day range starts at day 1".to_string());
        }
        if start > end {
            return Err(format!("day range {start}..{end} is empty"));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, day: u32) -> bool {
        (self.start..=self.end).contains(&day)
    }
}

/// One printed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub day: u32,
    pub rx: u64,
    pub tx: u64,
}

/// Rows and totals for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// `YYYY-MM`.
    pub month: String,
    pub rows: Vec<ReportRow>,
    pub totals: DayBucket,
}

impl Report {
    /// Select the days of `record` inside `range` (all days when `None`).
    pub fn build(record: &MonthlyRecord, range: Option<DayRange>) -> Self {
        let rows: Vec<ReportRow> = record
            .days()
            .iter()
            .zip(1u32..)
            .filter(|(_, day)| range.is_none_or(|r| r.contains(*day)))
            .map(|(bucket, day)| ReportRow {
                day,
                rx: bucket.rx,
                tx: bucket.tx,
            })
            .collect();
        let totals = rows.iter().fold(DayBucket::default(), |acc, r| DayBucket {
            rx: acc.rx.saturating_add(r.rx),
            tx: acc.tx.saturating_add(r.tx),
        });
        Self {
            month: record.key().to_string(),
            rows,
            totals,
        }
    }

    /// Fixed-width table: a header, one line per day, then totals.
    pub fn render(&self, unit: ByteUnit) -> String {
        let rx_head = format!("Received{}", unit.header_suffix());
        let tx_head = format!("Transmitted{}", unit.header_suffix());
        let rule = format!("{} {} {}", "-".repeat(6), "-".repeat(18), "-".repeat(18));

        let mut out = String::new();
        let _ = writeln!(out, "{:>6} {:>18} {:>18}", "Day", rx_head, tx_head);
        let _ = writeln!(out, "{rule}");
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:>6} {:>18} {:>18}",
                format!("{:02}", row.day),
                unit.format(row.rx),
                unit.format(row.tx)
            );
        }
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{:>6} {:>18} {:>18}",
            "Totals",
            unit.format(self.totals.rx),
            unit.format(self.totals.tx)
        );
        out
    }
}
