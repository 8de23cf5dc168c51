//! Monthly traffic record and its fixed-width big-endian encoding.
//!
//! # Layout
//!
//! ```text
//! offset 0   year       u16  years since 1900
//! offset 2   month      u8   0 = January .. 11 = December
//! offset 3   day[1].rx  u64
//! offset 11  day[1].tx  u64
//! ...        one (rx, tx) pair per day of the month
//! ```
//!
//! All multi-byte integers are big-endian. The file length is fully
//! determined by the header, which doubles as an integrity check.

use std::path::Path;

use serde::Serialize;

use crate::calendar::MonthKey;
use crate::delta::Delta;
use crate::error::{AcctError, Result};

/// Size of the `(year, month)` header.
pub const HEADER_LEN: usize = 3;

/// Size of one `(rx, tx)` day bucket.
pub const BUCKET_LEN: usize = 16;

/// Encoded size of a record covering `days` days.
pub fn encoded_len(days: u32) -> usize {
    HEADER_LEN + BUCKET_LEN * days as usize
}

/// Cumulative bytes for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub rx: u64,
    pub tx: u64,
}

impl DayBucket {
    pub fn new(rx: u64, tx: u64) -> Self {
        Self { rx, tx }
    }

    fn add(&mut self, delta: Delta) {
        self.rx = self.rx.saturating_add(delta.rx);
        self.tx = self.tx.saturating_add(delta.tx);
    }
}

/// One month of per-day traffic for a single host and interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRecord {
    key: MonthKey,
    days: Vec<DayBucket>,
}

impl MonthlyRecord {
    /// Fresh record with every bucket zeroed.
    pub fn new(key: MonthKey) -> Self {
        Self {
            key,
            days: vec![DayBucket::default(); key.days() as usize],
        }
    }

    pub fn key(&self) -> MonthKey {
        self.key
    }

    /// Number of day buckets; always `key().days()`.
    pub fn days_in_month(&self) -> u32 {
        self.days.len() as u32
    }

    /// Buckets in day order; index `i` holds day `i + 1`.
    pub fn days(&self) -> &[DayBucket] {
        &self.days
    }

    /// Bucket for the 1-based `day`, if it exists.
    pub fn day(&self, day: u32) -> Option<&DayBucket> {
        let idx = usize::try_from(day.checked_sub(1)?).ok()?;
        self.days.get(idx)
    }

    /// Fold `delta` into the bucket for the 1-based `day`.
    pub fn add(&mut self, day: u32, delta: Delta) -> Result<()> {
        let days_in_month = self.days_in_month();
        if day == 0 || day > days_in_month {
            return Err(AcctError::InvalidDay { day, days_in_month });
        }
        self.days[(day - 1) as usize].add(delta);
        Ok(())
    }

    /// Sum over all days.
    pub fn totals(&self) -> DayBucket {
        self.days.iter().fold(DayBucket::default(), |acc, b| DayBucket {
            rx: acc.rx.saturating_add(b.rx),
            tx: acc.tx.saturating_add(b.tx),
        })
    }

    /// Serialize the whole record into one buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(encoded_len(self.days_in_month()));
        out.extend_from_slice(&self.key.header_year().to_be_bytes());
        out.push(self.key.month0());
        for bucket in &self.days {
            out.extend_from_slice(&bucket.rx.to_be_bytes());
            out.extend_from_slice(&bucket.tx.to_be_bytes());
        }
        out
    }

    /// Parse a record read from `origin`.
    ///
    /// The header decides how many buckets must follow; any other length
    /// is reported as [`AcctError::CorruptRecord`] rather than truncated or
    /// padded.
    pub fn decode(bytes: &[u8], origin: &Path) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(AcctError::corrupt(
                origin,
                format!("{} bytes is shorter than the header", bytes.len()),
            ));
        }
        let header_year = u16::from_be_bytes([bytes[0], bytes[1]]);
        let header_month = bytes[2];
        let key = MonthKey::from_header(header_year, header_month).ok_or_else(|| {
            AcctError::corrupt(
                origin,
                format!("header month {header_month} is out of range"),
            )
        })?;

        let days = key.days();
        let expected = encoded_len(days);
        if bytes.len() != expected {
            return Err(AcctError::corrupt(
                origin,
                format!(
                    "{} bytes on disk, header {key} requires {expected} ({days} days)",
                    bytes.len()
                ),
            ));
        }

        let days = bytes[HEADER_LEN..]
            .chunks_exact(BUCKET_LEN)
            .map(|chunk| {
                let (rx, tx) = chunk.split_at(8);
                DayBucket {
                    rx: be_u64(rx),
                    tx: be_u64(tx),
                }
            })
            .collect();

        Ok(Self { key, days })
    }
}

/// Big-endian value of an 8-byte field.
fn be_u64(field: &[u8]) -> u64 {
    field.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feb_2026() -> MonthKey {
        MonthKey::new(2026, 1).unwrap()
    }

    // -----------------------------------------------------------------------
    // Construction and mutation
    // -----------------------------------------------------------------------

    #[test]
    fn test_new_record_is_zeroed() {
        let record = MonthlyRecord::new(feb_2026());
        assert_eq!(record.days_in_month(), 28);
        assert!(record.days().iter().all(|b| *b == DayBucket::default()));
    }

    #[test]
    fn test_add_touches_only_that_day() {
        let mut record = MonthlyRecord::new(feb_2026());
        record.add(14, Delta { rx: 7, tx: 9 }).unwrap();
        for (i, bucket) in record.days().iter().enumerate() {
            if i == 13 {
                assert_eq!(*bucket, DayBucket::new(7, 9));
            } else {
                assert_eq!(*bucket, DayBucket::default());
            }
        }
    }

    #[test]
    fn test_add_rejects_day_zero_and_past_end() {
        let mut record = MonthlyRecord::new(feb_2026());
        assert!(matches!(
            record.add(0, Delta::default()),
            Err(AcctError::InvalidDay { day: 0, days_in_month: 28 })
        ));
        assert!(matches!(
            record.add(29, Delta::default()),
            Err(AcctError::InvalidDay { day: 29, days_in_month: 28 })
        ));
        assert!(record.add(28, Delta::default()).is_ok());
    }

    #[test]
    fn test_totals() {
        let mut record = MonthlyRecord::new(feb_2026());
        record.add(1, Delta { rx: 100, tx: 50 }).unwrap();
        record.add(28, Delta { rx: 10, tx: 5 }).unwrap();
        assert_eq!(record.totals(), DayBucket::new(110, 55));
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    #[test]
    fn test_encode_layout_is_big_endian() {
        let mut record = MonthlyRecord::new(feb_2026());
        record.add(1, Delta { rx: 0x0102, tx: 0x03 }).unwrap();
        let bytes = record.encode();

        assert_eq!(bytes.len(), 3 + 16 * 28);
        assert_eq!(&bytes[0..2], &[0x00, 0x7e]); // 126
        assert_eq!(bytes[2], 1);
        assert_eq!(&bytes[3..11], &[0, 0, 0, 0, 0, 0, 0x01, 0x02]);
        assert_eq!(&bytes[11..19], &[0, 0, 0, 0, 0, 0, 0, 0x03]);
    }

    #[test]
    fn test_decode_restores_buckets() {
        let mut record = MonthlyRecord::new(MonthKey::new(2024, 1).unwrap());
        for day in 1..=29 {
            let d = u64::from(day);
            record.add(day, Delta { rx: d * 1000, tx: d }).unwrap();
        }
        let decoded = MonthlyRecord::decode(&record.encode(), Path::new("t")).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_reads_full_width_big_endian_fields() {
        let mut bytes = MonthlyRecord::new(feb_2026()).encode();
        bytes[3..11].copy_from_slice(&[0xff; 8]);
        bytes[11..19].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let record = MonthlyRecord::decode(&bytes, Path::new("t")).unwrap();
        assert_eq!(
            record.day(1),
            Some(&DayBucket::new(u64::MAX, 0x0102_0304_0506_0708))
        );
        assert_eq!(record.day(2), Some(&DayBucket::default()));
    }

    #[test]
    fn test_decode_rejects_truncated_body() {
        let bytes = MonthlyRecord::new(feb_2026()).encode();
        let err = MonthlyRecord::decode(&bytes[..bytes.len() - 1], Path::new("t")).unwrap_err();
        assert!(matches!(err, AcctError::CorruptRecord { .. }));
    }

    #[test]
    fn test_decode_rejects_leap_table_mismatch() {
        // A non-leap February padded out to 29 days, as a hard-coded table
        // would have written it.
        let mut bytes = MonthlyRecord::new(feb_2026()).encode();
        bytes.extend_from_slice(&[0u8; BUCKET_LEN]);
        let err = MonthlyRecord::decode(&bytes, Path::new("t")).unwrap_err();
        assert!(matches!(err, AcctError::CorruptRecord { .. }));
    }

    #[test]
    fn test_decode_rejects_short_header() {
        let err = MonthlyRecord::decode(&[0x00, 0x7e], Path::new("t")).unwrap_err();
        assert!(matches!(err, AcctError::CorruptRecord { .. }));
    }

    #[test]
    fn test_decode_rejects_bad_month() {
        let mut bytes = MonthlyRecord::new(feb_2026()).encode();
        bytes[2] = 12;
        let err = MonthlyRecord::decode(&bytes, Path::new("t")).unwrap_err();
        assert!(matches!(err, AcctError::CorruptRecord { .. }));
    }
}
