//! Counters from the Linux `/proc/net/dev` table.

use std::path::PathBuf;

use crate::delta::Sample;
use crate::error::{AcctError, Result};
use crate::source::CounterSource;

/// Default location of the interface statistics table.
pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// Number of numeric columns per interface line (8 receive, 8 transmit).
const NET_DEV_FIELDS: usize = 16;

/// Column holding received bytes.
const RX_BYTES: usize = 0;

/// Column holding transmitted bytes.
const TX_BYTES: usize = 8;

/// Reads one interface's byte counters from `/proc/net/dev`.
pub struct ProcNetDevSource {
    interface: String,
    path: PathBuf,
}

impl ProcNetDevSource {
    pub fn new(interface: &str) -> Self {
        Self::with_path(interface, PROC_NET_DEV)
    }

    /// Read from an alternate file with the same layout.
    pub fn with_path(interface: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            interface: interface.to_string(),
            path: path.into(),
        }
    }
}

impl CounterSource for ProcNetDevSource {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn sample(&mut self) -> Result<Sample> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AcctError::CounterSourceUnavailable {
                interface: self.interface.clone(),
                reason: format!("{}: {e}", self.path.display()),
            }
        })?;
        parse_net_dev(&raw, &self.interface)
    }
}

/// Extract the rx/tx byte counters for `interface` from `/proc/net/dev`
/// text.
///
/// The interface name must match exactly, so `eth1` never picks up the
/// `eth10` line.
pub fn parse_net_dev(raw: &str, interface: &str) -> Result<Sample> {
    for line in raw.lines().skip(2) {
        let Some((iface_raw, stats_raw)) = line.split_once(':') else {
            continue;
        };
        if iface_raw.trim() != interface {
            continue;
        }
        let fields: Vec<u64> = stats_raw
            .split_whitespace()
            .map_while(|s| s.parse::<u64>().ok())
            .collect();
        if fields.len() < NET_DEV_FIELDS {
            return Err(AcctError::CounterSourceUnavailable {
                interface: interface.to_string(),
                reason: format!(
                    "expected {NET_DEV_FIELDS} counters, found {}",
                    fields.len()
                ),
            });
        }
        return Ok(Sample::new(fields[RX_BYTES], fields[TX_BYTES]));
    }
    Err(AcctError::InterfaceNotFound(interface.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  123456     100    0    0    0     0          0         0   123456     100    0    0    0     0       0          0
  eth1: 9876543210 7000    1    2    0     0          0        12 1234567890  6000    0    0    0     0       0          0
 eth10:      42       1    0    0    0     0          0         0       24       1    0    0    0     0       0          0
";

    #[test]
    fn test_parse_net_dev_reads_rx_and_tx_bytes() {
        let sample = parse_net_dev(NET_DEV, "eth1").unwrap();
        assert_eq!(sample, Sample::new(9_876_543_210, 1_234_567_890));
    }

    #[test]
    fn test_parse_net_dev_exact_name_match() {
        let sample = parse_net_dev(NET_DEV, "eth10").unwrap();
        assert_eq!(sample, Sample::new(42, 24));
    }

    #[test]
    fn test_parse_net_dev_missing_interface() {
        let err = parse_net_dev(NET_DEV, "wlan0").unwrap_err();
        assert!(matches!(err, AcctError::InterfaceNotFound(name) if name == "wlan0"));
    }

    #[test]
    fn test_parse_net_dev_short_line() {
        let raw = "h1\nh2\n  eth1: 1 2 3\n";
        let err = parse_net_dev(raw, "eth1").unwrap_err();
        assert!(matches!(err, AcctError::CounterSourceUnavailable { .. }));
    }

    #[test]
    fn test_source_reads_alternate_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dev");
        std::fs::write(&path, NET_DEV).unwrap();

        let mut source = ProcNetDevSource::with_path("lo", &path);
        assert_eq!(source.interface(), "lo");
        assert_eq!(source.sample().unwrap(), Sample::new(123_456, 123_456));
    }

    #[test]
    fn test_source_unreadable_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = ProcNetDevSource::with_path("eth1", tmp.path().join("absent"));
        assert!(matches!(
            source.sample(),
            Err(AcctError::CounterSourceUnavailable { .. })
        ));
    }
}
