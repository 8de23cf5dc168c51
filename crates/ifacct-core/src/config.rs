//! Immutable runtime configuration, built once at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::delta::CounterWidth;
use crate::error::{AcctError, Result};

/// Default storage root for record files.
pub const DEFAULT_STORAGE_ROOT: &str = "/tmp/ifacct";

/// Default interface to account.
pub const DEFAULT_INTERFACE: &str = "eth1";

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Everything the store and the accumulator need to know.
#[derive(Debug, Clone)]
pub struct AcctConfig {
    /// Directory holding the monthly record files.
    pub storage_root: PathBuf,
    /// Interface whose counters are sampled.
    pub interface: String,
    /// Time between samples.
    pub interval: Duration,
    /// Host identifier used in file names.
    pub host: String,
    /// Width of the platform counters, for wraparound correction.
    pub counter_width: CounterWidth,
    /// Bound on lock waits; `None` blocks until granted.
    pub lock_timeout: Option<Duration>,
}

impl Default for AcctConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            interface: DEFAULT_INTERFACE.to_string(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            host: system_hostname().unwrap_or_else(|| "localhost".to_string()),
            counter_width: CounterWidth::native(),
            lock_timeout: None,
        }
    }
}

impl AcctConfig {
    /// Reject values that would produce unusable file names or a busy loop.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(AcctError::Config("interval must be at least 1 second".into()));
        }
        check_name("interface", &self.interface)?;
        check_name("host", &self.host)?;
        Ok(())
    }
}

fn check_name(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AcctError::Config(format!("{what} must not be empty")));
    }
    if value.contains('/') || value.contains('\0') {
        return Err(AcctError::Config(format!(
            "{what} '{value}' must not contain a path separator"
        )));
    }
    Ok(())
}

/// Hostname of this machine (best-effort).
pub fn system_hostname() -> Option<String> {
    #[cfg(unix)]
    {
        let mut buf = [0u8; 256];
        // SAFETY: buf is writable for its full length; gethostname truncates.
        let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
        if rc != 0 {
            return None;
        }
        let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        let name = String::from_utf8_lossy(&buf[..len]).trim().to_string();
        if name.is_empty() { None } else { Some(name) }
    }
    #[cfg(not(unix))]
    {
        std::env::var("COMPUTERNAME").ok()
    }
}
