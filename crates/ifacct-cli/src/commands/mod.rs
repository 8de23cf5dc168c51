pub mod daemon;
pub mod list;
pub mod report;

use std::fmt::Display;
use std::time::Duration;

use ifacct_core::system_hostname;

/// Host used when none is configured and the system name is unavailable.
const FALLBACK_HOST: &str = "localhost";

/// Route `log` output to stderr; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

/// Explicit host, else the system hostname.
pub fn resolve_host(host: Option<&str>) -> String {
    host.map(str::to_string)
        .or_else(system_hostname)
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}

/// `--lock-timeout-ms` as a wait bound; absent means block.
pub fn lock_timeout(ms: Option<u64>) -> Option<Duration> {
    ms.map(Duration::from_millis)
}

/// Print `err` and exit with status 1.
pub fn fail(err: impl Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // resolve_host tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_resolve_host_prefers_explicit() {
        assert_eq!(resolve_host(Some("gw")), "gw");
    }

    #[test]
    fn test_resolve_host_falls_back() {
        let host = resolve_host(None);
        assert!(!host.is_empty());
        assert!(!host.contains('\0'));
    }

    // -----------------------------------------------------------------------
    // lock_timeout tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_lock_timeout_absent_blocks() {
        assert_eq!(lock_timeout(None), None);
    }

    #[test]
    fn test_lock_timeout_millis() {
        assert_eq!(lock_timeout(Some(250)), Some(Duration::from_millis(250)));
    }
}
