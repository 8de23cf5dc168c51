//! Counter source implementations.

pub mod procfs;

pub use procfs::{PROC_NET_DEV, ProcNetDevSource, parse_net_dev};

use crate::source::CounterSource;

/// Counter source for `interface` on this platform.
pub fn platform_source(interface: &str) -> Box<dyn CounterSource> {
    Box::new(ProcNetDevSource::new(interface))
}
