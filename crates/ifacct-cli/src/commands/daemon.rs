//! `ifacct daemon`: sample counters and accumulate until signalled.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use ifacct_core::{
    AcctConfig, Accumulator, CounterWidth, RecordStore, ShutdownCause, ShutdownToken,
    platform_source,
};

use super::{fail, lock_timeout, resolve_host};

pub struct DaemonCommandConfig<'a> {
    pub data_dir: &'a Path,
    pub interface: &'a str,
    pub interval_secs: u64,
    pub host: Option<&'a str>,
    pub counter_width: CounterWidth,
    pub lock_timeout_ms: Option<u64>,
}

/// Token the SIGTERM/SIGQUIT handler signals.
static TERMINATE: OnceLock<ShutdownToken> = OnceLock::new();

/// Run the daemon command. Never returns.
pub fn run(cmd: DaemonCommandConfig<'_>) -> ! {
    let config = build_config(&cmd);
    if let Err(e) = config.validate() {
        fail(e);
    }

    let store = RecordStore::from_config(&config);
    if let Err(e) = store.ensure_root() {
        fail(format!(
            "cannot create storage root {}: {e}",
            config.storage_root.display()
        ));
    }

    let shutdown = ShutdownToken::new();
    if let Err(e) = install_signal_handlers(&shutdown) {
        fail(e);
    }

    log::info!(
        "starting: interface={} host={} interval={}s counters={}-bit root={}",
        config.interface,
        config.host,
        config.interval.as_secs(),
        config.counter_width,
        config.storage_root.display()
    );

    let source = platform_source(&config.interface);
    let mut accumulator = Accumulator::new(&config, source);
    match accumulator.run(&shutdown) {
        Ok(cause) => {
            log::info!("stopped ({cause})");
            std::process::exit(cause.exit_code());
        }
        Err(e) => {
            log::error!("fatal: {e}");
            std::process::exit(1);
        }
    }
}

fn build_config(cmd: &DaemonCommandConfig<'_>) -> AcctConfig {
    AcctConfig {
        storage_root: cmd.data_dir.to_path_buf(),
        interface: cmd.interface.to_string(),
        interval: Duration::from_secs(cmd.interval_secs),
        host: resolve_host(cmd.host),
        counter_width: cmd.counter_width,
        lock_timeout: lock_timeout(cmd.lock_timeout_ms),
    }
}

/// SIGINT requests an interrupt; SIGTERM and SIGQUIT an operator stop.
fn install_signal_handlers(shutdown: &ShutdownToken) -> Result<(), String> {
    let interrupt = shutdown.clone();
    ctrlc::set_handler(move || interrupt.request(ShutdownCause::Interrupt))
        .map_err(|e| format!("cannot install SIGINT handler: {e}"))?;

    if TERMINATE.set(shutdown.clone()).is_err() {
        return Err("signal handlers already installed".to_string());
    }
    #[cfg(unix)]
    for signal in [libc::SIGTERM, libc::SIGQUIT] {
        let handler = on_terminate as extern "C" fn(libc::c_int);
        // SAFETY: the handler only performs atomic operations.
        let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(format!(
                "cannot install handler for signal {signal}: {}",
                std::io::Error::last_os_error()
            ));
        }
    }
    Ok(())
}

#[cfg(unix)]
extern "C" fn on_terminate(_signal: libc::c_int) {
    if let Some(token) = TERMINATE.get() {
        token.request(ShutdownCause::Operator);
    }
}
