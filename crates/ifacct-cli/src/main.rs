//! CLI for ifacct: per-day traffic accounting for one network interface.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ifacct_core::config::{DEFAULT_INTERFACE, DEFAULT_INTERVAL_SECS, DEFAULT_STORAGE_ROOT};
use ifacct_core::{ByteUnit, CounterWidth, MonthKey};

#[derive(Parser)]
#[command(name = "ifacct")]
#[command(about = "ifacct: per-day rx/tx accounting for one network interface")]
#[command(version = ifacct_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample interface counters and fold deltas into monthly records.
    /// Runs in the foreground until SIGINT, SIGTERM or SIGQUIT.
    Daemon {
        /// Directory holding the monthly record files (created if missing)
        #[arg(short = 'd', long, default_value = DEFAULT_STORAGE_ROOT)]
        data_dir: PathBuf,

        /// Interface to account
        #[arg(short, long, default_value = DEFAULT_INTERFACE)]
        interface: String,

        /// Seconds between samples
        #[arg(short = 't', long, default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,

        /// Host identifier used in file names (default: system hostname)
        #[arg(long)]
        host: Option<String>,

        /// Counter width for wraparound correction: 32, 64 or native
        #[arg(long, default_value = "native")]
        counter_width: CounterWidth,

        /// Give up on a record lock after this many milliseconds (default: wait)
        #[arg(long)]
        lock_timeout_ms: Option<u64>,
    },

    /// Print the per-day table of one monthly record
    Report {
        /// Record file to read; overrides --data-dir/--interface/--host/--month
        file: Option<PathBuf>,

        /// Directory holding the monthly record files
        #[arg(short = 'd', long, default_value = DEFAULT_STORAGE_ROOT)]
        data_dir: PathBuf,

        /// Interface whose record to read
        #[arg(short, long, default_value = DEFAULT_INTERFACE)]
        interface: String,

        /// Host identifier used in file names (default: system hostname)
        #[arg(long)]
        host: Option<String>,

        /// Month to report as YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<MonthKey>,

        /// Unit for byte counts: bytes, kib, mib, gib, human
        #[arg(short, long, default_value = "human")]
        unit: ByteUnit,

        /// First day to show (1-based, inclusive)
        #[arg(long)]
        from: Option<u32>,

        /// Last day to show (1-based, inclusive)
        #[arg(long)]
        to: Option<u32>,

        /// Print rows and totals as JSON
        #[arg(long)]
        json: bool,

        /// Give up on the record lock after this many milliseconds (default: wait)
        #[arg(long)]
        lock_timeout_ms: Option<u64>,
    },

    /// List the months recorded for one host and interface, newest first
    List {
        /// Directory holding the monthly record files
        #[arg(short = 'd', long, default_value = DEFAULT_STORAGE_ROOT)]
        data_dir: PathBuf,

        /// Interface whose records to list
        #[arg(short, long, default_value = DEFAULT_INTERFACE)]
        interface: String,

        /// Host identifier used in file names (default: system hostname)
        #[arg(long)]
        host: Option<String>,
    },
}

fn main() {
    commands::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            data_dir,
            interface,
            interval,
            host,
            counter_width,
            lock_timeout_ms,
        } => commands::daemon::run(commands::daemon::DaemonCommandConfig {
            data_dir: &data_dir,
            interface: &interface,
            interval_secs: interval,
            host: host.as_deref(),
            counter_width,
            lock_timeout_ms,
        }),
        Commands::Report {
            file,
            data_dir,
            interface,
            host,
            month,
            unit,
            from,
            to,
            json,
            lock_timeout_ms,
        } => commands::report::run(commands::report::ReportCommandConfig {
            file: file.as_deref(),
            data_dir: &data_dir,
            interface: &interface,
            host: host.as_deref(),
            month,
            unit,
            from,
            to,
            json,
            lock_timeout_ms,
        }),
        Commands::List {
            data_dir,
            interface,
            host,
        } => commands::list::run(&data_dir, &interface, host.as_deref()),
    }
}
