//! `ifacct list`: months on disk for one host and interface.

use std::path::Path;

use ifacct_core::{MonthKey, RecordStore};

use super::{fail, resolve_host};

/// Run the list command.
pub fn run(data_dir: &Path, interface: &str, host: Option<&str>) {
    let store = RecordStore::new(data_dir, &resolve_host(host), interface);
    match store.list_months() {
        Ok(months) if months.is_empty() => {
            eprintln!("No records for {interface} in {}", data_dir.display());
        }
        Ok(months) => print!("{}", format_months(&store, &months)),
        Err(e) => fail(e),
    }
}

fn format_months(store: &RecordStore, months: &[MonthKey]) -> String {
    months
        .iter()
        .map(|m| format!("{m}  {}\n", store.path_for(*m).display()))
        .collect()
}
