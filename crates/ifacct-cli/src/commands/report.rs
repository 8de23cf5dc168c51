//! `ifacct report`: print one monthly record as a table or JSON.

use std::path::{Path, PathBuf};

use ifacct_core::{AcctError, ByteUnit, DayRange, MonthKey, Report, path_for, read_for_report};

use super::{fail, lock_timeout, resolve_host};

/// Last day any month can have; an open `--from` range ends here.
const MAX_DAY: u32 = 31;

pub struct ReportCommandConfig<'a> {
    pub file: Option<&'a Path>,
    pub data_dir: &'a Path,
    pub interface: &'a str,
    pub host: Option<&'a str>,
    pub month: Option<MonthKey>,
    pub unit: ByteUnit,
    pub from: Option<u32>,
    pub to: Option<u32>,
    pub json: bool,
    pub lock_timeout_ms: Option<u64>,
}

/// Run the report command.
pub fn run(cmd: ReportCommandConfig<'_>) {
    match render(&cmd) {
        Ok(text) => print!("{text}"),
        Err(e) => fail(e),
    }
}

fn render(cmd: &ReportCommandConfig<'_>) -> Result<String, String> {
    let range = day_range(cmd.from, cmd.to)?;
    let path = record_path(cmd)?;
    let record = read_for_report(&path, lock_timeout(cmd.lock_timeout_ms)).map_err(|e| match e {
        AcctError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            format!("no record at {}", path.display())
        }
        other => other.to_string(),
    })?;

    let report = Report::build(&record, range);
    if cmd.json {
        let mut out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("cannot encode report: {e}"))?;
        out.push('\n');
        return Ok(out);
    }
    Ok(format!("{}\n{}", heading(&path, &report), report.render(cmd.unit)))
}

fn heading(path: &Path, report: &Report) -> String {
    format!("{} ({})", report.month, path.display())
}

/// Explicit file, else the store path of the requested (or current) month.
fn record_path(cmd: &ReportCommandConfig<'_>) -> Result<PathBuf, String> {
    if let Some(file) = cmd.file {
        return Ok(file.to_path_buf());
    }
    let month = match cmd.month {
        Some(m) => m,
        None => MonthKey::current().ok_or("current date has no record month")?,
    };
    Ok(path_for(
        cmd.data_dir,
        &resolve_host(cmd.host),
        cmd.interface,
        month,
    ))
}

fn day_range(from: Option<u32>, to: Option<u32>) -> Result<Option<DayRange>, String> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    DayRange::new(from.unwrap_or(1), to.unwrap_or(MAX_DAY)).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifacct_core::{Delta, RecordStore};

    fn cmd<'a>(dir: &'a Path) -> ReportCommandConfig<'a> {
        ReportCommandConfig {
            file: None,
            data_dir: dir,
            interface: "eth1",
            host: Some("gw"),
            month: Some(MonthKey::new(2026, 1).unwrap()),
            unit: ByteUnit::Bytes,
            from: None,
            to: None,
            json: false,
            lock_timeout_ms: None,
        }
    }

    fn seed(dir: &Path) {
        let store = RecordStore::new(dir, "gw", "eth1");
        let feb = MonthKey::new(2026, 1).unwrap();
        store.accumulate(feb, 1, Delta { rx: 100, tx: 50 }).unwrap();
        store.accumulate(feb, 1, Delta { rx: 10, tx: 5 }).unwrap();
    }

    // -----------------------------------------------------------------------
    // day_range tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_day_range_open_ends() {
        assert_eq!(day_range(None, None).unwrap(), None);
        assert_eq!(
            day_range(Some(5), None).unwrap(),
            Some(DayRange::new(5, 31).unwrap())
        );
        assert_eq!(
            day_range(None, Some(3)).unwrap(),
            Some(DayRange::new(1, 3).unwrap())
        );
    }

    #[test]
    fn test_day_range_rejects_inverted() {
        assert!(day_range(Some(9), Some(2)).is_err());
        assert!(day_range(Some(0), Some(2)).is_err());
    }

    // -----------------------------------------------------------------------
    // render tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_render_month_from_store() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path());
        let text = render(&cmd(tmp.path())).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("2026-02"));
        // heading + header + rule + 28 days + rule + totals
        assert_eq!(lines.len(), 33);
        assert!(lines[32].contains("110"));
    }

    #[test]
    fn test_render_explicit_file_json() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path());
        let file = tmp.path().join("gw-eth1-202602.dat");
        let mut c = cmd(Path::new("/nonexistent"));
        c.file = Some(&file);
        c.month = None;
        c.json = true;
        c.from = Some(1);
        c.to = Some(2);

        let json: serde_json::Value = serde_json::from_str(&render(&c).unwrap()).unwrap();
        assert_eq!(json["month"], "2026-02");
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["totals"]["rx"], 110);
        assert_eq!(json["totals"]["tx"], 55);
    }

    #[test]
    fn test_render_missing_record() {
        let tmp = tempfile::tempdir().unwrap();
        let err = render(&cmd(tmp.path())).unwrap_err();
        assert!(err.starts_with("no record at"));
    }

    #[test]
    fn test_render_corrupt_record() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("gw-eth1-202602.dat");
        std::fs::write(&file, [0u8, 126, 1, 0, 0]).unwrap();
        let mut c = cmd(tmp.path());
        c.file = Some(&file);
        let err = render(&c).unwrap_err();
        assert!(err.contains("corrupt record"));
    }
}
