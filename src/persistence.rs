use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::clock::format_date;
use crate::session::SummarySnapshot;

pub const DAILY_LOG_PREFIX: &str = "uptime_log_";
pub const DAILY_LOG_SUFFIX: &str = ".log";
pub const SUMMARY_FILE: &str = "uptime_master_summary.log";
pub const SUMMARY_JSON_FILE: &str = "uptime_master_summary.json";

/// Default retention window for daily logs.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(14 * 24 * 60 * 60);

pub fn daily_log_name(date: Date) -> String {
    format!("{DAILY_LOG_PREFIX}{}{DAILY_LOG_SUFFIX}", format_date(date))
}

fn is_daily_log(name: &str) -> bool {
    name != SUMMARY_FILE && name.starts_with(DAILY_LOG_PREFIX) && name.ends_with(DAILY_LOG_SUFFIX)
}

/// Files under the log directory: one append-only log per local calendar
/// day plus an overwritten summary.
///
/// The current date and path live here rather than in globals; the store is
/// owned by the monitor loop.
#[derive(Debug)]
pub struct LogStore {
    dir: PathBuf,
    current_date: Date,
    current_path: PathBuf,
    retention: Duration,
}

impl LogStore {
    /// Create the directory if needed and point at today's log.
    pub fn open(dir: impl Into<PathBuf>, today: Date, retention: Duration) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let current_path = dir.join(daily_log_name(today));
        Ok(Self {
            dir,
            current_date: today,
            current_path,
            retention,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current_log_path(&self) -> &Path {
        &self.current_path
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }

    pub fn summary_json_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_JSON_FILE)
    }

    /// Append `line` to the log for `at`'s date, rolling over (and pruning)
    /// first if the date changed since the last append.
    pub fn append(&mut self, at: OffsetDateTime, line: &str) -> io::Result<()> {
        if at.date() != self.current_date {
            self.roll_over(at.date());
        }
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.current_path)?;
        writeln!(file, "{line}")
    }

    fn roll_over(&mut self, date: Date) {
        debug!(from = %self.current_date, to = %date, "rolling daily log");
        self.current_date = date;
        self.current_path = self.dir.join(daily_log_name(date));
        self.prune_expired(SystemTime::now());
    }

    /// Best-effort removal of daily logs last modified more than the
    /// retention window before `now`. Returns how many files were removed.
    pub fn prune_expired(&self, now: SystemTime) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "cannot list log dir for pruning");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_daily_log(name) {
                continue;
            }
            let path = entry.path();
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(m) => m,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping log without mtime");
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.retention {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "pruned expired daily log");
                    removed += 1;
                }
                Err(e) => debug!(path = %path.display(), error = %e, "failed to prune daily log"),
            }
        }
        removed
    }

    /// Overwrite the summary file. Readers see either the previous or the new
    /// contents, never a partial write.
    pub fn write_summary(&self, contents: &str) -> io::Result<()> {
        write_atomic(&self.summary_path(), contents.as_bytes())
    }

    pub fn write_summary_json(&self, snapshot: &SummarySnapshot) -> io::Result<()> {
        let body = serde_json::to_vec_pretty(snapshot).map_err(io::Error::other)?;
        write_atomic(&self.summary_json_path(), &body)
    }
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn daily_log_names() {
        assert_eq!(daily_log_name(date!(2024-01-09)), "uptime_log_2024-01-09.log");
        assert!(is_daily_log("uptime_log_2024-01-09.log"));
        assert!(!is_daily_log(SUMMARY_FILE));
        assert!(!is_daily_log(SUMMARY_JSON_FILE));
        assert!(!is_daily_log("notes.txt"));
    }

    #[test]
    fn append_rolls_over_on_date_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LogStore::open(dir.path(), date!(2024-05-01), DEFAULT_RETENTION).unwrap();

        store.append(datetime!(2024-05-01 23:59:58 UTC), "first").unwrap();
        store.append(datetime!(2024-05-02 00:00:01 UTC), "second").unwrap();

        let day1 = fs::read_to_string(dir.path().join("uptime_log_2024-05-01.log")).unwrap();
        let day2 = fs::read_to_string(dir.path().join("uptime_log_2024-05-02.log")).unwrap();
        assert_eq!(day1, "first\n");
        assert_eq!(day2, "second\n");
        assert!(store.current_log_path().ends_with("uptime_log_2024-05-02.log"));
    }

    #[test]
    fn summary_is_overwritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path(), date!(2024-05-01), DEFAULT_RETENTION).unwrap();
        store.write_summary("one\n").unwrap();
        store.write_summary("two\n").unwrap();
        assert_eq!(fs::read_to_string(store.summary_path()).unwrap(), "two\n");
        assert!(!dir.path().join("uptime_master_summary.log.tmp").exists());
    }

    #[test]
    fn append_recreates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("log");
        let mut store = LogStore::open(&logs, date!(2024-05-01), DEFAULT_RETENTION).unwrap();
        fs::remove_dir_all(&logs).unwrap();
        store.append(datetime!(2024-05-01 10:00:00 UTC), "line").unwrap();
        assert!(store.current_log_path().exists());
    }

    #[test]
    fn prune_on_missing_directory_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("log");
        let store = LogStore::open(&logs, date!(2024-05-01), DEFAULT_RETENTION).unwrap();
        fs::remove_dir_all(&logs).unwrap();
        assert_eq!(store.prune_expired(SystemTime::now()), 0);
    }
}
