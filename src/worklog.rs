//! Append-only local work log stored as a JSON array.

use chrono::{Local, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::TimeLogEntry;

pub struct WorkLogStore {
    path: PathBuf,
}

impl WorkLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WorkLogStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry by rewriting the whole collection.
    ///
    /// The new contents go to a sibling temp file which is then renamed over
    /// the log, so a reader never sees a half-written array.
    pub fn append(&self, entry: TimeLogEntry) -> Result<()> {
        let mut entries = self.read_all();
        entries.push(entry);

        let data = serde_json::to_string_pretty(&entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.storage_error(source))?;
            }
        }
        fs::write(&tmp_path, data).map_err(|source| Error::Storage {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| self.storage_error(source))?;

        debug!(path = %self.path.display(), count = entries.len(), "Appended work log entry");
        Ok(())
    }

    /// Every stored entry in append order.
    ///
    /// A missing file is an empty log. An unreadable or malformed file is
    /// also treated as empty, with a warning.
    pub fn read_all(&self) -> Vec<TimeLogEntry> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read work log");
                return Vec::new();
            }
        };

        match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Work log is malformed, ignoring contents");
                Vec::new()
            }
        }
    }

    /// Entries whose `logged_at` falls on `date` in the local time zone.
    pub fn query_by_date(&self, date: NaiveDate) -> Vec<TimeLogEntry> {
        self.read_all()
            .into_iter()
            .filter(|e| e.logged_at.with_timezone(&Local).date_naive() == date)
            .collect()
    }

    pub fn today(&self) -> Vec<TimeLogEntry> {
        self.query_by_date(Local::now().date_naive())
    }

    fn storage_error(&self, source: std::io::Error) -> Error {
        Error::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn setup_test_store() -> (WorkLogStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = WorkLogStore::new(dir.path().join("time_log.json"));
        (store, dir)
    }

    fn entry(issue: &str, logged_at: DateTime<Utc>) -> TimeLogEntry {
        TimeLogEntry {
            issue_id: issue.to_string(),
            summary: String::new(),
            start_time: logged_at - Duration::minutes(30),
            end_time: logged_at,
            duration_text: "30m".to_string(),
            comment: "Time tracked via JiraTimeWidget".to_string(),
            logged_at,
        }
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_missing_file_is_empty() {
        let (store, _dir) = setup_test_store();
        assert!(store.read_all().is_empty());
        assert!(store.today().is_empty());
    }

    #[test]
    fn test_append_creates_file() {
        let (store, _dir) = setup_test_store();
        store.append(entry("PROJ-1", Utc::now())).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.read_all().len(), 1);
    }

    #[test]
    fn test_append_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = WorkLogStore::new(dir.path().join("nested").join("log.json"));
        store.append(entry("PROJ-1", Utc::now())).unwrap();
        assert_eq!(store.read_all().len(), 1);
    }

    #[test]
    fn test_query_by_date_keeps_same_day_in_order() {
        let (store, _dir) = setup_test_store();
        let now = Utc::now();

        store.append(entry("PROJ-1", now)).unwrap();
        store.append(entry("PROJ-2", now - Duration::days(2))).unwrap();
        store.append(entry("PROJ-3", now)).unwrap();

        let today = store.query_by_date(Local::now().date_naive());
        let keys: Vec<&str> = today.iter().map(|e| e.issue_id.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-1", "PROJ-3"]);
    }

    #[test]
    fn test_query_other_date() {
        let (store, _dir) = setup_test_store();
        let earlier = Utc::now() - Duration::days(3);
        store.append(entry("PROJ-9", earlier)).unwrap();
        store.append(entry("PROJ-1", Utc::now())).unwrap();

        let found = store.query_by_date(earlier.with_timezone(&Local).date_naive());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].issue_id, "PROJ-9");
    }

    #[test]
    fn test_malformed_file_reads_as_empty() {
        let (store, _dir) = setup_test_store();
        fs::write(store.path(), "[{\"jiraId\": \"PROJ-1\", ").unwrap();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn test_append_after_corruption_starts_over() {
        let (store, _dir) = setup_test_store();
        fs::write(store.path(), "not json").unwrap();

        store.append(entry("PROJ-1", Utc::now())).unwrap();
        let all = store.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].issue_id, "PROJ-1");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (store, dir) = setup_test_store();
        store.append(entry("PROJ-1", Utc::now())).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_append_fails_when_target_is_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("log.json");
        fs::create_dir_all(&target).unwrap();

        let store = WorkLogStore::new(&target);
        let result = store.append(entry("PROJ-1", Utc::now()));
        assert!(matches!(result, Err(Error::Storage { .. })));
    }

    // ==================== Property-Based Tests ====================

    proptest! {
        #[test]
        fn prop_append_then_read_all(
            keys in proptest::collection::vec("[A-Z]{2,5}-[0-9]{1,4}", 1..8),
            comment in "[\\p{L}\\p{N} ]{0,40}"
        ) {
            let (store, _dir) = setup_test_store();
            let now = Utc::now();
            let mut appended = Vec::new();

            for (i, key) in keys.iter().enumerate() {
                let mut e = entry(key, now - Duration::hours(i as i64 * 13));
                e.comment = comment.clone();
                store.append(e.clone()).unwrap();
                appended.push(e);
            }

            prop_assert_eq!(store.read_all(), appended);
        }
    }
}
