//! Dated JSON snapshot files.
//!
//! One file per register per calendar date, named
//! `{slug}-data-{YYYY-MM-DD}.json`, holding a pretty-printed JSON array.
//! A written snapshot is never rewritten unless the caller asks for it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use psireg_core::EntityKind;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// A previous snapshot and the date it was taken.
#[derive(Debug)]
pub struct Baseline<T> {
    pub date: NaiveDate,
    pub records: Vec<T>,
}

/// Snapshot files under one data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn snapshot_path(&self, kind: EntityKind, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{}-data-{}.json", kind.slug(), date.format("%Y-%m-%d")))
    }

    #[must_use]
    pub fn event_log_path(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("pharmacy-events-{}.log", date.format("%Y-%m-%d")))
    }

    /// Writes `records` as the `kind` snapshot for `date`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SnapshotExists`] if the file is already there and
    ///   `overwrite` is `false`.
    /// - [`StoreError::Io`] / [`StoreError::Json`] on write failure.
    pub fn write_snapshot<T: Serialize>(
        &self,
        kind: EntityKind,
        date: NaiveDate,
        records: &[T],
        overwrite: bool,
    ) -> Result<PathBuf, StoreError> {
        let path = self.snapshot_path(kind, date);
        if path.exists() && !overwrite {
            return Err(StoreError::SnapshotExists { path });
        }
        self.ensure_root()?;

        let file = File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(%kind, path = %path.display(), records = records.len(), "wrote snapshot");
        Ok(path)
    }

    /// Reads the `kind` snapshot for `date`, or `None` if there is no file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Json`] if it does not parse.
    pub fn read_snapshot<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        date: NaiveDate,
    ) -> Result<Option<Vec<T>>, StoreError> {
        let path = self.snapshot_path(kind, date);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let records = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Json { path, source })?;
        Ok(Some(records))
    }

    /// Finds the most recent snapshot strictly before `before`, walking back
    /// one day at a time for at most `lookback_days` days.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoBaseline`] if no snapshot exists in the
    /// window, or any error from [`Self::read_snapshot`].
    pub fn load_baseline<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        before: NaiveDate,
        lookback_days: u32,
    ) -> Result<Baseline<T>, StoreError> {
        for offset in 1..=u64::from(lookback_days) {
            let Some(date) = before.checked_sub_days(Days::new(offset)) else {
                break;
            };
            if let Some(records) = self.read_snapshot(kind, date)? {
                if offset > 1 {
                    tracing::info!(%kind, %date, days_back = offset, "using older baseline snapshot");
                }
                return Ok(Baseline { date, records });
            }
        }
        Err(StoreError::NoBaseline {
            kind,
            before,
            lookback_days,
        })
    }

    /// Writes one line per event to the event log for `date`, replacing any
    /// earlier log for that date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on write failure.
    pub fn write_event_log(&self, date: NaiveDate, lines: &[String]) -> Result<PathBuf, StoreError> {
        self.ensure_root()?;
        let path = self.event_log_path(date);
        let mut body = lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        fs::write(&path, body).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psireg_core::Pharmacy;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn snapshot_path_uses_slug_and_iso_date() {
        let store = SnapshotStore::new("/data");
        assert_eq!(
            store.snapshot_path(EntityKind::Pharmacy, date(2022, 1, 12)),
            PathBuf::from("/data/pharmacy-data-2022-01-12.json")
        );
        assert_eq!(
            store.snapshot_path(EntityKind::Assistant, date(2021, 9, 3)),
            PathBuf::from("/data/assistant-data-2021-09-03.json")
        );
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested"));
        let records = vec![Pharmacy::new(1, "One"), Pharmacy::new(2, "Two")];

        let path = store
            .write_snapshot(EntityKind::Pharmacy, date(2022, 1, 12), &records, false)
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"Name\": \"One\""));

        let loaded: Vec<Pharmacy> = store
            .read_snapshot(EntityKind::Pharmacy, date(2022, 1, 12))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn existing_snapshot_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let day = date(2022, 1, 12);
        store
            .write_snapshot(EntityKind::Pharmacy, day, &[Pharmacy::new(1, "One")], false)
            .unwrap();

        let err = store
            .write_snapshot(EntityKind::Pharmacy, day, &[Pharmacy::new(2, "Two")], false)
            .unwrap_err();
        assert!(matches!(err, StoreError::SnapshotExists { .. }));

        store
            .write_snapshot(EntityKind::Pharmacy, day, &[Pharmacy::new(2, "Two")], true)
            .unwrap();
        let loaded: Vec<Pharmacy> = store.read_snapshot(EntityKind::Pharmacy, day).unwrap().unwrap();
        assert_eq!(loaded[0].registration_number, 2);
    }

    #[test]
    fn missing_snapshot_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let loaded: Option<Vec<Pharmacy>> = store
            .read_snapshot(EntityKind::Pharmacy, date(2022, 1, 12))
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn baseline_walks_back_to_most_recent_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .write_snapshot(EntityKind::Pharmacy, date(2022, 1, 5), &[Pharmacy::new(5, "Old")], false)
            .unwrap();
        store
            .write_snapshot(EntityKind::Pharmacy, date(2022, 1, 9), &[Pharmacy::new(9, "Newer")], false)
            .unwrap();
        // same-day snapshot is never its own baseline
        store
            .write_snapshot(EntityKind::Pharmacy, date(2022, 1, 12), &[Pharmacy::new(12, "Today")], false)
            .unwrap();

        let baseline: Baseline<Pharmacy> = store
            .load_baseline(EntityKind::Pharmacy, date(2022, 1, 12), 30)
            .unwrap();
        assert_eq!(baseline.date, date(2022, 1, 9));
        assert_eq!(baseline.records[0].name, "Newer");
    }

    #[test]
    fn baseline_ignores_other_registers() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .write_snapshot(EntityKind::Pharmacist, date(2022, 1, 11), &[serde_json::json!({})], false)
            .unwrap();

        let err = store
            .load_baseline::<Pharmacy>(EntityKind::Pharmacy, date(2022, 1, 12), 30)
            .unwrap_err();
        assert!(matches!(err, StoreError::NoBaseline { .. }));
    }

    #[test]
    fn baseline_outside_lookback_window_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .write_snapshot(EntityKind::Pharmacy, date(2021, 12, 1), &[Pharmacy::new(1, "Old")], false)
            .unwrap();

        let err = store
            .load_baseline::<Pharmacy>(EntityKind::Pharmacy, date(2022, 1, 12), 7)
            .unwrap_err();
        assert!(
            matches!(err, StoreError::NoBaseline { lookback_days: 7, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn event_log_has_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store
            .write_event_log(
                date(2022, 1, 12),
                &["first".to_owned(), "second".to_owned()],
            )
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }
}
