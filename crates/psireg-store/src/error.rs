use std::path::PathBuf;

use chrono::NaiveDate;
use psireg_core::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot already exists: {}", .path.display())]
    SnapshotExists { path: PathBuf },

    #[error("no {kind} snapshot found in the {lookback_days} days before {before}")]
    NoBaseline {
        kind: EntityKind,
        before: NaiveDate,
        lookback_days: u32,
    },
}
