pub mod diff;
pub mod error;
pub mod snapshot;
pub mod vacancy;

pub use diff::{diff_pharmacies, SnapshotDiff};
pub use error::StoreError;
pub use snapshot::{Baseline, SnapshotStore};
pub use vacancy::{track_snapshot, track_vacancies, VacancyEvent};
