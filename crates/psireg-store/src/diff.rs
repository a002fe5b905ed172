//! Added/removed pharmacies between two snapshots.

use std::collections::HashSet;

use psireg_core::Pharmacy;

/// Pharmacies that appeared or disappeared, keyed by registration number.
#[derive(Debug, Default)]
pub struct SnapshotDiff<'a> {
    /// In today's snapshot but not yesterday's, in today's order.
    pub added: Vec<&'a Pharmacy>,
    /// In yesterday's snapshot but not today's, in yesterday's order.
    pub removed: Vec<&'a Pharmacy>,
}

impl SnapshotDiff<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// One line per added or removed pharmacy, added first.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        let added = self
            .added
            .iter()
            .map(|p| format!("ADDED: {} (#{})", p.label(), p.registration_number));
        let removed = self
            .removed
            .iter()
            .map(|p| format!("REMOVED: {} (#{})", p.label(), p.registration_number));
        added.chain(removed).collect()
    }
}

#[must_use]
pub fn diff_pharmacies<'a>(today: &'a [Pharmacy], yesterday: &'a [Pharmacy]) -> SnapshotDiff<'a> {
    let today_ids: HashSet<i64> = today.iter().map(|p| p.registration_number).collect();
    let yesterday_ids: HashSet<i64> = yesterday.iter().map(|p| p.registration_number).collect();

    SnapshotDiff {
        added: today
            .iter()
            .filter(|p| !yesterday_ids.contains(&p.registration_number))
            .collect(),
        removed: yesterday
            .iter()
            .filter(|p| !today_ids.contains(&p.registration_number))
            .collect(),
    }
}
