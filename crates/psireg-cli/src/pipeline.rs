//! One scrape run per register: fetch, parse, normalize, track, persist.
//!
//! Lost pages and unreadable blocks only shrink the snapshot; the run still
//! writes whatever it managed to read. The pharmacy run refuses to start
//! without a baseline snapshot unless it is bootstrapping.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::PathBuf;

use chrono::NaiveDate;
use psireg_core::{AppConfig, EntityKind, Person, Pharmacy};
use psireg_scraper::{
    normalize_person, normalize_pharmacy, parse_page, PageBatch, RawEntry, RegisterClient,
};
use psireg_store::{diff_pharmacies, track_snapshot, Baseline, SnapshotStore, StoreError};
use serde_json::Value;

#[derive(Debug, Clone)]
pub(crate) struct ScrapeOptions {
    pub date: NaiveDate,
    pub bootstrap: bool,
    pub force: bool,
}

#[derive(Debug)]
pub(crate) struct RunSummary {
    pub records: usize,
    pub skipped: usize,
    pub lost_pages: Vec<u32>,
    /// Vacancy events then added/removed lines, as written to the event log.
    pub events: Vec<String>,
    pub snapshot: PathBuf,
}

pub(crate) struct Pipeline {
    client: RegisterClient,
    store: SnapshotStore,
    lookback_days: u32,
}

impl Pipeline {
    pub(crate) fn new(client: RegisterClient, store: SnapshotStore, lookback_days: u32) -> Self {
        Self {
            client,
            store,
            lookback_days,
        }
    }

    pub(crate) fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            RegisterClient::from_config(config)?,
            SnapshotStore::new(&config.data_dir),
            config.snapshot_lookback_days,
        ))
    }

    pub(crate) async fn scrape(
        &self,
        kind: EntityKind,
        options: &ScrapeOptions,
    ) -> anyhow::Result<RunSummary> {
        let path = self.store.snapshot_path(kind, options.date);
        if path.exists() && !options.force {
            return Err(StoreError::SnapshotExists { path }.into());
        }

        match kind {
            EntityKind::Pharmacy => self.scrape_pharmacies(options).await,
            EntityKind::Pharmacist | EntityKind::Assistant => self.scrape_people(kind, options).await,
        }
    }

    async fn scrape_pharmacies(&self, options: &ScrapeOptions) -> anyhow::Result<RunSummary> {
        let kind = EntityKind::Pharmacy;
        let baseline = match self
            .store
            .load_baseline::<Pharmacy>(kind, options.date, self.lookback_days)
        {
            Ok(baseline) => Some(baseline),
            Err(StoreError::NoBaseline { .. }) if options.bootstrap => {
                tracing::warn!(%kind, date = %options.date, "no baseline snapshot; bootstrapping");
                None
            }
            Err(err) => return Err(err.into()),
        };

        let previous_count = baseline.as_ref().map(|b| b.records.len());
        let batch = self.client.fetch_register(kind, previous_count).await;
        let lost_pages = batch.lost_pages.clone();
        let (entries, mut skipped) = parse_batch(batch, kind);

        let mut pharmacies = Vec::with_capacity(entries.len());
        for entry in entries {
            match normalize_pharmacy(entry) {
                Ok(pharmacy) => pharmacies.push(pharmacy),
                Err(err) => {
                    tracing::warn!(%kind, error = %err, "skipping record");
                    skipped += 1;
                }
            }
        }
        let pharmacies = dedupe_by(pharmacies, kind, |p| Some(p.registration_number));

        let (mut records, vacancy_events) = track_snapshot(pharmacies, baseline.as_ref(), options.date);
        let events = match &baseline {
            Some(Baseline { date, records: previous }) => {
                tracing::info!(%kind, baseline = %date, "tracked vacancies against baseline");
                if !lost_pages.is_empty() {
                    let carried = carry_forward_unseen(&mut records, previous);
                    tracing::warn!(
                        %kind,
                        lost_pages = lost_pages.len(),
                        carried,
                        "pages lost; kept unseen baseline pharmacies instead of reporting them removed"
                    );
                }
                let mut events: Vec<String> = vacancy_events.iter().map(ToString::to_string).collect();
                for line in diff_pharmacies(&records, previous).report_lines() {
                    tracing::info!(%kind, "{line}");
                    events.push(line);
                }
                events
            }
            // every record is new on a first run; markers are stamped but nothing is reported
            None => Vec::new(),
        };

        let snapshot = self
            .store
            .write_snapshot(kind, options.date, &records, options.force)?;
        self.store.write_event_log(options.date, &events)?;

        Ok(RunSummary {
            records: records.len(),
            skipped,
            lost_pages,
            events,
            snapshot,
        })
    }

    async fn scrape_people(
        &self,
        kind: EntityKind,
        options: &ScrapeOptions,
    ) -> anyhow::Result<RunSummary> {
        // only the record count is needed, for the page estimate
        let previous_count = match self
            .store
            .load_baseline::<Value>(kind, options.date, self.lookback_days)
        {
            Ok(baseline) => Some(baseline.records.len()),
            Err(StoreError::NoBaseline { .. }) => None,
            Err(err) => return Err(err.into()),
        };

        let batch = self.client.fetch_register(kind, previous_count).await;
        let lost_pages = batch.lost_pages.clone();
        let (entries, skipped) = parse_batch(batch, kind);

        let people: Vec<Person> = entries.into_iter().map(normalize_person).collect();
        let people = dedupe_by(people, kind, |p| p.registration_number);

        let snapshot = self
            .store
            .write_snapshot(kind, options.date, &people, options.force)?;

        Ok(RunSummary {
            records: people.len(),
            skipped,
            lost_pages,
            events: Vec::new(),
            snapshot,
        })
    }

    /// Added/removed report between the pharmacy snapshot for `date` and the
    /// snapshot before it.
    pub(crate) fn diff(&self, date: NaiveDate) -> anyhow::Result<Vec<String>> {
        let kind = EntityKind::Pharmacy;
        let today: Vec<Pharmacy> = self.store.read_snapshot(kind, date)?.ok_or_else(|| {
            anyhow::anyhow!(
                "no {kind} snapshot at {}",
                self.store.snapshot_path(kind, date).display()
            )
        })?;
        let baseline = self
            .store
            .load_baseline::<Pharmacy>(kind, date, self.lookback_days)?;

        tracing::info!(%kind, %date, baseline = %baseline.date, "comparing snapshots");
        Ok(diff_pharmacies(&today, &baseline.records).report_lines())
    }
}

/// Parses every fetched page in page order and concatenates the entries.
fn parse_batch(mut batch: PageBatch, kind: EntityKind) -> (Vec<RawEntry>, usize) {
    batch.pages.sort_unstable_by_key(|p| p.page);

    let mut entries = Vec::new();
    let mut skipped = 0;
    for fetched in &batch.pages {
        let parsed = parse_page(&fetched.html, kind);
        tracing::debug!(%kind, page = fetched.page, entries = parsed.entries.len(), "parsed page");
        entries.extend(parsed.entries);
        skipped += parsed.skipped;
    }
    (entries, skipped)
}

/// Appends every baseline pharmacy missing from `records`, unchanged.
///
/// Used when pages were lost: a pharmacy that may only have been on a lost
/// page keeps its `Vacant Since` markers and is not reported as removed.
/// Returns how many were carried.
fn carry_forward_unseen(records: &mut Vec<Pharmacy>, previous: &[Pharmacy]) -> usize {
    let seen: HashSet<i64> = records.iter().map(|p| p.registration_number).collect();
    let before = records.len();
    records.extend(
        previous
            .iter()
            .filter(|p| !seen.contains(&p.registration_number))
            .cloned(),
    );
    records.len() - before
}

/// Keeps the first record for each identity key. Records without a key are
/// always kept.
fn dedupe_by<T, K, F>(records: Vec<T>, kind: EntityKind, key: F) -> Vec<T>
where
    K: Eq + Hash + std::fmt::Display,
    F: Fn(&T) -> Option<K>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match key(record) {
            Some(id) if seen.contains(&id) => {
                tracing::warn!(%kind, registration_number = %id, "dropping duplicate record");
                false
            }
            Some(id) => {
                seen.insert(id);
                true
            }
            None => true,
        })
        .collect()
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
