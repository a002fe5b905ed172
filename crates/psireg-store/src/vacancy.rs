//! Supervising/superintendent vacancy tracking across daily snapshots.
//!
//! The only state carried from one run to the next is the pair of
//! `... Vacant Since` markers on each pharmacy. Everything else in today's
//! record comes fresh from the register.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use psireg_core::{Pharmacy, Role};

use crate::snapshot::Baseline;

/// A transition worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VacancyEvent {
    /// A role at a pharmacy seen yesterday is now unfilled.
    NewVacancy {
        registration_number: i64,
        pharmacy: String,
        role: Role,
    },
    /// A pharmacy not seen yesterday appeared with a role unfilled.
    NewPharmacyVacant {
        registration_number: i64,
        pharmacy: String,
        role: Role,
    },
    /// A role that was unfilled yesterday has a holder today.
    VacancyFilled {
        registration_number: i64,
        pharmacy: String,
        role: Role,
        holder: String,
    },
    /// A pharmacy not seen yesterday appeared with at least one role filled.
    NewPharmacy {
        registration_number: i64,
        pharmacy: String,
    },
}

impl fmt::Display for VacancyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VacancyEvent::NewVacancy {
                registration_number,
                pharmacy,
                role,
            } => write!(
                f,
                "NEW VACANCY: {role} Pharmacist at {pharmacy} (#{registration_number})"
            ),
            VacancyEvent::NewPharmacyVacant {
                registration_number,
                pharmacy,
                role,
            } => write!(
                f,
                "NEW PHARMACY, VACANT: {role} Pharmacist at {pharmacy} (#{registration_number})"
            ),
            VacancyEvent::VacancyFilled {
                registration_number,
                pharmacy,
                role,
                holder,
            } => write!(
                f,
                "VACANCY FILLED: {role} Pharmacist at {pharmacy} (#{registration_number}) is now {holder}"
            ),
            VacancyEvent::NewPharmacy {
                registration_number,
                pharmacy,
            } => write!(f, "NEW PHARMACY: {pharmacy} (#{registration_number})"),
        }
    }
}

/// Applies one day's vacancy rules to a single pharmacy.
///
/// `yesterday` is the same pharmacy (by registration number) from the
/// baseline snapshot taken on `baseline_date`, if it was there. Returns
/// today's record with its `Vacant Since` markers set, plus the events the
/// change produced.
///
/// A role that was already empty in the baseline but carries no marker
/// (a snapshot written before markers existed) is dated from the baseline,
/// not from today, and raises no event.
#[must_use]
pub fn track_vacancies(
    mut today: Pharmacy,
    yesterday: Option<&Pharmacy>,
    baseline_date: NaiveDate,
    run_date: NaiveDate,
) -> (Pharmacy, Vec<VacancyEvent>) {
    let mut events = Vec::new();
    let mut any_filled = false;

    for role in Role::ALL {
        match (today.role_holder(role).map(str::to_owned), yesterday) {
            (None, Some(prev)) => match (prev.vacant_since(role), prev.role_holder(role)) {
                (Some(since), _) => today.set_vacant_since(role, Some(since)),
                (None, None) => today.set_vacant_since(role, Some(baseline_date)),
                (None, Some(_)) => {
                    today.set_vacant_since(role, Some(run_date));
                    events.push(VacancyEvent::NewVacancy {
                        registration_number: today.registration_number,
                        pharmacy: today.label(),
                        role,
                    });
                }
            },
            (None, None) => {
                today.set_vacant_since(role, Some(run_date));
                events.push(VacancyEvent::NewPharmacyVacant {
                    registration_number: today.registration_number,
                    pharmacy: today.label(),
                    role,
                });
            }
            (Some(holder), Some(prev)) => {
                today.set_vacant_since(role, None);
                if prev.role_holder(role).is_none() {
                    events.push(VacancyEvent::VacancyFilled {
                        registration_number: today.registration_number,
                        pharmacy: today.label(),
                        role,
                        holder,
                    });
                }
            }
            (Some(_), None) => {
                today.set_vacant_since(role, None);
                any_filled = true;
            }
        }
    }

    if any_filled {
        events.push(VacancyEvent::NewPharmacy {
            registration_number: today.registration_number,
            pharmacy: today.label(),
        });
    }

    (today, events)
}

/// Runs [`track_vacancies`] over a whole snapshot against its baseline.
///
/// With no baseline every pharmacy is treated as new. Output order follows
/// `today`.
#[must_use]
pub fn track_snapshot(
    today: Vec<Pharmacy>,
    baseline: Option<&Baseline<Pharmacy>>,
    run_date: NaiveDate,
) -> (Vec<Pharmacy>, Vec<VacancyEvent>) {
    let baseline_date = baseline.map_or(run_date, |b| b.date);
    let index: HashMap<i64, &Pharmacy> = baseline
        .map(|b| b.records.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|p| (p.registration_number, p))
        .collect();

    let mut records = Vec::with_capacity(today.len());
    let mut events = Vec::new();
    for pharmacy in today {
        let prev = index.get(&pharmacy.registration_number).copied();
        let (tracked, mut found) = track_vacancies(pharmacy, prev, baseline_date, run_date);
        for event in &found {
            tracing::info!(registration_number = tracked.registration_number, "{event}");
        }
        events.append(&mut found);
        records.push(tracked);
    }
    (records, events)
}
