//! Structured opening hours.
//!
//! Serialized as a JSON object keyed by day label with a trailing
//! `WeeklyHours` total, e.g.
//!
//! ```text
//! {
//!   "Monday": { "Open": "09:00", "Closed": "18:00", "HoursOpen": 9.0 },
//!   "Bank Holidays": { "Open": null, "Closed": null, "HoursOpen": 0.0 },
//!   "WeeklyHours": 9.0
//! }
//! ```

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Day label whose hours are recorded but never counted in the weekly total.
pub const BANK_HOLIDAYS: &str = "Bank Holidays";

const WEEKLY_HOURS_KEY: &str = "WeeklyHours";
const LEGACY_WEEKLY_HOURS_KEY: &str = "Weekly Hours";

const DAY_ORDER: [&str; 8] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
    BANK_HOLIDAYS,
];

/// Hours for a single day. `open`/`closed` are both `None` when the pharmacy
/// is closed that day or the source text could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(rename = "Open", with = "hhmm", default)]
    pub open: Option<NaiveTime>,
    #[serde(rename = "Closed", with = "hhmm", default)]
    pub closed: Option<NaiveTime>,
    #[serde(
        rename = "LunchClosure",
        with = "hhmm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lunch_closure: Option<NaiveTime>,
    #[serde(
        rename = "LunchReopen",
        with = "hhmm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lunch_reopen: Option<NaiveTime>,
    #[serde(rename = "HoursOpen", alias = "Hours Open", default)]
    pub hours_open: f64,
}

impl DayHours {
    #[must_use]
    pub fn closed_all_day() -> Self {
        Self {
            open: None,
            closed: None,
            lunch_closure: None,
            lunch_reopen: None,
            hours_open: 0.0,
        }
    }
}

/// A pharmacy's week. Days keep the order they were added in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpeningHours {
    days: Vec<(String, DayHours)>,
    weekly_hours: f64,
}

impl OpeningHours {
    /// Builds the week and computes `WeeklyHours` from the per-day totals,
    /// leaving out [`BANK_HOLIDAYS`].
    #[must_use]
    pub fn from_days(days: Vec<(String, DayHours)>) -> Self {
        let weekly_hours = days
            .iter()
            .filter(|(day, _)| day != BANK_HOLIDAYS)
            .map(|(_, hours)| hours.hours_open)
            .sum();
        Self { days, weekly_hours }
    }

    #[must_use]
    pub fn weekly_hours(&self) -> f64 {
        self.weekly_hours
    }

    #[must_use]
    pub fn day(&self, name: &str) -> Option<&DayHours> {
        self.days
            .iter()
            .find(|(day, _)| day == name)
            .map(|(_, hours)| hours)
    }

    pub fn days(&self) -> impl Iterator<Item = (&str, &DayHours)> {
        self.days.iter().map(|(day, hours)| (day.as_str(), hours))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl Serialize for OpeningHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len() + 1))?;
        for (day, hours) in &self.days {
            map.serialize_entry(day, hours)?;
        }
        map.serialize_entry(WEEKLY_HOURS_KEY, &self.weekly_hours)?;
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Total(f64),
    Day(DayHours),
}

impl<'de> Deserialize<'de> for OpeningHours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Entry>::deserialize(deserializer)?;
        let mut days = Vec::with_capacity(raw.len());
        let mut stored_total = None;
        for (key, entry) in raw {
            match entry {
                Entry::Total(total)
                    if key == WEEKLY_HOURS_KEY || key == LEGACY_WEEKLY_HOURS_KEY =>
                {
                    stored_total = Some(total);
                }
                Entry::Total(_) => {}
                Entry::Day(hours) => days.push((key, hours)),
            }
        }
        days.sort_by_key(|(day, _)| {
            DAY_ORDER
                .iter()
                .position(|known| known == day)
                .unwrap_or(DAY_ORDER.len())
        });

        let mut hours = OpeningHours::from_days(days);
        if let Some(total) = stored_total {
            hours.weekly_hours = total;
        }
        Ok(hours)
    }
}

/// `HH:MM` (de)serialization for optional times. `24:00` reads as midnight.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    #[allow(clippy::ref_option)]
    pub(super) fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("24:00") => Ok(Some(NaiveTime::MIN)),
            Some(s) => NaiveTime::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
