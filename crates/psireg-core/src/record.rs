//! Typed register records.
//!
//! Every attribute the register is known to publish has a named field; labels
//! the register adds later land in the flattened `extra` map so nothing is
//! dropped between runs. Field names serialize to the register's own labels,
//! which keeps the JSON snapshots readable by the downstream tooling.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::hours::OpeningHours;
use crate::CoreError;

/// The three registers the regulator publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Pharmacy,
    Pharmacist,
    Assistant,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Pharmacy,
        EntityKind::Pharmacist,
        EntityKind::Assistant,
    ];

    /// Value of the `type` query parameter on the search endpoint.
    #[must_use]
    pub fn query_value(self) -> u8 {
        match self {
            EntityKind::Pharmacy => 0,
            EntityKind::Pharmacist => 1,
            EntityKind::Assistant => 2,
        }
    }

    /// Lowercase name used in snapshot file names.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Pharmacy => "pharmacy",
            EntityKind::Pharmacist => "pharmacist",
            EntityKind::Assistant => "assistant",
        }
    }

    /// Pharmacists and assistants are people; their blocks share one layout.
    #[must_use]
    pub fn is_person(self) -> bool {
        !matches!(self, EntityKind::Pharmacy)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pharmacy" | "pharmacies" | "0" => Ok(EntityKind::Pharmacy),
            "pharmacist" | "pharmacists" | "1" => Ok(EntityKind::Pharmacist),
            "assistant" | "assistants" | "2" => Ok(EntityKind::Assistant),
            other => Err(CoreError::UnknownEntityKind(other.to_string())),
        }
    }
}

/// A coerced attribute value.
///
/// Serialized untagged so snapshots hold plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Text view of the value. Integers are rendered back to digits; booleans
    /// and nulls have no text form.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Int(n) => Some(n.to_string()),
            FieldValue::Bool(_) | FieldValue::Null => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// Pharmacy roles whose vacancy is tracked across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Supervising,
    Superintendent,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Supervising, Role::Superintendent];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Supervising => f.write_str("Supervising"),
            Role::Superintendent => f.write_str("Superintendent"),
        }
    }
}

/// One entry in the pharmacy register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pharmacy {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "Section 77", default)]
    pub section_77: bool,
    #[serde(rename = "PSI Registration Number")]
    pub registration_number: i64,
    #[serde(rename = "Pharmacy Owner", default)]
    pub owner: Option<String>,
    #[serde(
        rename = "Ownership Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ownership_type: Option<String>,
    #[serde(rename = "Superintendent Pharmacist", default)]
    pub superintendent_pharmacist: Option<String>,
    #[serde(rename = "Supervising Pharmacist", default)]
    pub supervising_pharmacist: Option<String>,
    #[serde(
        rename = "Opening Hours",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_hours: Option<OpeningHours>,
    #[serde(rename = "Hospital", default)]
    pub hospital: bool,
    #[serde(rename = "Other", default)]
    pub other: bool,
    #[serde(
        rename = "Supervising Pharmacist Vacant Since",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub supervising_vacant_since: Option<NaiveDate>,
    #[serde(
        rename = "Superintendent Pharmacist Vacant Since",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub superintendent_vacant_since: Option<NaiveDate>,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, FieldValue>,
}

impl Pharmacy {
    /// A pharmacy with only its identity filled in.
    #[must_use]
    pub fn new(registration_number: i64, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            section_77: false,
            registration_number,
            owner: None,
            ownership_type: None,
            superintendent_pharmacist: None,
            supervising_pharmacist: None,
            opening_hours: None,
            hospital: false,
            other: false,
            supervising_vacant_since: None,
            superintendent_vacant_since: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn role_holder(&self, role: Role) -> Option<&str> {
        match role {
            Role::Supervising => self.supervising_pharmacist.as_deref(),
            Role::Superintendent => self.superintendent_pharmacist.as_deref(),
        }
    }

    #[must_use]
    pub fn vacant_since(&self, role: Role) -> Option<NaiveDate> {
        match role {
            Role::Supervising => self.supervising_vacant_since,
            Role::Superintendent => self.superintendent_vacant_since,
        }
    }

    pub fn set_vacant_since(&mut self, role: Role, since: Option<NaiveDate>) {
        match role {
            Role::Supervising => self.supervising_vacant_since = since,
            Role::Superintendent => self.superintendent_vacant_since = since,
        }
    }

    /// `Name, Address` as printed in operator reports.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.address {
            Some(address) => format!("{}, {address}", self.name),
            None => self.name.clone(),
        }
    }
}

/// One entry in the pharmacist or assistant register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "Section 77", default)]
    pub section_77: bool,
    #[serde(rename = "Registration Number", default)]
    pub registration_number: Option<i64>,
    #[serde(
        rename = "Date Registered",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_registered: Option<String>,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, FieldValue>,
}
