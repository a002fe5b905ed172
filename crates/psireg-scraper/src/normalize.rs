//! Normalization from [`RawEntry`] blocks to the typed records in
//! `psireg_core`.
//!
//! Each attribute is normalized on its own into a `Result`; a failed field
//! is logged and left out while the rest of the record is kept. Only a
//! pharmacy without a registration number is rejected outright, since the
//! number is its identity across snapshots.

use std::collections::BTreeMap;

use psireg_core::{FieldValue, OpeningHours, Person, Pharmacy};

use crate::classify::{is_hospital, is_other};
use crate::convert::convert_value;
use crate::error::ParseError;
use crate::hours::parse_opening_hours;
use crate::types::{RawAttribute, RawEntry, RawValue};

const CONDITIONS_ATTACHED: &str = "Conditions Attached to Registration";
const OPENING_HOURS: &str = "Opening Hours";
const PSI_REGISTRATION_NUMBER: &str = "PSI Registration Number";
const REGISTRATION_NUMBER: &str = "Registration Number";

enum NormalizedField {
    Hours(OpeningHours),
    Value(String, FieldValue),
}

fn normalize_attribute(attribute: RawAttribute) -> Result<NormalizedField, ParseError> {
    let RawAttribute { key, value } = attribute;
    if key == OPENING_HOURS {
        return match value {
            RawValue::Lines(lines) => Ok(NormalizedField::Hours(parse_opening_hours(&lines))),
            RawValue::Text(line) => Ok(NormalizedField::Hours(parse_opening_hours(&[line]))),
            RawValue::Missing => Err(ParseError::UnexpectedShape {
                key,
                reason: "no opening hours listed".to_owned(),
            }),
        };
    }

    let converted = match value {
        RawValue::Missing => FieldValue::Null,
        RawValue::Text(text) => convert_value(Some(&text)),
        RawValue::Lines(lines) => convert_value(Some(&lines.join(", "))),
    };
    Ok(NormalizedField::Value(key, converted))
}

/// Maps the register's numeric ownership codes to labels; other values pass
/// through as text.
fn ownership_label(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Int(1) => Some("Private".to_owned()),
        FieldValue::Int(3) => Some("Sole Trader".to_owned()),
        FieldValue::Int(4) => Some("Public".to_owned()),
        other => other.into_text(),
    }
}

/// Normalizes one pharmacy block, classifying it by name.
///
/// # Errors
///
/// Returns [`ParseError::MissingRegistrationNumber`] if the block has no
/// integer `PSI Registration Number`.
pub fn normalize_pharmacy(entry: RawEntry) -> Result<Pharmacy, ParseError> {
    let RawEntry {
        name,
        section_77,
        address,
        attributes,
        conditions_attached,
    } = entry;

    let mut registration_number = None;
    let mut pharmacy = Pharmacy::new(0, name);
    pharmacy.address = address;
    pharmacy.section_77 = section_77;

    for attribute in attributes {
        let field = match normalize_attribute(attribute) {
            Ok(field) => field,
            Err(err) => {
                tracing::debug!(name = %pharmacy.name, error = %err, "omitting field");
                continue;
            }
        };
        match field {
            NormalizedField::Hours(hours) => pharmacy.opening_hours = Some(hours),
            NormalizedField::Value(key, value) => match key.as_str() {
                PSI_REGISTRATION_NUMBER => registration_number = value.as_int(),
                "Pharmacy Owner" => pharmacy.owner = value.into_text(),
                "Ownership Type" => pharmacy.ownership_type = ownership_label(value),
                "Superintendent Pharmacist" => {
                    pharmacy.superintendent_pharmacist = value.into_text();
                }
                "Supervising Pharmacist" => pharmacy.supervising_pharmacist = value.into_text(),
                _ => {
                    pharmacy.extra.insert(key, value);
                }
            },
        }
    }

    if conditions_attached {
        pharmacy.extra.insert(CONDITIONS_ATTACHED.to_owned(), FieldValue::Bool(true));
    }
    pharmacy.registration_number =
        registration_number.ok_or_else(|| ParseError::MissingRegistrationNumber {
            name: pharmacy.name.clone(),
        })?;
    pharmacy.hospital = is_hospital(&pharmacy.name);
    pharmacy.other = is_other(&pharmacy.name);

    Ok(pharmacy)
}

/// Normalizes one pharmacist or assistant block.
#[must_use]
pub fn normalize_person(entry: RawEntry) -> Person {
    let RawEntry {
        name,
        section_77,
        address,
        attributes,
        conditions_attached,
    } = entry;

    let mut person = Person {
        name,
        address,
        section_77,
        registration_number: None,
        date_registered: None,
        extra: BTreeMap::new(),
    };

    for attribute in attributes {
        match normalize_attribute(attribute) {
            Ok(NormalizedField::Value(key, value)) => match key.as_str() {
                REGISTRATION_NUMBER | PSI_REGISTRATION_NUMBER => {
                    person.registration_number = value.as_int();
                }
                "Date Registered" => person.date_registered = value.into_text(),
                _ => {
                    person.extra.insert(key, value);
                }
            },
            Ok(NormalizedField::Hours(_)) => {
                tracing::debug!(name = %person.name, "ignoring opening hours on a person record");
            }
            Err(err) => {
                tracing::debug!(name = %person.name, error = %err, "omitting field");
            }
        }
    }

    // the asterisk outranks a "No" in the conditions attribute
    if conditions_attached {
        person.extra.insert(CONDITIONS_ATTACHED.to_owned(), FieldValue::Bool(true));
    }

    person
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
