//! Coercion of attribute text into typed values.

use psireg_core::FieldValue;

use crate::parse_helpers::clean_up_string;

const TRUE_WORDS: [&str; 2] = ["YES", "Y"];
const FALSE_WORDS: [&str; 2] = ["NO", "N"];
const NULL_WORDS: [&str; 1] = ["N/A"];

/// Converts a raw attribute value into a [`FieldValue`].
///
/// Order matters: integers are tried first so numeric strings are never read
/// as booleans. A missing or blank value is `Null`. `YES`/`Y` and `NO`/`N`
/// (any case) become booleans and `N/A` becomes `Null`. Anything else stays
/// as cleaned-up text.
#[must_use]
pub fn convert_value(raw: Option<&str>) -> FieldValue {
    let Some(cleaned) = raw.and_then(clean_up_string) else {
        return FieldValue::Null;
    };
    if let Ok(n) = cleaned.parse::<i64>() {
        return FieldValue::Int(n);
    }
    let upper = cleaned.to_uppercase();
    if TRUE_WORDS.contains(&upper.as_str()) {
        FieldValue::Bool(true)
    } else if FALSE_WORDS.contains(&upper.as_str()) {
        FieldValue::Bool(false)
    } else if NULL_WORDS.contains(&upper.as_str()) {
        FieldValue::Null
    } else {
        FieldValue::Text(cleaned)
    }
}
