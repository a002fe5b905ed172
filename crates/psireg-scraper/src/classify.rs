//! Pharmacy classification by name.

const HOSPITAL_TERMS: [&str; 5] = ["h.s.e.", "department", "clinic", "hospice", "hospital"];

/// Brand whose name contains "hospital" but is a community pharmacy.
const HOSPITAL_OVERRIDE: &str = "allcare";

const OTHER_TERMS: [&str; 5] = [
    "animal",
    "stock health",
    "tcp",
    "baxter healthcare",
    "avec",
];

/// `true` when the name carries a hospital term and is not an Allcare branch.
#[must_use]
pub fn is_hospital(name: &str) -> bool {
    let lower = name.to_lowercase();
    if !HOSPITAL_TERMS.iter().any(|term| lower.contains(term)) {
        return false;
    }
    !lower.contains(HOSPITAL_OVERRIDE)
}

/// `true` for veterinary, wholesale and other non-community outlets.
#[must_use]
pub fn is_other(name: &str) -> bool {
    let lower = name.to_lowercase();
    OTHER_TERMS.iter().any(|term| lower.contains(term))
}
