//! String cleanup shared by the parser and the value converter.

use std::sync::LazyLock;

use regex::Regex;

static BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid break regex"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

const SECTION_77_MARKER: &str = "section 77";

/// Normalizes register text:
/// - removes the space the register puts before commas,
/// - puts exactly one space after every comma,
/// - collapses runs of whitespace and trims both ends.
///
/// Returns `None` for empty or whitespace-only input.
pub(crate) fn clean_up_string(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let spaced = raw.replace(" ,", ",").replace(',', ", ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Splits a display name at the Section 77 emergency-registration marker.
///
/// The marker and everything after it are dropped, along with any opening
/// bracket or dash that introduced it. Returns the remaining name and
/// whether the marker was present.
pub(crate) fn strip_section_77(name: &str) -> (String, bool) {
    let lower = name.to_ascii_lowercase();
    let Some(pos) = lower.find(SECTION_77_MARKER) else {
        return (name.to_owned(), false);
    };
    let stripped = name[..pos]
        .trim_end_matches(|c: char| {
            c.is_whitespace() || matches!(c, '(' | '[' | '-' | '–' | ',' | ':')
        })
        .to_owned();
    (stripped, true)
}

/// Turns the inner text of an HTML comment into plain text. Line breaks
/// become comma separators and any other markup is dropped.
pub(crate) fn comment_to_text(comment: &str) -> Option<String> {
    let with_commas = BREAK_TAG.replace_all(comment, ", ");
    let plain = ANY_TAG.replace_all(&with_commas, " ");
    clean_up_string(&plain)
        .map(|s| s.trim_matches(|c: char| c == ',' || c.is_whitespace()).to_owned())
        .filter(|s| !s.is_empty())
}
