//! Intermediate shapes between the HTML parser and the normalizer.
//!
//! A [`RawEntry`] is one result block with its strings already
//! whitespace-cleaned but not yet coerced. Normalization into the typed
//! records in `psireg_core` happens in [`crate::normalize`].

/// One page of raw HTML as returned by the register.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub page: u32,
    pub html: String,
}

/// Everything a fetch run produced: the pages that arrived, in no particular
/// order, and the page numbers that were lost to transport failures.
#[derive(Debug, Default)]
pub struct PageBatch {
    pub pages: Vec<FetchedPage>,
    pub lost_pages: Vec<u32>,
}

impl PageBatch {
    pub fn merge(&mut self, other: PageBatch) {
        self.pages.extend(other.pages);
        self.lost_pages.extend(other.lost_pages);
    }
}

/// Value side of a labeled attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// The attribute had a label but no value element.
    Missing,
    Text(String),
    /// A value rendered as a list, e.g. one line per day of opening hours.
    Lines(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub key: String,
    pub value: RawValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub section_77: bool,
    pub address: Option<String>,
    pub attributes: Vec<RawAttribute>,
    /// A value in the block carried the conditions-attached asterisk.
    pub conditions_attached: bool,
}

/// Result of parsing one page: the entries that could be read and how many
/// blocks were skipped.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub entries: Vec<RawEntry>,
    pub skipped: usize,
}
