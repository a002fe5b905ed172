//! How many result pages a register has.
//!
//! The results footer carries the true count:
//!
//! ```text
//! <div class="pagination"><h4>Page 1 of 57</h4> ... </div>
//! ```
//!
//! When the footer is missing, the count is estimated from the previous
//! snapshot's record count, which can undercount if the register grew by
//! more than the safety margin since that snapshot.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Results the register renders per page.
pub const RECORDS_PER_PAGE: usize = 10;

/// Growth allowance applied to the previous record count, in percent.
const GROWTH_MARGIN_PERCENT: usize = 2;

static PAGINATION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.pagination").expect("valid pagination selector"));
static PAGE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page\s+\d+\s+of\s+(\d+)").expect("valid page regex"));

/// Reads the last page number from the pagination footer.
///
/// Returns `None` when the page has no footer or the footer has no
/// `Page X of Y` text.
#[must_use]
pub fn last_page_from_html(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let footer = document.select(&PAGINATION).next()?;
    let text = footer.text().collect::<String>();
    let caps = PAGE_OF.captures(&text)?;
    caps.get(1)?.as_str().parse::<u32>().ok()
}

/// Estimates the page count from a previous snapshot's record count:
/// `ceil(count * 1.02 / RECORDS_PER_PAGE) + 1`.
#[must_use]
pub fn estimate_page_count(previous_count: usize) -> u32 {
    let padded = (previous_count * (100 + GROWTH_MARGIN_PERCENT)).div_ceil(100);
    let pages = padded.div_ceil(RECORDS_PER_PAGE) + 1;
    u32::try_from(pages).unwrap_or(u32::MAX)
}
