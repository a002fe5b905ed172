//! Results-page HTML → [`RawEntry`] blocks.
//!
//! Each result is a `div.result-item` holding a name heading, an address
//! paragraph and a `ul.result-details` list of labeled attributes:
//!
//! ```text
//! <div class="result-item">
//!   <h3 class="result-name">Jane Doe (Section 77 Emergency Registration)</h3>
//!   <p class="result-address"><!-- 4 Oak Road<br>Dublin 6 --></p>
//!   <ul class="result-details">
//!     <li><span class="label">Registration Number:</span><span class="value">98765</span></li>
//!   </ul>
//! </div>
//! ```
//!
//! The pharmacist and assistant registers leave the address out of the
//! rendered text and keep it inside an HTML comment in the address element.
//! That comment is still read so person records carry an address.
//!
//! A registration number with conditions attached is flagged by a red
//! asterisk in a `<strong>` inside the value. The asterisk is left out of the
//! value text and recorded on the entry instead.
//!
//! A block without a name is skipped; an attribute without a label is
//! dropped. Neither stops the rest of the page from being read.

use std::sync::LazyLock;

use psireg_core::EntityKind;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::ParseError;
use crate::parse_helpers::{clean_up_string, comment_to_text, strip_section_77};
use crate::types::{ParsedPage, RawAttribute, RawEntry, RawValue};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid result selector")
}

static RESULT_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("div.result-item"));
static NAME: LazyLock<Selector> = LazyLock::new(|| selector(".result-name"));
static ADDRESS: LazyLock<Selector> = LazyLock::new(|| selector(".result-address"));
static DETAIL: LazyLock<Selector> = LazyLock::new(|| selector("ul.result-details > li"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector(".label"));
static VALUE: LazyLock<Selector> = LazyLock::new(|| selector(".value"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| selector("strong"));

/// Parses every result block on a page.
#[must_use]
pub fn parse_page(html: &str, kind: EntityKind) -> ParsedPage {
    let document = Html::parse_document(html);
    let mut parsed = ParsedPage::default();

    for block in document.select(&RESULT_ITEM) {
        match parse_block(block, kind) {
            Ok(entry) => parsed.entries.push(entry),
            Err(err) => {
                tracing::warn!(%kind, error = %err, "skipping result block");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

fn parse_block(block: ElementRef<'_>, kind: EntityKind) -> Result<RawEntry, ParseError> {
    let raw_name = block
        .select(&NAME)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or(ParseError::MissingName)?;
    let display_name = clean_up_string(&raw_name).ok_or(ParseError::MissingName)?;
    let (name, section_77) = strip_section_77(&display_name);
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let address = block
        .select(&ADDRESS)
        .next()
        .and_then(|el| extract_address(el, kind));

    let mut attributes = Vec::new();
    let mut conditions_attached = false;
    for item in block.select(&DETAIL) {
        match parse_attribute(item) {
            Ok((attribute, marked)) => {
                conditions_attached |= marked;
                attributes.push(attribute);
            }
            Err(err) => tracing::debug!(name = %name, error = %err, "dropping attribute"),
        }
    }

    Ok(RawEntry {
        name,
        section_77,
        address,
        attributes,
        conditions_attached,
    })
}

/// Pharmacies keep their address in the visible text. For people the
/// commented-out address wins, falling back to any visible text.
fn extract_address(element: ElementRef<'_>, kind: EntityKind) -> Option<String> {
    let inline = clean_up_string(&element.text().collect::<String>());
    if !kind.is_person() {
        return inline;
    }

    let hidden = element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Comment(comment) => comment_to_text(comment),
            _ => None,
        })
        .collect::<Vec<_>>();

    if hidden.is_empty() {
        inline
    } else {
        Some(hidden.join(", "))
    }
}

/// Text of `element` without anything inside a `<strong>` marker.
fn unmarked_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some((node, &text.text)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .any(|ancestor| ancestor.value().as_element().is_some_and(|e| e.name() == "strong"))
        })
        .map(|(_, text)| &**text)
        .collect()
}

/// Returns the attribute and whether its value carried a `<strong>` marker.
fn parse_attribute(item: ElementRef<'_>) -> Result<(RawAttribute, bool), ParseError> {
    let label = item
        .select(&LABEL)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or(ParseError::MissingLabel)?;
    let key = clean_up_string(&label)
        .map(|k| k.trim_end_matches(':').trim_end().to_owned())
        .filter(|k| !k.is_empty())
        .ok_or(ParseError::MissingLabel)?;

    let (value, marked) = match item.select(&VALUE).next() {
        None => (RawValue::Missing, false),
        Some(el) => {
            let marked = el.select(&STRONG).next().is_some();
            let lines: Vec<String> = el
                .select(&LIST_ITEM)
                .filter_map(|li| clean_up_string(&unmarked_text(li)))
                .collect();
            let value = if lines.is_empty() {
                clean_up_string(&unmarked_text(el)).map_or(RawValue::Missing, RawValue::Text)
            } else {
                RawValue::Lines(lines)
            };
            (value, marked)
        }
    };

    Ok((RawAttribute { key, value }, marked))
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
