pub mod classify;
pub mod client;
pub mod convert;
pub mod error;
pub mod hours;
pub mod normalize;
pub mod pagination;
pub mod parse;
mod parse_helpers;
mod rate_limit;
pub mod types;

pub use client::{FetchOptions, RegisterClient};
pub use error::{ParseError, ScraperError};
pub use normalize::{normalize_person, normalize_pharmacy};
pub use parse::parse_page;
pub use types::{FetchedPage, PageBatch, ParsedPage, RawAttribute, RawEntry, RawValue};
