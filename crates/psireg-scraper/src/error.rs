use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited fetching page {page} (retry after {retry_after_secs}s)")]
    RateLimited { page: u32, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Failure to read one block or one field out of a results page.
///
/// Callers fold these into "skip the record" or "omit the field" and keep
/// going; none of them abort a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("result block has no name")]
    MissingName,

    #[error("attribute has no label")]
    MissingLabel,

    #[error("attribute \"{key}\" has an unexpected shape: {reason}")]
    UnexpectedShape { key: String, reason: String },

    #[error("opening hours line has no day label: \"{line}\"")]
    MalformedDay { line: String },

    #[error("pharmacy \"{name}\" has no usable PSI Registration Number")]
    MissingRegistrationNumber { name: String },
}
