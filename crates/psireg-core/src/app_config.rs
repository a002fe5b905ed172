use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_requests: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// How many days back the baseline lookup walks before giving up.
    pub snapshot_lookback_days: u32,
}
