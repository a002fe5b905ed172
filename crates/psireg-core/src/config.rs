use crate::app_config::AppConfig;
use crate::ConfigError;

/// Reads `PSIREG_*` settings, loading a `.env` file first if there is one.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Reads `PSIREG_*` settings from the process environment only.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Every variable has a default; `lookup` only supplies overrides.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let base_url = or_default("PSIREG_BASE_URL", "http://public.thepsi.ie/");
    let data_dir = PathBuf::from(or_default("PSIREG_DATA_DIR", "./data"));
    let log_level = or_default("PSIREG_LOG_LEVEL", "info");
    let user_agent = or_default("PSIREG_USER_AGENT", "psireg/0.1 (register-snapshot)");

    let request_timeout_secs = parse_num::<u64>(
        "PSIREG_REQUEST_TIMEOUT_SECS",
        &or_default("PSIREG_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let max_concurrent_requests = parse_num::<usize>(
        "PSIREG_MAX_CONCURRENT_REQUESTS",
        &or_default("PSIREG_MAX_CONCURRENT_REQUESTS", "8"),
    )?;
    if max_concurrent_requests == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PSIREG_MAX_CONCURRENT_REQUESTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let max_retries = parse_num::<u32>(
        "PSIREG_MAX_RETRIES",
        &or_default("PSIREG_MAX_RETRIES", "2"),
    )?;
    let retry_backoff_base_ms = parse_num::<u64>(
        "PSIREG_RETRY_BACKOFF_BASE_MS",
        &or_default("PSIREG_RETRY_BACKOFF_BASE_MS", "1000"),
    )?;
    let snapshot_lookback_days = parse_num::<u32>(
        "PSIREG_SNAPSHOT_LOOKBACK_DAYS",
        &or_default("PSIREG_SNAPSHOT_LOOKBACK_DAYS", "365"),
    )?;

    Ok(AppConfig {
        base_url,
        data_dir,
        log_level,
        request_timeout_secs,
        user_agent,
        max_concurrent_requests,
        max_retries,
        retry_backoff_base_ms,
        snapshot_lookback_days,
    })
}

/// Parses a numeric env value, naming the variable in the error.
fn parse_num<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
