mod app_config;
mod config;
pub mod hours;
pub mod record;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use hours::{DayHours, OpeningHours, BANK_HOLIDAYS};
pub use record::{EntityKind, FieldValue, Person, Pharmacy, Role};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
}
