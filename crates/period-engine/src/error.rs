//! Error types for period-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeriodError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PeriodError>;
