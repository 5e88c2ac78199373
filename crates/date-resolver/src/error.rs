//! Error types for date-resolver operations.
//!
//! Resolution itself is total (unrecognized input yields `None`); these
//! errors only arise while building configuration or ranges by hand.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid city key: {0}")]
    InvalidCityKey(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, ResolverError>;
