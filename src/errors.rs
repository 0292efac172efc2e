//! Error types for the robokassa-rs library.
//!
//! This module defines all error types that can occur while signing, building
//! gateway URLs and querying operation state.

use thiserror::Error;

/// Main error type for Robokassa operations.
#[derive(Error, Debug)]
pub enum RobokassaError {
    /// An argument outside the set of values the gateway accepts
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A signing operation was called before the required settings were made
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The state-query document could not be parsed
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    /// Error during HTTP request/response handling
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status
    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    /// Error during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing URL
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl RobokassaError {
    /// Shorthand for a [`RobokassaError::Configuration`] naming the unset setting.
    pub(crate) fn unset(setting: &str) -> Self {
        RobokassaError::Configuration(format!("{} is not set", setting))
    }
}

/// Result type alias for Robokassa operations.
pub type Result<T> = std::result::Result<T, RobokassaError>;
