use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(shiftsheet::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(shiftsheet::config))]
    Config(String),

    #[error("Google API error: {0}")]
    #[diagnostic(code(shiftsheet::google_api))]
    GoogleApi(String),

    #[error("Authentication error: {0}")]
    #[diagnostic(code(shiftsheet::auth))]
    Auth(String),

    #[error("Provisioning journal error: {0}")]
    #[diagnostic(code(shiftsheet::journal))]
    Journal(String),

    #[error("Invalid month window: {0}")]
    #[diagnostic(
        code(shiftsheet::month_window),
        help("the month after the current one could not be represented as a date")
    )]
    InvalidMonthWindow(String),

    #[error("Invalid pattern: {0}")]
    #[diagnostic(code(shiftsheet::pattern))]
    Pattern(#[from] regex::Error),

    #[error("HTTP client error: {0}")]
    #[diagnostic(code(shiftsheet::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(shiftsheet::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(shiftsheet::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(shiftsheet::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Journal(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type TimesheetResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google API errors
pub fn google_api_error(message: &str) -> Error {
    Error::GoogleApi(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create journal errors
pub fn journal_error(message: &str) -> Error {
    Error::Journal(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
