//! Error types and handling for the forecast feed generator

use thiserror::Error;

/// Main error type for the forecast feed generator
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Missing or invalid location, timezone or settings
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather provider could not be reached or returned unusable data
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Empty or inconsistent forecast data
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A well-formed calendar document could not be produced
    #[error("Format error: {message}")]
    Format { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ForecastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and environment.")
            }
            ForecastError::Fetch { .. } => {
                "Unable to retrieve the forecast. The previous feed was left untouched.".to_string()
            }
            ForecastError::Validation { message } => {
                format!("Forecast data rejected: {message}")
            }
            ForecastError::Format { message } => {
                format!("Could not render the calendar feed: {message}")
            }
            ForecastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<config::ConfigError> for ForecastError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::fetch(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::fetch(format!("unexpected response body: {err}"))
        } else {
            Self::fetch(err.to_string())
        }
    }
}
