//! Error types for apiprobe

use thiserror::Error;

/// Result type alias using apiprobe Error
pub type Result<T> = std::result::Result<T, Error>;

/// apiprobe error types
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was missing; raised before any request is sent.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response. `message` is the body's `error` field when present.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The service answered successfully but without a usable result
    #[error("{0}")]
    NoResult(String),

    #[error("{0}")]
    Identity(String),

    #[error("{0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl Error {
    /// Generic message used when a failed response carries no `error` field.
    pub fn http_status(status: u16) -> Self {
        Error::Http {
            status,
            message: format!("HTTP error! status: {}", status),
        }
    }

    /// HTTP status of the failure, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_fallback_message() {
        let err = Error::http_status(503);
        assert_eq!(err.to_string(), "HTTP error! status: 503");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_validation_displays_bare_message() {
        let err = Error::Validation("Please enter a Product ID.".into());
        assert_eq!(err.to_string(), "Please enter a Product ID.");
        assert_eq!(err.status(), None);
    }
}
