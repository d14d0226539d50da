//! Custom error types for storyloom
//!
//! Every failure the client can hit is normalized into [`LoomError`] so the
//! UI can log it and show a single human-readable message.

use thiserror::Error;

/// Main error type for the storyloom client
#[derive(Error, Debug)]
pub enum LoomError {
    /// Non-2xx response from the backend. The message is the server's
    /// `detail` field when it sent one, otherwise the HTTP status text.
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Human-readable message
        message: String,
    },

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check that the storyloom server is running.")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid backend URL
    #[error("Invalid server URL: {0}\n\n  → Run 'loom config set api-url http://host:port'.")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Terminal/TUI error
    #[error("Terminal error: {0}\n\n  → Try resizing your terminal or restarting it.")]
    Terminal(String),

    /// The project is locked and no password is cached for it
    #[error("Project '{0}' is password protected.")]
    PasswordRequired(String),

    /// The generation stream broke off or could not be read
    #[error("Generation stream failed: {0}")]
    Stream(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

impl LoomError {
    /// HTTP status of a server-reported error
    pub fn status(&self) -> Option<u16> {
        match self {
            LoomError::Api { status, .. } => Some(*status),
            LoomError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server rejected the request for a missing or wrong password
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
            || matches!(self, LoomError::PasswordRequired(_))
    }
}

impl From<toml::de::Error> for LoomError {
    fn from(err: toml::de::Error) -> Self {
        LoomError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for LoomError {
    fn from(err: toml::ser::Error) -> Self {
        LoomError::Toml(err.to_string())
    }
}

/// Result type alias using LoomError
pub type Result<T> = std::result::Result<T, LoomError>;
