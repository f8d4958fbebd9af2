//! Error types for Sonance
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the input layer
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not resolve host {0}")]
    Resolve(String),

    #[error("Could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server answered HTTP {0}")]
    HttpStatus(u16),

    #[error("Redirect without a usable Location header")]
    BadRedirect,

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(u32),

    #[error("Stream is not seekable")]
    SeekUnsupported,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Format probe failed: {0}")]
    Probe(String),
}

impl InputError {
    /// True for failures caused by the remote side rather than by the caller's input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            InputError::Resolve(_)
                | InputError::Connect { .. }
                | InputError::Protocol(_)
                | InputError::HttpStatus(_)
                | InputError::BadRedirect
                | InputError::TooManyRedirects(_)
        )
    }
}

impl From<InputError> for std::io::Error {
    fn from(err: InputError) -> Self {
        use std::io::ErrorKind;
        match err {
            InputError::Io(e) => e,
            InputError::Timeout(msg) => std::io::Error::new(ErrorKind::TimedOut, msg),
            InputError::SeekUnsupported => std::io::Error::new(ErrorKind::Unsupported, err),
            other => std::io::Error::other(other),
        }
    }
}

/// Result type alias for Sonance
pub type Result<T> = std::result::Result<T, InputError>;
