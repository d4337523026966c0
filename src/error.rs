//! Error types for doorman

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for doorman operations
pub type Result<T> = std::result::Result<T, DoormanError>;

/// Custom error types for doorman
#[derive(Error, Debug)]
pub enum DoormanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("listener is closed")]
    Closed,
}

impl DoormanError {
    /// Whether this is an unrecoverable startup error, as opposed to a
    /// transient per-connection failure.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DoormanError::Bind { .. }
                | DoormanError::Config(_)
                | DoormanError::ConfigParse(_)
                | DoormanError::Signal(_)
        )
    }
}
