//! Error types for ferrflash.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrflash operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session establishment errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Dialogue errors (timeouts, device-reported failures)
    #[error("Dialogue error: {0}")]
    Dialogue(#[from] DialogueError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Batch-level upgrade errors
    #[error("Upgrade error: {0}")]
    Upgrade(#[from] UpgradeError),
}

/// Channel layer errors (login helper process, raw I/O).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The login helper could not be spawned
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// I/O error on the channel
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Channel closed
    #[error("Channel closed")]
    Closed,
}

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No usable prompt was established
    #[error("Connection to {host} failed: {reason}")]
    ConnectionFailed { host: String, reason: String },
}

/// Dialogue errors.
#[derive(Error, Debug)]
pub enum DialogueError {
    /// No rule resolved the dialogue within its budget
    #[error("{dialogue}: no response within {budget:?}")]
    Timeout {
        dialogue: &'static str,
        budget: Duration,
    },

    /// The channel closed before the dialogue resolved
    #[error("{dialogue}: channel closed before the dialogue completed")]
    EndOfStream { dialogue: &'static str },

    /// A failure rule matched
    #[error("{dialogue}: {reason}")]
    Failed {
        dialogue: &'static str,
        reason: String,
    },

    /// The device computed a different checksum than configured
    #[error("Checksum mismatch for {image}: expected {expected}, device reports {actual}")]
    ChecksumMismatch {
        image: String,
        expected: String,
        actual: String,
    },

    /// The prompt returned without a completion banner
    #[error("Transfer of {image} ended without a completion banner")]
    IncompleteTransfer { image: String },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a configuration document failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A configuration document is not valid JSON for its schema
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A profile pattern is not a valid regex
    #[error("Invalid profile pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Unknown transfer protocol
    #[error("Unknown protocol '{0}'")]
    InvalidProtocol(String),

    /// Unparseable flash size
    #[error("Invalid flash size '{0}'")]
    InvalidFlashSize(String),

    /// No file server configured for an upload
    #[error("No file server configured")]
    MissingServer,

    /// The device has less flash than the configured minimum
    #[error("{host}: flash size {available} is below the required minimum {required}")]
    InsufficientFlash {
        host: String,
        required: String,
        available: String,
    },
}

/// Batch-level errors reported once every host has been attempted.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// One or more hosts failed
    #[error("Upgrade failed on {} host(s): {}", hosts.len(), hosts.join(", "))]
    HostsFailed { hosts: Vec<String> },
}

/// Result type alias using ferrflash's Error.
pub type Result<T> = std::result::Result<T, Error>;
