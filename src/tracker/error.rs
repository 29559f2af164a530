use core::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::path::Path;

use thiserror::Error;

pub type Result<T, E = TrackerError> = core::result::Result<T, E>;

/// Application errors
#[derive(Error)]
pub enum TrackerError {
    #[error("Item {item_id} is corrupt: {message}")]
    CorruptItem { item_id: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration key is not set: {0}")]
    NoSuchKey(String),

    #[error("Failed to parse {path}: {message}")]
    ParseFailed { path: String, message: String },

    #[error("Invalid key name \"{key}\": {message}")]
    InvalidKeyName { key: String, message: String },

    #[error("Wrong expression: {0}")]
    WrongExpression(String),

    #[error("{0}")]
    General(String),

    #[error("{0}")]
    Io(io::Error),

    #[error("{path}: {source}")]
    IoAt { path: String, source: io::Error },
}

/// Constructs a `TrackerError::CorruptItem` error
pub fn corrupt_item(item_id: &str, message: impl Into<String>) -> TrackerError {
    TrackerError::CorruptItem {
        item_id: item_id.to_string(),
        message: message.into(),
    }
}

/// Constructs a `TrackerError::IoAt` error bound to the offending path
pub fn io_at(path: impl AsRef<Path>, source: io::Error) -> TrackerError {
    TrackerError::IoAt {
        path: path.as_ref().to_string_lossy().into_owned(),
        source,
    }
}

impl Debug for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl From<io::Error> for TrackerError {
    fn from(e: io::Error) -> Self {
        TrackerError::Io(e)
    }
}
