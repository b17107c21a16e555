//! Error Types

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by the configuration store, the set, and the file helpers
#[derive(Error, Debug)]
pub enum Error {
    /// A file could not be read, written, or inspected
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TOML content is malformed or does not match the destination's shape
    #[error("failed to parse TOML from {location}: {details}")]
    Parse { location: String, details: String },

    /// JSON content for a set is malformed or has the wrong element type
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A filesystem watch could not be established
    #[error("failed to watch '{}': {source}", .path.display())]
    Subscription {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A lookup across candidate locations found nothing
    #[error("'{name}' not found in {} searched path(s)", .searched.len())]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// Watch options failed validation
    #[error("invalid watch options: {0}")]
    InvalidOptions(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a parse error; `path` of `None` means the text came from memory
    pub fn parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => format!("'{}'", p.display()),
            None => "in-memory text".to_string(),
        };

        Error::Parse {
            location,
            details: error.to_string(),
        }
    }

    /// True for errors raised because a file could not be read or written
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// True for malformed TOML or JSON input
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Json(_))
    }
}
