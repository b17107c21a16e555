//! TOML Decoding
//!
//! Free functions that turn a TOML file or string into a typed record.
//! The `_into` variants write into an existing value only after the whole
//! document parsed, so a failed decode leaves the destination untouched.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Read and decode the TOML file at `path`
pub fn decode_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    debug!("Decoding configuration from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(&content, Some(path))
}

/// Decode TOML held in memory, e.g. a bundled default configuration
pub fn decode_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    parse(text, None)
}

pub(crate) fn parse<T: DeserializeOwned>(content: &str, path: Option<&Path>) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::parse(e, path))
}

/// Decode the file at `path` into `destination`
pub fn decode_file_into<T: DeserializeOwned>(path: impl AsRef<Path>, destination: &mut T) -> Result<()> {
    *destination = decode_file(path)?;
    Ok(())
}

/// Decode in-memory TOML into `destination`
pub fn decode_str_into<T: DeserializeOwned>(text: &str, destination: &mut T) -> Result<()> {
    *destination = decode_str(text)?;
    Ok(())
}
