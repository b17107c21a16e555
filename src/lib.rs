//! gt-utils Library
//!
//! Small utilities built around hot-reloading configuration:
//!
//! - [`conf`]: decode TOML into typed records and follow file changes
//! - [`hset`]: a thread-safe hash set with JSON encoding
//! - [`file`]: file reading, writing, listing, copying and lookup helpers

pub mod conf;
pub mod error;
pub mod file;
pub mod hset;

pub use conf::{ConfigStore, ReloadEvent, WatchHandle, WatchOptions};
pub use error::{Error, Result};
pub use hset::ConcurrentSet;
