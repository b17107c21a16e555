//! Configuration Module
//!
//! Decodes TOML into typed records and keeps them in sync with their
//! files through hot-reloading.

pub mod decode;
pub mod options;
pub mod store;
pub mod watcher;

pub use decode::{decode_file, decode_file_into, decode_str, decode_str_into};
pub use options::{SubscriptionFailurePolicy, WatchOptions};
pub use store::{ConfigStore, ReloadEvent};
pub use watcher::{is_replace_event, is_write_event, FileSubscription, WatchHandle};
