//! Watch Options
//!
//! Tunables for a configuration watch. They can come from a TOML file,
//! from `GT_WATCH_*` environment variables, or from the defaults, and are
//! validated before a watch starts.

use super::decode::decode_file;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// What to do when the filesystem watch cannot be established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionFailurePolicy {
    /// Hand the error back to the caller of `start_watch`
    #[default]
    ReturnError,
    /// Log the error and terminate the process
    Exit,
}

impl std::str::FromStr for SubscriptionFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "return_error" | "return" => Ok(Self::ReturnError),
            "exit" => Ok(Self::Exit),
            other => Err(Error::InvalidOptions(format!(
                "subscription_failure must be 'return_error' or 'exit', got '{}'",
                other
            ))),
        }
    }
}

/// Options for `ConfigStore::start_watch`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Pause between a write notification and the decode it triggers
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    pub subscription_failure: SubscriptionFailurePolicy,
    /// Buffer size of the reload event broadcast channel
    pub event_capacity: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            subscription_failure: SubscriptionFailurePolicy::ReturnError,
            event_capacity: 100,
        }
    }
}

impl WatchOptions {
    /// Load options from a TOML file, falling back to defaults when it is absent
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading watch options from: {}", path.display());
            let options: Self = decode_file(path)?;
            options.validate()?;
            Ok(options)
        } else {
            warn!("Watch options file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load options from `GT_WATCH_*` environment variables over the defaults
    pub fn load_from_env() -> Result<Self> {
        Self::load(None, |key| std::env::var(key).ok())
    }

    /// Layer the sources: defaults, then the options file if given, then
    /// the variables `lookup` finds
    pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(lookup)
    }

    /// Apply overrides looked up through `lookup`, then validate
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(delay) = lookup("GT_WATCH_SETTLE_DELAY") {
            self.settle_delay = humantime::parse_duration(&delay).map_err(|e| {
                Error::InvalidOptions(format!("invalid GT_WATCH_SETTLE_DELAY '{}': {}", delay, e))
            })?;
        }

        if let Some(policy) = lookup("GT_WATCH_SUBSCRIPTION_FAILURE") {
            self.subscription_failure = policy.parse()?;
        }

        if let Some(capacity) = lookup("GT_WATCH_EVENT_CAPACITY") {
            self.event_capacity = capacity.parse::<usize>().map_err(|e| {
                Error::InvalidOptions(format!("invalid GT_WATCH_EVENT_CAPACITY '{}': {}", capacity, e))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check that the options are usable
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::InvalidOptions("event_capacity must be greater than 0".to_string()));
        }

        if self.settle_delay > Duration::from_secs(60) {
            return Err(Error::InvalidOptions("settle_delay cannot exceed 1 minute".to_string()));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(&mut self, settle_delay: Option<Duration>, exit_on_subscription_failure: bool) {
        if let Some(delay) = settle_delay {
            self.settle_delay = delay;
            info!("CLI override: settle delay set to {:?}", delay);
        }

        if exit_on_subscription_failure {
            self.subscription_failure = SubscriptionFailurePolicy::Exit;
            info!("CLI override: process exits if the watch cannot be established");
        }
    }
}
