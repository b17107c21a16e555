//! Configuration Store
//!
//! Owns a decoded configuration record and the path it came from. Decodes
//! are serialized per store and swap the record only after a complete
//! parse; readers take the read side of the same lock, so they never
//! observe a half-written record.

use super::decode::parse;
use super::options::{SubscriptionFailurePolicy, WatchOptions};
use super::watcher::{self, FileSubscription, WatchHandle};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{broadcast, Mutex, RwLock, RwLockReadGuard};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info};

/// Outcome of a reload, broadcast to subscribers
#[derive(Debug, Clone)]
pub enum ReloadEvent {
    Reloaded {
        path: PathBuf,
        timestamp: SystemTime,
    },
    Failed {
        path: PathBuf,
        error: String,
        timestamp: SystemTime,
    },
}

impl ReloadEvent {
    pub fn path(&self) -> &Path {
        match self {
            ReloadEvent::Reloaded { path, .. } | ReloadEvent::Failed { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReloadEvent::Reloaded { .. })
    }
}

/// A TOML-backed configuration record that can follow its file
pub struct ConfigStore<T> {
    path: PathBuf,
    current: RwLock<T>,
    decode_lock: Mutex<()>,
    change_sender: broadcast::Sender<ReloadEvent>,
    options: WatchOptions,
}

impl<T> ConfigStore<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create a store around a caller-built initial record; nothing is read yet
    pub fn new(path: impl Into<PathBuf>, initial: T) -> Self {
        Self::with_options(path, initial, WatchOptions::default())
    }

    /// Create a store with explicit watch options
    pub fn with_options(path: impl Into<PathBuf>, initial: T, options: WatchOptions) -> Self {
        let (change_sender, _) = broadcast::channel(options.event_capacity.max(1));

        Self {
            path: path.into(),
            current: RwLock::new(initial),
            decode_lock: Mutex::new(()),
            change_sender,
            options,
        }
    }

    /// Create a store and decode its file once
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self>
    where
        T: Default,
    {
        let store = Self::new(path, T::default());
        store.decode().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Re-read the store's file into the record.
    ///
    /// On failure the record keeps its previous value.
    pub async fn decode(&self) -> Result<()> {
        let _guard = self.decode_lock.lock().await;

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::io(&self.path, e))?;
        let value: T = parse(&content, Some(&self.path))?;

        *self.current.write().await = value;
        Ok(())
    }

    /// Decode in-memory TOML into the record, for bundled payloads
    pub async fn decode_str(&self, text: &str) -> Result<()> {
        let _guard = self.decode_lock.lock().await;

        let value: T = parse(text, None)?;
        *self.current.write().await = value;
        Ok(())
    }

    /// Decode the file, log the outcome, and notify subscribers
    pub async fn reload(&self) -> Result<()> {
        match self.decode().await {
            Ok(()) => {
                info!("Configuration reloaded from: {}", self.path.display());
                self.publish(ReloadEvent::Reloaded {
                    path: self.path.clone(),
                    timestamp: SystemTime::now(),
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to reload configuration, keeping current config: {}", e);
                self.publish(ReloadEvent::Failed {
                    path: self.path.clone(),
                    error: e.to_string(),
                    timestamp: SystemTime::now(),
                });
                Err(e)
            }
        }
    }

    fn publish(&self, event: ReloadEvent) {
        if self.change_sender.send(event).is_err() {
            debug!("No subscribers for reload event");
        }
    }

    /// Borrow the current record
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.current.read().await
    }

    /// Clone the current record
    pub async fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.current.read().await.clone()
    }

    /// Subscribe to reload outcomes
    pub fn subscribe(&self) -> BroadcastStream<ReloadEvent> {
        BroadcastStream::new(self.change_sender.subscribe())
    }

    /// Decode the file, then keep decoding it on every write event.
    ///
    /// The file's directory is watched, so a save that writes a temporary
    /// file and renames it over this one also triggers a decode. Subscribe
    /// before calling this to receive every [`ReloadEvent`] it produces.
    ///
    /// The initial decode error is returned as is. Each call creates its
    /// own subscription, even for a path that is already watched. Dropping
    /// the returned handle leaves the watch running for the rest of the
    /// process; call [`WatchHandle::stop`] to end it.
    pub async fn start_watch(self: &Arc<Self>) -> Result<WatchHandle> {
        self.decode().await?;

        let subscription = match FileSubscription::new(&self.path) {
            Ok(subscription) => subscription,
            Err(e) => match self.options.subscription_failure {
                SubscriptionFailurePolicy::ReturnError => return Err(e),
                SubscriptionFailurePolicy::Exit => {
                    error!("Cannot watch configuration, exiting: {}", e);
                    std::process::exit(1);
                }
            },
        };

        Ok(watcher::spawn(Arc::clone(self), subscription, self.options.settle_delay))
    }
}
