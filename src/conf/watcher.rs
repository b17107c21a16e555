//! Configuration File Watcher
//!
//! Bridges `notify` callbacks into a tokio task that re-decodes a
//! [`ConfigStore`] whenever its file is written or replaced.

use super::store::ConfigStore;
use crate::{Error, Result};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// True for notifications that mean the file content changed
pub fn is_write_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

/// True for notifications that put a new file in place under the watched name,
/// as editors do when they save through a temporary file and a rename
pub fn is_replace_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Both))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Any))
    )
}

/// A live filesystem watch on a single file.
///
/// The file's directory is watched and notifications are filtered down to
/// the file's name, so the watch survives the file being replaced.
pub struct FileSubscription {
    path: PathBuf,
    dir: PathBuf,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    watcher: RecommendedWatcher,
}

impl FileSubscription {
    /// Subscribe to change notifications for `path`.
    ///
    /// Fails with [`Error::Subscription`] if the path does not exist or its
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let subscription_error = |source| Error::Subscription {
            path: path.clone(),
            source,
        };

        if !path.exists() {
            return Err(subscription_error(
                notify::Error::path_not_found().add_path(path.clone()),
            ));
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // The receiver is gone once the subscription is closed
                let _ = tx.send(res);
            },
            NotifyConfig::default(),
        )
        .map_err(subscription_error)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(subscription_error)?;

        info!(
            "Started watching configuration file: {} (directory {})",
            path.display(),
            dir.display()
        );

        Ok(Self {
            path,
            dir,
            events,
            watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if `event` concerns the subscribed file rather than a sibling
    pub fn concerns(&self, event: &Event) -> bool {
        let name = self.path.file_name();
        event.paths.iter().any(|p| p.file_name() == name)
    }

    /// True if `event` should trigger a reload of the subscribed file
    pub fn triggers_reload(&self, event: &Event) -> bool {
        self.concerns(event) && (is_write_event(&event.kind) || is_replace_event(&event.kind))
    }

    /// Wait for the next notification or notification error
    pub async fn next(&mut self) -> Option<notify::Result<Event>> {
        self.events.recv().await
    }

    /// Release the subscription
    pub fn close(mut self) -> Result<()> {
        self.watcher
            .unwatch(&self.dir)
            .map_err(|source| Error::Subscription {
                path: self.path.clone(),
                source,
            })?;
        info!("Stopped watching configuration file: {}", self.path.display());
        Ok(())
    }
}

/// Handle to a running watch task
#[derive(Debug)]
pub struct WatchHandle {
    id: Uuid,
    path: PathBuf,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Unsubscribe and wait for the watch task to end
    pub async fn stop(self) {
        let WatchHandle {
            id,
            shutdown_tx,
            task,
            ..
        } = self;

        if shutdown_tx.send(()).is_err() {
            debug!(watch_id = %id, "Watch task already finished");
        }

        match task.await {
            Ok(()) => debug!(watch_id = %id, "Watch task stopped"),
            Err(e) if e.is_cancelled() => debug!(watch_id = %id, "Watch task was cancelled"),
            Err(e) => error!(watch_id = %id, "Watch task failed: {}", e),
        }
    }
}

pub(crate) fn spawn<T>(
    store: Arc<ConfigStore<T>>,
    subscription: FileSubscription,
    settle_delay: Duration,
) -> WatchHandle
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let id = Uuid::new_v4();
    let path = subscription.path().to_path_buf();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(run(id, store, subscription, shutdown_rx, settle_delay));

    WatchHandle {
        id,
        path,
        shutdown_tx,
        task,
    }
}

async fn run<T>(
    id: Uuid,
    store: Arc<ConfigStore<T>>,
    mut subscription: FileSubscription,
    mut shutdown_rx: oneshot::Receiver<()>,
    settle_delay: Duration,
) where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let mut detached = false;

    loop {
        tokio::select! {
            res = &mut shutdown_rx, if !detached => match res {
                Ok(()) => {
                    info!(watch_id = %id, "Stopping configuration watch");
                    break;
                }
                Err(_) => {
                    // Handle dropped without stop(): keep watching for the process lifetime
                    debug!(watch_id = %id, "Watch handle dropped, detaching");
                    detached = true;
                }
            },
            next = subscription.next() => match next {
                Some(Ok(event)) => {
                    debug!(watch_id = %id, "File event: {:?}", event);

                    if !subscription.triggers_reload(&event) {
                        debug!(watch_id = %id, "Ignoring file event type: {:?}", event.kind);
                        continue;
                    }

                    if !settle_delay.is_zero() {
                        tokio::time::sleep(settle_delay).await;
                    }

                    // Outcome is logged and broadcast by reload()
                    let _ = store.reload().await;
                }
                Some(Err(e)) => {
                    error!(watch_id = %id, "File watcher error: {}", e);
                }
                None => {
                    warn!(watch_id = %id, "File watcher channel closed");
                    break;
                }
            },
        }
    }

    if let Err(e) = subscription.close() {
        warn!(watch_id = %id, "Failed to release watch: {}", e);
    }
}
