use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::Error;

/// Result of waiting on a deletion watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The watched node was deleted while we waited.
    Deleted,
    /// The bounded wait elapsed without a deletion event.
    TimedOut,
}

/// One-shot subscription to the deletion of a single node.
///
/// The event carries no payload: callers must re-read the sibling set after
/// any wake-up rather than trusting the notification itself.
pub struct DeletionWatch {
    rx: oneshot::Receiver<()>,
}

impl DeletionWatch {
    pub fn new(rx: oneshot::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Wait for the deletion event, up to `timeout`.
    ///
    /// A notifier dropped without firing (the service discarded its watch
    /// list) reports as `TimedOut`, which sends the caller back to a fresh
    /// sibling fetch either way.
    pub async fn wait(self, timeout: Duration) -> WatchOutcome {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(())) => WatchOutcome::Deleted,
            Ok(Err(_)) | Err(_) => WatchOutcome::TimedOut,
        }
    }
}

/// Client-side contract for the hierarchical coordination service.
///
/// One value is one session: ephemeral nodes created through it are removed
/// when the session closes, and every participant holds its own handle so
/// the service namespace stays the only shared state. Operations fail with
/// `Error::Unavailable` for service-class trouble, distinguishable from
/// `Error::NotFound` for a missing path.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Create an ephemeral, auto-sequenced node under `prefix` and return
    /// its full path. The suffix assigned by the service is strictly
    /// increasing across all sessions.
    async fn create_sequential(&self, prefix: &str) -> Result<String, Error>;

    /// Leaf names of every child of `path`, fetched fresh.
    async fn children(&self, path: &str) -> Result<Vec<String>, Error>;

    /// Arm a one-shot deletion watch on `path`. Returns `Ok(None)` when the
    /// node no longer exists, so the caller can skip straight to re-reading
    /// the sibling set.
    async fn watch_deletion(&self, path: &str) -> Result<Option<DeletionWatch>, Error>;

    /// Delete the node at `path`.
    async fn delete(&self, path: &str) -> Result<(), Error>;

    /// Create a persistent node at `path` if it does not already exist.
    /// Used only for namespace provisioning.
    async fn ensure_node(&self, path: &str) -> Result<(), Error>;

    /// End the session. The service removes every ephemeral node this
    /// session owns and fires their deletion watches.
    async fn close(&self) -> Result<(), Error>;
}
