//! In-memory coordination service speaking the [`NodeRegistry`] contract.
//!
//! Backs unit tests and the single-process harness. Sequence suffixes are
//! zero-padded and strictly increasing across the whole namespace, closing
//! a session atomically removes its ephemeral nodes, and deletion watches
//! are delivered as one-shot events: the same guarantees the protocol
//! relies on from the real service.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

use crate::registry::{DeletionWatch, NodeRegistry};
use crate::Error;

#[derive(Debug, Default)]
struct HiveState {
    next_seq: u64,
    next_session: u64,
    refuse_connections: bool,
    children_faults: u32,
    nodes: BTreeMap<String, NodeEntry>,
}

#[derive(Debug, Default)]
struct NodeEntry {
    /// Session id for ephemeral nodes, `None` for persistent ones.
    owner: Option<u64>,
    watchers: Vec<oneshot::Sender<()>>,
}

impl HiveState {
    fn remove_node(&mut self, path: &str) -> bool {
        match self.nodes.remove(path) {
            Some(entry) => {
                for watcher in entry.watchers {
                    let _ = watcher.send(());
                }
                true
            }
            None => false,
        }
    }
}

/// Shared in-memory coordination service. Cheap to clone; every clone sees
/// the same namespace.
#[derive(Clone, Default)]
pub struct InMemoryHive {
    state: Arc<Mutex<HiveState>>,
}

impl InMemoryHive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `connect` calls fail, for exercising the fatal
    /// connect path.
    pub async fn refuse_connections(&self, refuse: bool) {
        self.state.lock().await.refuse_connections = refuse;
    }

    /// Fail the next `count` child listings (across all sessions) with a
    /// service-class error, for exercising the transient-fetch retry path.
    pub async fn fail_next_children(&self, count: u32) {
        self.state.lock().await.children_faults = count;
    }

    /// Open a new session.
    ///
    /// # Errors
    ///
    /// `Error::Connect` when the service is refusing connections.
    pub async fn connect(&self) -> Result<MemorySession, Error> {
        let mut state = self.state.lock().await;
        if state.refuse_connections {
            return Err(Error::Connect("connection refused".to_string()));
        }
        state.next_session += 1;
        let session_id = state.next_session;
        Ok(MemorySession {
            state: self.state.clone(),
            session_id,
            closed: AtomicBool::new(false),
        })
    }
}

/// One session against an [`InMemoryHive`].
#[derive(Debug)]
pub struct MemorySession {
    state: Arc<Mutex<HiveState>>,
    session_id: u64,
    closed: AtomicBool,
}

impl MemorySession {
    fn check_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Unavailable("session closed".to_string()));
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Acquire) {
            tracing::debug!(
                session_id = self.session_id,
                "MemorySession dropped without close; ephemeral nodes linger"
            );
        }
    }
}

#[async_trait]
impl NodeRegistry for MemorySession {
    async fn create_sequential(&self, prefix: &str) -> Result<String, Error> {
        self.check_open()?;
        let mut state = self.state.lock().await;

        if let Some((parent, _)) = prefix.rsplit_once('/') {
            if !parent.is_empty() && !state.nodes.contains_key(parent) {
                return Err(Error::NotFound(parent.to_string()));
            }
        }

        state.next_seq += 1;
        let path = format!("{}{:010}", prefix, state.next_seq);
        state.nodes.insert(
            path.clone(),
            NodeEntry {
                owner: Some(self.session_id),
                watchers: Vec::new(),
            },
        );
        Ok(path)
    }

    async fn children(&self, path: &str) -> Result<Vec<String>, Error> {
        self.check_open()?;
        let mut state = self.state.lock().await;
        if state.children_faults > 0 {
            state.children_faults -= 1;
            return Err(Error::Unavailable("simulated fetch fault".to_string()));
        }
        if !state.nodes.contains_key(path) {
            return Err(Error::NotFound(path.to_string()));
        }

        let prefix = format!("{}/", path);
        let leaves = state
            .nodes
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();
        Ok(leaves)
    }

    async fn watch_deletion(&self, path: &str) -> Result<Option<DeletionWatch>, Error> {
        self.check_open()?;
        let mut state = self.state.lock().await;
        match state.nodes.get_mut(path) {
            Some(entry) => {
                let (tx, rx) = oneshot::channel();
                entry.watchers.push(tx);
                Ok(Some(DeletionWatch::new(rx)))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        self.check_open()?;
        let mut state = self.state.lock().await;
        if !state.remove_node(path) {
            return Err(Error::NotFound(path.to_string()));
        }
        Ok(())
    }

    async fn ensure_node(&self, path: &str) -> Result<(), Error> {
        self.check_open()?;
        let mut state = self.state.lock().await;
        state.nodes.entry(path.to_string()).or_default();
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        let owned: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, entry)| entry.owner == Some(self.session_id))
            .map(|(path, _)| path.clone())
            .collect();
        for path in owned {
            state.remove_node(&path);
        }
        tracing::debug!(session_id = self.session_id, "session closed");
        Ok(())
    }
}
