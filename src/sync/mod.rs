//! Synchronization service module.
//!
//! This module provides the [`SyncService`] struct which keeps the local
//! project cache consistent with the remote store. Local writes are
//! synchronous; remote work flows through per-project outbox lanes and
//! never blocks the caller.
//!
//! The sync service acts as the main data layer for the application,
//! offering:
//! - Fast local data access for UI operations
//! - Background push of local edits to the remote store
//! - Identity reconciliation when the remote store assigns a different
//!   project identifier than the client used
//! - A pull operation that adopts the remote collection wholesale

pub mod diff;
pub mod outbox;
pub mod projects;
pub mod reconcile;
pub mod tasks;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use diff::TaskDiff;
pub use outbox::{Outbox, RetryPolicy, SyncJob};
pub use reconcile::MatchOutcome;

use crate::remote::RemoteStore;
use crate::storage::LocalStorage;

/// Per-project synchronization state.
///
/// `SyncFailed` is not terminal: the next save enqueues a fresh push,
/// which re-enters `Syncing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectSyncState {
    /// Saved locally; no push has run (or sync is disabled).
    LocalOnly,
    /// A push for this project is in flight.
    Syncing,
    /// The last push completed.
    Synced,
    /// The last push gave up; local state is untouched.
    SyncFailed,
}

/// Shared internals of the sync service: storage, remote client, the
/// per-project state map and the identifier alias table the reconciler
/// maintains for jobs that were enqueued under a superseded id.
pub(crate) struct SyncCore {
    pub(crate) storage: Arc<Mutex<LocalStorage>>,
    pub(crate) remote: Arc<dyn RemoteStore>,
    states: Mutex<HashMap<String, ProjectSyncState>>,
    aliases: Mutex<HashMap<String, String>>,
}

impl SyncCore {
    pub(crate) async fn set_state(&self, id: &str, state: ProjectSyncState) {
        self.states.lock().await.insert(id.to_string(), state);
    }

    pub(crate) async fn clear_state(&self, id: &str) {
        self.states.lock().await.remove(id);
    }

    pub(crate) async fn move_state(&self, old_id: &str, new_id: &str) {
        let mut states = self.states.lock().await;
        if let Some(state) = states.remove(old_id) {
            states.insert(new_id.to_string(), state);
        }
    }

    /// Follow the alias chain to the identifier currently in use.
    pub(crate) async fn resolve_alias(&self, id: &str) -> String {
        let aliases = self.aliases.lock().await;
        let mut current = id;
        while let Some(next) = aliases.get(current) {
            current = next;
        }
        current.to_string()
    }

    pub(crate) async fn add_alias(&self, old_id: &str, new_id: &str) {
        self.aliases
            .lock()
            .await
            .insert(old_id.to_string(), new_id.to_string());
    }
}

/// Service that manages data synchronization between the remote store and
/// local storage.
///
/// All reads and the synchronous halves of `save`/`delete` go straight to
/// local storage; the remote side is reached only from outbox workers.
/// Clones share the same storage, lanes and state.
#[derive(Clone)]
pub struct SyncService {
    core: Arc<SyncCore>,
    outbox: Arc<Outbox>,
}

impl SyncService {
    /// Creates a new `SyncService` over the given storage and remote
    /// client.
    pub fn new(
        storage: Arc<Mutex<LocalStorage>>,
        remote: Arc<dyn RemoteStore>,
        retry: RetryPolicy,
    ) -> Self {
        let core = Arc::new(SyncCore {
            storage,
            remote,
            states: Mutex::new(HashMap::new()),
            aliases: Mutex::new(HashMap::new()),
        });
        let outbox = Arc::new(Outbox::new(core.clone(), retry));
        Self { core, outbox }
    }

    pub(crate) fn core(&self) -> &Arc<SyncCore> {
        &self.core
    }

    pub(crate) fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    /// Current sync state for a project, if any push has been tracked.
    pub async fn sync_state(&self, id: &str) -> Option<ProjectSyncState> {
        let id = self.core.resolve_alias(id).await;
        self.core.states.lock().await.get(&id).copied()
    }

    /// Whether background sync is enabled (persisted flag).
    pub async fn sync_enabled(&self) -> anyhow::Result<bool> {
        let storage = self.core.storage.lock().await;
        storage.sync_enabled().await
    }

    /// Enable or disable background sync.
    pub async fn set_sync_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        let storage = self.core.storage.lock().await;
        storage.set_sync_enabled(enabled).await
    }

    /// Read the current-project pointer.
    pub async fn current_project(&self) -> anyhow::Result<Option<String>> {
        let storage = self.core.storage.lock().await;
        storage.current_project().await
    }

    /// Set or clear the current-project pointer.
    pub async fn set_current_project(&self, id: Option<&str>) -> anyhow::Result<()> {
        let storage = self.core.storage.lock().await;
        storage.set_current_project(id).await
    }

    /// Retrieves all projects from local storage.
    ///
    /// This is the fast path for UI reads; no remote calls are made.
    pub async fn get_projects(&self) -> anyhow::Result<Vec<crate::models::Project>> {
        let storage = self.core.storage.lock().await;
        storage.get_all_projects().await
    }

    /// Retrieves a single project from local storage.
    pub async fn get_project(&self, id: &str) -> anyhow::Result<Option<crate::models::Project>> {
        let storage = self.core.storage.lock().await;
        storage.get_project(id).await
    }

    /// Number of background jobs not yet finished.
    pub fn pending_jobs(&self) -> usize {
        self.outbox.pending()
    }

    /// Wait for every queued background job to finish. Used by tests and
    /// orderly shutdown; normal callers never need it.
    pub async fn flush(&self) {
        self.outbox.flush().await;
    }
}
