//! Project-level sync orchestration: save, pull, delete, and the
//! background push job.

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use std::collections::HashSet;

use crate::models::Project;
use crate::remote::RemoteError;
use crate::sync::outbox::{JobError, JobHandler, Rekey, SyncJob};
use crate::sync::{reconcile, ProjectSyncState, SyncCore, SyncService};

impl SyncService {
    /// Save a project locally and schedule a background push.
    ///
    /// The local write completes before this returns; the caller gets the
    /// stored value (with refreshed `updated_at`). If sync is enabled, a
    /// push job is enqueued on the project's outbox lane and runs without
    /// blocking the caller.
    pub async fn save_project(&self, project: &Project) -> Result<Project> {
        let (stored, sync_enabled) = {
            let storage = self.core().storage.lock().await;
            let stored = storage.save_project(project).await?;
            (stored, storage.sync_enabled().await?)
        };

        self.core().set_state(&stored.id, ProjectSyncState::LocalOnly).await;

        if sync_enabled {
            self.outbox()
                .enqueue(&stored.id, SyncJob::Push { project_id: stored.id.clone() })
                .await;
        }

        Ok(stored)
    }

    /// Remove a project locally and schedule a best-effort remote delete.
    ///
    /// The local removal (including clearing the pointer if it referenced
    /// this project) completes before this returns. A remote failure is
    /// logged, never surfaced.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let sync_enabled = {
            let storage = self.core().storage.lock().await;
            storage.delete_project(id).await?;
            storage.sync_enabled().await?
        };

        self.core().clear_state(id).await;

        if sync_enabled {
            self.outbox()
                .enqueue(id, SyncJob::DeleteRemote { project_id: id.to_string() })
                .await;
        }

        Ok(())
    }

    /// Fetch the remote collection and adopt it locally.
    ///
    /// With sync disabled this returns the local collection unchanged.
    /// Any remote failure is logged and the prior local collection is
    /// returned — pull never raises for a remote outage and never leaves
    /// the cache empty. On success every local project missing from the
    /// remote list by identifier is reconciled by name/time match (the
    /// pointer follows the rewrite), then the remote list replaces the
    /// local collection; remote wins for metadata.
    pub async fn pull(&self) -> Result<Vec<Project>> {
        {
            let storage = self.core().storage.lock().await;
            if !storage.sync_enabled().await? {
                return storage.get_all_projects().await;
            }
        }

        let remote_list = match self.core().remote.list_projects(true).await {
            Ok(list) => list,
            Err(e) => {
                error!("Pull failed, keeping local collection: {e}");
                let storage = self.core().storage.lock().await;
                return storage.get_all_projects().await;
            }
        };
        info!("Fetched {} projects from remote store", remote_list.len());

        let storage = self.core().storage.lock().await;
        let locals = storage.get_all_projects().await?;
        let remote_ids: HashSet<&str> = remote_list.iter().map(|p| p.id.as_str()).collect();
        let mut pointer = storage.current_project().await?;

        for local in locals.iter().filter(|p| !remote_ids.contains(p.id.as_str())) {
            let outcome = reconcile::find_remote_match(local, &remote_list);
            if let Some(remote_id) = reconcile::resolve_outcome(local, &outcome) {
                pointer =
                    reconcile::rewrite_identity(&storage, &local.id, &remote_id, pointer.as_deref())
                        .await?;
                self.core().add_alias(&local.id, &remote_id).await;
                self.core().move_state(&local.id, &remote_id).await;
            }
        }

        storage.replace_all_projects(&remote_list, pointer.as_deref()).await?;
        storage.get_all_projects().await
    }
}

impl SyncCore {
    /// The push job body: resolve how the project exists remotely, then
    /// converge the remote side to the local state.
    pub(super) async fn push_project(&self, project_id: &str) -> Result<Option<Rekey>, JobError> {
        let id = self.resolve_alias(project_id).await;

        let local = {
            let storage = self.storage.lock().await;
            storage.get_project(&id).await.map_err(JobError::Fatal)?
        };
        let Some(local) = local else {
            // Deleted between enqueue and execution; nothing to push.
            self.clear_state(&id).await;
            return Ok(None);
        };

        self.set_state(&id, ProjectSyncState::Syncing).await;

        let result = self.push_resolved(&id, local).await;
        match &result {
            Ok(rekey) => {
                let final_id = rekey.as_ref().map_or(id.as_str(), |r| r.new_id.as_str());
                self.set_state(final_id, ProjectSyncState::Synced).await;
            }
            Err(_) => {
                self.set_state(&id, ProjectSyncState::SyncFailed).await;
            }
        }
        result
    }

    async fn push_resolved(&self, id: &str, local: Project) -> Result<Option<Rekey>, JobError> {
        match self.remote.get_project(id).await {
            Ok(remote_project) => {
                self.remote
                    .update_project(id, &local)
                    .await
                    .map_err(JobError::from_remote)?;
                self.sync_tasks(&local, &remote_project).await?;
                Ok(None)
            }
            Err(RemoteError::NotFound(_)) => {
                let listing = self
                    .remote
                    .list_projects(true)
                    .await
                    .map_err(JobError::from_remote)?;
                let outcome = reconcile::find_remote_match(&local, &listing);
                match reconcile::resolve_outcome(&local, &outcome) {
                    Some(remote_id) => self.push_as_existing(&local, &remote_id, &listing).await,
                    None => self.push_as_new(&local).await,
                }
            }
            Err(e) => Err(JobError::from_remote(e)),
        }
    }

    /// The project matched a remote entry under a different identifier:
    /// adopt the remote id, then converge it like any existing project.
    async fn push_as_existing(
        &self,
        local: &Project,
        remote_id: &str,
        listing: &[Project],
    ) -> Result<Option<Rekey>, JobError> {
        let rekey = self.adopt_remote_id(&local.id, remote_id).await?;

        let mut relabeled = local.clone();
        relabeled.id = remote_id.to_string();

        self.remote
            .update_project(remote_id, &relabeled)
            .await
            .map_err(JobError::from_remote)?;

        let remote_project = listing
            .iter()
            .find(|p| p.id == remote_id)
            .cloned()
            .unwrap_or_else(|| relabeled.clone());
        self.sync_tasks(&relabeled, &remote_project).await?;

        Ok(rekey)
    }

    /// No remote counterpart exists: create the project (adopting any
    /// reassigned identifier), then create every local task.
    async fn push_as_new(&self, local: &Project) -> Result<Option<Rekey>, JobError> {
        let created = self
            .remote
            .create_project(local)
            .await
            .map_err(JobError::from_remote)?;

        let rekey = if created.id != local.id {
            self.adopt_remote_id(&local.id, &created.id).await?
        } else {
            None
        };

        let mut relabeled = local.clone();
        relabeled.id = created.id.clone();
        self.create_all_tasks(&relabeled).await?;

        Ok(rekey)
    }

    /// Re-key the local cache entry to the identifier the remote store
    /// knows, rewriting the pointer alongside.
    async fn adopt_remote_id(&self, old_id: &str, new_id: &str) -> Result<Option<Rekey>, JobError> {
        {
            let storage = self.storage.lock().await;
            let pointer = storage.current_project().await.map_err(JobError::Fatal)?;
            reconcile::rewrite_identity(&storage, old_id, new_id, pointer.as_deref())
                .await
                .map_err(JobError::Fatal)?;
        }
        self.add_alias(old_id, new_id).await;
        self.move_state(old_id, new_id).await;
        Ok(Some(Rekey {
            old_id: old_id.to_string(),
            new_id: new_id.to_string(),
        }))
    }

    /// Best-effort remote delete for an already locally-removed project.
    pub(super) async fn remote_delete(&self, project_id: &str) -> Result<(), JobError> {
        let id = self.resolve_alias(project_id).await;
        match self.remote.delete_project(&id).await {
            // Already absent remotely; the intent is satisfied.
            Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(JobError::from_remote(e)),
        }
    }
}

impl JobError {
    pub(super) fn from_remote(e: RemoteError) -> Self {
        if e.is_transient() {
            JobError::Transient(e.into())
        } else {
            JobError::Fatal(e.into())
        }
    }
}

#[async_trait]
impl JobHandler for SyncCore {
    async fn execute(&self, job: &SyncJob) -> Result<Option<Rekey>, JobError> {
        match job {
            SyncJob::Push { project_id } => self.push_project(project_id).await,
            SyncJob::DeleteRemote { project_id } => {
                self.remote_delete(project_id).await.map(|()| None)
            }
        }
    }
}
