//! Shared test fixtures: an in-memory remote store with scripted
//! failures, id reassignment and call counters.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use planboard::models::{Project, Task, TaskState};
use planboard::remote::{RemoteError, RemoteStore};
use planboard::storage::LocalStorage;
use planboard::sync::{RetryPolicy, SyncService};

/// In-memory stand-in for the remote store.
#[derive(Default)]
pub struct MockRemoteStore {
    pub projects: Mutex<HashMap<String, Project>>,
    /// When set, `create_project` assigns `srv-N` identifiers instead of
    /// keeping the client-supplied one.
    pub reassign_ids: AtomicBool,
    /// When set, every call fails with a network error.
    pub fail_network: AtomicBool,
    next_id: AtomicUsize,

    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_project_calls: AtomicUsize,
    pub update_project_calls: AtomicUsize,
    pub delete_project_calls: AtomicUsize,
    pub create_task_calls: AtomicUsize,
    pub update_task_calls: AtomicUsize,
    pub delete_task_calls: AtomicUsize,
}

impl MockRemoteStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(1),
            ..Default::default()
        })
    }

    pub async fn seed(&self, project: Project) {
        self.projects.lock().await.insert(project.id.clone(), project);
    }

    pub async fn remote_task_ids(&self, project_id: &str) -> Vec<String> {
        let projects = self.projects.lock().await;
        projects
            .get(project_id)
            .map(|p| p.task_ids())
            .unwrap_or_default()
    }

    pub async fn contains(&self, project_id: &str) -> bool {
        self.projects.lock().await.contains_key(project_id)
    }

    fn check_network(&self) -> Result<(), RemoteError> {
        if self.fail_network.load(Ordering::SeqCst) {
            Err(RemoteError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        let projects = self.projects.lock().await;
        Ok(projects
            .values()
            .filter(|p| include_archived || !p.archived)
            .cloned()
            .collect())
    }

    async fn get_project(&self, id: &str) -> Result<Project, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        let projects = self.projects.lock().await;
        projects
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    async fn create_project(&self, project: &Project) -> Result<Project, RemoteError> {
        self.create_project_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        if project.name.is_empty() {
            return Err(RemoteError::Validation("name is required".into()));
        }

        let mut stored = project.clone();
        stored.tasks.clear();
        stored.task_states.clear();
        if self.reassign_ids.load(Ordering::SeqCst) {
            stored.id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        }
        self.projects.lock().await.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_project(&self, id: &str, project: &Project) -> Result<Project, RemoteError> {
        self.update_project_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        let mut projects = self.projects.lock().await;
        let existing = projects
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        // Metadata only; the task collection is managed by task calls.
        existing.name = project.name.clone();
        existing.project_type = project.project_type.clone();
        existing.status = project.status.clone();
        existing.lead = project.lead.clone();
        existing.budget = project.budget;
        existing.start_date = project.start_date.clone();
        existing.target_date = project.target_date.clone();
        existing.archived = project.archived;
        existing.phases = project.phases.clone();
        existing.updated_at = project.updated_at;
        Ok(existing.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_project_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        self.projects
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    async fn create_task(
        &self,
        project_id: &str,
        task: &Task,
        state: Option<&TaskState>,
        _parent_id: Option<&str>,
    ) -> Result<Task, RemoteError> {
        self.create_task_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        let mut projects = self.projects.lock().await;
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| RemoteError::NotFound(project_id.to_string()))?;

        let mut stored = task.clone();
        stored.subtasks.clear();
        project.tasks.push(stored.clone());
        if let Some(state) = state {
            project.task_states.insert(task.id.clone(), state.clone());
        }
        Ok(stored)
    }

    async fn update_task(
        &self,
        project_id: &str,
        task: &Task,
        state: Option<&TaskState>,
        _parent_id: Option<&str>,
    ) -> Result<Task, RemoteError> {
        self.update_task_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        let mut projects = self.projects.lock().await;
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| RemoteError::NotFound(project_id.to_string()))?;

        let slot = project
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| RemoteError::NotFound(task.id.clone()))?;
        let mut stored = task.clone();
        stored.subtasks.clear();
        *slot = stored.clone();
        if let Some(state) = state {
            project.task_states.insert(task.id.clone(), state.clone());
        }
        Ok(stored)
    }

    async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), RemoteError> {
        self.delete_task_calls.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        let mut projects = self.projects.lock().await;
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| RemoteError::NotFound(project_id.to_string()))?;
        project.tasks.retain(|t| t.id != task_id);
        project.task_states.remove(task_id);
        Ok(())
    }
}

/// A sync service over a fresh in-memory cache and the given mock.
pub async fn service_with(remote: Arc<MockRemoteStore>) -> anyhow::Result<SyncService> {
    let storage = Arc::new(Mutex::new(LocalStorage::new(true).await?));
    Ok(SyncService::new(
        storage,
        remote,
        RetryPolicy {
            max_attempts: 2,
            backoff: std::time::Duration::from_millis(10),
        },
    ))
}
