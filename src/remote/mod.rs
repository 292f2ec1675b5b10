//! Remote store client layer.
//!
//! This module defines the interface to the remote authoritative store,
//! along with the error taxonomy and the session seam the HTTP client
//! needs to distinguish an invalid session from a missing resource.
//!
//! The client is pure transport plus field translation: no retries, no
//! caching. Retry policy belongs to the sync layer's outbox.

use async_trait::async_trait;

use crate::models::{Project, Task, TaskState};

pub mod http;
pub mod translate;

pub use http::HttpRemoteStore;

/// Errors surfaced by remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote rejected payload: {0}")]
    Validation(String),
}

impl RemoteError {
    /// Transport-level failures are worth retrying; the rest are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }
}

/// Session seam consumed by the HTTP client.
///
/// The authentication subsystem is an external collaborator; all this
/// layer needs from it is a bearer token when a valid session exists.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current bearer token, or `None` when no valid session exists.
    async fn token(&self) -> Option<String>;
}

/// Session provider backed by an environment variable.
pub struct EnvSessionProvider {
    var: String,
}

impl EnvSessionProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SessionProvider for EnvSessionProvider {
    async fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.is_empty())
    }
}

/// Remote store interface.
///
/// Implementations translate between the domain model and the wire
/// representation on every call (see [`translate`]). Project `create` may
/// return an identifier different from the one submitted; callers are
/// responsible for reconciling it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>, RemoteError>;
    async fn get_project(&self, id: &str) -> Result<Project, RemoteError>;
    async fn create_project(&self, project: &Project) -> Result<Project, RemoteError>;
    async fn update_project(&self, id: &str, project: &Project) -> Result<Project, RemoteError>;
    async fn delete_project(&self, id: &str) -> Result<(), RemoteError>;

    async fn create_task(
        &self,
        project_id: &str,
        task: &Task,
        state: Option<&TaskState>,
        parent_id: Option<&str>,
    ) -> Result<Task, RemoteError>;
    async fn update_task(
        &self,
        project_id: &str,
        task: &Task,
        state: Option<&TaskState>,
        parent_id: Option<&str>,
    ) -> Result<Task, RemoteError>;
    async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), RemoteError>;
}
