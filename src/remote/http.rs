//! HTTP implementation of the remote store interface.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::sync::Arc;

use super::{translate, RemoteError, RemoteStore, SessionProvider};
use crate::models::{Project, Task, TaskState};

/// Remote store client speaking JSON over HTTP.
///
/// Pure transport and translation; errors map one-to-one onto
/// [`RemoteError`] and no call is ever retried here.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.session.token().await.ok_or(RemoteError::NotAuthenticated)?;
        Ok(self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::NotAuthenticated),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound(what.to_string())),
            status if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                Err(RemoteError::Validation(detail))
            }
            status if !status.is_success() => {
                Err(RemoteError::Network(format!("unexpected status {status} for {what}")))
            }
            _ => Ok(response),
        }
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Network(format!("malformed response body: {e}")))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>, RemoteError> {
        let path = format!("/projects?include_archived={include_archived}");
        let request = self.request(Method::GET, &path).await?;
        let response = self.send(request, "project list").await?;
        let wire: Vec<translate::RemoteProject> = Self::json(response).await?;
        Ok(wire.into_iter().map(translate::project_from_wire).collect())
    }

    async fn get_project(&self, id: &str) -> Result<Project, RemoteError> {
        let request = self.request(Method::GET, &format!("/projects/{id}")).await?;
        let response = self.send(request, id).await?;
        let wire: translate::RemoteProject = Self::json(response).await?;
        Ok(translate::project_from_wire(wire))
    }

    async fn create_project(&self, project: &Project) -> Result<Project, RemoteError> {
        let body = translate::project_to_wire(project, false);
        let request = self.request(Method::POST, "/projects").await?.json(&body);
        let response = self.send(request, &project.id).await?;
        let wire: translate::RemoteProject = Self::json(response).await?;
        Ok(translate::project_from_wire(wire))
    }

    async fn update_project(&self, id: &str, project: &Project) -> Result<Project, RemoteError> {
        let body = translate::project_to_wire(project, false);
        let request = self.request(Method::PUT, &format!("/projects/{id}")).await?.json(&body);
        let response = self.send(request, id).await?;
        let wire: translate::RemoteProject = Self::json(response).await?;
        Ok(translate::project_from_wire(wire))
    }

    async fn delete_project(&self, id: &str) -> Result<(), RemoteError> {
        let request = self.request(Method::DELETE, &format!("/projects/{id}")).await?;
        self.send(request, id).await?;
        Ok(())
    }

    async fn create_task(
        &self,
        project_id: &str,
        task: &Task,
        state: Option<&TaskState>,
        parent_id: Option<&str>,
    ) -> Result<Task, RemoteError> {
        let body = translate::task_to_wire(task, state, parent_id);
        let request = self
            .request(Method::POST, &format!("/projects/{project_id}/tasks"))
            .await?
            .json(&body);
        let response = self.send(request, &task.id).await?;
        let wire: translate::RemoteTask = Self::json(response).await?;
        Ok(translate::task_from_wire(&wire).0)
    }

    async fn update_task(
        &self,
        project_id: &str,
        task: &Task,
        state: Option<&TaskState>,
        parent_id: Option<&str>,
    ) -> Result<Task, RemoteError> {
        let body = translate::task_to_wire(task, state, parent_id);
        let request = self
            .request(Method::PUT, &format!("/projects/{project_id}/tasks/{}", task.id))
            .await?
            .json(&body);
        let response = self.send(request, &task.id).await?;
        let wire: translate::RemoteTask = Self::json(response).await?;
        Ok(translate::task_from_wire(&wire).0)
    }

    async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), RemoteError> {
        let request = self
            .request(Method::DELETE, &format!("/projects/{project_id}/tasks/{task_id}"))
            .await?;
        self.send(request, task_id).await?;
        Ok(())
    }
}
