//! Task-state repository for database operations.

use anyhow::Result;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::task_state;

/// Repository for task progress-state rows.
pub struct TaskStateRepository;

impl TaskStateRepository {
    /// Get all state rows for a project.
    pub async fn get_for_project<C>(conn: &C, project_id: &str) -> Result<Vec<task_state::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task_state::Entity::find()
            .filter(task_state::Column::ProjectId.eq(project_id))
            .all(conn)
            .await?)
    }

    /// Remove every state row belonging to a project.
    pub async fn delete_for_project<C>(conn: &C, project_id: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task_state::Entity::delete_many()
            .filter(task_state::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        Ok(())
    }
}
