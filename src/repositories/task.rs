//! Task repository for database operations.

use anyhow::Result;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::task;

/// Repository for task-related database operations.
pub struct TaskRepository;

impl TaskRepository {
    /// Get all task rows for a project.
    pub async fn get_for_project<C>(conn: &C, project_id: &str) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .all(conn)
            .await?)
    }

    /// Get a single task row by (project, task) identifier.
    pub async fn get_by_id<C>(conn: &C, project_id: &str, task_id: &str) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .filter(task::Column::Id.eq(task_id))
            .one(conn)
            .await?)
    }

    /// Remove every task row belonging to a project.
    pub async fn delete_for_project<C>(conn: &C, project_id: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task::Entity::delete_many()
            .filter(task::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await?;
        Ok(())
    }
}
