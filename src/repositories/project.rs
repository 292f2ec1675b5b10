//! Project repository for database operations.

use anyhow::Result;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::project;

/// Repository for project-related database operations.
pub struct ProjectRepository;

impl ProjectRepository {
    /// Get all projects ordered by creation time.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(project::Entity::find()
            .order_by_asc(project::Column::CreatedAt)
            .all(conn)
            .await?)
    }

    /// Get a single project by identifier.
    pub async fn get_by_id<C>(conn: &C, id: &str) -> Result<Option<project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(project::Entity::find()
            .filter(project::Column::Id.eq(id))
            .one(conn)
            .await?)
    }

    /// Get all projects with the given display name.
    ///
    /// Used by identity reconciliation, which correlates on name plus
    /// creation-time proximity; several rows may share a name.
    pub async fn get_by_name<C>(conn: &C, name: &str) -> Result<Vec<project::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(project::Entity::find()
            .filter(project::Column::Name.eq(name))
            .all(conn)
            .await?)
    }

    /// Update a project in the database.
    pub async fn update<C>(conn: &C, project: project::ActiveModel) -> Result<project::Model>
    where
        C: ConnectionTrait,
    {
        use sea_orm::ActiveModelTrait;
        Ok(project.update(conn).await?)
    }

    /// Delete a project from the database.
    pub async fn delete<C>(conn: &C, project: project::Model) -> Result<()>
    where
        C: ConnectionTrait,
    {
        use sea_orm::ModelTrait;
        project.delete(conn).await?;
        Ok(())
    }

    /// Delete every project row.
    pub async fn delete_all<C>(conn: &C) -> Result<()>
    where
        C: ConnectionTrait,
    {
        project::Entity::delete_many().exec(conn).await?;
        Ok(())
    }
}
