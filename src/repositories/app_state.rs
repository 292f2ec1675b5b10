//! Key/value application state repository.
//!
//! Holds the current-project pointer and the sync-enabled flag.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::app_state;

/// Repository for single-row application state.
pub struct AppStateRepository;

impl AppStateRepository {
    /// Read a state value by key.
    pub async fn get<C>(conn: &C, key: &str) -> Result<Option<String>>
    where
        C: ConnectionTrait,
    {
        Ok(app_state::Entity::find()
            .filter(app_state::Column::Key.eq(key))
            .one(conn)
            .await?
            .map(|row| row.value))
    }

    /// Upsert a state value.
    pub async fn set<C>(conn: &C, key: &str, value: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let row = app_state::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
        };
        app_state::Entity::insert(row)
            .on_conflict(
                OnConflict::column(app_state::Column::Key)
                    .update_column(app_state::Column::Value)
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Remove a state value if present.
    pub async fn clear<C>(conn: &C, key: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        app_state::Entity::delete_many()
            .filter(app_state::Column::Key.eq(key))
            .exec(conn)
            .await?;
        Ok(())
    }
}
