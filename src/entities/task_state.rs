use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress state row, keyed by (project, task).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub task_id: String,
    pub status: String,
    pub notes: String,
    pub actual_hours: f64,
    pub blocked_reason: Option<String>,
    pub completed_at: Option<DateTimeUtc>,
    /// Time-log entries, serialized as JSON.
    pub time_log: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
