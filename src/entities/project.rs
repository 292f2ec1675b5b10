use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub lead: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Ordered phase descriptors, serialized as JSON.
    pub phases: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
    #[sea_orm(has_many = "super::task_state::Entity")]
    TaskStates,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::task_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskStates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
