//! Project persistence: domain <-> row conversion and the cache-store
//! operations the sync layer builds on.
//!
//! Writes here are per-entity and transactional: one call, one transaction.
//! The identifier re-key used by reconciliation moves the project row, its
//! child rows and the current-project pointer in a single transaction, so
//! the pointer can never be observed referencing a removed key.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use std::collections::HashMap;

use crate::constants::{STATE_KEY_CURRENT_PROJECT, STATE_KEY_SYNC_ENABLED};
use crate::entities::{project, task, task_state};
use crate::models::{Project, Task, TaskState, TaskStatus};
use crate::repositories::{AppStateRepository, ProjectRepository, TaskRepository, TaskStateRepository};
use crate::storage::LocalStorage;

fn task_state_from_row(row: task_state::Model) -> TaskState {
    TaskState {
        status: TaskStatus::parse(&row.status),
        notes: row.notes,
        actual_hours: row.actual_hours,
        blocked_reason: row.blocked_reason,
        completed_at: row.completed_at,
        time_log: serde_json::from_str(&row.time_log).unwrap_or_default(),
    }
}

fn task_from_row(row: &task::Model) -> Task {
    Task {
        id: row.id.clone(),
        name: row.name.clone(),
        phase: row.phase.clone(),
        category: row.category.clone(),
        estimated_hours: row.estimated_hours,
        depends_on: serde_json::from_str(&row.depends_on).unwrap_or_default(),
        subtasks: Vec::new(),
    }
}

/// Rebuild the nested task collection from flattened rows.
fn assemble_tasks(rows: Vec<task::Model>) -> Vec<Task> {
    let mut children: HashMap<Option<String>, Vec<task::Model>> = HashMap::new();
    for row in rows {
        children.entry(row.parent_id.clone()).or_default().push(row);
    }

    fn build(parent: Option<String>, children: &mut HashMap<Option<String>, Vec<task::Model>>) -> Vec<Task> {
        let rows = children.remove(&parent).unwrap_or_default();
        rows.iter()
            .map(|row| {
                let mut task = task_from_row(row);
                task.subtasks = build(Some(row.id.clone()), children);
                task
            })
            .collect()
    }

    build(None, &mut children)
}

/// Flatten a project's task tree into row models.
fn flatten_tasks(project_id: &str, tasks: &[Task], parent: Option<&str>, out: &mut Vec<task::ActiveModel>) {
    for t in tasks {
        out.push(task::ActiveModel {
            project_id: ActiveValue::Set(project_id.to_string()),
            id: ActiveValue::Set(t.id.clone()),
            name: ActiveValue::Set(t.name.clone()),
            phase: ActiveValue::Set(t.phase.clone()),
            category: ActiveValue::Set(t.category.clone()),
            estimated_hours: ActiveValue::Set(t.estimated_hours),
            depends_on: ActiveValue::Set(serde_json::to_string(&t.depends_on).unwrap_or_else(|_| "[]".into())),
            parent_id: ActiveValue::Set(parent.map(str::to_string)),
        });
        flatten_tasks(project_id, &t.subtasks, Some(&t.id), out);
    }
}

impl LocalStorage {
    /// Retrieve every cached project, archived ones included.
    pub async fn get_all_projects(&self) -> Result<Vec<Project>> {
        let rows = ProjectRepository::get_all(&self.conn).await?;
        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            projects.push(self.assemble_project(row).await?);
        }
        Ok(projects)
    }

    /// Retrieve a single project by identifier.
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        match ProjectRepository::get_by_id(&self.conn, id).await? {
            Some(row) => Ok(Some(self.assemble_project(row).await?)),
            None => Ok(None),
        }
    }

    async fn assemble_project(&self, row: project::Model) -> Result<Project> {
        let task_rows = TaskRepository::get_for_project(&self.conn, &row.id).await?;
        let state_rows = TaskStateRepository::get_for_project(&self.conn, &row.id).await?;

        let task_states = state_rows
            .into_iter()
            .map(|s| (s.task_id.clone(), task_state_from_row(s)))
            .collect();

        Ok(Project {
            id: row.id,
            name: row.name,
            project_type: row.project_type,
            status: row.status,
            lead: row.lead,
            budget: row.budget,
            start_date: row.start_date,
            target_date: row.target_date,
            archived: row.is_archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
            phases: serde_json::from_str(&row.phases).unwrap_or_default(),
            tasks: assemble_tasks(task_rows),
            task_states,
        })
    }

    /// Upsert a project by identifier.
    ///
    /// Stamps `updated_at`; an existing row keeps its original
    /// `created_at`. Task and task-state rows are replaced wholesale.
    /// Returns the value as stored.
    pub async fn save_project(&self, incoming: &Project) -> Result<Project> {
        let txn = self.conn.begin().await?;

        let existing = ProjectRepository::get_by_id(&txn, &incoming.id).await?;
        let created_at = existing.map(|row| row.created_at).unwrap_or(incoming.created_at);
        let updated_at = Utc::now();

        let row = project::ActiveModel {
            id: ActiveValue::Set(incoming.id.clone()),
            name: ActiveValue::Set(incoming.name.clone()),
            project_type: ActiveValue::Set(incoming.project_type.clone()),
            status: ActiveValue::Set(incoming.status.clone()),
            lead: ActiveValue::Set(incoming.lead.clone()),
            budget: ActiveValue::Set(incoming.budget),
            start_date: ActiveValue::Set(incoming.start_date.clone()),
            target_date: ActiveValue::Set(incoming.target_date.clone()),
            is_archived: ActiveValue::Set(incoming.archived),
            created_at: ActiveValue::Set(created_at),
            updated_at: ActiveValue::Set(updated_at),
            phases: ActiveValue::Set(serde_json::to_string(&incoming.phases)?),
        };

        project::Entity::insert(row)
            .on_conflict(
                OnConflict::column(project::Column::Id)
                    .update_columns([
                        project::Column::Name,
                        project::Column::ProjectType,
                        project::Column::Status,
                        project::Column::Lead,
                        project::Column::Budget,
                        project::Column::StartDate,
                        project::Column::TargetDate,
                        project::Column::IsArchived,
                        project::Column::UpdatedAt,
                        project::Column::Phases,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;

        TaskRepository::delete_for_project(&txn, &incoming.id).await?;
        TaskStateRepository::delete_for_project(&txn, &incoming.id).await?;

        let mut task_rows = Vec::new();
        flatten_tasks(&incoming.id, &incoming.tasks, None, &mut task_rows);
        for row in task_rows {
            task::Entity::insert(row).exec(&txn).await?;
        }

        for (task_id, state) in &incoming.task_states {
            let row = task_state::ActiveModel {
                project_id: ActiveValue::Set(incoming.id.clone()),
                task_id: ActiveValue::Set(task_id.clone()),
                status: ActiveValue::Set(state.status.as_str().to_string()),
                notes: ActiveValue::Set(state.notes.clone()),
                actual_hours: ActiveValue::Set(state.actual_hours),
                blocked_reason: ActiveValue::Set(state.blocked_reason.clone()),
                completed_at: ActiveValue::Set(state.completed_at),
                time_log: ActiveValue::Set(serde_json::to_string(&state.time_log)?),
            };
            task_state::Entity::insert(row).exec(&txn).await?;
        }

        txn.commit().await?;

        let mut stored = incoming.clone();
        stored.created_at = created_at;
        stored.updated_at = updated_at;
        Ok(stored)
    }

    /// Remove a project. Clears the current-project pointer if it
    /// referenced the removed entry.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let txn = self.conn.begin().await?;

        if let Some(row) = ProjectRepository::get_by_id(&txn, id).await? {
            // Children first: SQLite only cascades with foreign_keys on,
            // which not every connection pragma set guarantees.
            TaskRepository::delete_for_project(&txn, id).await?;
            TaskStateRepository::delete_for_project(&txn, id).await?;
            ProjectRepository::delete(&txn, row).await?;
        }

        if AppStateRepository::get(&txn, STATE_KEY_CURRENT_PROJECT).await?.as_deref() == Some(id) {
            AppStateRepository::clear(&txn, STATE_KEY_CURRENT_PROJECT).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Re-key a project from `old_id` to `new_id`, moving child rows and
    /// the current-project pointer in one transaction.
    ///
    /// This is the reconciler's rewrite primitive. The pointer is threaded
    /// explicitly: the caller passes the value it is working with and gets
    /// the rewritten value back; the persisted copy is updated alongside
    /// the re-key so no reader can observe the pointer referencing a
    /// removed key.
    pub async fn rename_project_id(
        &self,
        old_id: &str,
        new_id: &str,
        pointer: Option<&str>,
    ) -> Result<Option<String>> {
        if old_id == new_id {
            return Ok(pointer.map(str::to_string));
        }

        let txn = self.conn.begin().await?;

        let Some(row) = ProjectRepository::get_by_id(&txn, old_id).await? else {
            anyhow::bail!("Cannot re-key unknown project: {old_id}");
        };

        let moved = project::ActiveModel {
            id: ActiveValue::Set(new_id.to_string()),
            name: ActiveValue::Set(row.name.clone()),
            project_type: ActiveValue::Set(row.project_type.clone()),
            status: ActiveValue::Set(row.status.clone()),
            lead: ActiveValue::Set(row.lead.clone()),
            budget: ActiveValue::Set(row.budget),
            start_date: ActiveValue::Set(row.start_date.clone()),
            target_date: ActiveValue::Set(row.target_date.clone()),
            is_archived: ActiveValue::Set(row.is_archived),
            created_at: ActiveValue::Set(row.created_at),
            updated_at: ActiveValue::Set(row.updated_at),
            phases: ActiveValue::Set(row.phases.clone()),
        };
        project::Entity::insert(moved)
            .on_conflict(
                OnConflict::column(project::Column::Id)
                    .update_columns([
                        project::Column::Name,
                        project::Column::ProjectType,
                        project::Column::Status,
                        project::Column::Lead,
                        project::Column::Budget,
                        project::Column::StartDate,
                        project::Column::TargetDate,
                        project::Column::IsArchived,
                        project::Column::UpdatedAt,
                        project::Column::Phases,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;

        task::Entity::update_many()
            .col_expr(task::Column::ProjectId, sea_orm::sea_query::Expr::value(new_id))
            .filter(task::Column::ProjectId.eq(old_id))
            .exec(&txn)
            .await?;
        task_state::Entity::update_many()
            .col_expr(task_state::Column::ProjectId, sea_orm::sea_query::Expr::value(new_id))
            .filter(task_state::Column::ProjectId.eq(old_id))
            .exec(&txn)
            .await?;

        ProjectRepository::delete(&txn, row).await?;

        let pointer = if pointer == Some(old_id) {
            AppStateRepository::set(&txn, STATE_KEY_CURRENT_PROJECT, new_id).await?;
            Some(new_id.to_string())
        } else {
            pointer.map(str::to_string)
        };

        txn.commit().await?;
        Ok(pointer)
    }

    /// Replace the entire cached collection (pull's remote-wins step).
    ///
    /// The pointer is written alongside; passing a pointer that does not
    /// resolve to an entry in `projects` clears it instead.
    pub async fn replace_all_projects(&self, projects: &[Project], pointer: Option<&str>) -> Result<()> {
        let txn = self.conn.begin().await?;

        // Children first, then parents; same reasoning as delete_project.
        task_state::Entity::delete_many().exec(&txn).await?;
        task::Entity::delete_many().exec(&txn).await?;
        ProjectRepository::delete_all(&txn).await?;

        for p in projects {
            let row = project::ActiveModel {
                id: ActiveValue::Set(p.id.clone()),
                name: ActiveValue::Set(p.name.clone()),
                project_type: ActiveValue::Set(p.project_type.clone()),
                status: ActiveValue::Set(p.status.clone()),
                lead: ActiveValue::Set(p.lead.clone()),
                budget: ActiveValue::Set(p.budget),
                start_date: ActiveValue::Set(p.start_date.clone()),
                target_date: ActiveValue::Set(p.target_date.clone()),
                is_archived: ActiveValue::Set(p.archived),
                created_at: ActiveValue::Set(p.created_at),
                updated_at: ActiveValue::Set(p.updated_at),
                phases: ActiveValue::Set(serde_json::to_string(&p.phases)?),
            };
            project::Entity::insert(row).exec(&txn).await?;

            let mut task_rows = Vec::new();
            flatten_tasks(&p.id, &p.tasks, None, &mut task_rows);
            for row in task_rows {
                task::Entity::insert(row).exec(&txn).await?;
            }

            for (task_id, state) in &p.task_states {
                let row = task_state::ActiveModel {
                    project_id: ActiveValue::Set(p.id.clone()),
                    task_id: ActiveValue::Set(task_id.clone()),
                    status: ActiveValue::Set(state.status.as_str().to_string()),
                    notes: ActiveValue::Set(state.notes.clone()),
                    actual_hours: ActiveValue::Set(state.actual_hours),
                    blocked_reason: ActiveValue::Set(state.blocked_reason.clone()),
                    completed_at: ActiveValue::Set(state.completed_at),
                    time_log: ActiveValue::Set(serde_json::to_string(&state.time_log)?),
                };
                task_state::Entity::insert(row).exec(&txn).await?;
            }
        }

        let resolvable = pointer.filter(|p| projects.iter().any(|proj| proj.id == *p));
        match resolvable {
            Some(p) => AppStateRepository::set(&txn, STATE_KEY_CURRENT_PROJECT, p).await?,
            None => AppStateRepository::clear(&txn, STATE_KEY_CURRENT_PROJECT).await?,
        }

        txn.commit().await?;
        Ok(())
    }

    /// Read the current-project pointer.
    pub async fn current_project(&self) -> Result<Option<String>> {
        AppStateRepository::get(&self.conn, STATE_KEY_CURRENT_PROJECT).await
    }

    /// Set or clear the current-project pointer.
    ///
    /// A non-null pointer must resolve to a cached project.
    pub async fn set_current_project(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => {
                if ProjectRepository::get_by_id(&self.conn, id).await?.is_none() {
                    anyhow::bail!("Cannot point at unknown project: {id}");
                }
                AppStateRepository::set(&self.conn, STATE_KEY_CURRENT_PROJECT, id).await
            }
            None => AppStateRepository::clear(&self.conn, STATE_KEY_CURRENT_PROJECT).await,
        }
    }

    /// Read the persisted sync-enabled flag. Defaults to disabled.
    pub async fn sync_enabled(&self) -> Result<bool> {
        Ok(AppStateRepository::get(&self.conn, STATE_KEY_SYNC_ENABLED)
            .await?
            .as_deref()
            == Some("true"))
    }

    /// Persist the sync-enabled flag.
    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<()> {
        AppStateRepository::set(
            &self.conn,
            STATE_KEY_SYNC_ENABLED,
            if enabled { "true" } else { "false" },
        )
        .await
    }
}
