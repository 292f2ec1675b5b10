//! Task-level sync: applying a computed diff against the remote store.

use std::collections::{HashMap, HashSet};

use crate::models::{Project, Task};
use crate::sync::outbox::JobError;
use crate::sync::{SyncCore, TaskDiff};

/// Flatten a task tree into (task, parent-id) pairs.
fn flatten_with_parents<'a>(
    tasks: &'a [Task],
    parent: Option<&'a str>,
    out: &mut Vec<(&'a Task, Option<&'a str>)>,
) {
    for task in tasks {
        out.push((task, parent));
        flatten_with_parents(&task.subtasks, Some(&task.id), out);
    }
}

impl SyncCore {
    /// Converge the remote task collection to the local one.
    ///
    /// Creates and updates are applied before deletes so the remote side
    /// never transiently references an identifier that is about to
    /// disappear.
    pub(super) async fn sync_tasks(
        &self,
        local: &Project,
        remote_project: &Project,
    ) -> Result<(), JobError> {
        let local_ids: HashSet<String> = local.task_ids().into_iter().collect();
        let remote_ids: HashSet<String> = remote_project.task_ids().into_iter().collect();
        let diff = TaskDiff::between(&local_ids, &remote_ids);
        if diff.is_empty() {
            return Ok(());
        }

        let mut pairs = Vec::new();
        flatten_with_parents(&local.tasks, None, &mut pairs);
        let by_id: HashMap<&str, (&Task, Option<&str>)> =
            pairs.into_iter().map(|(task, parent)| (task.id.as_str(), (task, parent))).collect();

        for task_id in &diff.to_create {
            if let Some((task, parent)) = by_id.get(task_id.as_str()) {
                self.remote
                    .create_task(&local.id, task, local.task_states.get(task_id), *parent)
                    .await
                    .map_err(JobError::from_remote)?;
            }
        }

        for task_id in &diff.to_update {
            if let Some((task, parent)) = by_id.get(task_id.as_str()) {
                self.remote
                    .update_task(&local.id, task, local.task_states.get(task_id), *parent)
                    .await
                    .map_err(JobError::from_remote)?;
            }
        }

        for task_id in &diff.to_delete {
            self.remote
                .delete_task(&local.id, task_id)
                .await
                .map_err(JobError::from_remote)?;
        }

        Ok(())
    }

    /// Create every local task remotely (used after a project create).
    pub(super) async fn create_all_tasks(&self, local: &Project) -> Result<(), JobError> {
        let mut pairs = Vec::new();
        flatten_with_parents(&local.tasks, None, &mut pairs);

        for (task, parent) in pairs {
            self.remote
                .create_task(&local.id, task, local.task_states.get(&task.id), parent)
                .await
                .map_err(JobError::from_remote)?;
        }
        Ok(())
    }
}
