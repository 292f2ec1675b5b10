//! Domain model shared by the storage, remote and sync layers.
//!
//! These are plain serde-serializable value types. Identifiers are opaque
//! strings: a project created locally gets a client-generated UUID, which
//! the remote store may replace with its own identifier on first create.
//! The sync layer is responsible for reconciling the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A project with its nested tasks and per-task progress state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub lead: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered phase descriptors; tasks reference phases by name.
    pub phases: Vec<Phase>,
    pub tasks: Vec<Task>,
    /// Progress state keyed by task identifier.
    pub task_states: HashMap<String, TaskState>,
}

/// An ordered phase descriptor within a project.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A task definition. Progress lives separately in [`TaskState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub phase: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Task>,
}

/// Progress state for a single task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub actual_hours: f64,
    pub blocked_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_log: Vec<TimeLogEntry>,
}

/// One logged unit of work against a task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeLogEntry {
    pub logged_at: DateTime<Utc>,
    pub hours: f64,
    pub note: Option<String>,
}

/// Local task status vocabulary.
///
/// The remote store uses `not-started` where we use `pending`; the mapping
/// lives at the wire boundary in [`crate::remote::translate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Complete => "complete",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// Parse the local vocabulary. Unknown values fall back to `Pending`.
    pub fn parse(s: &str) -> Self {
        match s {
            "in-progress" => TaskStatus::InProgress,
            "complete" => TaskStatus::Complete,
            "blocked" => TaskStatus::Blocked,
            _ => TaskStatus::Pending,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Project {
    /// Create a new local-only project with a client-generated identifier.
    ///
    /// Both timestamps are set to now; the identifier may later be
    /// superseded by the remote store on first create.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            project_type: None,
            status: None,
            lead: None,
            budget: None,
            start_date: None,
            target_date: None,
            archived: false,
            created_at: now,
            updated_at: now,
            phases: Vec::new(),
            tasks: Vec::new(),
            task_states: HashMap::new(),
        }
    }

    /// All task identifiers in this project, subtasks included.
    pub fn task_ids(&self) -> Vec<String> {
        fn collect(tasks: &[Task], out: &mut Vec<String>) {
            for task in tasks {
                out.push(task.id.clone());
                collect(&task.subtasks, out);
            }
        }
        let mut ids = Vec::new();
        collect(&self.tasks, &mut ids);
        ids
    }

    /// Find a task by identifier, searching subtasks too.
    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        fn find<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
            for task in tasks {
                if task.id == task_id {
                    return Some(task);
                }
                if let Some(found) = find(&task.subtasks, task_id) {
                    return Some(found);
                }
            }
            None
        }
        find(&self.tasks, task_id)
    }
}

impl Task {
    /// Create a task with a client-generated identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            phase: None,
            category: None,
            estimated_hours: 0.0,
            depends_on: Vec::new(),
            subtasks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_round_trips_known_values() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Complete,
            TaskStatus::Blocked,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn status_parse_defaults_to_pending() {
        assert_eq!(TaskStatus::parse("nonsense"), TaskStatus::Pending);
        assert_eq!(TaskStatus::parse(""), TaskStatus::Pending);
    }

    #[test]
    fn task_ids_include_subtasks() {
        let mut project = Project::new("Acme");
        let mut parent = Task::new("parent");
        let child = Task::new("child");
        let child_id = child.id.clone();
        parent.subtasks.push(child);
        let parent_id = parent.id.clone();
        project.tasks.push(parent);

        let ids = project.task_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&parent_id));
        assert!(ids.contains(&child_id));
    }

    #[test]
    fn find_task_reaches_nested_subtasks() {
        let mut project = Project::new("Acme");
        let mut parent = Task::new("parent");
        let child = Task::new("child");
        let child_id = child.id.clone();
        parent.subtasks.push(child);
        project.tasks.push(parent);

        assert_eq!(project.find_task(&child_id).map(|t| t.name.as_str()), Some("child"));
        assert!(project.find_task("missing").is_none());
    }
}
