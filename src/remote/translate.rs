//! Wire representation and boundary translation.
//!
//! The remote store speaks a slightly different dialect than the local
//! model: tasks carry their display text as `name` and their free-text
//! notes as `description`, progress notes travel as `notes`, and the
//! status vocabulary uses `not-started` where the local model says
//! `pending`. The status mapping is total and is its own inverse.
//!
//! Older remote clients submitted actual-hours as a decimal string, so
//! ingest accepts both a JSON number and a numeric string; we always emit
//! numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Project, Task, TaskState, TaskStatus, TimeLogEntry};

/// Wire form of a project. List/get/create/update responses nest the full
/// task collection; create/update requests leave it empty because tasks
/// are managed through the task endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub phases: Vec<crate::models::Phase>,
    #[serde(default)]
    pub tasks: Vec<RemoteTask>,
}

/// Wire form of a task: definition and progress state travel together,
/// flattened (subtask nesting goes through `parent_id`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    pub name: String,
    /// Task free-text notes.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "default_remote_status")]
    pub status: String,
    /// Progress notes.
    #[serde(default)]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient_hours")]
    pub actual_hours: f64,
    #[serde(default)]
    pub blocked_reason: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_log: Vec<TimeLogEntry>,
}

fn default_remote_status() -> String {
    "not-started".to_string()
}

fn lenient_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s.trim().parse().unwrap_or(0.0),
    })
}

/// Local status -> remote vocabulary.
pub fn status_to_remote(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "not-started",
        TaskStatus::InProgress => "in-progress",
        TaskStatus::Complete => "complete",
        TaskStatus::Blocked => "blocked",
    }
}

/// Remote vocabulary -> local status. Unknown values fall back to pending.
pub fn status_to_local(status: &str) -> TaskStatus {
    match status {
        "not-started" => TaskStatus::Pending,
        other => TaskStatus::parse(other),
    }
}

/// Build the wire form of a task plus its progress state.
pub fn task_to_wire(task: &Task, state: Option<&TaskState>, parent_id: Option<&str>) -> RemoteTask {
    let state = state.cloned().unwrap_or_default();
    RemoteTask {
        id: task.id.clone(),
        name: task.name.clone(),
        description: None,
        phase: task.phase.clone(),
        category: task.category.clone(),
        estimated_hours: task.estimated_hours,
        depends_on: task.depends_on.clone(),
        parent_id: parent_id.map(str::to_string),
        status: status_to_remote(state.status).to_string(),
        notes: state.notes,
        actual_hours: state.actual_hours,
        blocked_reason: state.blocked_reason,
        completed_at: state.completed_at,
        time_log: state.time_log,
    }
}

/// Split a wire task back into the local definition and progress state.
pub fn task_from_wire(wire: &RemoteTask) -> (Task, TaskState) {
    let task = Task {
        id: wire.id.clone(),
        name: wire.name.clone(),
        phase: wire.phase.clone(),
        category: wire.category.clone(),
        estimated_hours: wire.estimated_hours,
        depends_on: wire.depends_on.clone(),
        subtasks: Vec::new(),
    };
    let state = TaskState {
        status: status_to_local(&wire.status),
        notes: wire.notes.clone(),
        actual_hours: wire.actual_hours,
        blocked_reason: wire.blocked_reason.clone(),
        completed_at: wire.completed_at,
        time_log: wire.time_log.clone(),
    };
    (task, state)
}

/// Build the wire form of a project. `include_tasks` selects between the
/// response shape (nested tasks) and the request shape (tasks omitted).
pub fn project_to_wire(project: &Project, include_tasks: bool) -> RemoteProject {
    let mut tasks = Vec::new();
    if include_tasks {
        flatten(&project.tasks, None, project, &mut tasks);
    }
    RemoteProject {
        id: project.id.clone(),
        name: project.name.clone(),
        project_type: project.project_type.clone(),
        status: project.status.clone(),
        lead: project.lead.clone(),
        budget: project.budget,
        start_date: project.start_date.clone(),
        target_date: project.target_date.clone(),
        archived: project.archived,
        created_at: project.created_at,
        updated_at: project.updated_at,
        phases: project.phases.clone(),
        tasks,
    }
}

fn flatten(tasks: &[Task], parent: Option<&str>, project: &Project, out: &mut Vec<RemoteTask>) {
    for task in tasks {
        out.push(task_to_wire(task, project.task_states.get(&task.id), parent));
        flatten(&task.subtasks, Some(&task.id), project, out);
    }
}

/// Assemble a domain project from its wire form.
pub fn project_from_wire(wire: RemoteProject) -> Project {
    let mut project = Project {
        id: wire.id,
        name: wire.name,
        project_type: wire.project_type,
        status: wire.status,
        lead: wire.lead,
        budget: wire.budget,
        start_date: wire.start_date,
        target_date: wire.target_date,
        archived: wire.archived,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
        phases: wire.phases,
        tasks: Vec::new(),
        task_states: Default::default(),
    };

    let mut parents: Vec<(Option<String>, Task)> = Vec::new();
    for wire_task in &wire.tasks {
        let (task, state) = task_from_wire(wire_task);
        project.task_states.insert(task.id.clone(), state);
        parents.push((wire_task.parent_id.clone(), task));
    }

    // Reattach subtasks to their parents; orphans become top-level.
    let mut roots: Vec<Task> = Vec::new();
    let mut children: Vec<(String, Task)> = Vec::new();
    for (parent_id, task) in parents {
        match parent_id {
            Some(pid) => children.push((pid, task)),
            None => roots.push(task),
        }
    }
    for (pid, child) in children {
        match roots.iter_mut().find(|t| t.id == pid) {
            Some(parent) => parent.subtasks.push(child),
            None => roots.push(child),
        }
    }
    project.tasks = roots;
    project
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_translation_is_its_own_inverse() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Complete,
            TaskStatus::Blocked,
        ] {
            assert_eq!(status_to_local(status_to_remote(status)), status);
        }
    }

    #[test]
    fn pending_maps_to_not_started() {
        assert_eq!(status_to_remote(TaskStatus::Pending), "not-started");
        assert_eq!(status_to_local("not-started"), TaskStatus::Pending);
    }

    #[test]
    fn unknown_remote_status_falls_back_to_pending() {
        assert_eq!(status_to_local("archived"), TaskStatus::Pending);
    }

    #[test]
    fn actual_hours_accepts_string_and_number() {
        let from_number: RemoteTask =
            serde_json::from_str(r#"{"id":"t1","name":"a","actual_hours":2.5}"#).unwrap();
        assert_eq!(from_number.actual_hours, 2.5);

        let from_string: RemoteTask =
            serde_json::from_str(r#"{"id":"t1","name":"a","actual_hours":"2.5"}"#).unwrap();
        assert_eq!(from_string.actual_hours, 2.5);

        let from_garbage: RemoteTask =
            serde_json::from_str(r#"{"id":"t1","name":"a","actual_hours":"lots"}"#).unwrap();
        assert_eq!(from_garbage.actual_hours, 0.0);
    }

    #[test]
    fn project_round_trips_through_wire_form() {
        let mut project = Project::new("Acme Launch");
        let mut parent = Task::new("build");
        parent.estimated_hours = 8.0;
        let child = Task::new("test");
        let child_id = child.id.clone();
        parent.subtasks.push(child);
        project.task_states.insert(
            child_id.clone(),
            TaskState {
                status: TaskStatus::InProgress,
                notes: "halfway".into(),
                actual_hours: 3.0,
                ..Default::default()
            },
        );
        project.tasks.push(parent);

        let wire = project_to_wire(&project, true);
        assert_eq!(wire.tasks.len(), 2);
        let back = project_from_wire(wire);

        assert_eq!(back.tasks.len(), 1);
        assert_eq!(back.tasks[0].subtasks.len(), 1);
        assert_eq!(back.task_states[&child_id].status, TaskStatus::InProgress);
        assert_eq!(back.task_states[&child_id].actual_hours, 3.0);
    }
}
