//! Local cache store behavior: round-trips, pointer invariants and the
//! identifier re-key primitive.

use planboard::models::{Phase, Project, Task, TaskState, TaskStatus, TimeLogEntry};
use planboard::storage::LocalStorage;

fn sample_project(name: &str) -> Project {
    let mut project = Project::new(name);
    project.project_type = Some("software".into());
    project.status = Some("active".into());
    project.lead = Some("Robin".into());
    project.budget = Some(25_000.0);
    project.phases.push(Phase {
        name: "Build".into(),
        description: "Implementation".into(),
    });

    let mut task = Task::new("wire the API");
    task.phase = Some("Build".into());
    task.estimated_hours = 12.0;
    let subtask = Task::new("define endpoints");
    let subtask_id = subtask.id.clone();
    task.depends_on.push(subtask_id.clone());
    task.subtasks.push(subtask);
    let task_id = task.id.clone();
    project.tasks.push(task);

    project.task_states.insert(
        task_id,
        TaskState {
            status: TaskStatus::InProgress,
            notes: "going well".into(),
            actual_hours: 4.5,
            blocked_reason: None,
            completed_at: None,
            time_log: vec![TimeLogEntry {
                logged_at: chrono::Utc::now(),
                hours: 4.5,
                note: Some("first pass".into()),
            }],
        },
    );
    project
}

#[tokio::test]
async fn storage_creation() {
    let result = LocalStorage::new(true).await;
    assert!(result.is_ok(), "LocalStorage should be created successfully");
}

#[tokio::test]
async fn save_then_get_round_trips_except_updated_at() {
    let storage = LocalStorage::new(true).await.unwrap();
    let project = sample_project("Acme");

    let stored = storage.save_project(&project).await.unwrap();
    let fetched = storage.get_project(&project.id).await.unwrap().unwrap();

    let mut expected = project.clone();
    expected.updated_at = stored.updated_at;
    assert_eq!(fetched, expected);
    assert!(stored.updated_at >= project.updated_at);
}

#[tokio::test]
async fn resave_preserves_creation_time() {
    let storage = LocalStorage::new(true).await.unwrap();
    let project = sample_project("Acme");

    let first = storage.save_project(&project).await.unwrap();

    let mut edited = first.clone();
    edited.name = "Acme Launch".into();
    // A stale client might carry a different created_at; the row keeps
    // the original.
    edited.created_at = chrono::Utc::now();
    storage.save_project(&edited).await.unwrap();

    let fetched = storage.get_project(&project.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Acme Launch");
    assert_eq!(fetched.created_at, first.created_at);
}

#[tokio::test]
async fn get_all_returns_archived_projects_too() {
    let storage = LocalStorage::new(true).await.unwrap();
    let mut archived = sample_project("Old");
    archived.archived = true;
    storage.save_project(&archived).await.unwrap();
    storage.save_project(&sample_project("Current")).await.unwrap();

    let all = storage.get_all_projects().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|p| p.archived));
}

#[tokio::test]
async fn pointer_must_resolve_to_a_cached_project() {
    let storage = LocalStorage::new(true).await.unwrap();
    let project = sample_project("Acme");
    storage.save_project(&project).await.unwrap();

    assert!(storage.set_current_project(Some("missing")).await.is_err());
    storage.set_current_project(Some(&project.id)).await.unwrap();
    assert_eq!(storage.current_project().await.unwrap(), Some(project.id.clone()));

    storage.set_current_project(None).await.unwrap();
    assert_eq!(storage.current_project().await.unwrap(), None);
}

#[tokio::test]
async fn delete_clears_pointer_when_it_referenced_the_entry() {
    let storage = LocalStorage::new(true).await.unwrap();
    let keep = sample_project("Keep");
    let drop = sample_project("Drop");
    storage.save_project(&keep).await.unwrap();
    storage.save_project(&drop).await.unwrap();

    storage.set_current_project(Some(&drop.id)).await.unwrap();
    storage.delete_project(&drop.id).await.unwrap();

    assert!(storage.get_project(&drop.id).await.unwrap().is_none());
    assert_eq!(storage.current_project().await.unwrap(), None);

    // Deleting a different project leaves the pointer alone.
    storage.set_current_project(Some(&keep.id)).await.unwrap();
    storage.delete_project("unrelated").await.unwrap();
    assert_eq!(storage.current_project().await.unwrap(), Some(keep.id.clone()));
}

#[tokio::test]
async fn rename_moves_entry_children_and_pointer() {
    let storage = LocalStorage::new(true).await.unwrap();
    let project = sample_project("Acme");
    let old_id = project.id.clone();
    storage.save_project(&project).await.unwrap();
    storage.set_current_project(Some(&old_id)).await.unwrap();

    let pointer = storage
        .rename_project_id(&old_id, "srv-1", Some(&old_id))
        .await
        .unwrap();
    assert_eq!(pointer.as_deref(), Some("srv-1"));

    assert!(storage.get_project(&old_id).await.unwrap().is_none());
    let moved = storage.get_project("srv-1").await.unwrap().unwrap();
    assert_eq!(moved.name, "Acme");
    assert_eq!(moved.tasks.len(), 1);
    assert_eq!(moved.tasks[0].subtasks.len(), 1);
    assert_eq!(moved.task_states.len(), 1);
    assert_eq!(storage.current_project().await.unwrap(), Some("srv-1".to_string()));
}

#[tokio::test]
async fn rename_leaves_unrelated_pointer_untouched() {
    let storage = LocalStorage::new(true).await.unwrap();
    let a = sample_project("A");
    let b = sample_project("B");
    storage.save_project(&a).await.unwrap();
    storage.save_project(&b).await.unwrap();
    storage.set_current_project(Some(&b.id)).await.unwrap();

    let pointer = storage
        .rename_project_id(&a.id, "srv-7", Some(&b.id))
        .await
        .unwrap();
    assert_eq!(pointer, Some(b.id.clone()));
    assert_eq!(storage.current_project().await.unwrap(), Some(b.id.clone()));
}

#[tokio::test]
async fn replace_all_swaps_collection_and_keeps_resolvable_pointer() {
    let storage = LocalStorage::new(true).await.unwrap();
    let old = sample_project("Old");
    storage.save_project(&old).await.unwrap();
    storage.set_current_project(Some(&old.id)).await.unwrap();

    let incoming = vec![sample_project("New A"), sample_project("New B")];
    let kept = incoming[0].id.clone();
    storage.replace_all_projects(&incoming, Some(&kept)).await.unwrap();

    let all = storage.get_all_projects().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(storage.get_project(&old.id).await.unwrap().is_none());
    assert_eq!(storage.current_project().await.unwrap(), Some(kept));
}

#[tokio::test]
async fn replace_all_clears_unresolvable_pointer() {
    let storage = LocalStorage::new(true).await.unwrap();
    let old = sample_project("Old");
    storage.save_project(&old).await.unwrap();
    storage.set_current_project(Some(&old.id)).await.unwrap();

    storage
        .replace_all_projects(&[sample_project("New")], Some(&old.id))
        .await
        .unwrap();
    assert_eq!(storage.current_project().await.unwrap(), None);
}

#[tokio::test]
async fn clear_all_data_empties_the_cache() {
    let storage = LocalStorage::new(true).await.unwrap();
    storage.save_project(&sample_project("Acme")).await.unwrap();
    assert!(storage.has_data().await.unwrap());

    storage.clear_all_data().await.unwrap();
    assert!(!storage.has_data().await.unwrap());
    assert_eq!(storage.current_project().await.unwrap(), None);
}

#[tokio::test]
async fn sync_flag_defaults_to_disabled_and_persists() {
    let storage = LocalStorage::new(true).await.unwrap();
    assert!(!storage.sync_enabled().await.unwrap());
    storage.set_sync_enabled(true).await.unwrap();
    assert!(storage.sync_enabled().await.unwrap());
    storage.set_sync_enabled(false).await.unwrap();
    assert!(!storage.sync_enabled().await.unwrap());
}
