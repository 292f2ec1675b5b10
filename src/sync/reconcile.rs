//! Identity reconciliation.
//!
//! A project created offline carries a client-generated identifier the
//! remote store has never seen; the store may also assign a fresh
//! identifier on first create. When a remote lookup comes back NotFound
//! for a locally-known id, the two sides are correlated on display name
//! plus creation-time proximity.
//!
//! The heuristic is not guaranteed unique: two projects with the same
//! name created inside the tolerance window are indistinguishable. We
//! refuse to guess in that case — the ambiguity is logged and handled as
//! no-match, which routes the project through `create`.

use chrono::Duration;
use log::warn;

use crate::constants::RECONCILE_WINDOW_SECS;
use crate::models::Project;
use crate::storage::LocalStorage;

/// Outcome of a candidate search against the remote project list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Exactly one remote project matched; its identifier.
    Unique(String),
    /// No remote candidate inside the window.
    NoMatch,
    /// Several candidates matched; carries the candidate count.
    Ambiguous(usize),
}

/// Correlate a local project against the full remote list by name and
/// creation-time proximity.
pub fn find_remote_match(local: &Project, remote: &[Project]) -> MatchOutcome {
    let window = Duration::seconds(RECONCILE_WINDOW_SECS);
    let candidates: Vec<&Project> = remote
        .iter()
        .filter(|r| r.name == local.name)
        .filter(|r| {
            let delta = r.created_at.signed_duration_since(local.created_at);
            delta.abs() <= window
        })
        .collect();

    match candidates.as_slice() {
        [] => MatchOutcome::NoMatch,
        [single] => MatchOutcome::Unique(single.id.clone()),
        many => MatchOutcome::Ambiguous(many.len()),
    }
}

/// Apply an identifier rewrite: re-key the cache entry and thread the
/// current-project pointer through, returning its new value.
///
/// Logs the rewrite; the storage call is atomic, so no reader ever sees
/// the pointer referencing the removed key.
pub async fn rewrite_identity(
    storage: &LocalStorage,
    old_id: &str,
    new_id: &str,
    pointer: Option<&str>,
) -> anyhow::Result<Option<String>> {
    if old_id == new_id {
        return Ok(pointer.map(str::to_string));
    }
    log::info!("Project {old_id} is known remotely as {new_id}, re-keying local entry");
    storage.rename_project_id(old_id, new_id, pointer).await
}

/// Resolve a match outcome to the remote identifier to adopt, logging the
/// ambiguous case. `None` means "treat as not present remotely".
pub fn resolve_outcome(local: &Project, outcome: &MatchOutcome) -> Option<String> {
    match outcome {
        MatchOutcome::Unique(id) => Some(id.clone()),
        MatchOutcome::NoMatch => None,
        MatchOutcome::Ambiguous(count) => {
            warn!(
                "Ambiguous identity match for project '{}' ({}): {count} remote candidates share \
                 its name inside the tolerance window; treating as not present remotely",
                local.name, local.id
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn project(id: &str, name: &str, created_secs: i64) -> Project {
        let mut p = Project::new(name);
        p.id = id.to_string();
        p.created_at = Utc.timestamp_opt(created_secs, 0).unwrap();
        p
    }

    #[test]
    fn matches_same_name_inside_window() {
        let local = project("loc-1", "Acme", 1_000);
        let remote = vec![project("srv-1", "Acme", 1_000 + RECONCILE_WINDOW_SECS)];
        assert_eq!(find_remote_match(&local, &remote), MatchOutcome::Unique("srv-1".into()));
    }

    #[test]
    fn rejects_same_name_outside_window() {
        let local = project("loc-1", "Acme", 1_000);
        let remote = vec![project("srv-1", "Acme", 1_000 + RECONCILE_WINDOW_SECS + 1)];
        assert_eq!(find_remote_match(&local, &remote), MatchOutcome::NoMatch);
    }

    #[test]
    fn rejects_different_name_inside_window() {
        let local = project("loc-1", "Acme", 1_000);
        let remote = vec![project("srv-1", "Acme Launch", 1_000)];
        assert_eq!(find_remote_match(&local, &remote), MatchOutcome::NoMatch);
    }

    #[test]
    fn window_is_symmetric() {
        let local = project("loc-1", "Acme", 1_000);
        let remote = vec![project("srv-1", "Acme", 1_000 - RECONCILE_WINDOW_SECS)];
        assert_eq!(find_remote_match(&local, &remote), MatchOutcome::Unique("srv-1".into()));
    }

    #[test]
    fn several_candidates_are_ambiguous() {
        let local = project("loc-1", "Acme", 1_000);
        let remote = vec![
            project("srv-1", "Acme", 990),
            project("srv-2", "Acme", 1_010),
        ];
        let outcome = find_remote_match(&local, &remote);
        assert_eq!(outcome, MatchOutcome::Ambiguous(2));
        assert_eq!(resolve_outcome(&local, &outcome), None);
    }
}
