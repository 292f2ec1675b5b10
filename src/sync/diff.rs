//! Task diff engine: pure create/update/delete set computation.
//!
//! Works on identifier sets only; it knows nothing about task content.
//! The orchestrator applies creates and updates before deletes so the
//! remote side never checks a dependency against an identifier that is
//! about to disappear.

use std::collections::HashSet;

/// The create/update/delete partition of a local vs. remote task-id pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskDiff {
    /// Locally present, remotely absent.
    pub to_create: Vec<String>,
    /// Present on both sides.
    pub to_update: Vec<String>,
    /// Remotely present, locally absent.
    pub to_delete: Vec<String>,
}

impl TaskDiff {
    /// Compute the partition. Output order is sorted for determinism; the
    /// sets themselves are order-agnostic.
    pub fn between(local: &HashSet<String>, remote: &HashSet<String>) -> Self {
        let mut to_create: Vec<String> = local.difference(remote).cloned().collect();
        let mut to_update: Vec<String> = local.intersection(remote).cloned().collect();
        let mut to_delete: Vec<String> = remote.difference(local).cloned().collect();
        to_create.sort();
        to_update.sort();
        to_delete.sort();
        Self {
            to_create,
            to_update,
            to_delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}
