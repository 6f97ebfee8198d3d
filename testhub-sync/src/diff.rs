//! Unified diff between a working copy's snapshot and its live template.

use serde_json::{json, Value};
use similar::TextDiff;

use testhub_core::{SourceKey, SyncStatus, Template, WorkingCopy, WorkingCopyId, WorkingSnapshot};

use crate::fingerprint::snapshot_of;
use crate::status::derive;

/// What a library sync would change on one working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub working_copy_id: WorkingCopyId,
    pub key: SourceKey,
    pub sync_status: SyncStatus,
    /// Empty when the snapshot matches the template.
    pub unified_diff: String,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Compare `copy` against `template`. A missing template diffs against an
/// empty document.
pub fn snapshot_diff(copy: &WorkingCopy, template: Option<&Template>) -> SnapshotDiff {
    let current = render(&copy.working_data);
    let incoming = template
        .map(|t| render(&snapshot_of(t)))
        .unwrap_or_default();

    let unified_diff = if current == incoming {
        String::new()
    } else {
        TextDiff::from_lines(&current, &incoming)
            .unified_diff()
            .header("a/snapshot", "b/template")
            .context_radius(3)
            .to_string()
    };

    SnapshotDiff {
        working_copy_id: copy.id.clone(),
        key: copy.key(),
        sync_status: derive(copy, template),
        unified_diff,
    }
}

// Fingerprints are left out so the diff only shows user-visible fields.
fn render(snapshot: &WorkingSnapshot) -> String {
    let doc: Value = json!({
        "name": snapshot.name,
        "entities_used": snapshot.entities_used,
        "description": snapshot.description,
        "content": snapshot.content,
    });
    format!("{doc:#}\n")
}
