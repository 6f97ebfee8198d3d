//! Working-copy sync status derivation.
//!
//! Signal precedence:
//! 1. `Orphaned` (no template resolves for the working copy's key)
//! 2. `Outdated` (template fingerprint differs from the snapshot's)
//! 3. the stored status (normally `Synced`)
//!
//! Derivation is read-only. The stored `sync_status` only moves back to
//! `Synced` through an explicit library sync.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use testhub_core::{SourceKey, SyncStatus, Template, WorkingCopy};

use crate::fingerprint::fingerprint;

/// Classify `copy` against the template it points at, if one still exists.
pub fn derive(copy: &WorkingCopy, template: Option<&Template>) -> SyncStatus {
    let Some(template) = template else {
        return SyncStatus::Orphaned;
    };
    // Ad-hoc copies carry no fingerprint and are never reported outdated.
    if let Some(synced) = copy.working_data.fingerprint.as_deref() {
        if synced != fingerprint(template) {
            return SyncStatus::Outdated;
        }
    }
    match copy.sync_status {
        // The template exists again (re-created with the same id).
        SyncStatus::Orphaned => SyncStatus::Outdated,
        other => other,
    }
}

/// Index templates by stable key for repeated lookups.
pub fn index_templates(templates: &[Template]) -> HashMap<SourceKey, &Template> {
    templates.iter().map(|t| (t.key(), t)).collect()
}

/// Format age from a chrono timestamp (`last_sync_date`).
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let age = now.signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
