//! Template fingerprints: SHA-256 over the content a working copy mirrors.
//!
//! A working copy stores the fingerprint of the template it was synced from.
//! Comparing it with the live template's fingerprint is how `outdated` is
//! detected without diffing full snapshots on every read.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use testhub_core::{Template, WorkingSnapshot};

/// Hex SHA-256 of the template's mirrored fields.
///
/// `id`, `type` and `updated_at` are excluded: touching a template without
/// changing its content must not mark working copies outdated.
pub fn fingerprint(template: &Template) -> String {
    let canonical = mirrored_fields(template);
    let mut h = Sha256::new();
    h.update(canonical.to_string().as_bytes());
    hex::encode(h.finalize())
}

/// Build the denormalized snapshot stored on a working copy.
pub fn snapshot_of(template: &Template) -> WorkingSnapshot {
    WorkingSnapshot {
        name: template.name.clone(),
        entities_used: Some(template.entities_used.clone()),
        description: template.description.clone(),
        content: template.content.clone(),
        fingerprint: Some(fingerprint(template)),
    }
}

fn mirrored_fields(template: &Template) -> Value {
    json!({
        "name": template.name,
        "entities_used": template.entities_used,
        "schema": template.schema,
        "description": template.description,
        "content": template.content,
    })
}
