//! Test-artifact versioning: new artifacts, regeneration, rollback, stale.
//!
//! All functions are pure. They read the current record and return the patch
//! to write back; the engine performs the read-modify-write.
//!
//! Every content change archives the current `(version, entity_data)` into
//! `previous_versions` (oldest evicted first past the history limit) and
//! bumps `version` by exactly one. Rollback is a content change too, so the
//! version keeps moving forward.

use chrono::{DateTime, Utc};

use testhub_core::{
    ArtifactId, EntityData, GenerationMethod, SourceKey, TestArtifact, TestArtifactPatch,
    TestStatus, VersionSnapshot, WorkingCopyId,
};

use crate::error::HubError;

/// First version of a freshly generated artifact.
pub fn new_artifact(
    key: &SourceKey,
    source_name: &str,
    entity_data: EntityData,
    method: GenerationMethod,
    working_copy_id: Option<WorkingCopyId>,
    now: DateTime<Utc>,
) -> TestArtifact {
    TestArtifact {
        id: ArtifactId::generate(),
        source_type: key.source_type,
        source_id: key.source_id.clone(),
        source_name: source_name.to_string(),
        entity_data,
        test_status: TestStatus::Pending,
        version: 1,
        previous_versions: Vec::new(),
        generation_method: method,
        working_copy_id,
        created_at: now,
        updated_at: now,
    }
}

/// Replace an artifact's content with newly generated data.
///
/// Resets `verified` (or `stale`) back to `pending`.
pub fn regenerate(
    current: &TestArtifact,
    source_name: &str,
    entity_data: EntityData,
    method: GenerationMethod,
    working_copy_id: Option<WorkingCopyId>,
    history_limit: usize,
    now: DateTime<Utc>,
) -> TestArtifactPatch {
    TestArtifactPatch {
        source_name: Some(source_name.to_string()),
        entity_data: Some(entity_data),
        test_status: Some(TestStatus::Pending),
        version: Some(current.version + 1),
        previous_versions: Some(archive_current(current, history_limit, now)),
        generation_method: Some(method),
        working_copy_id,
    }
}

/// Restore the content recorded for `target_version`.
///
/// Fails with [`HubError::Validation`] if that version is not in the
/// retained history.
pub fn rollback(
    current: &TestArtifact,
    target_version: u32,
    history_limit: usize,
    now: DateTime<Utc>,
) -> Result<TestArtifactPatch, HubError> {
    let restored = current
        .previous_versions
        .iter()
        .find(|v| v.version == target_version)
        .map(|v| v.entity_data.clone())
        .ok_or_else(|| {
            HubError::validation(format!(
                "version {target_version} of artifact '{}' is not in its history (current is {})",
                current.id, current.version
            ))
        })?;

    Ok(TestArtifactPatch {
        entity_data: Some(restored),
        test_status: Some(TestStatus::Pending),
        version: Some(current.version + 1),
        previous_versions: Some(archive_current(current, history_limit, now)),
        ..TestArtifactPatch::default()
    })
}

/// Status-only patch. Never touches `version`.
pub fn set_status(status: TestStatus) -> TestArtifactPatch {
    TestArtifactPatch {
        test_status: Some(status),
        ..TestArtifactPatch::default()
    }
}

fn archive_current(
    current: &TestArtifact,
    history_limit: usize,
    now: DateTime<Utc>,
) -> Vec<VersionSnapshot> {
    let mut history = current.previous_versions.clone();
    history.push(VersionSnapshot {
        version: current.version,
        entity_data: current.entity_data.clone(),
        timestamp: now,
    });
    // The entry just archived always survives.
    let history_limit = history_limit.max(1);
    if history.len() > history_limit {
        let excess = history.len() - history_limit;
        history.drain(..excess);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use testhub_core::{Record, SourceType};

    fn data(tag: &str, n: usize) -> EntityData {
        let mut d = EntityData::new();
        d.insert("Invoice".into(), vec![json!({ "tag": tag }); n]);
        d
    }

    fn fresh() -> TestArtifact {
        new_artifact(
            &SourceKey::new(SourceType::Page, "T1"),
            "Invoices",
            data("v1", 3),
            GenerationMethod::AiGenerated,
            None,
            Utc::now(),
        )
    }

    fn apply(mut artifact: TestArtifact, patch: TestArtifactPatch) -> TestArtifact {
        artifact.apply(patch, Utc::now());
        artifact
    }

    #[test]
    fn new_artifact_starts_at_v1_pending() {
        let a = fresh();
        assert_eq!(a.version, 1);
        assert_eq!(a.test_status, TestStatus::Pending);
        assert!(a.previous_versions.is_empty());
        assert_eq!(a.record_count(), 3);
    }

    #[test]
    fn regenerate_bumps_version_and_archives_prior() {
        let v1 = fresh();
        let patch = regenerate(
            &v1,
            "Invoices",
            data("v2", 2),
            GenerationMethod::AiGenerated,
            None,
            10,
            Utc::now(),
        );
        let v2 = apply(v1.clone(), patch);
        assert_eq!(v2.version, 2);
        assert_eq!(v2.previous_versions.len(), 1);
        assert_eq!(v2.previous_versions[0].version, 1);
        assert_eq!(v2.previous_versions[0].entity_data, v1.entity_data);
        assert_eq!(v2.record_count(), 2);
    }

    #[test]
    fn regenerate_resets_verified_to_pending() {
        let mut v1 = fresh();
        v1.test_status = TestStatus::Verified;
        let patch = regenerate(
            &v1,
            "Invoices",
            data("v2", 3),
            GenerationMethod::AiGenerated,
            None,
            10,
            Utc::now(),
        );
        assert_eq!(apply(v1, patch).test_status, TestStatus::Pending);
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut a = fresh();
        for i in 2..=5 {
            let patch = regenerate(
                &a,
                "Invoices",
                data(&format!("v{i}"), 1),
                GenerationMethod::AiGenerated,
                None,
                2,
                Utc::now(),
            );
            a = apply(a, patch);
        }
        assert_eq!(a.version, 5);
        let kept: Vec<u32> = a.previous_versions.iter().map(|v| v.version).collect();
        assert_eq!(kept, vec![3, 4]);
    }

    #[test]
    fn zero_history_limit_still_keeps_the_prior_version() {
        let v1 = fresh();
        let patch = regenerate(
            &v1,
            "Invoices",
            data("v2", 1),
            GenerationMethod::AiGenerated,
            None,
            0,
            Utc::now(),
        );
        let v2 = apply(v1.clone(), patch);
        assert_eq!(v2.version, 2);
        assert_eq!(v2.previous_versions.len(), 1);
        assert_eq!(v2.previous_versions[0].entity_data, v1.entity_data);
        assert!(rollback(&v2, 1, 0, Utc::now()).is_ok());
    }

    #[test]
    fn rollback_restores_data_and_moves_forward() {
        let v1 = fresh();
        let v2 = apply(
            v1.clone(),
            regenerate(
                &v1,
                "Invoices",
                data("v2", 1),
                GenerationMethod::AiGenerated,
                None,
                10,
                Utc::now(),
            ),
        );
        let patch = rollback(&v2, 1, 10, Utc::now()).expect("rollback");
        let v3 = apply(v2.clone(), patch);
        assert_eq!(v3.version, 3);
        assert_eq!(v3.entity_data, v1.entity_data);
        let versions: Vec<u32> = v3.previous_versions.iter().map(|v| v.version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(v3.previous_versions[1].entity_data, v2.entity_data);
    }

    #[test]
    fn rollback_to_unknown_version_is_validation_error() {
        let err = rollback(&fresh(), 7, 10, Utc::now()).unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
        assert!(err.to_string().contains("version 7"));
    }

    #[test]
    fn set_status_leaves_version_alone() {
        let v1 = fresh();
        let verified = apply(v1, set_status(TestStatus::Verified));
        assert_eq!(verified.version, 1);
        assert_eq!(verified.test_status, TestStatus::Verified);
    }
}
