//! Read model: working copies joined to their test artifacts and templates.
//!
//! [`build_view`] is a pure function over store snapshots. Nothing here is
//! cached; callers rebuild the view (and [`Stats`]) on every read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use testhub_core::{
    ArtifactId, SourceKey, SyncStatus, Template, TestArtifact, TestStatus, WorkingCopy,
    WorkingCopyId,
};

use crate::status::{derive, index_templates};

/// One row of the testing view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub working_copy_id: WorkingCopyId,
    pub key: SourceKey,
    pub name: String,
    pub entities: Vec<String>,
    pub sync_status: SyncStatus,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub has_test_data: bool,
    pub test_artifact_id: Option<ArtifactId>,
    pub test_status: Option<TestStatus>,
    pub version: Option<u32>,
    pub record_count: usize,
    pub can_rollback: bool,
}

impl Item {
    pub fn is_verified(&self) -> bool {
        self.test_status == Some(TestStatus::Verified)
    }
}

/// Join working copies to artifacts by [`SourceKey`] and to templates for
/// status and entity fallback.
///
/// Only page and feature working copies are included. Output order follows
/// `working_copies`.
pub fn build_view(
    working_copies: &[WorkingCopy],
    artifacts: &[TestArtifact],
    templates: &[Template],
) -> Vec<Item> {
    let templates = index_templates(templates);
    // Later records win if a key was ever duplicated.
    let artifacts: HashMap<SourceKey, &TestArtifact> =
        artifacts.iter().map(|a| (a.key(), a)).collect();

    working_copies
        .iter()
        .filter(|wc| wc.source_type.is_testable())
        .map(|wc| {
            let key = wc.key();
            let template = templates.get(&key).copied();
            let entities = wc
                .working_data
                .entities_used
                .clone()
                .or_else(|| template.map(|t| t.entities_used.clone()))
                .unwrap_or_default();
            let artifact = artifacts.get(&key).copied();

            Item {
                working_copy_id: wc.id.clone(),
                name: wc.source_name.clone(),
                entities,
                sync_status: derive(wc, template),
                last_sync_date: wc.last_sync_date,
                has_test_data: artifact.is_some(),
                test_artifact_id: artifact.map(|a| a.id.clone()),
                test_status: artifact.map(|a| a.test_status),
                version: artifact.map(|a| a.version),
                record_count: artifact.map_or(0, TestArtifact::record_count),
                can_rollback: artifact.is_some_and(TestArtifact::can_rollback),
                key,
            }
        })
        .collect()
}

/// Aggregate counts over a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub with_test_data: usize,
    pub without_test_data: usize,
    pub verified: usize,
    pub pending: usize,
    pub stale: usize,
    pub orphaned: usize,
}

impl Stats {
    pub fn from_items(items: &[Item]) -> Self {
        let count_status =
            |status: TestStatus| items.iter().filter(|i| i.test_status == Some(status)).count();
        let with_test_data = items.iter().filter(|i| i.has_test_data).count();
        Self {
            total: items.len(),
            with_test_data,
            without_test_data: items.len() - with_test_data,
            verified: count_status(TestStatus::Verified),
            pending: count_status(TestStatus::Pending),
            stale: count_status(TestStatus::Stale),
            orphaned: items
                .iter()
                .filter(|i| i.sync_status == SyncStatus::Orphaned)
                .count(),
        }
    }
}
