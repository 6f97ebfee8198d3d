//! The Testing Hub engine: single-item and bulk operations over the three
//! collections.
//!
//! Every operation rebuilds whatever view it needs from store snapshots; the
//! engine holds no cached state. Bulk operations are strictly sequential,
//! process targets in view order, pace themselves with a [`RateLimiter`]
//! between items, and stop before the next item once cancelled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use testhub_core::{
    ArtifactId, Collection, EntityData, GenerationMethod, HubConfig, Origin, SourceKey,
    SourceType, SyncStatus, Template, TemplateFilter, TemplateStore, TestArtifact, TestStatus,
    WorkingCopy, WorkingCopyId, WorkingCopyPatch,
};
use testhub_generator::{EntitySchema, GenerationAdapter, GenerationRequest};

use crate::diff::{snapshot_diff, SnapshotDiff};
use crate::error::HubError;
use crate::fingerprint::snapshot_of;
use crate::progress::{BatchSummary, CancelToken, Progress, SyncOutcome};
use crate::rate_limit::{FixedDelay, NoDelay, RateLimiter};
use crate::versioning;
use crate::view::{build_view, Item, Stats};

/// Per-hub tunables that are not pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    pub records_per_entity: usize,
    pub history_limit: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from(&HubConfig::default())
    }
}

impl From<&HubConfig> for HubSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            records_per_entity: config.records_per_entity,
            history_limit: config.history_limit,
        }
    }
}

pub struct TestingHub {
    templates: Arc<dyn TemplateStore>,
    working_copies: Arc<dyn Collection<WorkingCopy>>,
    artifacts: Arc<dyn Collection<TestArtifact>>,
    adapter: Arc<dyn GenerationAdapter>,
    generate_pacing: Arc<dyn RateLimiter>,
    sync_pacing: Arc<dyn RateLimiter>,
    verify_pacing: Arc<dyn RateLimiter>,
    settings: HubSettings,
}

impl TestingHub {
    /// Build a hub with the default pacing (1 s between generations, 50 ms
    /// between synced templates, none between verifications).
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        working_copies: Arc<dyn Collection<WorkingCopy>>,
        artifacts: Arc<dyn Collection<TestArtifact>>,
        adapter: Arc<dyn GenerationAdapter>,
    ) -> Self {
        Self::with_config(
            templates,
            working_copies,
            artifacts,
            adapter,
            &HubConfig::default(),
        )
    }

    pub fn with_config(
        templates: Arc<dyn TemplateStore>,
        working_copies: Arc<dyn Collection<WorkingCopy>>,
        artifacts: Arc<dyn Collection<TestArtifact>>,
        adapter: Arc<dyn GenerationAdapter>,
        config: &HubConfig,
    ) -> Self {
        Self {
            templates,
            working_copies,
            artifacts,
            adapter,
            generate_pacing: Arc::new(FixedDelay(config.generate_delay())),
            sync_pacing: Arc::new(FixedDelay(config.sync_delay())),
            verify_pacing: Arc::new(NoDelay),
            settings: HubSettings::from(config),
        }
    }

    pub fn with_generate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.generate_pacing = limiter;
        self
    }

    pub fn with_sync_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.sync_pacing = limiter;
        self
    }

    pub fn with_settings(mut self, settings: HubSettings) -> Self {
        self.settings = settings;
        self
    }

    // -----------------------------------------------------------------------
    // 1. Read model
    // -----------------------------------------------------------------------

    /// Rebuild the testing view from the current contents of all three stores.
    pub async fn build_view(&self) -> Result<Vec<Item>, HubError> {
        let (working_copies, artifacts, templates) = tokio::try_join!(
            self.working_copies.list(),
            self.artifacts.list(),
            self.templates.list(),
        )?;
        Ok(build_view(&working_copies, &artifacts, &templates))
    }

    pub async fn stats(&self) -> Result<Stats, HubError> {
        Ok(Stats::from_items(&self.build_view().await?))
    }

    /// The view row for `key`, if a working copy for it exists.
    pub async fn item_for(&self, key: &SourceKey) -> Result<Item, HubError> {
        self.build_view()
            .await?
            .into_iter()
            .find(|item| item.key == *key)
            .ok_or_else(|| HubError::NotFound {
                what: "working copy for",
                id: key.to_string(),
            })
    }

    /// Latest artifact bound to `key`. Later records win over earlier ones.
    pub async fn test_artifact_for(
        &self,
        key: &SourceKey,
    ) -> Result<Option<TestArtifact>, HubError> {
        Ok(self.artifacts.find_by_key(key).await?.pop())
    }

    // -----------------------------------------------------------------------
    // 2. Single-item operations
    // -----------------------------------------------------------------------

    /// Generate test data for one item and persist it as a new artifact or a
    /// new version of the existing one.
    ///
    /// Adapter failures abort before any write.
    pub async fn generate_test_data(&self, item: &Item) -> Result<TestArtifact, HubError> {
        let entity_data = if item.entities.is_empty() {
            EntityData::new()
        } else {
            let schemas = self.entity_schemas(&item.entities).await?;
            let request = GenerationRequest::new(&item.name, schemas)
                .with_records_per_entity(self.settings.records_per_entity);
            self.adapter
                .generate(&request)
                .await
                .map_err(|source| HubError::Adapter {
                    item: item.name.clone(),
                    source,
                })?
        };
        self.write_generated(item, entity_data).await
    }

    async fn entity_schemas(&self, entities: &[String]) -> Result<Vec<EntitySchema>, HubError> {
        let mut schemas = Vec::with_capacity(entities.len());
        for name in entities {
            let criteria = TemplateFilter::of_type(SourceType::Entity).named(name.as_str());
            let schema = self
                .templates
                .filter(&criteria)
                .await?
                .into_iter()
                .find_map(|t| t.schema)
                .unwrap_or_default();
            schemas.push(EntitySchema::new(name.as_str(), schema));
        }
        Ok(schemas)
    }

    async fn write_generated(
        &self,
        item: &Item,
        entity_data: EntityData,
    ) -> Result<TestArtifact, HubError> {
        let now = Utc::now();
        let wc = Some(item.working_copy_id.clone());
        match self.test_artifact_for(&item.key).await? {
            Some(current) => {
                let patch = versioning::regenerate(
                    &current,
                    &item.name,
                    entity_data,
                    GenerationMethod::AiGenerated,
                    wc,
                    self.settings.history_limit,
                    now,
                );
                let updated = self.artifacts.update(&current.id, patch).await?;
                info!(key = %item.key, version = updated.version, "regenerated test data");
                Ok(updated)
            }
            None => {
                let artifact = versioning::new_artifact(
                    &item.key,
                    &item.name,
                    entity_data,
                    GenerationMethod::AiGenerated,
                    wc,
                    now,
                );
                let created = self.artifacts.create(artifact).await?;
                info!(key = %item.key, id = %created.id, "created test data");
                Ok(created)
            }
        }
    }

    /// Mark an item's artifact verified. The version does not change.
    pub async fn verify_single(&self, item: &Item) -> Result<TestArtifact, HubError> {
        let id = match (&item.test_artifact_id, item.has_test_data) {
            (Some(id), true) => id,
            _ => {
                return Err(HubError::validation(format!(
                    "'{}' has no test data to verify",
                    item.name
                )))
            }
        };
        let verified = self
            .artifacts
            .update(id, versioning::set_status(TestStatus::Verified))
            .await?;
        debug!(key = %item.key, version = verified.version, "verified test data");
        Ok(verified)
    }

    /// Restore `target_version` of an artifact as a new, forward version.
    pub async fn rollback(
        &self,
        artifact_id: &ArtifactId,
        target_version: u32,
    ) -> Result<TestArtifact, HubError> {
        let current = self
            .artifacts
            .get(artifact_id)
            .await?
            .ok_or_else(|| HubError::NotFound {
                what: "test artifact",
                id: artifact_id.to_string(),
            })?;
        let patch =
            versioning::rollback(&current, target_version, self.settings.history_limit, Utc::now())?;
        let restored = self.artifacts.update(artifact_id, patch).await?;
        info!(
            id = %artifact_id,
            from = target_version,
            version = restored.version,
            "rolled back test data"
        );
        Ok(restored)
    }

    /// Flag the artifact bound to `key` as stale after an external schema
    /// change. The version does not change.
    pub async fn mark_stale(&self, key: &SourceKey) -> Result<TestArtifact, HubError> {
        let current = self
            .test_artifact_for(key)
            .await?
            .ok_or_else(|| HubError::NotFound {
                what: "test artifact for",
                id: key.to_string(),
            })?;
        let stale = self
            .artifacts
            .update(&current.id, versioning::set_status(TestStatus::Stale))
            .await?;
        info!(%key, "marked test data stale");
        Ok(stale)
    }

    pub async fn delete_test_artifact(&self, id: &ArtifactId) -> Result<(), HubError> {
        self.artifacts.delete(id).await?;
        info!(%id, "deleted test data");
        Ok(())
    }

    /// Remove one working copy. Its test artifact is untouched.
    pub async fn delete_working_copy(&self, id: &WorkingCopyId) -> Result<(), HubError> {
        self.working_copies.delete(id).await?;
        debug!(%id, "deleted working copy");
        Ok(())
    }

    /// Diff a working copy's snapshot against its live template.
    pub async fn diff_working_copy(&self, id: &WorkingCopyId) -> Result<SnapshotDiff, HubError> {
        let copy = self
            .working_copies
            .get(id)
            .await?
            .ok_or_else(|| HubError::NotFound {
                what: "working copy",
                id: id.to_string(),
            })?;
        let template = self
            .templates
            .get(&copy.source_id)
            .await?
            .filter(|t| t.template_type == copy.source_type);
        Ok(snapshot_diff(&copy, template.as_ref()))
    }

    // -----------------------------------------------------------------------
    // 3. Bulk operations
    // -----------------------------------------------------------------------

    /// Generate test data for every item that has none.
    ///
    /// Per-item failures are counted, logged and skipped. Only failing to
    /// read the view itself is an error. Working copies sharing a key are
    /// generated once, for the first in view order.
    pub async fn bulk_generate(
        &self,
        cancel: &CancelToken,
        mut progress: impl FnMut(Progress) + Send,
    ) -> Result<BatchSummary, HubError> {
        let mut seen = HashSet::new();
        let targets: Vec<Item> = self
            .build_view()
            .await?
            .into_iter()
            .filter(|item| !item.has_test_data)
            .filter(|item| seen.insert(item.key.clone()))
            .collect();
        let total = targets.len();
        info!(total, "bulk generate started");

        let mut summary = BatchSummary::default();
        for (index, item) in targets.iter().enumerate() {
            if !self.wait_turn(index, self.generate_pacing.as_ref(), cancel).await {
                summary.cancelled = true;
                break;
            }
            let message = match self.generate_test_data(item).await {
                Ok(artifact) => {
                    summary.succeeded += 1;
                    format!("{}: {} records", item.name, artifact.record_count())
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(key = %item.key, error = %err, "generation failed");
                    format!("{}: failed ({err})", item.name)
                }
            };
            progress(Progress::new(index + 1, total, message));
        }

        info!(%summary, "bulk generate finished");
        Ok(summary)
    }

    /// Verify every item that has test data and is not verified yet.
    pub async fn bulk_verify(
        &self,
        cancel: &CancelToken,
        progress: impl FnMut(Progress) + Send,
    ) -> Result<BatchSummary, HubError> {
        let mut seen = HashSet::new();
        let ids: Vec<ArtifactId> = self
            .build_view()
            .await?
            .into_iter()
            .filter(|item| item.has_test_data && !item.is_verified())
            .filter_map(|item| item.test_artifact_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Ok(self.verify_batch(&ids, cancel, progress).await)
    }

    /// Mark each artifact id verified, isolating failures per id.
    pub async fn verify_batch(
        &self,
        ids: &[ArtifactId],
        cancel: &CancelToken,
        mut progress: impl FnMut(Progress) + Send,
    ) -> BatchSummary {
        let total = ids.len();
        let mut summary = BatchSummary::default();
        for (index, id) in ids.iter().enumerate() {
            if !self.wait_turn(index, self.verify_pacing.as_ref(), cancel).await {
                summary.cancelled = true;
                break;
            }
            let result = self
                .artifacts
                .update(id, versioning::set_status(TestStatus::Verified))
                .await;
            let message = match result {
                Ok(artifact) => {
                    summary.succeeded += 1;
                    format!("{}: verified", artifact.source_name)
                }
                Err(err) => {
                    summary.failed += 1;
                    let err = HubError::from(err);
                    warn!(%id, error = %err, "verification failed");
                    format!("{id}: failed ({err})")
                }
            };
            progress(Progress::new(index + 1, total, message));
        }
        info!(%summary, "bulk verify finished");
        summary
    }

    /// Delete every working copy. Test artifacts are never touched.
    ///
    /// Failed deletions are counted and skipped; `cancelled` is set when the
    /// token fires before every copy was visited.
    pub async fn clear_all_working_copies(
        &self,
        confirmed: bool,
        cancel: &CancelToken,
        mut progress: impl FnMut(Progress) + Send,
    ) -> Result<BatchSummary, HubError> {
        if !confirmed {
            return Err(HubError::validation(
                "clearing all working copies requires confirmation",
            ));
        }
        let copies = self.working_copies.list().await?;
        let total = copies.len();
        let mut summary = BatchSummary::default();
        for (index, copy) in copies.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(visited = index, total, "clear cancelled");
                summary.cancelled = true;
                break;
            }
            let message = match self.working_copies.delete(&copy.id).await {
                Ok(()) => {
                    summary.succeeded += 1;
                    format!("{}: deleted", copy.source_name)
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(id = %copy.id, error = %err, "failed to delete working copy");
                    format!("{}: failed ({err})", copy.source_name)
                }
            };
            progress(Progress::new(index + 1, total, message));
        }
        info!(%summary, total, "cleared working copies");
        Ok(summary)
    }

    /// Create or refresh a working copy for every library template of
    /// `source_type`. Working copies whose template is gone are left alone.
    pub async fn sync_from_library(
        &self,
        source_type: SourceType,
        cancel: &CancelToken,
        mut progress: impl FnMut(Progress) + Send,
    ) -> Result<SyncOutcome, HubError> {
        let templates = self
            .templates
            .filter(&TemplateFilter::of_type(source_type))
            .await?;
        let mut existing: HashMap<SourceKey, WorkingCopyId> = self
            .working_copies
            .list()
            .await?
            .into_iter()
            .map(|wc| (wc.key(), wc.id))
            .collect();

        let total = templates.len();
        info!(%source_type, total, "library sync started");
        let mut outcome = SyncOutcome::default();
        for (index, template) in templates.iter().enumerate() {
            if !self.wait_turn(index, self.sync_pacing.as_ref(), cancel).await {
                outcome.cancelled = true;
                break;
            }
            let key = template.key();
            let current = existing.get(&key).cloned();
            let message = match self.sync_one(template, current.as_ref()).await {
                Ok((copy, created)) => {
                    if created {
                        outcome.created += 1;
                        existing.insert(key, copy.id);
                        format!("{}: created", template.name)
                    } else {
                        outcome.updated += 1;
                        format!("{}: updated", template.name)
                    }
                }
                Err(err) => {
                    outcome.failed += 1;
                    warn!(%key, error = %err, "library sync failed");
                    format!("{}: failed ({err})", template.name)
                }
            };
            progress(Progress::new(index + 1, total, message));
        }

        info!(%source_type, %outcome, "library sync finished");
        Ok(outcome)
    }

    async fn sync_one(
        &self,
        template: &Template,
        existing: Option<&WorkingCopyId>,
    ) -> Result<(WorkingCopy, bool), HubError> {
        let now = Utc::now();
        if let Some(id) = existing {
            let patch = WorkingCopyPatch {
                source_name: Some(template.name.clone()),
                working_data: Some(snapshot_of(template)),
                sync_status: Some(SyncStatus::Synced),
                last_sync_date: Some(now),
            };
            let updated = self.working_copies.update(id, patch).await?;
            debug!(key = %updated.key(), "refreshed working copy");
            return Ok((updated, false));
        }

        let copy = WorkingCopy {
            id: WorkingCopyId::generate(),
            source_type: template.template_type,
            source_id: template.id.clone(),
            source_name: template.name.clone(),
            working_data: snapshot_of(template),
            sync_status: SyncStatus::Synced,
            last_sync_date: Some(now),
            origin: Origin::Library,
            created_at: now,
            updated_at: now,
        };
        let created = self.working_copies.create(copy).await?;
        debug!(key = %created.key(), "created working copy");
        Ok((created, true))
    }

    /// Pace before every item but the first. Returns `false` once cancelled.
    async fn wait_turn(
        &self,
        index: usize,
        limiter: &dyn RateLimiter,
        cancel: &CancelToken,
    ) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if index == 0 {
            return true;
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = limiter.pace() => !cancel.is_cancelled(),
        }
    }
}
