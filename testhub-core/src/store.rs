//! Store seams consumed by the reconciliation engine.
//!
//! The backing entity API is a remote collaborator; the engine only ever
//! speaks to it through these traits. [`Collection`] is the generic CRUD
//! surface shared by working copies and test artifacts, [`TemplateStore`] is
//! the read-only view of the template library.
//!
//! Two backends ship with the crate: [`crate::memory::MemoryCollection`] and
//! [`crate::fs_store::FileCollection`].

use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;
use crate::types::{
    ArtifactId, SourceKey, SourceType, Template, TemplateId, TemplatePatch, TestArtifact,
    TestArtifactPatch, WorkingCopy, WorkingCopyId, WorkingCopyPatch,
};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A record type that can live in a [`Collection`].
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static;
    type Patch: Send + 'static;

    /// Collection name, used in error messages and as the on-disk file stem.
    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;
    fn key(&self) -> SourceKey;

    /// Apply a partial update in place and stamp `updated_at`.
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

impl Record for Template {
    type Id = TemplateId;
    type Patch = TemplatePatch;
    const COLLECTION: &'static str = "templates";

    fn id(&self) -> &TemplateId {
        &self.id
    }

    fn key(&self) -> SourceKey {
        Template::key(self)
    }

    fn apply(&mut self, patch: TemplatePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(entities) = patch.entities_used {
            self.entities_used = entities;
        }
        if let Some(schema) = patch.schema {
            self.schema = schema;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        self.updated_at = now;
    }
}

impl Record for WorkingCopy {
    type Id = WorkingCopyId;
    type Patch = WorkingCopyPatch;
    const COLLECTION: &'static str = "working_copies";

    fn id(&self) -> &WorkingCopyId {
        &self.id
    }

    fn key(&self) -> SourceKey {
        WorkingCopy::key(self)
    }

    fn apply(&mut self, patch: WorkingCopyPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.source_name {
            self.source_name = name;
        }
        if let Some(data) = patch.working_data {
            self.working_data = data;
        }
        if let Some(status) = patch.sync_status {
            self.sync_status = status;
        }
        if let Some(date) = patch.last_sync_date {
            self.last_sync_date = Some(date);
        }
        self.updated_at = now;
    }
}

impl Record for TestArtifact {
    type Id = ArtifactId;
    type Patch = TestArtifactPatch;
    const COLLECTION: &'static str = "test_artifacts";

    fn id(&self) -> &ArtifactId {
        &self.id
    }

    fn key(&self) -> SourceKey {
        TestArtifact::key(self)
    }

    fn apply(&mut self, patch: TestArtifactPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.source_name {
            self.source_name = name;
        }
        if let Some(data) = patch.entity_data {
            self.entity_data = data;
        }
        if let Some(status) = patch.test_status {
            self.test_status = status;
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(history) = patch.previous_versions {
            self.previous_versions = history;
        }
        if let Some(method) = patch.generation_method {
            self.generation_method = method;
        }
        if let Some(wc) = patch.working_copy_id {
            self.working_copy_id = Some(wc);
        }
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Generic CRUD over one remote collection.
///
/// Listing order is creation order. There is no query language beyond exact
/// matching on the [`SourceKey`].
#[async_trait]
pub trait Collection<R: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, StoreError>;

    async fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError>;

    /// Insert a new record. Fails with [`StoreError::Conflict`] on a duplicate id.
    async fn create(&self, record: R) -> Result<R, StoreError>;

    /// Apply a partial update. Fails with [`StoreError::NotFound`] if the id
    /// no longer resolves.
    async fn update(&self, id: &R::Id, patch: R::Patch) -> Result<R, StoreError>;

    /// Remove a record. Fails with [`StoreError::NotFound`] if absent.
    async fn delete(&self, id: &R::Id) -> Result<(), StoreError>;

    /// Exact-match filter on the stable key.
    async fn find_by_key(&self, key: &SourceKey) -> Result<Vec<R>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.key() == *key)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Template library
// ---------------------------------------------------------------------------

/// Exact-field criteria for [`TemplateStore::filter`]. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFilter {
    pub template_type: Option<SourceType>,
    pub name: Option<String>,
}

impl TemplateFilter {
    pub fn of_type(template_type: SourceType) -> Self {
        Self {
            template_type: Some(template_type),
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn matches(&self, template: &Template) -> bool {
        self.template_type
            .map_or(true, |t| t == template.template_type)
            && self.name.as_deref().map_or(true, |n| n == template.name)
    }
}

/// Read-only access to the template library.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Template>, StoreError>;
    async fn filter(&self, criteria: &TemplateFilter) -> Result<Vec<Template>, StoreError>;
    async fn get(&self, id: &TemplateId) -> Result<Option<Template>, StoreError>;
}

#[async_trait]
impl<C> TemplateStore for C
where
    C: Collection<Template>,
{
    async fn list(&self) -> Result<Vec<Template>, StoreError> {
        <C as Collection<Template>>::list(self).await
    }

    async fn filter(&self, criteria: &TemplateFilter) -> Result<Vec<Template>, StoreError> {
        Ok(<C as Collection<Template>>::list(self)
            .await?
            .into_iter()
            .filter(|t| criteria.matches(t))
            .collect())
    }

    async fn get(&self, id: &TemplateId) -> Result<Option<Template>, StoreError> {
        <C as Collection<Template>>::get(self, id).await
    }
}
