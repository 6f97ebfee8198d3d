//! In-process [`Collection`] backend.
//!
//! Backs tests and embedders that keep the three collections in memory.
//! Records are kept in creation order so that listing is deterministic.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{Collection, Record};

/// A [`Collection`] held in a `Vec` behind an async lock.
#[derive(Debug)]
pub struct MemoryCollection<R: Record> {
    records: RwLock<Vec<R>>,
}

impl<R: Record> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> MemoryCollection<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Seed a collection with existing records, keeping their order.
    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn not_found<R: Record>(id: &R::Id) -> StoreError {
    StoreError::NotFound {
        collection: R::COLLECTION,
        id: id.to_string(),
    }
}

#[async_trait]
impl<R: Record> Collection<R> for MemoryCollection<R> {
    async fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn create(&self, record: R) -> Result<R, StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::Conflict {
                collection: R::COLLECTION,
                id: record.id().to_string(),
            });
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &R::Id, patch: R::Patch) -> Result<R, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| not_found::<R>(id))?;
        record.apply(patch, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(not_found::<R>(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Origin, SourceKey, SourceType, SyncStatus, TemplateId, WorkingCopy, WorkingCopyId,
        WorkingCopyPatch, WorkingSnapshot,
    };

    fn copy(id: &str, source: &str) -> WorkingCopy {
        let now = Utc::now();
        WorkingCopy {
            id: WorkingCopyId::from(id),
            source_type: SourceType::Page,
            source_id: TemplateId::from(source),
            source_name: source.to_string(),
            working_data: WorkingSnapshot::default(),
            sync_status: SyncStatus::Synced,
            last_sync_date: None,
            origin: Origin::Library,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_list_preserves_order() {
        let store: MemoryCollection<WorkingCopy> = MemoryCollection::new();
        store.create(copy("b", "T2")).await.expect("create");
        store.create(copy("a", "T1")).await.expect("create");
        let ids: Vec<_> = Collection::list(&store)
            .await
            .expect("list")
            .into_iter()
            .map(|wc| wc.id.0)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let store: MemoryCollection<WorkingCopy> = MemoryCollection::new();
        store.create(copy("a", "T1")).await.expect("create");
        let err = store.create(copy("a", "T1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_not_found() {
        let store: MemoryCollection<WorkingCopy> = MemoryCollection::new();
        let id = WorkingCopyId::from("ghost");
        let err = store
            .update(&id, WorkingCopyPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.delete(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn find_by_key_is_exact() {
        let store = MemoryCollection::with_records(vec![copy("a", "T1"), copy("b", "T2")]);
        let hits = store
            .find_by_key(&SourceKey::new(SourceType::Page, "T2"))
            .await
            .expect("find");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.0, "b");
        let none = store
            .find_by_key(&SourceKey::new(SourceType::Feature, "T2"))
            .await
            .expect("find");
        assert!(none.is_empty());
    }
}
