//! File-backed [`Collection`]: one YAML document per collection.
//!
//! # Storage layout
//!
//! ```text
//! <data_dir>/
//!   templates.yaml        (mode 0600)
//!   working_copies.yaml   (mode 0600)
//!   test_artifacts.yaml   (mode 0600)
//! ```
//!
//! Every mutation is a read-modify-write of the whole document, serialized
//! through a per-collection lock. Write flow: serialize → `.yaml.tmp` sibling
//! → `chmod 0600` → `rename`. The `.tmp` always sits next to the target so the
//! rename never crosses filesystems.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{io_err, StoreError};
use crate::paths::collection_path;
use crate::store::{Collection, Record};

const FORMAT_VERSION: u32 = 1;

/// On-disk payload of one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFile<R> {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Vec::new")]
    pub records: Vec<R>,
}

/// A [`Collection`] persisted as `<data_dir>/<R::COLLECTION>.yaml`.
#[derive(Debug)]
pub struct FileCollection<R: Record> {
    path: PathBuf,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> FileCollection<R> {
    /// Open the collection under `data_dir`. Nothing is read until first use.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: collection_path(data_dir, R::COLLECTION),
            lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing file is an empty collection.
    async fn load(&self) -> Result<Vec<R>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(&self.path, err)),
        };
        let file: CollectionFile<R> =
            serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(file.records)
    }

    async fn save(&self, records: Vec<R>) -> Result<(), StoreError> {
        let Some(dir) = self.path.parent() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("invalid collection path"),
            ));
        };
        if tokio::fs::metadata(dir).await.is_err() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_err(dir, e))?;
            set_dir_permissions(dir).await?;
        }

        let file = CollectionFile {
            version: FORMAT_VERSION,
            updated_at: Utc::now(),
            records,
        };
        let yaml = serde_yaml::to_string(&file)?;
        let tmp = self.path.with_file_name(format!("{}.yaml.tmp", R::COLLECTION));
        tokio::fs::write(&tmp, yaml)
            .await
            .map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }
}

fn not_found<R: Record>(id: &R::Id) -> StoreError {
    StoreError::NotFound {
        collection: R::COLLECTION,
        id: id.to_string(),
    }
}

#[async_trait]
impl<R: Record> Collection<R> for FileCollection<R> {
    async fn list(&self) -> Result<Vec<R>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|r| r.id() == id))
    }

    async fn create(&self, record: R) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::Conflict {
                collection: R::COLLECTION,
                id: record.id().to_string(),
            });
        }
        records.push(record.clone());
        self.save(records).await?;
        Ok(record)
    }

    async fn update(&self, id: &R::Id, patch: R::Patch) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| not_found::<R>(id))?;
        record.apply(patch, Utc::now());
        let updated = record.clone();
        self.save(records).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(not_found::<R>(id));
        }
        self.save(records).await
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
async fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .await
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
async fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
async fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
async fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
