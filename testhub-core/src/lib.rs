//! Testing Hub core library: domain types, store seams, backends, config.
//!
//! Public API surface:
//! - [`types`]: newtypes, [`SourceKey`], templates, working copies, artifacts
//! - [`store`]: [`Collection`] / [`TemplateStore`] traits
//! - [`memory`] / [`fs_store`]: in-memory and YAML-file backends
//! - [`config`]: [`HubConfig`] load / save
//! - [`error`]: [`StoreError`]

pub mod config;
pub mod error;
pub mod fs_store;
pub mod memory;
pub mod paths;
pub mod store;
pub mod types;

pub use config::HubConfig;
pub use error::StoreError;
pub use fs_store::FileCollection;
pub use memory::MemoryCollection;
pub use store::{Collection, Record, TemplateFilter, TemplateStore};
pub use types::{
    ArtifactId, EntityData, GenerationMethod, Origin, SourceKey, SourceType, SyncStatus,
    Template, TemplateId, TemplatePatch, TestArtifact, TestArtifactPatch, TestStatus,
    VersionSnapshot, WorkingCopy, WorkingCopyId, WorkingCopyPatch, WorkingSnapshot,
};
