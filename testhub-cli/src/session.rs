//! Wiring shared by every command: home, config, file-backed stores and the
//! hub, plus the tokio runtime the async engine runs on.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use testhub_core::{
    config, FileCollection, SourceKey, SourceType, Template, TestArtifact, WorkingCopy,
};
use testhub_generator::SchemaSampler;
use testhub_sync::{CancelToken, Item, Progress, TestingHub};

pub struct Session {
    pub templates: Arc<FileCollection<Template>>,
    pub hub: TestingHub,
    runtime: tokio::runtime::Runtime,
}

impl Session {
    pub fn open() -> Result<Self> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let config = config::load_at(&home).context("failed to load ~/.testhub/config.yaml")?;
        let data_dir = config.data_dir_at(&home);

        let templates = Arc::new(FileCollection::<Template>::open(&data_dir));
        let working_copies = Arc::new(FileCollection::<WorkingCopy>::open(&data_dir));
        let artifacts = Arc::new(FileCollection::<TestArtifact>::open(&data_dir));
        let hub = TestingHub::with_config(
            templates.clone(),
            working_copies,
            artifacts,
            Arc::new(SchemaSampler::new()),
            &config,
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;

        Ok(Self {
            templates,
            hub,
            runtime,
        })
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// A token that fires on the first Ctrl-C. Must be called inside the runtime.
pub fn cancel_on_ctrl_c() -> CancelToken {
    let token = CancelToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received ctrl-c, stopping after the current item");
            trigger.cancel();
        }
    });
    token
}

pub fn print_progress(progress: Progress) {
    println!("  {progress}");
}

/// Find the view row for `source_id`, using `source_type` to disambiguate a
/// page and a feature sharing an id.
pub async fn resolve_item(
    hub: &TestingHub,
    source_id: &str,
    source_type: Option<SourceType>,
) -> Result<Item> {
    let mut matches: Vec<Item> = hub
        .build_view()
        .await?
        .into_iter()
        .filter(|item| item.key.source_id.as_str() == source_id)
        .filter(|item| source_type.map_or(true, |t| item.key.source_type == t))
        .collect();
    match matches.len() {
        0 => bail!("no working copy for '{source_id}'; run `testhub sync <type>` first"),
        1 => Ok(matches.remove(0)),
        _ => bail!("'{source_id}' matches several working copies; pass --type"),
    }
}

/// Find the test artifact for `source_id`. Works without a working copy.
pub async fn resolve_artifact(
    hub: &TestingHub,
    source_id: &str,
    source_type: Option<SourceType>,
) -> Result<TestArtifact> {
    let candidates = match source_type {
        Some(t) => vec![t],
        None => vec![SourceType::Page, SourceType::Feature],
    };
    let mut found = Vec::new();
    for t in candidates {
        if let Some(artifact) = hub
            .test_artifact_for(&SourceKey::new(t, source_id))
            .await?
        {
            found.push(artifact);
        }
    }
    match found.len() {
        0 => bail!("no test data for '{source_id}'"),
        1 => Ok(found.remove(0)),
        _ => bail!("'{source_id}' has test data as both page and feature; pass --type"),
    }
}
