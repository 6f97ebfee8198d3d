//! `testhub rollback <source-id> --to <version>`

use anyhow::{Context, Result};
use clap::Args;

use testhub_core::SourceType;

use crate::session::{resolve_artifact, Session};

/// Arguments for `testhub rollback`.
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Template id the test data belongs to.
    pub source_id: String,

    /// Version to restore. Must still be in the artifact's history.
    #[arg(long = "to", value_name = "VERSION")]
    pub to: u32,

    /// Disambiguate a page and a feature sharing an id.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub source_type: Option<SourceType>,
}

impl RollbackArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let restored = session
            .block_on(async {
                let current =
                    resolve_artifact(&session.hub, &self.source_id, self.source_type).await?;
                session
                    .hub
                    .rollback(&current.id, self.to)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .with_context(|| format!("rollback failed for '{}'", self.source_id))?;

        println!(
            "✓ Restored v{} of '{}' as v{} ({} records)",
            self.to,
            restored.source_name,
            restored.version,
            restored.record_count()
        );
        Ok(())
    }
}
