//! `testhub stale <source-id>`: flag test data after an external schema change.

use anyhow::{Context, Result};
use clap::Args;

use testhub_core::SourceType;

use crate::session::{resolve_artifact, Session};

/// Arguments for `testhub stale`.
#[derive(Args, Debug)]
pub struct StaleArgs {
    /// Template id the test data belongs to.
    pub source_id: String,

    /// Disambiguate a page and a feature sharing an id.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub source_type: Option<SourceType>,
}

impl StaleArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let artifact = session
            .block_on(async {
                let current =
                    resolve_artifact(&session.hub, &self.source_id, self.source_type).await?;
                session
                    .hub
                    .mark_stale(&current.key())
                    .await
                    .map_err(anyhow::Error::from)
            })
            .with_context(|| format!("failed to mark '{}' stale", self.source_id))?;

        println!(
            "✓ Marked '{}' stale (v{})",
            artifact.source_name, artifact.version
        );
        Ok(())
    }
}
