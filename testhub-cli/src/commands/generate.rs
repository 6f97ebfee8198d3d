//! `testhub generate`: produce test data for one item or every item without any.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use testhub_core::SourceType;

use crate::session::{cancel_on_ctrl_c, print_progress, resolve_item, Session};

/// Arguments for `testhub generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template id of the item to generate for (omit when using `--all`).
    pub source_id: Option<String>,

    /// Generate for every item that has no test data yet.
    #[arg(long, conflicts_with = "source_id")]
    pub all: bool,

    /// Disambiguate a page and a feature sharing an id.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub source_type: Option<SourceType>,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;

        if self.all {
            let summary = session
                .block_on(async {
                    let cancel = cancel_on_ctrl_c();
                    session.hub.bulk_generate(&cancel, print_progress).await
                })
                .context("generate --all failed")?;
            if summary.processed() == 0 && !summary.cancelled {
                println!("Every item already has test data.");
            } else if summary.is_partial() {
                println!("{} {summary}", "!".yellow().bold());
            } else {
                println!("✓ {summary}");
            }
            return Ok(());
        }

        let Some(source_id) = self.source_id.as_deref() else {
            bail!("provide a source id or use --all");
        };
        let artifact = session
            .block_on(async {
                let item = resolve_item(&session.hub, source_id, self.source_type).await?;
                session
                    .hub
                    .generate_test_data(&item)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .with_context(|| format!("generate failed for '{source_id}'"))?;

        println!(
            "✓ Generated v{} for '{}' ({} records, {})",
            artifact.version,
            artifact.source_name,
            artifact.record_count(),
            artifact.test_status
        );
        Ok(())
    }
}
