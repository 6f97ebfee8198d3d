//! `testhub verify`: mark test data verified.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use testhub_core::SourceType;

use crate::session::{cancel_on_ctrl_c, print_progress, resolve_item, Session};

/// Arguments for `testhub verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Template id of the item to verify (omit when using `--all`).
    pub source_id: Option<String>,

    /// Verify every item with unverified test data.
    #[arg(long, conflicts_with = "source_id")]
    pub all: bool,

    /// Disambiguate a page and a feature sharing an id.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub source_type: Option<SourceType>,
}

impl VerifyArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;

        if self.all {
            let summary = session
                .block_on(async {
                    let cancel = cancel_on_ctrl_c();
                    session.hub.bulk_verify(&cancel, print_progress).await
                })
                .context("verify --all failed")?;
            if summary.processed() == 0 && !summary.cancelled {
                println!("Nothing to verify.");
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
                    .verify_single(&item)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .with_context(|| format!("verify failed for '{source_id}'"))?;

        println!(
            "✓ Verified '{}' (v{})",
            artifact.source_name, artifact.version
        );
        Ok(())
    }
}
