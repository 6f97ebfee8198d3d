//! `testhub sync <type>`: create or refresh working copies from the library.

use anyhow::{Context, Result};
use clap::Args;

use testhub_core::SourceType;

use crate::session::{cancel_on_ctrl_c, print_progress, Session};

/// Arguments for `testhub sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Template kind to sync: page | feature | entity.
    pub source_type: SourceType,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let outcome = session
            .block_on(async {
                let cancel = cancel_on_ctrl_c();
                session
                    .hub
                    .sync_from_library(self.source_type, &cancel, print_progress)
                    .await
            })
            .with_context(|| format!("sync failed for {} templates", self.source_type))?;

        if outcome.created + outcome.updated + outcome.failed == 0 && !outcome.cancelled {
            println!("No {} templates in the library.", self.source_type);
            return Ok(());
        }
        println!("✓ {} sync: {outcome}", self.source_type);
        Ok(())
    }
}
