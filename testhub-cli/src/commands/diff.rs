//! `testhub diff <working-copy-id>`: what a sync would change.

use anyhow::{Context, Result};
use clap::Args;

use testhub_core::WorkingCopyId;

use crate::session::Session;

/// Arguments for `testhub diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Working copy id, as shown by `testhub status`.
    pub working_copy_id: String,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let id = WorkingCopyId::from(self.working_copy_id.as_str());
        let diff = session
            .block_on(session.hub.diff_working_copy(&id))
            .with_context(|| format!("diff failed for '{id}'"))?;

        if diff.is_empty() {
            println!("No differences for '{}' ({}).", id, diff.key);
            return Ok(());
        }

        println!("{} is {}", diff.key, diff.sync_status);
        print!("{}", diff.unified_diff);
        if !diff.unified_diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
