//! `testhub clear`: delete every working copy, keeping test data.

use anyhow::{Context, Result};
use clap::Args;

use crate::session::{cancel_on_ctrl_c, print_progress, Session};

/// Arguments for `testhub clear`.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm deleting every working copy.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl ClearArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let summary = session
            .block_on(async {
                let cancel = cancel_on_ctrl_c();
                session
                    .hub
                    .clear_all_working_copies(self.yes, &cancel, print_progress)
                    .await
            })
            .context("clear failed (pass --yes to confirm)")?;

        println!(
            "✓ Deleted {} working copies. Test data was kept.",
            summary.succeeded
        );
        if summary.failed > 0 {
            println!("{} working copies could not be deleted.", summary.failed);
        }
        if summary.cancelled {
            println!("Cancelled before every working copy was visited.");
        }
        Ok(())
    }
}
