//! Testing Hub: test-data reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! testhub template add <id> --type page|feature|entity --name <name> [--entity <E>]... [--content <text>] [--schema <json>]
//! testhub template list
//! testhub template remove <id>
//! testhub sync <page|feature|entity>
//! testhub status [--json]
//! testhub generate <source-id> [--type page|feature]
//! testhub generate --all
//! testhub verify <source-id> [--type page|feature]
//! testhub verify --all
//! testhub rollback <source-id> --to <version> [--type page|feature]
//! testhub stale <source-id> [--type page|feature]
//! testhub clear [--yes]
//! testhub diff <working-copy-id>
//! ```

mod commands;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    clear::ClearArgs, diff::DiffArgs, generate::GenerateArgs, rollback::RollbackArgs,
    stale::StaleArgs, status::StatusArgs, sync::SyncArgs, template::TemplateCommand,
    verify::VerifyArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "testhub",
    version,
    about = "Keep generated test data in step with the template library",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage library templates.
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Create or refresh working copies from the library.
    Sync(SyncArgs),

    /// Show working copies, their sync status and test data.
    Status(StatusArgs),

    /// Generate test data for one item or every item without any.
    Generate(GenerateArgs),

    /// Mark test data verified.
    Verify(VerifyArgs),

    /// Restore an earlier version of an item's test data.
    Rollback(RollbackArgs),

    /// Flag an item's test data as stale after a schema change.
    Stale(StaleArgs),

    /// Delete every working copy. Test data is kept.
    Clear(ClearArgs),

    /// Show what a sync would change on a working copy.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Template { command } => commands::template::run(command),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Generate(args) => args.run(),
        Commands::Verify(args) => args.run(),
        Commands::Rollback(args) => args.run(),
        Commands::Stale(args) => args.run(),
        Commands::Clear(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
