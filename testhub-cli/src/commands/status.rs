//! `testhub status`: working copies, sync status and test data at a glance.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use testhub_core::{SyncStatus, TestStatus};
use testhub_sync::{format_datetime_age, Item, Stats};

use crate::session::Session;

/// Arguments for `testhub status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let items = session
            .block_on(session.hub.build_view())
            .context("failed to build the testing view")?;
        let stats = Stats::from_items(&items);

        if self.json {
            print_json(&items, stats)?;
            return Ok(());
        }
        print_table(items, stats);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    summary: Stats,
    items: &'a [Item],
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "type")]
    source_type: String,
    #[tabled(rename = "source")]
    source_id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "sync")]
    sync: String,
    #[tabled(rename = "test data")]
    test_data: String,
    #[tabled(rename = "records")]
    records: usize,
    #[tabled(rename = "last sync")]
    last_sync: String,
    #[tabled(rename = "working copy")]
    working_copy: String,
}

fn print_json(items: &[Item], stats: Stats) -> Result<()> {
    let payload = StatusReportJson {
        summary: stats,
        items,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(items: Vec<Item>, stats: Stats) {
    println!(
        "Testing Hub v{} | {} items | {} with test data | {} verified | {} pending | {} stale | {} orphaned",
        env!("CARGO_PKG_VERSION"),
        stats.total,
        stats.with_test_data,
        stats.verified,
        stats.pending,
        stats.stale,
        stats.orphaned,
    );

    if items.is_empty() {
        println!("No working copies.");
        println!("Run: testhub sync page");
        return;
    }

    let rows: Vec<StatusTableRow> = items
        .into_iter()
        .map(|item| StatusTableRow {
            source_type: item.key.source_type.to_string(),
            source_id: item.key.source_id.to_string(),
            sync: sync_label(item.sync_status),
            test_data: test_data_label(&item),
            records: item.record_count,
            last_sync: item
                .last_sync_date
                .map(format_datetime_age)
                .unwrap_or_else(|| "never".to_string()),
            working_copy: item.working_copy_id.to_string(),
            name: item.name,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if stats.without_test_data > 0 {
        println!("Run 'testhub generate --all' to fill in missing test data.");
    }
}

fn sync_label(status: SyncStatus) -> String {
    match status {
        SyncStatus::Synced => "synced".green().to_string(),
        SyncStatus::Outdated => "outdated".yellow().to_string(),
        SyncStatus::Orphaned => "orphaned".magenta().to_string(),
    }
}

fn test_data_label(item: &Item) -> String {
    let (Some(status), Some(version)) = (item.test_status, item.version) else {
        return "none".bright_black().to_string();
    };
    let label = format!("v{version} {status}");
    match status {
        TestStatus::Verified => label.green().to_string(),
        TestStatus::Pending => label.yellow().to_string(),
        TestStatus::Stale => label.red().to_string(),
    }
}
