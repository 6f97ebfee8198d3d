use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn testhub_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("testhub"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// A home with pacing disabled so bulk commands run instantly.
fn fast_home() -> TempDir {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".testhub");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("config.yaml"),
        "generate_delay_ms: 0\nsync_delay_ms: 0\n",
    )
    .expect("write config");
    home
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let output = testhub_cmd(home).args(args).output().expect("run testhub");
    assert!(
        output.status.success(),
        "testhub {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn status_json(home: &Path) -> Value {
    serde_json::from_str(&run_ok(home, &["status", "--json"])).expect("status json")
}

fn seed_invoice_page(home: &Path) {
    run_ok(
        home,
        &[
            "template",
            "add",
            "E1",
            "--type",
            "entity",
            "--name",
            "Invoice",
            "--schema",
            r#"{"properties":{"number":{"type":"string"},"total":{"type":"number"}}}"#,
        ],
    );
    run_ok(
        home,
        &[
            "template", "add", "T1", "--type", "page", "--name", "Invoices", "--entity",
            "Invoice",
        ],
    );
}

#[test]
fn invoice_page_lifecycle() {
    let home = fast_home();
    seed_invoice_page(home.path());

    testhub_cmd(home.path())
        .args(["sync", "page"])
        .assert()
        .success()
        .stdout(contains("1 created, 0 updated"));

    testhub_cmd(home.path())
        .args(["generate", "T1"])
        .assert()
        .success()
        .stdout(contains("Generated v1 for 'Invoices' (3 records, pending)"));

    testhub_cmd(home.path())
        .args(["verify", "T1"])
        .assert()
        .success()
        .stdout(contains("Verified 'Invoices' (v1)"));

    run_ok(home.path(), &["template", "remove", "T1"]);

    let status = status_json(home.path());
    let item = &status["items"][0];
    assert_eq!(item["key"]["source_type"], "page");
    assert_eq!(item["key"]["source_id"], "T1");
    assert_eq!(item["sync_status"], "orphaned");
    assert_eq!(item["has_test_data"], true);
    assert_eq!(item["test_status"], "verified");
    assert_eq!(item["record_count"], 3);
    assert_eq!(status["summary"]["orphaned"], 1);
}

#[test]
fn second_sync_only_updates() {
    let home = fast_home();
    seed_invoice_page(home.path());
    run_ok(home.path(), &["sync", "page"]);

    testhub_cmd(home.path())
        .args(["sync", "page"])
        .assert()
        .success()
        .stdout(contains("0 created, 1 updated"));
    assert_eq!(
        status_json(home.path())["items"]
            .as_array()
            .expect("items")
            .len(),
        1
    );
}

#[test]
fn clear_needs_confirmation_and_keeps_test_data() {
    let home = fast_home();
    seed_invoice_page(home.path());
    run_ok(home.path(), &["sync", "page"]);
    run_ok(home.path(), &["generate", "T1"]);

    testhub_cmd(home.path())
        .args(["clear"])
        .assert()
        .failure()
        .stderr(contains("requires confirmation"));

    testhub_cmd(home.path())
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(contains("Deleted 1 working copies"));
    assert_eq!(status_json(home.path())["summary"]["total"], 0);

    let artifacts = fs::read_to_string(
        home.path()
            .join(".testhub")
            .join("data")
            .join("test_artifacts.yaml"),
    )
    .expect("artifact file");
    assert!(artifacts.contains("source_id: T1"));

    run_ok(home.path(), &["sync", "page"]);
    let status = status_json(home.path());
    assert_eq!(status["items"][0]["has_test_data"], true);
    assert_eq!(status["items"][0]["version"], 1);
}

#[test]
fn generate_all_reports_partial_success() {
    let home = fast_home();
    seed_invoice_page(home.path());
    run_ok(
        home.path(),
        &["template", "add", "E2", "--type", "entity", "--name", "Broken", "--schema", "\"oops\""],
    );
    run_ok(
        home.path(),
        &["template", "add", "T2", "--type", "page", "--name", "Reports", "--entity", "Broken"],
    );
    run_ok(home.path(), &["sync", "page"]);

    testhub_cmd(home.path())
        .args(["generate", "--all"])
        .assert()
        .success()
        .stdout(contains("[1/2]"))
        .stdout(contains("[2/2]"))
        .stdout(contains("1 succeeded, 1 failed"));

    let stats = &status_json(home.path())["summary"];
    assert_eq!(stats["with_test_data"], 1);
    assert_eq!(stats["without_test_data"], 1);
}

#[test]
fn verify_all_then_rollback_and_stale() {
    let home = fast_home();
    seed_invoice_page(home.path());
    run_ok(home.path(), &["sync", "page"]);
    run_ok(home.path(), &["generate", "T1"]);

    testhub_cmd(home.path())
        .args(["verify", "--all"])
        .assert()
        .success()
        .stdout(contains("1 succeeded, 0 failed"));

    testhub_cmd(home.path())
        .args(["generate", "T1"])
        .assert()
        .success()
        .stdout(contains("Generated v2"));

    testhub_cmd(home.path())
        .args(["rollback", "T1", "--to", "1"])
        .assert()
        .success()
        .stdout(contains("Restored v1 of 'Invoices' as v3"));

    testhub_cmd(home.path())
        .args(["rollback", "T1", "--to", "9"])
        .assert()
        .failure()
        .stderr(contains("not in its history"));

    testhub_cmd(home.path())
        .args(["stale", "T1"])
        .assert()
        .success()
        .stdout(contains("Marked 'Invoices' stale (v3)"));
    assert_eq!(status_json(home.path())["summary"]["stale"], 1);
}

#[test]
fn diff_shows_template_edits_until_resync() {
    let home = fast_home();
    seed_invoice_page(home.path());
    run_ok(home.path(), &["sync", "page"]);

    run_ok(
        home.path(),
        &[
            "template", "add", "T1", "--type", "page", "--name", "Invoices", "--entity",
            "Invoice", "--content", r#"{"layout":"cards"}"#,
        ],
    );
    let status = status_json(home.path());
    assert_eq!(status["items"][0]["sync_status"], "outdated");
    let wc = status["items"][0]["working_copy_id"]
        .as_str()
        .expect("working copy id")
        .to_string();

    testhub_cmd(home.path())
        .args(["diff", &wc])
        .assert()
        .success()
        .stdout(contains("+++ b/template"))
        .stdout(contains("\"layout\": \"cards\""));

    run_ok(home.path(), &["sync", "page"]);
    testhub_cmd(home.path())
        .args(["diff", &wc])
        .assert()
        .success()
        .stdout(contains("No differences"));
}

#[test]
fn unknown_source_id_is_an_error() {
    let home = fast_home();
    testhub_cmd(home.path())
        .args(["generate", "nope"])
        .assert()
        .failure()
        .stderr(contains("no working copy for 'nope'"));

    testhub_cmd(home.path())
        .args(["diff", "missing-wc"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}
