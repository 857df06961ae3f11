//! CLI integration tests for Trellis
//!
//! These tests verify the complete workflow from initialization through
//! claim, completion and pruning, ensuring commands work together correctly.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the trellis binary
fn trellis_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("trellis"));
    cmd.env_remove("TRELLIS_ROOT").env_remove("TRELLIS_LOG");
    cmd
}

/// Create a temporary directory and initialize a trellis project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    trellis_cmd().arg("init").arg(dir.path()).assert().success();
    dir
}

/// Runs a command inside the project and asserts success
fn run_ok(dir: &Path, args: &[&str]) -> String {
    let assert = trellis_cmd().current_dir(dir).args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Shows an object as JSON
fn show_json(dir: &Path, id: &str) -> serde_json::Value {
    let stdout = run_ok(dir, &["show", id, "--format", "json"]);
    serde_json::from_str(&stdout).unwrap()
}

/// Creates P-web > E-auth > F-login > T-form
fn setup_hierarchy() -> TempDir {
    let dir = setup_project();
    let root = dir.path();

    run_ok(root, &["create", "project", "Web"]);
    run_ok(root, &["create", "epic", "Auth", "--parent", "P-web"]);
    run_ok(root, &["create", "feature", "Login", "--parent", "E-auth"]);
    run_ok(root, &["create", "task", "Form", "--parent", "F-login"]);
    dir
}

const STORE: &str = ".trellis";

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    trellis_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized trellis project"));

    assert!(dir.path().join(STORE).is_dir());
    assert!(dir.path().join(STORE).join("config.toml").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    trellis_cmd().arg("init").arg(dir.path()).assert().success();
    trellis_cmd().arg("init").arg(dir.path()).assert().success();
}

#[test]
fn test_commands_require_project() {
    let dir = TempDir::new().unwrap();

    trellis_cmd()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a trellis project"));
}

#[test]
fn test_project_discovered_from_subdirectory() {
    let dir = setup_project();
    let nested = dir.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    run_ok(&nested, &["create", "task", "Nested"]);

    assert!(dir.path().join(STORE).join("t/open/T-nested.md").is_file());
}

#[test]
fn test_root_flag_overrides_discovery() {
    let dir = setup_project();
    let elsewhere = TempDir::new().unwrap();

    trellis_cmd()
        .current_dir(elsewhere.path())
        .arg("--root")
        .arg(dir.path())
        .args(["create", "task", "Remote"])
        .assert()
        .success();

    assert!(dir.path().join(STORE).join("t/open/T-remote.md").is_file());
}

// =============================================================================
// Object Tests
// =============================================================================

#[test]
fn test_create_writes_canonical_layout() {
    let dir = setup_hierarchy();
    let store = dir.path().join(STORE);

    assert!(store.join("p/P-web/P-web.md").is_file());
    assert!(store.join("p/P-web/e/E-auth/E-auth.md").is_file());
    assert!(store.join("p/P-web/e/E-auth/f/F-login/F-login.md").is_file());
    assert!(store.join("p/P-web/e/E-auth/f/F-login/t/open/T-form.md").is_file());

    let feature = show_json(dir.path(), "F-login");
    assert_eq!(feature["childrenIds"], serde_json::json!(["T-form"]));
}

#[test]
fn test_create_document_format() {
    let dir = setup_hierarchy();
    let path = dir
        .path()
        .join(STORE)
        .join("p/P-web/e/E-auth/f/F-login/t/open/T-form.md");

    let content = fs::read_to_string(path).unwrap();
    assert!(content.starts_with("---\n"));
    assert!(content.contains("id: T-form"));
    assert!(content.contains("parent: F-login"));
    assert!(content.contains("schema: '1.0'") || content.contains("schema: \"1.0\""));
}

#[test]
fn test_create_epic_without_project_fails() {
    let dir = setup_project();

    trellis_cmd()
        .current_dir(dir.path())
        .args(["create", "epic", "Orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must have a parent project"));
}

#[test]
fn test_create_with_missing_parent_fails() {
    let dir = setup_project();

    trellis_cmd()
        .current_dir(dir.path())
        .args(["create", "task", "Lost", "--parent", "F-nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("F-nowhere"));
}

#[test]
fn test_list_hides_closed_by_default() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Keep"]);
    run_ok(root, &["create", "task", "Drop"]);
    run_ok(root, &["update", "T-drop", "--status", "wont-do"]);

    let open = run_ok(root, &["list"]);
    assert!(open.contains("T-keep"));
    assert!(!open.contains("T-drop"));

    let all = run_ok(root, &["list", "--include-closed"]);
    assert!(all.contains("T-drop"));
    assert!(root.join(STORE).join("t/closed/T-drop.md").is_file());
}

#[test]
fn test_list_json_filters_by_kind() {
    let dir = setup_hierarchy();

    let stdout = run_ok(dir.path(), &["list", "--kind", "feature", "--format", "json"]);
    let items: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "F-login");
    assert_eq!(items[0]["type"], "feature");
}

#[test]
fn test_log_and_files_are_recorded() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Notes"]);
    run_ok(root, &["log", "T-notes", "looked into it"]);
    run_ok(root, &["files", "T-notes", "src/a.rs=first"]);
    run_ok(root, &["files", "T-notes", "src/a.rs=second", "README.md=docs"]);

    let task = show_json(root, "T-notes");
    assert_eq!(task["log"], serde_json::json!(["looked into it"]));
    assert_eq!(task["affectedFiles"]["src/a.rs"], "first; second");
    assert_eq!(task["affectedFiles"]["README.md"], "docs");
}

#[test]
fn test_update_lifecycle_status_requires_force() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Quick"]);

    trellis_cmd()
        .current_dir(root)
        .args(["update", "T-quick", "--status", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("use complete"));

    run_ok(root, &["update", "T-quick", "--status", "done", "--force"]);
    assert_eq!(show_json(root, "T-quick")["status"], "done");
}

#[test]
fn test_prerequisite_cycle_rejected() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "A"]);
    run_ok(root, &["create", "task", "B", "--prerequisite", "T-a"]);

    trellis_cmd()
        .current_dir(root)
        .args(["update", "T-a", "--prerequisite", "T-b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_claim_marks_ancestors_in_progress() {
    let dir = setup_hierarchy();
    let root = dir.path();

    trellis_cmd()
        .current_dir(root)
        .args(["claim", "T-form"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Claimed task: T-form"));

    for id in ["T-form", "F-login", "E-auth", "P-web"] {
        assert_eq!(show_json(root, id)["status"], "in-progress", "{}", id);
    }
}

#[test]
fn test_claim_discovers_highest_priority() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Low one", "--priority", "low"]);
    run_ok(root, &["create", "task", "Urgent", "--priority", "high"]);

    let stdout = run_ok(root, &["next"]);
    assert!(stdout.contains("T-urgent"));

    let stdout = run_ok(root, &["claim"]);
    assert!(stdout.contains("T-urgent"));
}

#[test]
fn test_claim_blocked_by_prerequisite() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "First"]);
    run_ok(root, &["create", "task", "Second", "--prerequisite", "T-first"]);

    trellis_cmd()
        .current_dir(root)
        .args(["claim", "T-second"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incomplete prerequisites"));

    run_ok(root, &["claim", "T-second", "--force"]);
}

#[test]
fn test_claim_with_nothing_available() {
    let dir = setup_project();

    trellis_cmd()
        .current_dir(dir.path())
        .arg("claim")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No available tasks"));
}

#[test]
fn test_complete_moves_task_and_auto_completes_parents() {
    let dir = setup_hierarchy();
    let root = dir.path();
    run_ok(root, &["claim", "T-form"]);

    run_ok(
        root,
        &[
            "complete",
            "T-form",
            "--summary",
            "Built the form",
            "--file",
            "src/form.rs=new component",
            "--auto-complete-parent",
        ],
    );

    let base = root.join(STORE).join("p/P-web/e/E-auth/f/F-login/t");
    assert!(base.join("closed/T-form.md").is_file());
    assert!(!base.join("open/T-form.md").exists());

    let task = show_json(root, "T-form");
    assert_eq!(task["status"], "done");
    assert_eq!(task["affectedFiles"]["src/form.rs"], "new component");

    let feature = show_json(root, "F-login");
    assert_eq!(feature["status"], "done");
    assert_eq!(
        feature["log"].as_array().unwrap().last().unwrap(),
        "Auto-completed: All child tasks are complete"
    );
    assert_eq!(show_json(root, "P-web")["status"], "done");
}

#[test]
fn test_complete_without_auto_leaves_parent_open() {
    let dir = setup_hierarchy();
    let root = dir.path();
    run_ok(root, &["claim", "T-form"]);
    run_ok(root, &["complete", "T-form", "--summary", "done"]);

    assert_eq!(show_json(root, "F-login")["status"], "in-progress");
}

#[test]
fn test_complete_requires_in_progress() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Idle"]);

    trellis_cmd()
        .current_dir(root)
        .args(["complete", "T-idle", "--summary", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("current status: open"));
}

#[test]
fn test_delete_required_prerequisite_needs_force() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Base"]);
    run_ok(root, &["create", "task", "Top", "--prerequisite", "T-base"]);

    trellis_cmd()
        .current_dir(root)
        .args(["delete", "T-base"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("prerequisite"));

    run_ok(root, &["delete", "T-base", "--force"]);
    assert!(!root.join(STORE).join("t/open/T-base.md").exists());
}

#[test]
fn test_delete_feature_removes_folder() {
    let dir = setup_hierarchy();
    let root = dir.path();

    run_ok(root, &["delete", "F-login"]);

    assert!(!root.join(STORE).join("p/P-web/e/E-auth/f/F-login").exists());
    trellis_cmd()
        .current_dir(root)
        .args(["show", "T-form"])
        .assert()
        .failure();
}

#[test]
fn test_prune_removes_closed_objects() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Old"]);
    run_ok(root, &["create", "task", "Live"]);
    run_ok(root, &["update", "T-old", "--status", "wont-do"]);

    let stdout = run_ok(root, &["prune", "--days", "0", "--format", "json"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(report["deletedCount"], 1);
    assert_eq!(report["deletedIds"], serde_json::json!(["T-old"]));
    assert!(!root.join(STORE).join("t/closed/T-old.md").exists());
    assert!(root.join(STORE).join("t/open/T-live.md").is_file());
}

#[test]
fn test_prune_default_age_keeps_recent() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Recent"]);
    run_ok(root, &["update", "T-recent", "--status", "wont-do"]);

    run_ok(root, &["prune"]);
    assert!(root.join(STORE).join("t/closed/T-recent.md").is_file());
}

// =============================================================================
// Output Tests
// =============================================================================

#[test]
fn test_json_errors_are_structured() {
    let dir = setup_project();

    trellis_cmd()
        .current_dir(dir.path())
        .args(["show", "T-missing", "--format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"success\":false"))
        .stderr(predicate::str::contains("Object not found: T-missing"));
}

#[test]
fn test_unparsable_document_is_skipped() {
    let dir = setup_project();
    let root = dir.path();
    run_ok(root, &["create", "task", "Fine"]);
    fs::write(root.join(STORE).join("t/open/T-broken.md"), "garbage").unwrap();

    let stdout = run_ok(root, &["list"]);
    assert!(stdout.contains("T-fine"));
    assert!(!stdout.contains("T-broken"));
}
