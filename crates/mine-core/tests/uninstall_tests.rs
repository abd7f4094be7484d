//! Uninstall runs of the Orchestrator

use std::sync::Arc;

use mine_core::{
    Catalog, DocumentOutcome, FatalError, InstallAction, InstallTarget, MARKER, MergeError,
    Orchestrator, RunStatus, SyncOptions,
};
use mine_fs::NormalizedPath;
use mine_test_utils::{MemoryFetcher, TestRoot};
use pretty_assertions::assert_eq;

fn catalog() -> Catalog {
    Catalog::from_toml(
        r#"
version = "3.5.0"
source = "mem://resources"

[[groups]]
kind = "workflows"
resources = ["plan.md", "review.md"]

[[groups]]
kind = "templates"
resources = ["session_store.json"]

[[skills]]
name = "brainstorming"
companions = ["questions.md"]
"#,
        None,
    )
    .unwrap()
}

fn orchestrator(root: &TestRoot, options: SyncOptions) -> Orchestrator {
    let target = InstallTarget::new(NormalizedPath::new(root.base()));
    Orchestrator::new(
        catalog(),
        target,
        Arc::new(MemoryFetcher::serving_everything()),
        options,
    )
}

#[tokio::test]
async fn test_install_then_uninstall_restores_user_prefix() {
    let root = TestRoot::new();
    root.write("global_rules.md", "My rules\nBe brief.\n");
    let engine = orchestrator(&root, SyncOptions::default());

    engine.install().await;
    root.assert_contains("global_rules.md", MARKER);

    let outcome = engine.uninstall();

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.action, InstallAction::Uninstall);
    assert_eq!(outcome.report.succeeded.len(), 5);
    assert!(outcome.report.failed.is_empty());
    assert_eq!(outcome.report.document, Some(DocumentOutcome::Stripped));
    assert_eq!(root.read("global_rules.md"), "My rules\nBe brief.");

    root.assert_not_exists("windsurf/mine_version");
    root.assert_not_exists("windsurf/global_workflows");
    root.assert_not_exists("windsurf/skills");
    root.assert_not_exists("windsurf/.mine.lock");
    root.assert_not_exists("mine_preferences.json");
    root.assert_not_exists("windsurf");
}

#[tokio::test]
async fn test_uninstall_deletes_document_with_empty_prefix() {
    let root = TestRoot::new();
    let engine = orchestrator(&root, SyncOptions::default());

    engine.install().await;
    root.assert_exists("global_rules.md");

    let outcome = engine.uninstall();

    assert_eq!(outcome.report.document, Some(DocumentOutcome::Deleted));
    root.assert_not_exists("global_rules.md");
}

#[test]
fn test_uninstall_on_empty_root_is_a_noop() {
    let root = TestRoot::new();
    let engine = orchestrator(&root, SyncOptions::default());

    let outcome = engine.uninstall();

    assert_eq!(outcome.status, RunStatus::Done);
    assert!(outcome.report.succeeded.is_empty());
    assert!(outcome.report.failed.is_empty());
    assert_eq!(outcome.report.document, Some(DocumentOutcome::Absent));
    root.assert_not_exists("windsurf");
}

#[test]
fn test_uninstall_leaves_document_without_marker_untouched() {
    let root = TestRoot::new();
    root.write("global_rules.md", "Only my own rules.\n\n");
    let engine = orchestrator(&root, SyncOptions::default());

    let outcome = engine.uninstall();

    assert_eq!(outcome.report.document, Some(DocumentOutcome::Untouched));
    assert_eq!(root.read("global_rules.md"), "Only my own rules.\n\n");
}

#[tokio::test]
async fn test_uninstall_keeps_user_files_and_their_directories() {
    let root = TestRoot::new();
    let engine = orchestrator(&root, SyncOptions::default());
    engine.install().await;
    root.write("windsurf/global_workflows/my-own.md", "mine, not the tool's");

    engine.uninstall();

    root.assert_exists("windsurf/global_workflows/my-own.md");
    root.assert_not_exists("windsurf/global_workflows/plan.md");
    root.assert_not_exists("windsurf/templates");
}

#[tokio::test]
async fn test_uninstall_can_keep_preferences() {
    let root = TestRoot::new();
    let options = SyncOptions {
        keep_preferences: true,
        ..SyncOptions::default()
    };
    let engine = orchestrator(&root, options);
    engine.install().await;

    engine.uninstall();

    root.assert_exists("mine_preferences.json");
    root.assert_not_exists("windsurf/mine_version");
}

#[tokio::test]
async fn test_reinstall_after_uninstall_is_fresh() {
    let root = TestRoot::new();
    let engine = orchestrator(&root, SyncOptions::default());
    engine.install().await;
    engine.uninstall();

    let outcome = engine.install().await;

    assert_eq!(outcome.action, InstallAction::FreshInstall);
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");
}

#[test]
fn test_failed_strip_still_removes_lock_file() {
    let root = TestRoot::new();
    root.write("windsurf/global_workflows/plan.md", "# plan");
    root.write("windsurf/mine_version", "3.5.0\n");
    std::fs::create_dir_all(root.path("global_rules.md")).unwrap();
    let engine = orchestrator(&root, SyncOptions::default());

    let outcome = engine.uninstall();

    assert!(matches!(
        outcome.status,
        RunStatus::Fatal(FatalError::MergeFailed(MergeError::Unreadable { .. }))
    ));
    root.assert_not_exists("windsurf/.mine.lock");
    root.assert_not_exists("windsurf/global_workflows/plan.md");
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");
}
