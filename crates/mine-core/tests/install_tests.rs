//! Install and upgrade runs of the Orchestrator

use std::sync::Arc;
use std::time::Duration;

use mine_core::{
    Catalog, DocumentOutcome, ErrorKind, FatalError, InstallAction, InstallTarget, MergeError,
    Orchestrator, RunStatus, SyncOptions, render_managed,
};
use mine_fetch::{FetchError, RetryPolicy};
use mine_fs::{InstallLock, NormalizedPath};
use mine_test_utils::{MemoryFetcher, TestRoot};
use pretty_assertions::assert_eq;

const SOURCE: &str = "mem://resources";

fn catalog(body: &str) -> Catalog {
    let toml = format!("version = \"3.5.0\"\nsource = \"{SOURCE}\"\n{body}");
    Catalog::from_toml(&toml, None).unwrap()
}

fn single_workflow() -> Catalog {
    catalog("[[groups]]\nkind = \"workflows\"\nresources = [\"plan.md\"]\n")
}

fn fast_options() -> SyncOptions {
    SyncOptions {
        retry: RetryPolicy {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            timeout: Duration::from_secs(2),
            ..RetryPolicy::default()
        },
        ..SyncOptions::default()
    }
}

fn orchestrator(
    root: &TestRoot,
    catalog: Catalog,
    fetcher: MemoryFetcher,
    options: SyncOptions,
) -> (Orchestrator, Arc<MemoryFetcher>) {
    let fetcher = Arc::new(fetcher);
    let target = InstallTarget::new(NormalizedPath::new(root.base()));
    (
        Orchestrator::new(catalog, target, fetcher.clone(), options),
        fetcher,
    )
}

fn names(resources: &[mine_core::ResourceDescriptor]) -> Vec<String> {
    let mut names: Vec<String> = resources.iter().map(|r| r.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_fresh_install_single_workflow() {
    let root = TestRoot::new();
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.action, InstallAction::FreshInstall);
    assert_eq!(names(&outcome.report.succeeded), vec!["plan.md"]);
    assert!(outcome.report.failed.is_empty());

    assert_eq!(
        root.read("windsurf/global_workflows/plan.md").into_bytes(),
        MemoryFetcher::default_body("mem://resources/workflows/plan.md")
    );
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");

    let rendered = render_managed(engine.catalog(), engine.target());
    assert_eq!(root.read("global_rules.md"), rendered);
    assert!(rendered.contains("3.5.0"));
    assert_eq!(outcome.report.document, Some(DocumentOutcome::Created));
    root.assert_exists("mine_preferences.json");
}

#[tokio::test]
async fn test_second_install_is_a_noop() {
    let root = TestRoot::new();
    let (engine, fetcher) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    engine.install().await;
    let before = root.snapshot();
    let calls = fetcher.total_calls();

    let outcome = engine.install().await;

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.action, InstallAction::UpToDate);
    assert_eq!(names(&outcome.report.skipped), vec!["plan.md"]);
    assert!(outcome.report.succeeded.is_empty());
    assert_eq!(fetcher.total_calls(), calls);
    assert_eq!(root.snapshot(), before);
}

#[tokio::test]
async fn test_same_version_with_existing_files_short_circuits() {
    let root = TestRoot::new();
    root.write("windsurf/mine_version", "3.5.0\n");
    root.write("windsurf/global_workflows/plan.md", "already here");
    let (engine, fetcher) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );
    let before = root.snapshot();

    let outcome = engine.install().await;

    assert_eq!(outcome.action, InstallAction::UpToDate);
    assert_eq!(names(&outcome.report.skipped), vec!["plan.md"]);
    assert_eq!(fetcher.total_calls(), 0);
    assert_eq!(root.read("windsurf/global_workflows/plan.md"), "already here");
    root.assert_not_exists("global_rules.md");
    assert_eq!(root.snapshot(), before);
}

#[tokio::test]
async fn test_write_failure_is_isolated() {
    let root = TestRoot::new();
    let catalog = catalog(
        "[[groups]]\nkind = \"workflows\"\nresources = [\"plan.md\", \"review.md\"]\noptional = [\"explore.md\"]\n",
    );
    // A directory where a file should go cannot be replaced by a rename
    std::fs::create_dir_all(root.path("windsurf/global_workflows/plan.md")).unwrap();
    std::fs::create_dir_all(root.path("windsurf/global_workflows/explore.md")).unwrap();
    let (engine, _) = orchestrator(
        &root,
        catalog,
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(names(&outcome.report.succeeded), vec!["review.md"]);
    assert_eq!(outcome.report.failed.len(), 1);
    assert!(matches!(
        outcome.report.failure_for("plan.md"),
        Some(ErrorKind::Write(_))
    ));
    assert_eq!(names(&outcome.report.skipped_optional), vec!["explore.md"]);
    assert_eq!(
        root.read("windsurf/global_workflows/review.md"),
        "content of mem://resources/workflows/review.md"
    );
    root.assert_contains("global_rules.md", mine_core::MARKER);
    assert_eq!(outcome.report.document, Some(DocumentOutcome::Created));
    root.assert_not_exists("windsurf/mine_version");
}

#[tokio::test]
async fn test_missing_file_triggers_reinstall() {
    let root = TestRoot::new();
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );
    engine.install().await;
    std::fs::remove_file(root.path("windsurf/global_workflows/plan.md")).unwrap();

    let outcome = engine.install().await;

    assert_eq!(outcome.action, InstallAction::Reinstall);
    root.assert_exists("windsurf/global_workflows/plan.md");
}

#[tokio::test]
async fn test_force_reruns_pipeline() {
    let root = TestRoot::new();
    let options = SyncOptions {
        force: true,
        ..fast_options()
    };
    let (engine, fetcher) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        options,
    );

    engine.install().await;
    let outcome = engine.install().await;

    assert_eq!(outcome.action, InstallAction::Reinstall);
    assert_eq!(fetcher.total_calls(), 2);
    assert_eq!(outcome.report.document, Some(DocumentOutcome::Unchanged));
}

#[tokio::test]
async fn test_partial_failure_isolation() {
    let root = TestRoot::new();
    let catalog = catalog(
        "[[groups]]\nkind = \"workflows\"\nresources = [\"plan.md\", \"review.md\", \"debug.md\"]\n",
    );
    let fetcher = MemoryFetcher::serving_everything().with_failure(
        "mem://resources/workflows/plan.md",
        FetchError::NotFound {
            locator: "mem://resources/workflows/plan.md".into(),
        },
    );
    let (engine, _) = orchestrator(&root, catalog, fetcher, fast_options());

    let outcome = engine.install().await;

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(names(&outcome.report.succeeded), vec!["debug.md", "review.md"]);
    assert_eq!(outcome.report.failed.len(), 1);
    assert!(matches!(
        outcome.report.failure_for("plan.md"),
        Some(ErrorKind::Fetch(FetchError::NotFound { .. }))
    ));
    root.assert_exists("windsurf/global_workflows/review.md");
    root.assert_exists("windsurf/global_workflows/debug.md");
    root.assert_not_exists("windsurf/global_workflows/plan.md");

    // The merge still ran, but the version is only recorded once nothing
    // required is missing so the next run retries.
    root.assert_contains("global_rules.md", mine_core::MARKER);
    root.assert_not_exists("windsurf/mine_version");
    assert_eq!(outcome.report.warnings.len(), 1);
}

#[tokio::test]
async fn test_optional_failure_is_skipped_and_version_recorded() {
    let root = TestRoot::new();
    let catalog = catalog(
        "[[groups]]\nkind = \"workflows\"\nresources = [\"plan.md\"]\noptional = [\"explore.md\"]\n",
    );
    let fetcher = MemoryFetcher::serving_everything().with_failure(
        "mem://resources/workflows/explore.md",
        FetchError::Rejected { status: 403 },
    );
    let (engine, _) = orchestrator(&root, catalog, fetcher, fast_options());

    let outcome = engine.install().await;

    assert_eq!(names(&outcome.report.skipped_optional), vec!["explore.md"]);
    assert!(outcome.report.failed.is_empty());
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let root = TestRoot::new();
    let locator = "mem://resources/workflows/plan.md";
    let fetcher = MemoryFetcher::new().with_flaky(locator, 2, "# plan");
    let (engine, fetcher) = orchestrator(&root, single_workflow(), fetcher, fast_options());

    let outcome = engine.install().await;

    assert_eq!(names(&outcome.report.succeeded), vec!["plan.md"]);
    assert_eq!(fetcher.calls_for(locator), 3);
    assert_eq!(root.read("windsurf/global_workflows/plan.md"), "# plan");
}

#[tokio::test]
async fn test_skill_bundle_with_failed_primary_is_not_half_written() {
    let root = TestRoot::new();
    let catalog = catalog(
        "[[skills]]\nname = \"review\"\nprimary = \"SKILL.md\"\ncompanions = [\"checklist.md\"]\n",
    );
    let fetcher = MemoryFetcher::serving_everything().with_failure(
        "mem://resources/skills/review/SKILL.md",
        FetchError::network("connection reset"),
    );
    let (engine, _) = orchestrator(&root, catalog, fetcher, fast_options());

    let outcome = engine.install().await;

    assert!(matches!(
        outcome.report.failure_for("review/SKILL.md"),
        Some(ErrorKind::Fetch(FetchError::Network { .. }))
    ));
    assert_eq!(
        outcome.report.failure_for("review/checklist.md"),
        Some(&ErrorKind::BundleIncomplete {
            bundle: "review".into()
        })
    );
    root.assert_not_exists("windsurf/skills/review/checklist.md");
}

#[tokio::test]
async fn test_missing_companion_does_not_fail_skill() {
    let root = TestRoot::new();
    let catalog = catalog(
        "[[skills]]\nname = \"review\"\ncompanions = [\"checklist.md\"]\n",
    );
    let fetcher = MemoryFetcher::new().with_resource("mem://resources/skills/review/SKILL.md", "skill");
    let (engine, _) = orchestrator(&root, catalog, fetcher, fast_options());

    let outcome = engine.install().await;

    assert_eq!(names(&outcome.report.succeeded), vec!["review/SKILL.md"]);
    assert_eq!(names(&outcome.report.skipped_optional), vec!["review/checklist.md"]);
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");
}

#[tokio::test]
async fn test_existing_user_prose_is_preserved() {
    let root = TestRoot::new();
    root.write("global_rules.md", "My rules\n\nAlways answer in English.\n\n\n");
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    let rendered = render_managed(engine.catalog(), engine.target());
    assert_eq!(
        root.read("global_rules.md"),
        format!("My rules\n\nAlways answer in English.\n{rendered}")
    );
    assert_eq!(outcome.report.document, Some(DocumentOutcome::Updated));
}

#[tokio::test]
async fn test_failed_merge_leaves_version_unchanged() {
    let root = TestRoot::new();
    root.write("windsurf/mine_version", "3.4.0\n");
    std::fs::create_dir_all(root.path("global_rules.md")).unwrap();
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert!(matches!(
        outcome.status,
        RunStatus::Fatal(FatalError::MergeFailed(MergeError::Unreadable { .. }))
    ));
    assert_eq!(
        outcome.action,
        InstallAction::Upgrade {
            from: "3.4.0".into()
        }
    );
    assert_eq!(names(&outcome.report.succeeded), vec!["plan.md"]);
    assert_eq!(root.read("windsurf/mine_version"), "3.4.0\n");
}

#[tokio::test]
async fn test_failed_merge_on_fresh_install_leaves_version_absent() {
    let root = TestRoot::new();
    std::fs::create_dir_all(root.path("global_rules.md")).unwrap();
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert!(matches!(outcome.status, RunStatus::Fatal(FatalError::MergeFailed(_))));
    root.assert_not_exists("windsurf/mine_version");
    root.assert_not_exists("mine_preferences.json");
}

#[tokio::test]
async fn test_unwritable_version_store_is_fatal() {
    let root = TestRoot::new();
    std::fs::create_dir_all(root.path("windsurf/mine_version")).unwrap();
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert!(matches!(
        outcome.status,
        RunStatus::Fatal(FatalError::VersionStoreUnwritable { .. })
    ));
    assert_eq!(names(&outcome.report.succeeded), vec!["plan.md"]);
}

#[tokio::test]
async fn test_busy_lock_aborts_before_writing() {
    let root = TestRoot::new();
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );
    let _held = InstallLock::acquire(&engine.target().lock_file()).unwrap();

    let outcome = engine.install().await;

    assert!(matches!(outcome.status, RunStatus::Fatal(FatalError::LockBusy { .. })));
    root.assert_not_exists("windsurf/global_workflows/plan.md");
    root.assert_not_exists("global_rules.md");
    root.assert_not_exists("windsurf/mine_version");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetch_concurrency_is_bounded() {
    let root = TestRoot::new();
    let resources: Vec<String> = (0..12).map(|i| format!("\"w{i}.md\"")).collect();
    let catalog = catalog(&format!(
        "[[groups]]\nkind = \"workflows\"\nresources = [{}]\n",
        resources.join(", ")
    ));
    let options = SyncOptions {
        concurrency: 2,
        ..fast_options()
    };
    let fetcher = MemoryFetcher::serving_everything().with_delay(Duration::from_millis(20));
    let (engine, fetcher) = orchestrator(&root, catalog, fetcher, options);

    let outcome = engine.install().await;

    assert_eq!(outcome.report.succeeded.len(), 12);
    assert!(fetcher.max_in_flight() <= 2);
    assert!(fetcher.max_in_flight() >= 1);
}

#[tokio::test]
async fn test_cancel_during_fetch_writes_nothing() {
    let root = TestRoot::new();
    let fetcher = MemoryFetcher::serving_everything().with_delay(Duration::from_secs(30));
    let (engine, _) = orchestrator(&root, single_workflow(), fetcher, fast_options());

    let outcome = engine
        .install_until(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(outcome.action, InstallAction::FreshInstall);
    root.assert_not_exists("windsurf");
    root.assert_not_exists("global_rules.md");
}

#[tokio::test]
async fn test_upgrade_without_install_does_nothing() {
    let root = TestRoot::new();
    let (engine, fetcher) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.upgrade().await;

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.action, InstallAction::NotInstalled);
    assert_eq!(fetcher.total_calls(), 0);
    root.assert_not_exists("windsurf");
}

#[tokio::test]
async fn test_upgrade_from_older_version_keeps_preferences_untouched() {
    let root = TestRoot::new();
    root.write("windsurf/mine_version", "3.4.0\n");
    root.write("windsurf/global_workflows/plan.md", "old plan");
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::new().with_resource("mem://resources/workflows/plan.md", "new plan"),
        fast_options(),
    );

    let outcome = engine.upgrade().await;

    assert_eq!(
        outcome.action,
        InstallAction::Upgrade {
            from: "3.4.0".into()
        }
    );
    assert_eq!(root.read("windsurf/global_workflows/plan.md"), "new plan");
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");
    assert_eq!(outcome.report.preferences, None);
    root.assert_not_exists("mine_preferences.json");
}

#[tokio::test]
async fn test_unrecognised_version_token_takes_upgrade_path() {
    let root = TestRoot::new();
    root.write("windsurf/mine_version", "legacy-build\n");
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert_eq!(
        outcome.action,
        InstallAction::Upgrade {
            from: "legacy-build".into()
        }
    );
    assert_eq!(root.read("windsurf/mine_version"), "3.5.0\n");
}

#[tokio::test]
async fn test_existing_preferences_are_never_overwritten() {
    let root = TestRoot::new();
    root.write("mine_preferences.json", "{\"response_style\": \"verbose\"}");
    let (engine, _) = orchestrator(
        &root,
        single_workflow(),
        MemoryFetcher::serving_everything(),
        fast_options(),
    );

    let outcome = engine.install().await;

    assert_eq!(
        outcome.report.preferences,
        Some(mine_core::BootstrapOutcome::AlreadyPresent)
    );
    assert_eq!(
        root.read("mine_preferences.json"),
        "{\"response_style\": \"verbose\"}"
    );
}
