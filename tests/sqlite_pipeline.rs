//! The same consolidation driven through the SQLite store, plus reopen
//!
//! Run with: `cargo test --test sqlite_pipeline`

mod common;

use common::*;
use tagwarden::pipeline::run;
use tagwarden::{
    analyze, execute, Config, ExecutionMode, ItemId, OpenStore, Outcome, SkipReason, SqliteTagStore,
};

#[test]
fn apply_consolidates_fixture() {
    let (store, _dir) = sqlite_store();
    let analysis = analyze(&store, &Config::default()).unwrap();

    let report = execute(&store, &analysis.plan, options(ExecutionMode::Apply)).unwrap();
    assert_eq!(report.stats.failed, 0);
    assert_eq!(snapshot(&store), expected(CONSOLIDATED));
}

#[test]
fn merged_items_carry_target_name() {
    let (store, _dir) = sqlite_store();
    let analysis = analyze(&store, &Config::default()).unwrap();
    execute(&store, &analysis.plan, options(ExecutionMode::Apply)).unwrap();

    // seed-1 was the first "music" item
    let tags = store.item_tags(&ItemId::from("seed-1")).unwrap();
    assert_eq!(tags, Some(vec!["Music".to_string()]));
}

#[test]
fn consolidation_survives_reopen() {
    let (store, dir) = sqlite_store();
    let analysis = analyze(&store, &Config::default()).unwrap();
    execute(&store, &analysis.plan, options(ExecutionMode::Apply)).unwrap();
    drop(store);

    let reopened = SqliteTagStore::open(dir.path().join("tags.db")).unwrap();
    assert_eq!(snapshot(&reopened), expected(CONSOLIDATED));

    let again = execute(&reopened, &analysis.plan, options(ExecutionMode::Apply)).unwrap();
    assert_eq!(again.stats.applied, 0);
    assert!(again
        .entries
        .iter()
        .all(|e| e.outcome == Outcome::skipped(SkipReason::AlreadyApplied)));
}

#[test]
fn dry_run_matches_apply() {
    let config = Config::default();
    let (dry_store, _dry_dir) = sqlite_store();
    let (live_store, _live_dir) = sqlite_store();

    let (_, dry) = run(&dry_store, &config, options(ExecutionMode::DryRun)).unwrap();
    let (_, live) = run(&live_store, &config, options(ExecutionMode::Apply)).unwrap();

    assert!(dry.same_outcomes(&live));
    assert_eq!(snapshot(&dry_store), expected(FIXTURE));
}
