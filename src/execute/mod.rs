//! Plan execution
//!
//! Runs a validated plan against a tag store: renames first, then merges, then
//! deletes. Every operation re-reads the store before acting, so changes made
//! since analysis turn into `skipped` entries rather than damage. A dry run
//! issues the same reads and makes the same decisions but never mutates.
//!
//! Failures are isolated per operation. Only a credential failure stops the
//! run early; the report is still returned so partial progress is visible.

mod report;
mod throttle;

pub use report::{ExecutionReport, OperationReport, Outcome, RunStats, SkipReason};
pub use throttle::Throttle;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::DEFAULT_LOW_USAGE_THRESHOLD;
use crate::plan::{ConsolidationPlan, MergeTarget, Operation, PlanError};
use crate::storage::artifacts::write_backup;
use crate::storage::{StorageError, StorageResult, TagStore};
use crate::tag::{Tag, TagId};

/// Default pause between store calls
pub const DEFAULT_CALL_DELAY: Duration = Duration::from_millis(100);

/// Default pause before retrying a transient failure
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Whether mutations are issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    DryRun,
    Apply,
}

impl ExecutionMode {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DryRun => f.write_str("dry-run"),
            Self::Apply => f.write_str("apply"),
        }
    }
}

/// Errors that stop a run before any operation is attempted
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Validation(#[from] PlanError),

    #[error("Backup failed, no changes were made: {0}")]
    Backup(#[source] StorageError),
}

/// Executor knobs
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub mode: ExecutionMode,
    /// Deletes are skipped once usage rises above this (or above the usage
    /// recorded at analysis, whichever is larger)
    pub low_usage_threshold: u64,
    pub call_delay: Duration,
    pub retry_delay: Duration,
    /// Where to write the pre-run backup in apply mode; `None` disables it
    pub backup_dir: Option<PathBuf>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::DryRun,
            low_usage_threshold: DEFAULT_LOW_USAGE_THRESHOLD,
            call_delay: DEFAULT_CALL_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            backup_dir: None,
        }
    }
}

impl ExecutorOptions {
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_low_usage_threshold(mut self, threshold: u64) -> Self {
        self.low_usage_threshold = threshold;
        self
    }

    /// Set both the inter-call and retry delays to zero (tests, local stores)
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.call_delay = Duration::ZERO;
        self.retry_delay = Duration::ZERO;
        self
    }

    #[must_use]
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }
}

/// An operation that did not complete, with whatever it got through
struct Failure {
    error: StorageError,
    affected: u64,
}

impl From<StorageError> for Failure {
    fn from(error: StorageError) -> Self {
        Self { error, affected: 0 }
    }
}

type Step = Result<(Outcome, u64), Failure>;

fn skip(reason: SkipReason) -> Step {
    Ok((Outcome::skipped(reason), 0))
}

/// Executes consolidation plans against one store
pub struct PlanExecutor<'a> {
    store: &'a dyn TagStore,
    options: ExecutorOptions,
    throttle: Throttle,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(store: &'a dyn TagStore, options: ExecutorOptions) -> Self {
        let throttle = Throttle::new(options.call_delay, options.retry_delay);
        Self {
            store,
            options,
            throttle,
        }
    }

    /// Store calls issued so far, retries included
    pub fn calls(&self) -> usize {
        self.throttle.calls()
    }

    fn dry_run(&self) -> bool {
        self.options.mode.is_dry_run()
    }

    fn call<T>(
        &mut self,
        what: &str,
        mut f: impl FnMut(&dyn TagStore) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let store = self.store;
        self.throttle.call(what, || f(store))
    }

    /// Execute a plan.
    ///
    /// The plan is validated first; an invalid plan is rejected before any
    /// store call. In apply mode a backup is written before the first
    /// mutation when a backup directory is configured.
    pub fn execute(&mut self, plan: &ConsolidationPlan) -> Result<ExecutionReport, ExecuteError> {
        plan.validate()?;

        let mut report = ExecutionReport::new(self.options.mode);
        tracing::info!(mode = %self.options.mode, operations = plan.len(), "executing plan");

        if !self.dry_run() {
            if let Some(dir) = self.options.backup_dir.clone() {
                let tags = self
                    .call("list_tags", |s| s.list_tags())
                    .map_err(ExecuteError::Backup)?;
                let path = write_backup(&dir, &tags).map_err(ExecuteError::Backup)?;
                report.backup_path = Some(path);
            }
        }

        for op in plan.ordered() {
            let (outcome, affected, fatal) = match self.run(op) {
                Ok((outcome, affected)) => (outcome, affected, None),
                Err(Failure { error, affected }) => {
                    let fatal = error.is_auth().then(|| error.to_string());
                    (
                        Outcome::Failed {
                            error: error.to_string(),
                        },
                        affected,
                        fatal,
                    )
                }
            };

            match &outcome {
                Outcome::Applied => {
                    tracing::debug!(op = %op.describe(), affected, "applied")
                }
                Outcome::Skipped {
                    reason: SkipReason::AlreadyApplied,
                } => {
                    tracing::debug!(op = %op.describe(), "already applied")
                }
                Outcome::Skipped { reason } => {
                    tracing::warn!(op = %op.describe(), %reason, "skipped")
                }
                Outcome::Failed { error } => {
                    tracing::warn!(op = %op.describe(), %error, affected, "failed")
                }
            }

            report.push(OperationReport {
                operation: op.clone(),
                outcome,
                affected_item_count: affected,
            });

            if let Some(reason) = fatal {
                tracing::error!(error = %reason, "store rejected credentials, aborting run");
                report.aborted = Some(reason);
                break;
            }
        }

        report.finish();
        tracing::info!(
            mode = %report.mode,
            applied = report.stats.applied,
            skipped = report.stats.skipped,
            failed = report.stats.failed,
            affected = report.stats.affected_items,
            "plan execution finished"
        );
        Ok(report)
    }

    fn run(&mut self, op: &Operation) -> Step {
        match op {
            Operation::Rename { tag_id, new_name, .. } => self.rename(tag_id, new_name),
            Operation::MergeInto {
                sources,
                target,
                resulting_name,
                ..
            } => self.merge(sources, target, resulting_name),
            Operation::Delete {
                tag_id,
                usage_at_analysis,
                ..
            } => self.delete(tag_id, *usage_at_analysis),
        }
    }

    fn rename(&mut self, tag_id: &TagId, new_name: &str) -> Step {
        let Some(tag) = self.call("get_tag", |s| s.get_tag(tag_id))? else {
            return skip(SkipReason::NotFound);
        };
        if tag.name == new_name {
            return skip(SkipReason::AlreadyApplied);
        }
        if self.dry_run() {
            return Ok((Outcome::Applied, tag.usage_count));
        }

        match self.call("rename_tag", |s| s.rename_tag(tag_id, new_name)) {
            Ok(()) => Ok((Outcome::Applied, tag.usage_count)),
            Err(StorageError::NotFound(_)) => skip(SkipReason::NotFound),
            Err(StorageError::Conflict(detail)) => skip(SkipReason::Conflict { detail }),
            Err(err) => Err(err.into()),
        }
    }

    fn merge(&mut self, sources: &BTreeSet<TagId>, target: &MergeTarget, resulting_name: &str) -> Step {
        let target_id = target.tag_id();

        let mut live: Vec<Tag> = Vec::new();
        for id in sources {
            if Some(id) == target_id {
                continue;
            }
            if let Some(tag) = self.call("get_tag", |s| s.get_tag(id))? {
                live.push(tag);
            }
        }
        if live.is_empty() {
            return skip(SkipReason::AlreadyApplied);
        }

        let target_name = self.resolve_target(target, resulting_name)?;

        let mut moved = 0u64;
        for source in &live {
            let items = self
                .call("list_items_with_tag", |s| s.list_items_with_tag(&source.id))
                .map_err(|error| Failure { error, affected: moved })?;

            for item in &items {
                if self.dry_run() {
                    moved += 1;
                    continue;
                }
                match self.call("reassign_item_tag", |s| {
                    s.reassign_item_tag(item, &source.name, &target_name)
                }) {
                    Ok(()) => moved += 1,
                    Err(StorageError::NotFound(_)) => {
                        tracing::debug!(item = %item, "item vanished during merge");
                    }
                    Err(error) => return Err(Failure { error, affected: moved }),
                }
            }

            if !self.dry_run() {
                match self.call("delete_tag", |s| s.delete_tag(&source.id)) {
                    Ok(()) | Err(StorageError::NotFound(_)) => {}
                    Err(error) => return Err(Failure { error, affected: moved }),
                }
            }
        }

        Ok((Outcome::Applied, moved))
    }

    /// Current name of the merge target, creating it when it has to exist.
    fn resolve_target(&mut self, target: &MergeTarget, resulting_name: &str) -> Result<String, Failure> {
        let wanted = match target {
            MergeTarget::ExistingTag { tag_id } => {
                if let Some(tag) = self.call("get_tag", |s| s.get_tag(tag_id))? {
                    return Ok(tag.name);
                }
                tracing::warn!(tag_id = %tag_id, name = resulting_name, "merge target vanished, recreating by name");
                resulting_name
            }
            MergeTarget::NewName { name } => name.as_str(),
        };
        if !self.dry_run() {
            self.call("create_or_get_tag", |s| s.create_or_get_tag(wanted))?;
        }
        Ok(wanted.to_string())
    }

    fn delete(&mut self, tag_id: &TagId, usage_at_analysis: u64) -> Step {
        let Some(tag) = self.call("get_tag", |s| s.get_tag(tag_id))? else {
            return skip(SkipReason::AlreadyApplied);
        };

        let ceiling = self.options.low_usage_threshold.max(usage_at_analysis);
        if tag.usage_count > ceiling {
            return skip(SkipReason::Conflict {
                detail: format!(
                    "usage rose from {} to {} since analysis",
                    usage_at_analysis, tag.usage_count
                ),
            });
        }
        if self.dry_run() {
            return Ok((Outcome::Applied, tag.usage_count));
        }

        match self.call("delete_tag", |s| s.delete_tag(tag_id)) {
            Ok(()) => Ok((Outcome::Applied, tag.usage_count)),
            Err(StorageError::NotFound(_)) => skip(SkipReason::AlreadyApplied),
            Err(err) => Err(err.into()),
        }
    }
}

/// Execute a plan with the given options.
pub fn execute(
    store: &dyn TagStore,
    plan: &ConsolidationPlan,
    options: ExecutorOptions,
) -> Result<ExecutionReport, ExecuteError> {
    PlanExecutor::new(store, options).execute(plan)
}
