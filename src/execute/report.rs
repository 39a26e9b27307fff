//! Execution report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ExecutionMode;
use crate::plan::Operation;

/// Why an operation was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The store already reflects the operation
    AlreadyApplied,
    /// The subject vanished since analysis
    NotFound,
    /// Store state no longer satisfies the operation's precondition
    Conflict { detail: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyApplied => f.write_str("already applied"),
            Self::NotFound => f.write_str("not found"),
            Self::Conflict { detail } => write!(f, "conflict: {}", detail),
        }
    }
}

/// Terminal state of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl Outcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Skipped { reason } => write!(f, "skipped ({})", reason),
            Self::Failed { error } => write!(f, "failed ({})", error),
        }
    }
}

/// Report entry for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub operation: Operation,
    pub outcome: Outcome,
    /// Items touched (or, in a dry run, that would be touched)
    pub affected_item_count: u64,
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub affected_items: u64,
}

impl RunStats {
    fn record(&mut self, entry: &OperationReport) {
        match entry.outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        self.affected_items += entry.affected_item_count;
    }

    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

/// Result of one executor run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<OperationReport>,
    pub stats: RunStats,
    /// Set when the run stopped early (credential failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    /// Backup written before the first mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

impl ExecutionReport {
    pub fn new(mode: ExecutionMode) -> Self {
        let now = Utc::now();
        Self {
            mode,
            started_at: now,
            finished_at: now,
            entries: Vec::new(),
            stats: RunStats::default(),
            aborted: None,
            backup_path: None,
        }
    }

    pub fn push(&mut self, entry: OperationReport) {
        self.stats.record(&entry);
        self.entries.push(entry);
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// True when both runs reached the same outcomes, ignoring mode,
    /// timing and backups.
    pub fn same_outcomes(&self, other: &ExecutionReport) -> bool {
        self.entries == other.entries && self.stats == other.stats && self.aborted == other.aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DeleteReason;

    fn entry(outcome: Outcome, affected: u64) -> OperationReport {
        OperationReport {
            operation: Operation::Delete {
                tag_id: "1".into(),
                name: "stuff".into(),
                reason: DeleteReason::Junk,
                usage_at_analysis: 0,
            },
            outcome,
            affected_item_count: affected,
        }
    }

    #[test]
    fn stats_accumulate_per_outcome() {
        let mut report = ExecutionReport::new(ExecutionMode::Apply);
        report.push(entry(Outcome::Applied, 4));
        report.push(entry(Outcome::skipped(SkipReason::AlreadyApplied), 0));
        report.push(entry(Outcome::Failed { error: "boom".into() }, 2));

        assert_eq!(
            report.stats,
            RunStats {
                applied: 1,
                skipped: 1,
                failed: 1,
                affected_items: 6
            }
        );
        assert_eq!(report.stats.total(), 3);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::skipped(SkipReason::Conflict {
            detail: "usage rose".into(),
        }))
        .unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"]["kind"], "conflict");
        assert_eq!(json["reason"]["detail"], "usage rose");
    }

    #[test]
    fn same_outcomes_ignores_mode_and_time() {
        let mut dry = ExecutionReport::new(ExecutionMode::DryRun);
        let mut live = ExecutionReport::new(ExecutionMode::Apply);
        dry.push(entry(Outcome::Applied, 3));
        live.push(entry(Outcome::Applied, 3));
        live.backup_path = Some(PathBuf::from("/tmp/backup.json"));
        assert!(dry.same_outcomes(&live));

        live.push(entry(Outcome::Applied, 1));
        assert!(!dry.same_outcomes(&live));
    }
}
