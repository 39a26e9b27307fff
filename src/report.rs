//! Analysis reports and human-readable summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::classify::{Category, ClassificationResult};
use crate::config::Config;
use crate::execute::{ExecutionReport, Outcome};
use crate::normalize::NormalizeStats;
use crate::plan::{ConsolidationPlan, OperationKind};
use crate::tag::Tag;

/// Tags used at least this often count as high-use
pub const HIGH_USE_MIN: u64 = 10;

/// Corpus-wide usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub total_tags: usize,
    pub unused: usize,
    pub single_use: usize,
    /// `usage_count <= low_usage_threshold`
    pub low_use: usize,
    /// `usage_count >= HIGH_USE_MIN`
    pub high_use: usize,
    pub total_references: u64,
    pub average_usage: f64,
}

impl UsageStatistics {
    pub fn compute(corpus: &[Tag], low_usage_threshold: u64) -> Self {
        let total_references: u64 = corpus.iter().map(|t| t.usage_count).sum();
        let count = |pred: &dyn Fn(u64) -> bool| corpus.iter().filter(|t| pred(t.usage_count)).count();
        Self {
            total_tags: corpus.len(),
            unused: count(&|u| u == 0),
            single_use: count(&|u| u == 1),
            low_use: count(&|u| u <= low_usage_threshold),
            high_use: count(&|u| u >= HIGH_USE_MIN),
            total_references,
            average_usage: if corpus.is_empty() {
                0.0
            } else {
                total_references as f64 / corpus.len() as f64
            },
        }
    }
}

/// Everything an analysis run found, for audit and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub low_usage_threshold: u64,
    pub similarity_threshold: f64,
    pub statistics: UsageStatistics,
    pub category_counts: BTreeMap<Category, usize>,
    pub junk_reasons: BTreeMap<String, usize>,
    pub fuzzy_matches: usize,
    pub planned_renames: usize,
    pub planned_merges: usize,
    pub planned_deletes: usize,
    pub projected_tag_count: usize,
    pub classifications: Vec<ClassificationResult>,
}

impl AnalysisReport {
    pub fn new(
        corpus: &[Tag],
        classifications: &[ClassificationResult],
        plan: &ConsolidationPlan,
        config: &Config,
    ) -> Self {
        let mut category_counts = BTreeMap::new();
        let mut junk_reasons = BTreeMap::new();
        for result in classifications {
            *category_counts.entry(result.category).or_insert(0) += 1;
            if let Some(reason) = result.junk_reason() {
                *junk_reasons.entry(reason.to_string()).or_insert(0) += 1;
            }
        }

        Self {
            generated_at: Utc::now(),
            low_usage_threshold: config.low_usage_threshold,
            similarity_threshold: config.similarity_threshold,
            statistics: UsageStatistics::compute(corpus, config.low_usage_threshold),
            category_counts,
            junk_reasons,
            fuzzy_matches: classifications.iter().filter(|r| r.is_fuzzy()).count(),
            planned_renames: plan.count(OperationKind::Rename),
            planned_merges: plan.count(OperationKind::Merge),
            planned_deletes: plan.count(OperationKind::Delete),
            projected_tag_count: plan.projected_tag_count(corpus.len()),
            classifications: classifications.to_vec(),
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }
}

const RULE: &str = "================================================================";

pub fn render_analysis(report: &AnalysisReport) -> String {
    let s = &report.statistics;
    let mut out = String::new();
    let _ = writeln!(out, "{}\nTAG ANALYSIS\n{}", RULE, RULE);
    let _ = writeln!(out, "Total tags:          {}", s.total_tags);
    let _ = writeln!(out, "Total references:    {}", s.total_references);
    let _ = writeln!(out, "Average usage:       {:.2}", s.average_usage);
    let _ = writeln!(out, "Unused:              {}", s.unused);
    let _ = writeln!(out, "Single use:          {}", s.single_use);
    let _ = writeln!(out, "Low use (<= {}):      {}", report.low_usage_threshold, s.low_use);
    let _ = writeln!(out, "High use (>= {}):    {}", HIGH_USE_MIN, s.high_use);

    let _ = writeln!(out, "\nCategories");
    for category in [
        Category::Canonical,
        Category::CaseDuplicate,
        Category::SemanticDuplicate,
        Category::LowUsage,
        Category::Junk,
    ] {
        let _ = writeln!(out, "  {:<20} {}", category.as_str(), report.count(category));
    }
    if report.fuzzy_matches > 0 {
        let _ = writeln!(out, "  (of which fuzzy)    {}", report.fuzzy_matches);
    }
    if !report.junk_reasons.is_empty() {
        let _ = writeln!(out, "\nJunk reasons");
        for (reason, n) in &report.junk_reasons {
            let _ = writeln!(out, "  {:<20} {}", reason, n);
        }
    }

    let _ = writeln!(out, "\nPlan");
    let _ = writeln!(out, "  renames             {}", report.planned_renames);
    let _ = writeln!(out, "  merges              {}", report.planned_merges);
    let _ = writeln!(out, "  deletes             {}", report.planned_deletes);
    let _ = writeln!(
        out,
        "  tags {} -> {}",
        s.total_tags, report.projected_tag_count
    );
    out
}

/// One line per operation, in execution order
pub fn render_plan(plan: &ConsolidationPlan) -> String {
    let mut out = String::new();
    for (i, op) in plan.ordered().iter().enumerate() {
        let _ = writeln!(out, "{:>4}. {}", i + 1, op.describe());
    }
    if plan.is_empty() {
        out.push_str("Nothing to do.\n");
    }
    out
}

pub fn render_execution(report: &ExecutionReport) -> String {
    let mut out = String::new();
    let title = if report.mode.is_dry_run() {
        "PLAN EXECUTION (DRY RUN)"
    } else {
        "PLAN EXECUTION"
    };
    let _ = writeln!(out, "{}\n{}\n{}", RULE, title, RULE);
    for entry in &report.entries {
        if matches!(entry.outcome, Outcome::Applied) && entry.affected_item_count == 0 {
            let _ = writeln!(out, "  [{}] {}", entry.outcome.label(), entry.operation.describe());
        } else if matches!(entry.outcome, Outcome::Applied) {
            let _ = writeln!(
                out,
                "  [{}] {} ({} items)",
                entry.outcome.label(),
                entry.operation.describe(),
                entry.affected_item_count
            );
        } else {
            let _ = writeln!(out, "  [{}] {}", entry.outcome, entry.operation.describe());
        }
    }
    let stats = &report.stats;
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Applied:         {}", stats.applied);
    let _ = writeln!(out, "Skipped:         {}", stats.skipped);
    let _ = writeln!(out, "Failed:          {}", stats.failed);
    let _ = writeln!(out, "Items affected:  {}", stats.affected_items);
    if let Some(path) = &report.backup_path {
        let _ = writeln!(out, "Backup:          {}", path.display());
    }
    if let Some(reason) = &report.aborted {
        let _ = writeln!(out, "\nRun aborted: {}", reason);
    } else if report.mode.is_dry_run() {
        let _ = writeln!(out, "\nDry run: no changes were made.");
    }
    out
}

pub fn render_normalize(stats: &NormalizeStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\nNORMALIZATION SUMMARY\n{}", RULE, RULE);
    let _ = writeln!(out, "Items processed:     {}", stats.items_processed);
    let _ = writeln!(out, "Items updated:       {}", stats.items_updated);
    let _ = writeln!(out, "Tags substituted:    {}", stats.tags_substituted);
    let _ = writeln!(out, "Tags fuzzy matched:  {}", stats.tags_fuzzy_matched);
    let _ = writeln!(out, "Tags dropped:        {}", stats.tags_dropped);
    let _ = writeln!(out, "Errors:              {}", stats.errors);
    if let Some(reason) = &stats.aborted {
        let _ = writeln!(out, "\nRun aborted: {}", reason);
    } else if stats.mode.is_dry_run() {
        let _ = writeln!(out, "\nDry run: no changes were made.");
    }
    out
}
