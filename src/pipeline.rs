//! End-to-end runs: read the corpus, classify, plan, execute

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classify::{classify_corpus, ClassificationResult};
use crate::config::Config;
use crate::execute::{
    execute, ExecuteError, ExecutionReport, ExecutorOptions, Throttle, DEFAULT_CALL_DELAY,
    DEFAULT_RETRY_DELAY,
};
use crate::plan::{build, ConsolidationPlan, PlanError};
use crate::report::AnalysisReport;
use crate::storage::artifacts::write_backup;
use crate::storage::{PlanDocument, StorageError, TagStore};
use crate::tag::Tag;

/// Errors from a whole pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// A corpus snapshot with its classifications and the plan derived from them
#[derive(Debug, Clone)]
pub struct Analysis {
    pub corpus: Vec<Tag>,
    pub classifications: Vec<ClassificationResult>,
    pub plan: ConsolidationPlan,
}

impl Analysis {
    /// Classify and plan an already-fetched corpus.
    pub fn of_corpus(corpus: Vec<Tag>, config: &Config) -> PipelineResult<Self> {
        let classifications = classify_corpus(&corpus, config);
        let plan = build(&classifications, &corpus)?;
        Ok(Self {
            corpus,
            classifications,
            plan,
        })
    }

    pub fn report(&self, config: &Config) -> AnalysisReport {
        AnalysisReport::new(&self.corpus, &self.classifications, &self.plan, config)
    }

    /// Wrap the plan for saving, stamped with the thresholds it was built with
    pub fn document(&self, config: &Config) -> PlanDocument {
        PlanDocument::new(self.plan.clone(), config)
    }
}

/// Read the corpus and analyze it. Nothing is written.
///
/// The read is paced and retried once on a transient error, with the default
/// delays.
pub fn analyze(store: &dyn TagStore, config: &Config) -> PipelineResult<Analysis> {
    let mut throttle = Throttle::new(DEFAULT_CALL_DELAY, DEFAULT_RETRY_DELAY);
    analyze_with(store, config, &mut throttle)
}

/// [`analyze`] with the caller's throttle.
pub fn analyze_with(
    store: &dyn TagStore,
    config: &Config,
    throttle: &mut Throttle,
) -> PipelineResult<Analysis> {
    let corpus = throttle.call("list_tags", || store.list_tags())?;
    tracing::info!(tags = corpus.len(), "analyzing tag corpus");
    Analysis::of_corpus(corpus, config)
}

/// Snapshot every tag into a new backup file under `dir`.
///
/// Returns the file path and the number of tags written.
pub fn backup(store: &dyn TagStore, dir: &Path) -> PipelineResult<(PathBuf, usize)> {
    let mut throttle = Throttle::new(DEFAULT_CALL_DELAY, DEFAULT_RETRY_DELAY);
    let tags = throttle.call("list_tags", || store.list_tags())?;
    let path = write_backup(dir, &tags)?;
    Ok((path, tags.len()))
}

/// Analyze, then execute the resulting plan with `options`.
pub fn run(
    store: &dyn TagStore,
    config: &Config,
    options: ExecutorOptions,
) -> PipelineResult<(Analysis, ExecutionReport)> {
    let mut throttle = Throttle::new(options.call_delay, options.retry_delay);
    let analysis = analyze_with(store, config, &mut throttle)?;
    let options = options.with_low_usage_threshold(config.low_usage_threshold);
    let report = execute(store, &analysis.plan, options)?;
    Ok((analysis, report))
}
