//! Tagwarden: tag corpus hygiene for bookmark and note stores
//!
//! Tag sets written by hand and by automated taggers drift: the same idea
//! shows up as `music`, `Music` and `MUSIC`, synonyms pile up, and junk like
//! `123` or `stuff` sticks around. Tagwarden classifies every tag in a
//! corpus, turns the findings into a consolidation plan of renames, merges
//! and deletes, and executes that plan against a store, defensively and
//! with a dry-run mode that reports exactly what an apply run would do.
//!
//! # Core Concepts
//!
//! - **Classification**: every tag falls into exactly one [`Category`]
//! - **Plan**: an ordered, validated list of [`Operation`]s
//! - **Executor**: re-checks live store state before each operation and
//!   skips, rather than fails, anything that no longer applies
//! - **Live normalization**: recently written items are cleaned against the
//!   current corpus without touching the rest of the store
//!
//! # Example
//!
//! ```
//! use tagwarden::{analyze, Config, MemoryTagStore};
//!
//! let store = MemoryTagStore::new();
//! store.seed_tag("music", 3).unwrap();
//! store.seed_tag("Music", 12).unwrap();
//!
//! let analysis = analyze(&store, &Config::default()).unwrap();
//! assert!(!analysis.plan.is_empty());
//! ```

pub mod classify;
pub mod config;
pub mod execute;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod similarity;
pub mod storage;
pub mod tag;

pub use classify::{classify, classify_corpus, Category, ClassificationResult, Classifier, Evidence};
pub use config::{Config, ConfigError};
pub use execute::{
    execute, ExecuteError, ExecutionMode, ExecutionReport, ExecutorOptions, Outcome, PlanExecutor,
    SkipReason,
};
pub use normalize::{normalize_item_tags, normalize_recent, LiveNormalizer, NormalizeOptions, NormalizeStats};
pub use pipeline::{analyze, Analysis, PipelineError};
pub use plan::{build, ConsolidationPlan, DeleteReason, MergeTarget, Operation, PlanError};
pub use report::{AnalysisReport, UsageStatistics};
pub use similarity::{normalized_similarity, similarity};
pub use storage::{
    MemoryTagStore, OpenStore, PlanDocument, SqliteTagStore, StorageError, StorageResult, TagStore,
};
pub use tag::{ItemId, RecentItem, Tag, TagId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
