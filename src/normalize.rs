//! Live normalization of recently written items
//!
//! Instead of consolidating the whole store, each recently updated item has
//! its tag names normalized against the current corpus: junk names are
//! dropped, duplicates are replaced by their canonical name, and near-miss
//! spellings are replaced by the established tag they resemble. Cost is
//! bounded by the lookback window, not by the size of the store.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use crate::classify::{best_fuzzy_match, Category, Classifier, CorpusIndex, JunkReason};
use crate::config::Config;
use crate::execute::{ExecutionMode, Throttle, DEFAULT_CALL_DELAY, DEFAULT_RETRY_DELAY};
use crate::storage::artifacts::write_backup;
use crate::storage::{StorageError, StorageResult, TagStore};
use crate::tag::{normalize_name, RecentItem, Tag, TagId};

/// Default lookback window in minutes
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 15;

/// What happens to one tag name
#[derive(Debug, Clone, PartialEq)]
pub enum TagDecision {
    Keep,
    Substitute {
        canonical: String,
        /// Similarity score when the substitution came from fuzzy matching
        fuzzy: Option<f64>,
    },
    Drop {
        reason: JunkReason,
    },
}

/// An item's normalized tag set plus what changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTags {
    pub tags: Vec<String>,
    pub substituted: usize,
    pub fuzzy_matched: usize,
    pub dropped: usize,
}

impl NormalizedTags {
    /// True when `tags` differs from the input list
    pub fn changed_from(&self, original: &[String]) -> bool {
        self.tags.as_slice() != original
    }
}

/// Normalizer bound to one corpus snapshot
pub struct LiveNormalizer<'a> {
    classifier: Classifier<'a>,
    index: CorpusIndex,
    /// Consolidated corpus tags with their normalized names (fuzzy targets)
    candidates: Vec<(Tag, String)>,
    by_name: HashMap<String, Tag>,
}

impl<'a> LiveNormalizer<'a> {
    pub fn new(corpus: &[Tag], config: &'a Config) -> Self {
        let classifier = Classifier::new(config);
        let results = classifier.classify_corpus(corpus);
        let candidates = classifier
            .fuzzy_targets(corpus, &results)
            .into_iter()
            .map(|tag| {
                let normalized = tag.normalized();
                (tag, normalized)
            })
            .collect();

        Self {
            index: classifier.index(corpus),
            by_name: corpus.iter().map(|t| (t.name.clone(), t.clone())).collect(),
            candidates,
            classifier,
        }
    }

    /// Decide what to do with one tag name.
    ///
    /// Names unknown to the corpus are judged as brand-new tags with no usage.
    pub fn decide(&self, name: &str) -> TagDecision {
        let tag = self
            .by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| Tag::new(TagId::from(""), name, 0));
        let result = self.classifier.classify(&tag, &self.index);

        match result.category {
            Category::Junk => match crate::classify::junk_reason(name, self.classifier.config()) {
                Some(reason) => TagDecision::Drop { reason },
                None => TagDecision::Keep,
            },
            Category::CaseDuplicate | Category::SemanticDuplicate => match result.canonical {
                Some(canonical) if canonical != name => TagDecision::Substitute {
                    canonical,
                    fuzzy: None,
                },
                _ => TagDecision::Keep,
            },
            Category::LowUsage | Category::Canonical => {
                if !self.classifier.config().fuzzy_matching {
                    return TagDecision::Keep;
                }
                let normalized = tag.normalized();
                let pool = self.candidates.iter().map(|(t, n)| (t, n.as_str()));
                match best_fuzzy_match(
                    &tag,
                    &normalized,
                    pool,
                    self.classifier.config().similarity_threshold,
                ) {
                    Some((target, score)) => TagDecision::Substitute {
                        canonical: target.name.clone(),
                        fuzzy: Some(score),
                    },
                    None => TagDecision::Keep,
                }
            }
        }
    }

    /// Normalize a list of tag names, deduplicating by normalized name (first
    /// occurrence wins).
    pub fn normalize(&self, names: &[String]) -> NormalizedTags {
        let mut out = NormalizedTags::default();
        let mut seen: HashSet<String> = HashSet::new();

        for name in names {
            let resolved = match self.decide(name) {
                TagDecision::Keep => name.clone(),
                TagDecision::Substitute { canonical, fuzzy } => {
                    out.substituted += 1;
                    if fuzzy.is_some() {
                        out.fuzzy_matched += 1;
                    }
                    canonical
                }
                TagDecision::Drop { reason } => {
                    tracing::trace!(tag = %name, %reason, "dropping junk tag");
                    out.dropped += 1;
                    continue;
                }
            };
            if seen.insert(normalize_name(&resolved)) {
                out.tags.push(resolved);
            }
        }
        out
    }
}

/// Normalize one item's tags against a corpus snapshot.
pub fn normalize_item_tags(item: &RecentItem, recent_corpus: &[Tag], config: &Config) -> Vec<String> {
    LiveNormalizer::new(recent_corpus, config)
        .normalize(&item.tag_names)
        .tags
}

/// Options for a live normalization run
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub mode: ExecutionMode,
    pub window: chrono::Duration,
    pub call_delay: Duration,
    pub retry_delay: Duration,
    pub backup_dir: Option<PathBuf>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::DryRun,
            window: chrono::Duration::minutes(DEFAULT_LOOKBACK_MINUTES),
            call_delay: DEFAULT_CALL_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            backup_dir: None,
        }
    }
}

impl NormalizeOptions {
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_lookback_minutes(mut self, minutes: i64) -> Self {
        self.window = chrono::Duration::minutes(minutes);
        self
    }

    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.call_delay = Duration::ZERO;
        self.retry_delay = Duration::ZERO;
        self
    }

    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }
}

/// Counters for one live normalization run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub mode: ExecutionMode,
    pub items_processed: usize,
    /// Items written back (or, in a dry run, that would be)
    pub items_updated: usize,
    pub tags_substituted: usize,
    pub tags_fuzzy_matched: usize,
    pub tags_dropped: usize,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

/// Normalize every item updated within the lookback window.
///
/// Reading the corpus or the recent items is fatal; per-item write failures
/// are counted and the run continues, except credential failures which stop
/// it.
pub fn normalize_recent(
    store: &dyn TagStore,
    config: &Config,
    options: &NormalizeOptions,
) -> StorageResult<NormalizeStats> {
    let mut throttle = Throttle::new(options.call_delay, options.retry_delay);
    let mut stats = NormalizeStats {
        mode: options.mode,
        ..NormalizeStats::default()
    };

    let corpus = throttle.call("list_tags", || store.list_tags())?;
    let items = throttle.call("list_recent_items", || store.list_recent_items(options.window))?;
    tracing::info!(
        tags = corpus.len(),
        items = items.len(),
        window_minutes = options.window.num_minutes(),
        "normalizing recent items"
    );

    let normalizer = LiveNormalizer::new(&corpus, config);
    let mut updates: Vec<(&RecentItem, Vec<String>)> = Vec::new();
    for item in &items {
        stats.items_processed += 1;
        let result = normalizer.normalize(&item.tag_names);
        stats.tags_substituted += result.substituted;
        stats.tags_fuzzy_matched += result.fuzzy_matched;
        stats.tags_dropped += result.dropped;
        if result.changed_from(&item.tag_names) {
            tracing::debug!(
                item = %item.item_id,
                old = ?item.tag_names,
                new = ?result.tags,
                "normalized item tags"
            );
            updates.push((item, result.tags));
        }
    }

    if options.mode.is_dry_run() {
        stats.items_updated = updates.len();
        return Ok(stats);
    }

    if let (Some(dir), false) = (&options.backup_dir, updates.is_empty()) {
        stats.backup_path = Some(write_backup(dir, &corpus)?);
    }

    for (item, tags) in updates {
        match throttle.call("replace_item_tags", || store.replace_item_tags(&item.item_id, &tags)) {
            Ok(()) => stats.items_updated += 1,
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(item = %item.item_id, "item vanished before write-back");
            }
            Err(err) if err.is_auth() => {
                tracing::error!(error = %err, "store rejected credentials, aborting run");
                stats.errors += 1;
                stats.aborted = Some(err.to_string());
                break;
            }
            Err(err) => {
                tracing::warn!(item = %item.item_id, error = %err, "failed to update item tags");
                stats.errors += 1;
            }
        }
    }

    tracing::info!(
        processed = stats.items_processed,
        updated = stats.items_updated,
        errors = stats.errors,
        "normalization finished"
    );
    Ok(stats)
}
