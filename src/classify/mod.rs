//! Tag classification
//!
//! Assigns every tag one of five categories. The first pass is a per-tag
//! decision list (first match wins):
//!
//! 1. junk (blocklist, too short, no alphanumerics, all digits)
//! 2. case duplicate (another tag normalizes to the same name)
//! 3. semantic duplicate (member of a configured group, not the canonical term)
//! 4. low usage (`usage_count <= low_usage_threshold`)
//! 5. canonical
//!
//! Junk tags never count as case variants of anything.
//!
//! The fuzzy pass then works on the consolidated view: every duplicate group
//! is one unit named after its canonical name with the group's combined
//! usage, and every other non-junk tag is a unit of its own. Near-miss units
//! fold into higher-ranked ones (more usage, then smaller name). The pass is
//! single-hop: an absorbed unit is never a target. Finally a duplicate group
//! whose combined usage is still at or below the threshold is low usage.
//! Classifying the result of one applied round yields no further duplicates.

mod rules;

pub use rules::{canonical_form, junk_reason, JunkReason};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::Config;
use crate::similarity::normalized_similarity;
use crate::tag::{normalize_name, Tag, TagId};

/// Classification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Junk,
    LowUsage,
    CaseDuplicate,
    SemanticDuplicate,
    Canonical,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junk => "junk",
            Self::LowUsage => "low_usage",
            Self::CaseDuplicate => "case_duplicate",
            Self::SemanticDuplicate => "semantic_duplicate",
            Self::Canonical => "canonical",
        }
    }

    /// Duplicates are consolidated rather than deleted
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::CaseDuplicate | Self::SemanticDuplicate)
    }

    /// Junk and low-usage tags are deletion candidates
    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Junk | Self::LowUsage)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the classification was based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// A blocklist term matched the normalized name
    MatchedTerm { term: String },
    /// Fuzzy match against another tag
    SimilarityScore { score: f64, matched: String },
    /// Case-folding key or semantic group name
    GroupKey { key: String },
}

/// Result of classifying one tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub tag_id: TagId,
    pub tag_name: String,
    pub usage_count: u64,
    pub category: Category,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    /// Resolved target name for duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

impl ClassificationResult {
    fn new(tag: &Tag, category: Category, reason: impl Into<String>) -> Self {
        Self {
            tag_id: tag.id.clone(),
            tag_name: tag.name.clone(),
            usage_count: tag.usage_count,
            category,
            reason: reason.into(),
            evidence: None,
            canonical: None,
        }
    }

    fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical = Some(canonical.into());
        self
    }

    /// Junk reason, if this is a junk classification
    pub fn junk_reason(&self) -> Option<&str> {
        (self.category == Category::Junk).then_some(self.reason.as_str())
    }

    /// True when this result came from the fuzzy pass
    pub fn is_fuzzy(&self) -> bool {
        matches!(self.evidence, Some(Evidence::SimilarityScore { .. }))
    }
}

/// Case-folding index over a corpus: normalized name -> literal names
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    variants: HashMap<String, BTreeSet<String>>,
}

impl CorpusIndex {
    pub fn new(corpus: &[Tag]) -> Self {
        let mut variants: HashMap<String, BTreeSet<String>> = HashMap::new();
        for tag in corpus {
            variants.entry(tag.normalized()).or_default().insert(tag.name.clone());
        }
        Self { variants }
    }

    /// Literal names in the corpus that normalize to `normalized`
    pub fn variants(&self, normalized: &str) -> impl Iterator<Item = &String> {
        self.variants.get(normalized).into_iter().flatten()
    }
}

/// Classifier bound to one configuration
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    config: &'a Config,
    semantic: HashMap<String, String>,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            semantic: config.semantic_lookup(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Canonical target name for a duplicate: its semantic group's canonical
    /// term when it belongs to one, otherwise its canonical casing.
    pub fn resolve_canonical(&self, name: &str) -> String {
        match self.semantic.get(&normalize_name(name)) {
            Some(canonical) => canonical.clone(),
            None => canonical_form(name, self.config),
        }
    }

    /// First-pass classification of one tag against a corpus index.
    pub fn classify(&self, tag: &Tag, index: &CorpusIndex) -> ClassificationResult {
        let normalized = tag.normalized();

        if let Some(reason) = junk_reason(&tag.name, self.config) {
            let result = ClassificationResult::new(tag, Category::Junk, reason.as_str());
            return match reason {
                JunkReason::Blocklist => result.with_evidence(Evidence::MatchedTerm { term: normalized }),
                _ => result,
            };
        }

        let others: Vec<&String> = index.variants(&normalized).filter(|v| **v != tag.name).collect();
        if !others.is_empty() {
            let listed: Vec<&str> = others.iter().map(|s| s.as_str()).collect();
            return ClassificationResult::new(
                tag,
                Category::CaseDuplicate,
                format!("case variant of {}", quote_all(&listed)),
            )
            .with_evidence(Evidence::GroupKey { key: normalized })
            .with_canonical(self.resolve_canonical(&tag.name));
        }

        if let Some(canonical) = self.semantic.get(&normalized) {
            if tag.name != *canonical {
                return ClassificationResult::new(
                    tag,
                    Category::SemanticDuplicate,
                    format!("member of semantic group '{}'", canonical),
                )
                .with_evidence(Evidence::GroupKey { key: canonical.clone() })
                .with_canonical(canonical.clone());
            }
        }

        if tag.usage_count <= self.config.low_usage_threshold {
            return ClassificationResult::new(
                tag,
                Category::LowUsage,
                format!(
                    "usage {} <= threshold {}",
                    tag.usage_count, self.config.low_usage_threshold
                ),
            );
        }

        ClassificationResult::new(tag, Category::Canonical, "canonical")
    }

    /// Case-folding index over the tags that survive the junk rules.
    ///
    /// Junk tags are deleted, so they never make another tag a case variant.
    pub fn index(&self, corpus: &[Tag]) -> CorpusIndex {
        let kept: Vec<Tag> = corpus
            .iter()
            .filter(|tag| junk_reason(&tag.name, self.config).is_none())
            .cloned()
            .collect();
        CorpusIndex::new(&kept)
    }

    /// Classify a whole corpus: first pass for every tag, then the fuzzy pass
    /// over the consolidated view, then low-usage groups.
    ///
    /// Results are returned in corpus order.
    pub fn classify_corpus(&self, corpus: &[Tag]) -> Vec<ClassificationResult> {
        let index = self.index(corpus);
        let mut results: Vec<ClassificationResult> =
            corpus.iter().map(|tag| self.classify(tag, &index)).collect();

        let units = consolidate(corpus, &results);
        let absorbed = if self.config.fuzzy_matching {
            self.fuzzy_pass(corpus, &units, &mut results)
        } else {
            vec![false; units.len()]
        };
        self.demote_low_usage_groups(corpus, &units, &absorbed, &mut results);

        tracing::debug!(
            tags = corpus.len(),
            duplicates = results.iter().filter(|r| r.category.is_duplicate()).count(),
            deletable = results.iter().filter(|r| r.category.is_deletable()).count(),
            "classified corpus"
        );
        results
    }

    /// Tags as they will stand once `results` are applied, restricted to the
    /// ones that outlive the low-usage rule. These are the fuzzy targets for
    /// names that are not in the corpus yet.
    pub fn fuzzy_targets(&self, corpus: &[Tag], results: &[ClassificationResult]) -> Vec<Tag> {
        consolidate(corpus, results)
            .into_iter()
            .filter(|unit| unit.tag.usage_count > self.config.low_usage_threshold)
            .map(|unit| unit.tag)
            .collect()
    }

    /// Single-hop fuzzy matching between consolidated units.
    ///
    /// Units are visited in rank order; each may fold into a higher-ranked
    /// unit that has not been absorbed itself and that would survive the
    /// low-usage rule. Every member of an absorbed unit is retargeted at the
    /// matched name. Returns the absorbed flag per unit.
    fn fuzzy_pass(
        &self,
        corpus: &[Tag],
        units: &[Unit],
        results: &mut [ClassificationResult],
    ) -> Vec<bool> {
        let mut order: Vec<usize> = (0..units.len()).collect();
        order.sort_by(|&a, &b| rank_order(&units[a].tag, &units[b].tag));

        let mut absorbed = vec![false; units.len()];
        for &u in &order {
            let pool = order
                .iter()
                .copied()
                .filter(|&v| v != u && !absorbed[v])
                .filter(|&v| units[v].tag.usage_count > self.config.low_usage_threshold)
                .map(|v| (&units[v].tag, units[v].normalized.as_str()));

            let Some((target, score)) = best_fuzzy_match(
                &units[u].tag,
                &units[u].normalized,
                pool,
                self.config.similarity_threshold,
            ) else {
                continue;
            };
            let matched = target.name.clone();
            tracing::trace!(tag = %units[u].tag.name, target = %matched, score, "fuzzy match");

            for &i in &units[u].members {
                results[i] = ClassificationResult::new(
                    &corpus[i],
                    Category::CaseDuplicate,
                    format!("fuzzy match {:.3} with '{}'", score, matched),
                )
                .with_evidence(Evidence::SimilarityScore {
                    score,
                    matched: matched.clone(),
                })
                .with_canonical(matched.clone());
            }
            absorbed[u] = true;
        }
        absorbed
    }

    /// A duplicate group whose combined usage is at or below the threshold
    /// would consolidate into a low-usage tag, so its members are low usage.
    fn demote_low_usage_groups(
        &self,
        corpus: &[Tag],
        units: &[Unit],
        absorbed: &[bool],
        results: &mut [ClassificationResult],
    ) {
        let threshold = self.config.low_usage_threshold;
        for (unit, _) in units
            .iter()
            .zip(absorbed)
            .filter(|(unit, absorbed)| unit.grouped && !**absorbed)
            .filter(|(unit, _)| unit.tag.usage_count <= threshold)
        {
            for &i in &unit.members {
                if !results[i].category.is_duplicate() {
                    continue;
                }
                results[i] = ClassificationResult::new(
                    &corpus[i],
                    Category::LowUsage,
                    format!(
                        "group '{}' usage {} <= threshold {}",
                        unit.tag.name, unit.tag.usage_count, threshold
                    ),
                )
                .with_evidence(Evidence::GroupKey {
                    key: unit.tag.name.clone(),
                });
            }
        }
    }
}

/// One tag as it stands after consolidation: either a duplicate group folded
/// onto its canonical name (plus any tag already carrying that name), or a
/// single canonical or low-usage tag.
#[derive(Debug, Clone)]
struct Unit {
    /// Canonical name, combined usage, smallest member id
    tag: Tag,
    normalized: String,
    /// Corpus indices
    members: Vec<usize>,
    grouped: bool,
}

impl Unit {
    fn new(tag: Tag, members: Vec<usize>, grouped: bool) -> Self {
        Self {
            normalized: tag.normalized(),
            tag,
            members,
            grouped,
        }
    }
}

/// Fold duplicate groups by canonical name. Junk tags are left out.
fn consolidate(corpus: &[Tag], results: &[ClassificationResult]) -> Vec<Unit> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, result) in results.iter().enumerate() {
        if let (true, Some(canonical)) = (result.category.is_duplicate(), result.canonical.as_deref()) {
            groups.entry(canonical).or_default().push(i);
        }
    }

    let mut units = Vec::new();
    for (i, result) in results.iter().enumerate() {
        if !matches!(result.category, Category::Canonical | Category::LowUsage) {
            continue;
        }
        match groups.get_mut(corpus[i].name.as_str()) {
            Some(members) => members.push(i),
            None => units.push(Unit::new(corpus[i].clone(), vec![i], false)),
        }
    }

    for (canonical, members) in groups {
        let usage = members.iter().map(|&i| corpus[i].usage_count).sum();
        let id = members
            .iter()
            .map(|&i| &corpus[i].id)
            .min()
            .cloned()
            .unwrap_or_else(|| TagId::from(""));
        units.push(Unit::new(Tag::new(id, canonical, usage), members, true));
    }
    units
}

/// Rank order: higher usage first, then lexicographically smaller name,
/// then smaller id. `Less` means `a` outranks `b`.
pub fn rank_order(a: &Tag, b: &Tag) -> Ordering {
    b.usage_count
        .cmp(&a.usage_count)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Best fuzzy target for `tag` among `candidates`.
///
/// Only candidates that outrank `tag` and do not share its normalized form
/// qualify. Ties on score prefer higher usage, then the smaller name.
pub fn best_fuzzy_match<'t, I>(
    tag: &Tag,
    normalized: &str,
    candidates: I,
    threshold: f64,
) -> Option<(&'t Tag, f64)>
where
    I: IntoIterator<Item = (&'t Tag, &'t str)>,
{
    let mut best: Option<(&Tag, f64)> = None;
    for (candidate, candidate_norm) in candidates {
        if candidate_norm == normalized || rank_order(candidate, tag) != Ordering::Less {
            continue;
        }
        let score = normalized_similarity(normalized, candidate_norm);
        if score < threshold {
            continue;
        }
        let better = match best {
            None => true,
            Some((current, current_score)) => match score.partial_cmp(&current_score) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => rank_order(candidate, current) == Ordering::Less,
                _ => false,
            },
        };
        if better {
            best = Some((candidate, score));
        }
    }
    best
}

/// Classify one tag against a corpus (first pass only).
pub fn classify(tag: &Tag, corpus: &[Tag], config: &Config) -> ClassificationResult {
    let classifier = Classifier::new(config);
    classifier.classify(tag, &classifier.index(corpus))
}

/// Classify a corpus including the fuzzy pass.
pub fn classify_corpus(corpus: &[Tag], config: &Config) -> Vec<ClassificationResult> {
    Classifier::new(config).classify_corpus(corpus)
}

fn quote_all(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: &str, name: &str, usage: u64) -> Tag {
        Tag::new(id, name, usage)
    }

    fn by_name<'r>(results: &'r [ClassificationResult], name: &str) -> &'r ClassificationResult {
        results.iter().find(|r| r.tag_name == name).unwrap()
    }

    #[test]
    fn case_variants_are_both_duplicates() {
        let corpus = vec![tag("1", "music", 34), tag("2", "Music", 96)];
        let results = classify_corpus(&corpus, &Config::default());

        for r in &results {
            assert_eq!(r.category, Category::CaseDuplicate);
            assert_eq!(r.canonical.as_deref(), Some("Music"));
            assert_eq!(r.evidence, Some(Evidence::GroupKey { key: "music".into() }));
        }
    }

    #[test]
    fn semantic_members_resolve_to_group_canonical() {
        let config = Config::default()
            .without_semantic_groups()
            .with_semantic_group("AI", ["ai", "ml", "machine learning", "llm"]);
        let corpus = vec![
            tag("1", "ai", 2),
            tag("2", "ML", 3),
            tag("3", "Machine Learning", 8),
        ];
        let results = classify_corpus(&corpus, &config);

        for r in &results {
            assert_eq!(r.category, Category::SemanticDuplicate, "{}", r.tag_name);
            assert_eq!(r.canonical.as_deref(), Some("AI"));
        }
    }

    #[test]
    fn group_canonical_term_itself_is_not_a_duplicate() {
        let corpus = vec![tag("1", "AI", 40)];
        let result = classify(&corpus[0], &corpus, &Config::default());
        assert_eq!(result.category, Category::Canonical);
    }

    #[test]
    fn case_duplicate_inside_semantic_group_targets_group() {
        let corpus = vec![tag("1", "llm", 5), tag("2", "LLM", 9)];
        let results = classify_corpus(&corpus, &Config::default());
        for r in &results {
            assert_eq!(r.category, Category::CaseDuplicate);
            assert_eq!(r.canonical.as_deref(), Some("AI"));
        }
    }

    #[test]
    fn junk_wins_regardless_of_usage() {
        let corpus = vec![tag("1", "a", 500), tag("2", "123", 80), tag("3", "stuff", 12)];
        let results = classify_corpus(&corpus, &Config::default());
        assert!(results.iter().all(|r| r.category == Category::Junk));
        assert_eq!(by_name(&results, "123").reason, "all_digits");
        assert_eq!(
            by_name(&results, "stuff").evidence,
            Some(Evidence::MatchedTerm { term: "stuff".into() })
        );
    }

    #[test]
    fn protected_acronym_below_threshold_is_low_usage() {
        let config = Config::default().with_low_usage_threshold(3);
        let corpus = vec![tag("1", "API", 1)];
        let result = classify(&corpus[0], &corpus, &config);
        assert_eq!(result.category, Category::LowUsage);
    }

    #[test]
    fn usage_at_threshold_is_low_usage() {
        let config = Config::default().with_low_usage_threshold(3);
        let corpus = vec![tag("1", "Gardening", 3), tag("2", "Cooking", 4)];
        let results = classify_corpus(&corpus, &config);
        assert_eq!(by_name(&results, "Gardening").category, Category::LowUsage);
        assert_eq!(by_name(&results, "Cooking").category, Category::Canonical);
    }

    #[test]
    fn fuzzy_match_folds_misspelling_into_popular_tag() {
        let corpus = vec![tag("1", "Kubernetes", 40), tag("2", "Kubernets", 1)];
        let results = classify_corpus(&corpus, &Config::default());

        let misspelt = by_name(&results, "Kubernets");
        assert_eq!(misspelt.category, Category::CaseDuplicate);
        assert_eq!(misspelt.canonical.as_deref(), Some("Kubernetes"));
        assert!(misspelt.is_fuzzy());
        assert_eq!(by_name(&results, "Kubernetes").category, Category::Canonical);
    }

    #[test]
    fn fuzzy_pass_can_be_disabled() {
        let config = Config::default().with_fuzzy_matching(false);
        let corpus = vec![tag("1", "Kubernetes", 40), tag("2", "Kubernets", 1)];
        let results = classify_corpus(&corpus, &config);
        assert_eq!(by_name(&results, "Kubernets").category, Category::LowUsage);
    }

    #[test]
    fn fuzzy_matching_is_not_transitive() {
        // "Photograph" ~ "Photography" ~ "Photographs"; the middle tag is
        // absorbed first, so the lowest-ranked tag cannot chain through it.
        let config = Config::default().with_similarity_threshold(0.9);
        let corpus = vec![
            tag("1", "Photography", 50),
            tag("2", "Photographs", 20),
            tag("3", "Photograph", 10),
        ];
        let results = classify_corpus(&corpus, &config);

        assert_eq!(by_name(&results, "Photography").category, Category::Canonical);
        let targets: Vec<_> = results
            .iter()
            .filter(|r| r.is_fuzzy())
            .map(|r| r.canonical.clone().unwrap())
            .collect();
        assert!(targets.iter().all(|t| t == "Photography"), "{:?}", targets);
    }

    #[test]
    fn fuzzy_tie_prefers_higher_usage_then_name() {
        let a = tag("1", "Colour", 10);
        let b = tag("2", "Colors", 10);
        let c = tag("3", "Coloura", 30);
        let source = tag("4", "Colous", 1);
        let na = a.normalized();
        let nb = b.normalized();
        let nc = c.normalized();
        let ns = source.normalized();

        // a and b tie on score and usage: smaller name wins
        let (best, _) = best_fuzzy_match(
            &source,
            &ns,
            vec![(&b, nb.as_str()), (&a, na.as_str())],
            0.5,
        )
        .unwrap();
        assert_eq!(best.name, "Colors");

        // higher score beats usage
        let (best, score) = best_fuzzy_match(
            &source,
            &ns,
            vec![(&c, nc.as_str()), (&a, na.as_str())],
            0.5,
        )
        .unwrap();
        assert_eq!(best.name, "Colour");
        assert!((score - 10.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn case_group_is_a_fuzzy_target_under_its_canonical_name() {
        let corpus = vec![
            tag("1", "design", 30),
            tag("2", "Design", 30),
            tag("3", "Designn", 5),
        ];
        let config = Config::default().without_semantic_groups();
        let results = classify_corpus(&corpus, &config);

        let misspelt = by_name(&results, "Designn");
        assert_eq!(misspelt.category, Category::CaseDuplicate);
        assert_eq!(misspelt.canonical.as_deref(), Some("Design"));
        assert!(misspelt.is_fuzzy());
        assert!(!by_name(&results, "design").is_fuzzy());
    }

    #[test]
    fn case_group_folds_as_one_unit_into_a_better_used_tag() {
        // rust + Rust consolidate to 10 uses, below Rusty's 14
        let corpus = vec![tag("1", "rust", 9), tag("2", "Rust", 1), tag("3", "Rusty", 14)];
        let results = classify_corpus(&corpus, &Config::default());

        for name in ["rust", "Rust"] {
            let r = by_name(&results, name);
            assert_eq!(r.category, Category::CaseDuplicate, "{}", name);
            assert_eq!(r.canonical.as_deref(), Some("Rusty"), "{}", name);
            assert!(r.is_fuzzy(), "{}", name);
        }
        assert_eq!(by_name(&results, "Rusty").category, Category::Canonical);
    }

    #[test]
    fn tag_already_named_after_a_group_moves_with_it() {
        // "AI" is the semantic target of ML/LLM; the group (AI + ML + LLM)
        // is outranked by the similar "AIs"
        let config = Config::default()
            .without_semantic_groups()
            .with_semantic_group("AI", ["ml", "llm"])
            .with_similarity_threshold(0.75);
        let corpus = vec![
            tag("1", "AI", 3),
            tag("2", "ML", 4),
            tag("3", "LLM", 2),
            tag("4", "AIs", 50),
        ];
        let results = classify_corpus(&corpus, &config);
        for name in ["AI", "ML", "LLM"] {
            assert_eq!(by_name(&results, name).canonical.as_deref(), Some("AIs"), "{}", name);
        }
    }

    #[test]
    fn group_with_low_combined_usage_is_low_usage() {
        let corpus = vec![tag("1", "gardening", 1), tag("2", "Gardening", 1), tag("3", "Cooking", 9)];
        let results = classify_corpus(&corpus, &Config::default());
        for name in ["gardening", "Gardening"] {
            let r = by_name(&results, name);
            assert_eq!(r.category, Category::LowUsage, "{}", name);
            assert_eq!(r.evidence, Some(Evidence::GroupKey { key: "Gardening".into() }));
            assert!(r.canonical.is_none());
        }
    }

    #[test]
    fn junk_spelling_does_not_make_a_case_variant() {
        let corpus = vec![tag("1", "XY", 8), tag("2", "xy", 3)];
        let results = classify_corpus(&corpus, &Config::default());
        assert_eq!(by_name(&results, "xy").category, Category::Junk);
        assert_eq!(by_name(&results, "XY").category, Category::Canonical);
    }

    #[test]
    fn classification_is_deterministic() {
        let corpus = vec![
            tag("1", "rust", 3),
            tag("2", "Rust", 12),
            tag("3", "Rustlang", 2),
            tag("4", "xx", 1),
        ];
        let config = Config::default();
        assert_eq!(classify_corpus(&corpus, &config), classify_corpus(&corpus, &config));
    }
}
