//! Classification configuration
//!
//! [`Config`] is an immutable value passed into the classifier, plan builder
//! and live normalizer. All fields have defaults taken from the curated lists
//! the tagger cleanup has always used; override them from a YAML file, a
//! plain-text blocklist, or environment variables.
//!
//! # Environment Variable Overrides
//!
//! | Variable                          | Field                  |
//! |-----------------------------------|------------------------|
//! | `TAGWARDEN_LOW_USAGE_THRESHOLD`   | `low_usage_threshold`  |
//! | `TAGWARDEN_SIMILARITY_THRESHOLD`  | `similarity_threshold` |
//!
//! # YAML
//!
//! ```yaml
//! low_usage_threshold: 3
//! similarity_threshold: 0.9
//! semantic_groups:
//!   AI: [ai, ml, machine learning, llm]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tag::normalize_name;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default low-usage threshold (tags used by at most this many items)
pub const DEFAULT_LOW_USAGE_THRESHOLD: u64 = 2;

/// Default fuzzy-match threshold
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lowercase terms that are never useful as tags
    pub junk_blocklist: BTreeSet<String>,

    /// Lowercase acronyms exempt from the short-name junk rule and rendered
    /// upper-case in canonical names
    pub protected_acronyms: BTreeSet<String>,

    /// Tags with `usage_count <= low_usage_threshold` are deletable
    pub low_usage_threshold: u64,

    /// Minimum similarity for a fuzzy merge (0.0–1.0)
    pub similarity_threshold: f64,

    /// Run the fuzzy pass at all
    pub fuzzy_matching: bool,

    /// Canonical term -> synonymous member terms
    pub semantic_groups: BTreeMap<String, BTreeSet<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            junk_blocklist: to_set(DEFAULT_BLOCKLIST),
            protected_acronyms: to_set(DEFAULT_ACRONYMS),
            low_usage_threshold: DEFAULT_LOW_USAGE_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            fuzzy_matching: true,
            semantic_groups: DEFAULT_SEMANTIC_GROUPS
                .iter()
                .map(|(canonical, members)| (canonical.to_string(), to_set(members)))
                .collect(),
        }
    }
}

impl Config {
    /// Parse a YAML document, normalize it and validate it.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Extend the blocklist from a plain-text file: one term per line,
    /// blank lines and `#` comments ignored.
    pub fn with_blocklist_file(mut self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.junk_blocklist.len();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.junk_blocklist.insert(normalize_name(line));
        }
        tracing::info!(
            path = %path.display(),
            added = self.junk_blocklist.len() - before,
            "extended junk blocklist"
        );
        Ok(self)
    }

    /// Apply environment variable overrides. Invalid values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var("TAGWARDEN_LOW_USAGE_THRESHOLD")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.low_usage_threshold = n;
        }
        if let Some(t) = std::env::var("TAGWARDEN_SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|t| (0.0..=1.0).contains(t))
        {
            self.similarity_threshold = t;
        }
        self
    }

    #[must_use]
    pub fn with_low_usage_threshold(mut self, threshold: u64) -> Self {
        self.low_usage_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_fuzzy_matching(mut self, enabled: bool) -> Self {
        self.fuzzy_matching = enabled;
        self
    }

    #[must_use]
    pub fn with_blocklist<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.junk_blocklist = terms.into_iter().map(|t| normalize_name(t.as_ref())).collect();
        self
    }

    #[must_use]
    pub fn with_protected_acronyms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.protected_acronyms = terms.into_iter().map(|t| normalize_name(t.as_ref())).collect();
        self
    }

    /// Replace all semantic groups.
    #[must_use]
    pub fn without_semantic_groups(mut self) -> Self {
        self.semantic_groups.clear();
        self
    }

    /// Add (or replace) one semantic group.
    #[must_use]
    pub fn with_semantic_group<I, S>(mut self, canonical: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.semantic_groups.insert(
            canonical.into(),
            members.into_iter().map(|m| normalize_name(m.as_ref())).collect(),
        );
        self
    }

    /// Lowercase and trim every term so lookups can use normalized names.
    #[must_use]
    pub fn normalized(self) -> Self {
        let norm = |set: BTreeSet<String>| -> BTreeSet<String> {
            set.iter().map(|t| normalize_name(t)).filter(|t| !t.is_empty()).collect()
        };
        Self {
            junk_blocklist: norm(self.junk_blocklist),
            protected_acronyms: norm(self.protected_acronyms),
            semantic_groups: self
                .semantic_groups
                .into_iter()
                .map(|(canonical, members)| (canonical.trim().to_string(), norm(members)))
                .collect(),
            ..self
        }
    }

    /// Check thresholds and semantic-group consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        let mut owner: HashMap<String, &str> = HashMap::new();
        for (canonical, members) in &self.semantic_groups {
            if canonical.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "semantic group with an empty canonical name".to_string(),
                ));
            }
            let canonical_norm = normalize_name(canonical);
            for term in members.iter().chain(std::iter::once(&canonical_norm)) {
                if let Some(previous) = owner.insert(term.clone(), canonical.as_str()) {
                    if previous != canonical.as_str() {
                        return Err(ConfigError::Invalid(format!(
                            "term '{}' belongs to both semantic groups '{}' and '{}'",
                            term, previous, canonical
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_blocklisted(&self, normalized: &str) -> bool {
        self.junk_blocklist.contains(normalized)
    }

    pub fn is_protected_acronym(&self, normalized: &str) -> bool {
        self.protected_acronyms.contains(normalized)
    }

    /// Map each normalized member term (and each group's own normalized
    /// canonical name) to the group's canonical term.
    pub fn semantic_lookup(&self) -> HashMap<String, String> {
        let mut lookup = HashMap::new();
        for (canonical, members) in &self.semantic_groups {
            lookup.insert(normalize_name(canonical), canonical.clone());
            for member in members {
                lookup.insert(member.clone(), canonical.clone());
            }
        }
        lookup
    }
}

fn to_set(terms: &[&str]) -> BTreeSet<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

const DEFAULT_BLOCKLIST: &[&str] = &[
    // verbs
    "avoid", "feel", "sign", "read", "view", "click", "get", "make", "see", "go", "come", "take",
    "give", "find", "use", "tell", "ask", "work", "seem", "try", "leave", "call", "keep", "let",
    "begin", "help", "show", "hear", "run", "move", "live", "believe", "bring", "happen", "write",
    "sit", "stand", "lose", "pay", "meet", "include",
    // generic nouns
    "thing", "stuff", "item", "place", "time", "way", "room", "area", "part", "case", "point",
    "group", "number", "fact", "hand", "eye", "side", "head", "house", "service", "program",
    "question", "problem", "level", "form", "kind", "type", "sort",
    // generic adjectives
    "good", "bad", "new", "old", "great", "small", "large", "big", "little", "high", "low",
    "long", "short", "different", "same", "important", "public", "able", "own", "other", "early",
    "young", "few", "next", "last", "right", "left", "sure", "best", "better", "worse", "worst",
    // function words
    "a", "an", "the", "and", "or", "but", "if", "because", "as", "until", "while", "of", "at",
    "by", "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again",
    // pronouns and determiners
    "i", "you", "he", "she", "it", "we", "they", "them", "their", "this", "that", "these",
    "those", "who", "which", "what", "where", "when", "why", "how", "all", "each", "every",
    "both", "some", "any", "many", "much",
    // page furniture
    "signup", "sign up", "login", "log in", "logout", "sign in", "click here", "more", "less",
    "back", "previous", "home", "menu", "subscribe", "follow", "share", "like", "comment",
    "save", "delete",
    // vague descriptors
    "men", "women", "person", "man", "woman", "child", "children", "sea", "land", "water", "air",
    "fire", "earth", "sun", "moon", "day", "night", "week", "month", "year", "morning",
    "evening", "afternoon",
];

const DEFAULT_ACRONYMS: &[&str] = &[
    "ai", "api", "url", "http", "https", "html", "css", "js", "llm", "ml", "nlp", "ocr", "ui",
    "ux", "ceo", "cto", "cfo", "cio", "hr", "pr", "pm", "nft", "vr", "ar", "iot", "saas", "paas",
    "iaas", "aws", "gcp", "gke", "eks", "aks", "sql", "json", "xml", "yaml", "csv", "rest",
    "soap", "grpc", "tcp", "ip", "dns", "ssl", "tls", "ssh", "vpn", "cdn", "ddos", "xss", "csrf",
    "jwt", "ci", "cd", "rss", "seo", "sem", "crm", "erp", "pdf", "svg", "png", "jpg", "gif",
    "ide", "sdk", "cli", "gui", "tui", "os", "ram", "cpu", "gpu", "ssd", "hdd", "faq", "qa",
    "qc", "sla", "kpi", "roi", "mvp",
];

const DEFAULT_SEMANTIC_GROUPS: &[(&str, &[&str])] = &[
    (
        "AI",
        &["ai", "artificial intelligence", "machine learning", "ml", "llm", "llms", "deep learning"],
    ),
    ("Technology", &["technology", "tech", "technical"]),
    ("Product", &["product", "products"]),
    ("Business", &["business", "company", "enterprise"]),
    ("Design", &["design", "designer", "designers"]),
    ("Development", &["development", "developer", "dev", "developers"]),
    ("Data", &["data", "database", "databases", "analytics"]),
    ("Security", &["security", "cybersecurity", "privacy"]),
    ("Internet", &["network", "networking", "internet"]),
    ("Software", &["software", "application", "app", "applications", "apps"]),
    ("API", &["api", "apis"]),
    ("Web", &["web", "website", "websites"]),
    ("Mobile", &["mobile", "ios", "android"]),
];
