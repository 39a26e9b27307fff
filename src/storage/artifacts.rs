//! Persisted run artifacts: backup snapshots, plan documents and reports
//!
//! All artifacts are pretty-printed JSON so they can be reviewed by hand.
//! Backups are write-once: a new file with a unique name per run, opened with
//! create-new semantics.

use super::traits::{StorageError, StorageResult};
use crate::config::Config;
use crate::plan::ConsolidationPlan;
use crate::tag::Tag;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Current backup snapshot format
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// Current plan document format
pub const PLAN_FORMAT_VERSION: u32 = 1;

/// Full copy of the tag list taken before a mutating run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub tag_count: usize,
    pub tags: Vec<Tag>,
}

impl BackupSnapshot {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self {
            format_version: BACKUP_FORMAT_VERSION,
            created_at: Utc::now(),
            tag_count: tags.len(),
            tags,
        }
    }
}

/// Write a backup of `tags` into `dir`, returning the new file's path.
///
/// The file name carries a UTC timestamp and a random suffix; an existing
/// file is never overwritten.
pub fn write_backup(dir: impl AsRef<Path>, tags: &[Tag]) -> StorageResult<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let snapshot = BackupSnapshot::new(tags.to_vec());
    let suffix = Uuid::new_v4().simple().to_string();
    let name = format!(
        "tags-backup-{}-{}.json",
        snapshot.created_at.format("%Y%m%dT%H%M%SZ"),
        &suffix[..8]
    );
    let path = dir.join(name);

    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    serde_json::to_writer_pretty(&mut file, &snapshot)?;
    file.write_all(b"\n")?;
    file.sync_all()?;

    tracing::info!(path = %path.display(), tags = snapshot.tag_count, "wrote backup snapshot");
    Ok(path)
}

/// Read a backup snapshot back.
pub fn load_backup(path: impl AsRef<Path>) -> StorageResult<BackupSnapshot> {
    let snapshot: BackupSnapshot = read_json(path)?;
    if snapshot.format_version != BACKUP_FORMAT_VERSION {
        return Err(StorageError::Format(format!(
            "backup format version {} (expected {})",
            snapshot.format_version, BACKUP_FORMAT_VERSION
        )));
    }
    Ok(snapshot)
}

/// A plan plus the context it was computed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub format_version: u32,
    pub plan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Thresholds in force at analysis time
    pub low_usage_threshold: u64,
    pub similarity_threshold: f64,
    pub plan: ConsolidationPlan,
}

impl PlanDocument {
    pub fn new(plan: ConsolidationPlan, config: &Config) -> Self {
        Self {
            format_version: PLAN_FORMAT_VERSION,
            plan_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            low_usage_threshold: config.low_usage_threshold,
            similarity_threshold: config.similarity_threshold,
            plan,
        }
    }
}

/// Save a plan document for later review and execution.
pub fn save_plan(path: impl AsRef<Path>, document: &PlanDocument) -> StorageResult<()> {
    write_json(path.as_ref(), document)?;
    tracing::info!(
        path = %path.as_ref().display(),
        plan_id = %document.plan_id,
        operations = document.plan.len(),
        "saved plan"
    );
    Ok(())
}

/// Load a saved plan document.
pub fn load_plan(path: impl AsRef<Path>) -> StorageResult<PlanDocument> {
    let document: PlanDocument = read_json(path)?;
    if document.format_version != PLAN_FORMAT_VERSION {
        return Err(StorageError::Format(format!(
            "plan format version {} (expected {})",
            document.format_version, PLAN_FORMAT_VERSION
        )));
    }
    Ok(document)
}

/// Write any report as pretty JSON, replacing an existing file.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> StorageResult<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
