//! Consolidation plans
//!
//! A plan is the reviewable, serializable list of rename/merge/delete
//! operations computed from one classification run. It is the only thing the
//! executor acts on, which is what makes dry runs, audits and resumption
//! possible.

mod builder;

pub use builder::build;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

use crate::tag::TagId;

/// Where merged tags end up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeTarget {
    /// An existing tag, by id
    ExistingTag { tag_id: TagId },
    /// A tag created (or fetched) by name at execution time
    NewName { name: String },
}

impl MergeTarget {
    pub fn tag_id(&self) -> Option<&TagId> {
        match self {
            Self::ExistingTag { tag_id } => Some(tag_id),
            Self::NewName { .. } => None,
        }
    }
}

/// Why a tag is scheduled for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    Junk,
    LowUsage,
}

/// One plan step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Rename {
        tag_id: TagId,
        /// Name at analysis time, for review only
        from_name: String,
        new_name: String,
    },
    MergeInto {
        sources: BTreeSet<TagId>,
        target: MergeTarget,
        resulting_name: String,
        /// Source names at analysis time, for review only
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        source_names: Vec<String>,
    },
    Delete {
        tag_id: TagId,
        name: String,
        reason: DeleteReason,
        usage_at_analysis: u64,
    },
}

/// Execution phase; operations run in ascending phase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Rename,
    Merge,
    Delete,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Rename { .. } => OperationKind::Rename,
            Self::MergeInto { .. } => OperationKind::Merge,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Tag ids this operation acts on (renames, merges away or deletes)
    pub fn subjects(&self) -> Vec<&TagId> {
        match self {
            Self::Rename { tag_id, .. } | Self::Delete { tag_id, .. } => vec![tag_id],
            Self::MergeInto { sources, .. } => sources.iter().collect(),
        }
    }

    /// One-line human description
    pub fn describe(&self) -> String {
        match self {
            Self::Rename {
                tag_id,
                from_name,
                new_name,
            } => format!("rename {} '{}' -> '{}'", tag_id, from_name, new_name),
            Self::MergeInto {
                sources,
                resulting_name,
                source_names,
                ..
            } => {
                if source_names.is_empty() {
                    format!("merge {} tag(s) into '{}'", sources.len(), resulting_name)
                } else {
                    format!("merge [{}] into '{}'", source_names.join(", "), resulting_name)
                }
            }
            Self::Delete {
                tag_id, name, reason, ..
            } => format!("delete {} '{}' ({:?})", tag_id, name, reason),
        }
    }
}

/// A single invariant violation found while validating a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanViolation {
    /// A tag id is the subject of more than one operation
    DuplicateSubject(TagId),
    /// A merge target is scheduled for deletion
    TargetDeleted(TagId),
    /// A merge target is merged away by another operation
    TargetMergedAway(TagId),
    /// A merge has no sources
    EmptyMerge(String),
    /// A rename or merge produces an empty name
    EmptyName(String),
}

impl std::fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSubject(id) => write!(f, "tag {} is the subject of more than one operation", id),
            Self::TargetDeleted(id) => write!(f, "merge target {} is scheduled for deletion", id),
            Self::TargetMergedAway(id) => write!(f, "merge target {} is itself merged away", id),
            Self::EmptyMerge(name) => write!(f, "merge into '{}' has no sources", name),
            Self::EmptyName(what) => write!(f, "{} produces an empty name", what),
        }
    }
}

/// Plan construction / validation errors
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan validation failed: {}", format_violations(.0))]
    Validation(Vec<PlanViolation>),
}

fn format_violations(violations: &[PlanViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ordered collection of operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationPlan {
    pub operations: Vec<Operation>,
}

impl ConsolidationPlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Count operations of one kind
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind() == kind).count()
    }

    /// Operations in execution order: renames, then merges, then deletes.
    /// Order within a phase is preserved.
    pub fn ordered(&self) -> Vec<&Operation> {
        let mut ops: Vec<&Operation> = self.operations.iter().collect();
        ops.sort_by_key(|op| op.kind());
        ops
    }

    /// Tag count once the plan has been fully applied
    pub fn projected_tag_count(&self, current: usize) -> usize {
        let removed: usize = self
            .operations
            .iter()
            .map(|op| match op {
                Operation::MergeInto { sources, .. } => sources.len(),
                Operation::Delete { .. } => 1,
                Operation::Rename { .. } => 0,
            })
            .sum();
        current.saturating_sub(removed)
    }

    /// Check the plan invariants: every tag id is the subject of at most one
    /// operation, and no merge target is deleted or merged away.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut violations = Vec::new();
        let mut seen: HashSet<&TagId> = HashSet::new();
        let mut subject_kind: HashMap<&TagId, OperationKind> = HashMap::new();

        for op in &self.operations {
            for subject in op.subjects() {
                if !seen.insert(subject) {
                    violations.push(PlanViolation::DuplicateSubject(subject.clone()));
                }
                subject_kind.entry(subject).or_insert(op.kind());
            }
            match op {
                Operation::Rename { tag_id, new_name, .. } if new_name.trim().is_empty() => {
                    violations.push(PlanViolation::EmptyName(format!("rename of {}", tag_id)));
                }
                Operation::MergeInto {
                    sources,
                    resulting_name,
                    ..
                } => {
                    if sources.is_empty() {
                        violations.push(PlanViolation::EmptyMerge(resulting_name.clone()));
                    }
                    if resulting_name.trim().is_empty() {
                        violations.push(PlanViolation::EmptyName("merge".to_string()));
                    }
                }
                _ => {}
            }
        }

        for op in &self.operations {
            if let Operation::MergeInto { target, .. } = op {
                if let Some(target_id) = target.tag_id() {
                    match subject_kind.get(target_id) {
                        Some(OperationKind::Delete) => {
                            violations.push(PlanViolation::TargetDeleted(target_id.clone()))
                        }
                        Some(OperationKind::Merge) => {
                            violations.push(PlanViolation::TargetMergedAway(target_id.clone()))
                        }
                        _ => {}
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PlanError::Validation(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TagId {
        TagId::from(s)
    }

    fn rename(tag: &str, to: &str) -> Operation {
        Operation::Rename {
            tag_id: id(tag),
            from_name: tag.to_string(),
            new_name: to.to_string(),
        }
    }

    fn merge(sources: &[&str], target: &str) -> Operation {
        Operation::MergeInto {
            sources: sources.iter().map(|s| id(s)).collect(),
            target: MergeTarget::ExistingTag { tag_id: id(target) },
            resulting_name: "Target".to_string(),
            source_names: Vec::new(),
        }
    }

    fn delete(tag: &str) -> Operation {
        Operation::Delete {
            tag_id: id(tag),
            name: tag.to_string(),
            reason: DeleteReason::Junk,
            usage_at_analysis: 0,
        }
    }

    #[test]
    fn valid_plan_passes() {
        let plan = ConsolidationPlan::new(vec![rename("1", "Music"), merge(&["2"], "1"), delete("3")]);
        plan.validate().unwrap();
    }

    #[test]
    fn tag_renamed_and_merged_is_rejected() {
        let plan = ConsolidationPlan::new(vec![rename("1", "Music"), merge(&["1"], "2")]);
        match plan.validate() {
            Err(PlanError::Validation(v)) => {
                assert_eq!(v, vec![PlanViolation::DuplicateSubject(id("1"))])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn deleted_merge_target_is_rejected() {
        let plan = ConsolidationPlan::new(vec![merge(&["1"], "2"), delete("2")]);
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("scheduled for deletion"));
    }

    #[test]
    fn chained_merge_is_rejected() {
        let plan = ConsolidationPlan::new(vec![merge(&["1"], "2"), merge(&["2"], "3")]);
        let PlanError::Validation(v) = plan.validate().unwrap_err();
        assert_eq!(v, vec![PlanViolation::TargetMergedAway(id("2"))]);
    }

    #[test]
    fn empty_merge_is_rejected() {
        let plan = ConsolidationPlan::new(vec![merge(&[], "2")]);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn ordered_groups_by_phase() {
        let plan = ConsolidationPlan::new(vec![delete("9"), merge(&["2"], "1"), rename("1", "X")]);
        let kinds: Vec<_> = plan.ordered().iter().map(|op| op.kind()).collect();
        assert_eq!(
            kinds,
            vec![OperationKind::Rename, OperationKind::Merge, OperationKind::Delete]
        );
    }

    #[test]
    fn projected_count_subtracts_removed_tags() {
        let plan = ConsolidationPlan::new(vec![rename("1", "X"), merge(&["2", "3"], "1"), delete("4")]);
        assert_eq!(plan.projected_tag_count(10), 7);
    }

    #[test]
    fn operations_serialize_with_op_tag() {
        let json = serde_json::to_value(merge(&["2"], "1")).unwrap();
        assert_eq!(json["op"], "merge_into");
        assert_eq!(json["target"]["existing_tag"]["tag_id"], "1");
        assert_eq!(json["sources"][0], "2");
    }
}
