//! Plan builder: classifications + corpus -> consolidation plan

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::{ConsolidationPlan, DeleteReason, MergeTarget, Operation, PlanError};
use crate::classify::{rank_order, Category, ClassificationResult};
use crate::tag::{Tag, TagId};

/// Build a consolidation plan.
///
/// Pure: the same classifications and corpus always yield the same plan.
/// Duplicates are grouped by their resolved canonical name; each group is
/// either merged into an existing tag that already carries the exact name,
/// or consolidated onto a surviving member that is renamed to it. Junk and
/// low-usage tags not claimed by any group are deleted.
///
/// The plan is validated before it is returned; on violation no plan is
/// produced.
pub fn build(
    classifications: &[ClassificationResult],
    corpus: &[Tag],
) -> Result<ConsolidationPlan, PlanError> {
    let by_id: HashMap<&TagId, &Tag> = corpus.iter().map(|t| (&t.id, t)).collect();

    // Exact name -> tag; on (store-violating) duplicate names keep the smallest id
    let mut by_name: HashMap<&str, &Tag> = HashMap::new();
    for tag in corpus {
        by_name
            .entry(tag.name.as_str())
            .and_modify(|existing| {
                if tag.id < existing.id {
                    *existing = tag;
                }
            })
            .or_insert(tag);
    }

    let mut groups: BTreeMap<&str, Vec<&Tag>> = BTreeMap::new();
    for result in classifications {
        if !result.category.is_duplicate() {
            continue;
        }
        let (Some(canonical), Some(tag)) = (result.canonical.as_deref(), by_id.get(&result.tag_id))
        else {
            tracing::debug!(tag_id = %result.tag_id, "duplicate without target or not in corpus, ignored");
            continue;
        };
        groups.entry(canonical).or_default().push(tag);
    }

    let mut renames = Vec::new();
    let mut merges = Vec::new();
    let mut claimed: HashSet<&TagId> = HashSet::new();

    for (canonical, mut members) in groups {
        members.sort_by(|a, b| a.id.cmp(&b.id));
        members.dedup_by(|a, b| a.id == b.id);

        let existing = by_name.get(canonical).copied();
        let outside = existing.filter(|e| !members.iter().any(|m| m.id == e.id));

        claimed.extend(members.iter().map(|m| &m.id));

        if let Some(target) = outside {
            claimed.insert(&target.id);
            merges.push(merge_op(&members, &target.id, canonical));
            continue;
        }

        let survivor = existing.unwrap_or_else(|| pick_survivor(&members));
        renames.push(Operation::Rename {
            tag_id: survivor.id.clone(),
            from_name: survivor.name.clone(),
            new_name: canonical.to_string(),
        });

        let rest: Vec<&Tag> = members.into_iter().filter(|m| m.id != survivor.id).collect();
        if !rest.is_empty() {
            merges.push(merge_op(&rest, &survivor.id, canonical));
        }
    }

    let mut deletes: Vec<(&Tag, DeleteReason)> = classifications
        .iter()
        .filter(|r| r.category.is_deletable())
        .filter_map(|r| by_id.get(&r.tag_id).map(|tag| (*tag, r.category)))
        .filter(|(tag, _)| !claimed.contains(&tag.id))
        .map(|(tag, category)| {
            let reason = match category {
                Category::Junk => DeleteReason::Junk,
                _ => DeleteReason::LowUsage,
            };
            (tag, reason)
        })
        .collect();
    deletes.sort_by(|(a, _), (b, _)| delete_order(a, b));
    deletes.dedup_by(|(a, _), (b, _)| a.id == b.id);

    let mut operations = renames;
    operations.append(&mut merges);
    operations.extend(deletes.into_iter().map(|(tag, reason)| Operation::Delete {
        tag_id: tag.id.clone(),
        name: tag.name.clone(),
        reason,
        usage_at_analysis: tag.usage_count,
    }));

    let plan = ConsolidationPlan::new(operations);
    if let Err(err) = plan.validate() {
        tracing::error!(error = %err, "refusing to emit an invalid plan");
        return Err(err);
    }

    tracing::info!(
        renames = plan.count(super::OperationKind::Rename),
        merges = plan.count(super::OperationKind::Merge),
        deletes = plan.count(super::OperationKind::Delete),
        "built consolidation plan"
    );
    Ok(plan)
}

/// Highest usage wins; ties go to the smaller name, then the smaller id.
fn pick_survivor<'t>(members: &[&'t Tag]) -> &'t Tag {
    let mut best = members[0];
    for member in &members[1..] {
        if rank_order(member, best) == Ordering::Less {
            best = member;
        }
    }
    best
}

/// Least-used first, then by name and id.
fn delete_order(a: &Tag, b: &Tag) -> Ordering {
    a.usage_count
        .cmp(&b.usage_count)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

fn merge_op(sources: &[&Tag], target: &TagId, resulting_name: &str) -> Operation {
    let ids: BTreeSet<TagId> = sources.iter().map(|t| t.id.clone()).collect();
    let mut ordered: Vec<&Tag> = sources.to_vec();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));
    Operation::MergeInto {
        sources: ids,
        target: MergeTarget::ExistingTag {
            tag_id: target.clone(),
        },
        resulting_name: resulting_name.to_string(),
        source_names: ordered.into_iter().map(|t| t.name.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_corpus;
    use crate::config::Config;
    use crate::plan::OperationKind;

    fn tag(id: &str, name: &str, usage: u64) -> Tag {
        Tag::new(id, name, usage)
    }

    fn plan_for(corpus: &[Tag], config: &Config) -> ConsolidationPlan {
        build(&classify_corpus(corpus, config), corpus).unwrap()
    }

    #[test]
    fn case_pair_merges_into_existing_canonical_spelling() {
        let corpus = vec![tag("m1", "music", 34), tag("m2", "Music", 96)];
        let plan = plan_for(&corpus, &Config::default());

        assert_eq!(
            plan.operations,
            vec![
                Operation::Rename {
                    tag_id: "m2".into(),
                    from_name: "Music".into(),
                    new_name: "Music".into(),
                },
                Operation::MergeInto {
                    sources: ["m1".into()].into_iter().collect(),
                    target: MergeTarget::ExistingTag { tag_id: "m2".into() },
                    resulting_name: "Music".into(),
                    source_names: vec!["music".into()],
                },
            ]
        );
    }

    #[test]
    fn exact_name_member_survives_even_with_lower_usage() {
        let corpus = vec![tag("1", "MUSIC", 200), tag("2", "Music", 3)];
        let plan = plan_for(&corpus, &Config::default());
        match &plan.operations[0] {
            Operation::Rename { tag_id, .. } => assert_eq!(tag_id.as_str(), "2"),
            other => panic!("expected rename, got {:?}", other),
        }
    }

    #[test]
    fn semantic_group_without_existing_target_renames_highest_usage() {
        let config = Config::default()
            .without_semantic_groups()
            .with_semantic_group("AI", ["ai", "ml", "machine learning", "llm"]);
        let corpus = vec![
            tag("1", "ai", 2),
            tag("2", "ML", 3),
            tag("3", "Machine Learning", 8),
        ];
        let plan = plan_for(&corpus, &config);

        assert_eq!(plan.count(OperationKind::Rename), 1);
        assert_eq!(plan.count(OperationKind::Merge), 1);
        assert_eq!(plan.count(OperationKind::Delete), 0);
        match &plan.operations[0] {
            Operation::Rename { tag_id, new_name, .. } => {
                assert_eq!(tag_id.as_str(), "3");
                assert_eq!(new_name, "AI");
            }
            other => panic!("expected rename, got {:?}", other),
        }
        match &plan.operations[1] {
            Operation::MergeInto { sources, target, .. } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(target.tag_id().map(TagId::as_str), Some("3"));
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }

    #[test]
    fn existing_low_usage_target_is_kept_not_deleted() {
        let config = Config::default().with_low_usage_threshold(3);
        let corpus = vec![tag("1", "AI", 1), tag("2", "ml", 9), tag("3", "llm", 4)];
        let plan = plan_for(&corpus, &config);

        assert_eq!(plan.count(OperationKind::Delete), 0);
        assert_eq!(plan.count(OperationKind::Rename), 0);
        match &plan.operations[0] {
            Operation::MergeInto { sources, target, .. } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(target.tag_id().map(TagId::as_str), Some("1"));
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }

    #[test]
    fn singleton_semantic_member_is_renamed() {
        let corpus = vec![tag("1", "apps", 12)];
        let plan = plan_for(&corpus, &Config::default());
        assert_eq!(
            plan.operations,
            vec![Operation::Rename {
                tag_id: "1".into(),
                from_name: "apps".into(),
                new_name: "Software".into(),
            }]
        );
    }

    #[test]
    fn fuzzy_source_merges_into_matched_tag() {
        let corpus = vec![tag("1", "Kubernetes", 40), tag("2", "Kubernets", 1)];
        let plan = plan_for(&corpus, &Config::default());
        assert_eq!(plan.len(), 1);
        assert!(matches!(
            &plan.operations[0],
            Operation::MergeInto { target: MergeTarget::ExistingTag { tag_id }, .. } if tag_id.as_str() == "1"
        ));
    }

    #[test]
    fn junk_and_low_usage_are_deleted_least_used_first() {
        let corpus = vec![
            tag("1", "stuff", 30),
            tag("2", "Gardening", 1),
            tag("3", "123", 0),
            tag("4", "Rust", 50),
        ];
        let plan = plan_for(&corpus, &Config::default());
        let deleted: Vec<_> = plan
            .operations
            .iter()
            .map(|op| match op {
                Operation::Delete { name, reason, .. } => (name.as_str(), *reason),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            deleted,
            vec![
                ("123", DeleteReason::Junk),
                ("Gardening", DeleteReason::LowUsage),
                ("stuff", DeleteReason::Junk),
            ]
        );
    }

    #[test]
    fn stale_classifications_are_ignored() {
        let corpus = vec![tag("1", "Rust", 50)];
        let stale = vec![ClassificationResult {
            tag_id: "99".into(),
            tag_name: "gone".into(),
            usage_count: 0,
            category: Category::Junk,
            reason: "too_short".into(),
            evidence: None,
            canonical: None,
        }];
        assert!(build(&stale, &corpus).unwrap().is_empty());
    }

    #[test]
    fn overlapping_classifications_fail_closed() {
        // one tag pulled into two groups
        let corpus = vec![tag("1", "x1", 5), tag("2", "x2", 5)];
        let dup = |id: &str, name: &str, canonical: &str| ClassificationResult {
            tag_id: id.into(),
            tag_name: name.into(),
            usage_count: 5,
            category: Category::SemanticDuplicate,
            reason: String::new(),
            evidence: None,
            canonical: Some(canonical.into()),
        };
        let conflicting = vec![dup("1", "x1", "A"), dup("1", "x1", "B"), dup("2", "x2", "B")];
        assert!(matches!(build(&conflicting, &corpus), Err(PlanError::Validation(_))));
    }

    #[test]
    fn random_corpora_never_touch_a_tag_twice() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        const WORDS: &[&str] = &[
            "music", "Music", "MUSIC", "ai", "AI", "ml", "llm", "Rust", "rust", "Rusty", "web",
            "Web", "Websites", "a", "42", "stuff", "Kubernetes", "Kubernets", "apps", "Software",
        ];
        let mut rng = StdRng::seed_from_u64(0xbeef);
        let config = Config::default();
        for _ in 0..200 {
            let mut corpus: Vec<Tag> = Vec::new();
            for (i, word) in WORDS.iter().enumerate() {
                if rng.gen_bool(0.5) {
                    corpus.push(tag(&i.to_string(), word, rng.gen_range(0..60)));
                }
            }
            let plan = plan_for(&corpus, &config);
            plan.validate().unwrap();
            assert!(plan.projected_tag_count(corpus.len()) <= corpus.len());
        }
    }

    #[test]
    fn building_twice_yields_the_same_plan() {
        let corpus = vec![
            tag("1", "rust", 3),
            tag("2", "Rust", 12),
            tag("3", "web", 7),
            tag("4", "Websites", 9),
            tag("5", "xx", 1),
        ];
        let config = Config::default();
        assert_eq!(plan_for(&corpus, &config), plan_for(&corpus, &config));
    }
}
