//! Decides the survivor of each group and what it inherits.

use uuid::Uuid;

use crate::error::PlanError;
use crate::model::{IdentifierSets, PageRecord};
use crate::removable::RemovalDecision;
use crate::scanner::DuplicateGroup;

/// Survivor and merged fields for a group with several stateful members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub key: String,
    pub survivor: Uuid,
    /// Every other member of the group, zero-signal members included.
    pub remove_ids: Vec<Uuid>,
    pub merged_counter: i64,
    pub merged_sets: IdentifierSets,
}

/// What happens to one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Deleting the zero-signal members leaves a single page. It still takes
    /// over the deleted members' comment counts.
    RemoveOnly {
        key: String,
        survivor: Uuid,
        remove_ids: Vec<Uuid>,
        merged_counter: i64,
    },
    Merge(MergePlan),
}

impl Resolution {
    pub fn key(&self) -> &str {
        match self {
            Resolution::RemoveOnly { key, .. } => key,
            Resolution::Merge(plan) => &plan.key,
        }
    }

    pub fn survivor(&self) -> Uuid {
        match self {
            Resolution::RemoveOnly { survivor, .. } => *survivor,
            Resolution::Merge(plan) => plan.survivor,
        }
    }

    pub fn remove_ids(&self) -> &[Uuid] {
        match self {
            Resolution::RemoveOnly { remove_ids, .. } => remove_ids,
            Resolution::Merge(plan) => &plan.remove_ids,
        }
    }
}

/// Resolve one group given its removal decision.
pub fn resolve(group: &DuplicateGroup, decision: &RemovalDecision) -> Result<Resolution, PlanError> {
    // Retained ids keep the group order, so the first is the oldest.
    let Some(&survivor) = decision.retained.first() else {
        return Err(PlanError::EmptyGroup);
    };
    let merged = merge_members(group)?;

    if decision.resolves_group() {
        return Ok(Resolution::RemoveOnly {
            key: group.key.clone(),
            survivor,
            remove_ids: decision.removable.clone(),
            merged_counter: merged.counter,
        });
    }

    let remove_ids = group
        .members
        .iter()
        .map(|m| m.page.id)
        .filter(|id| *id != survivor)
        .collect();

    Ok(Resolution::Merge(MergePlan {
        key: group.key.clone(),
        survivor,
        remove_ids,
        merged_counter: merged.counter,
        merged_sets: merged.sets,
    }))
}

struct MergedFields {
    counter: i64,
    sets: IdentifierSets,
}

/// Counters are summed, sets are unioned, over every member.
fn merge_members(group: &DuplicateGroup) -> Result<MergedFields, PlanError> {
    let mut merged = MergedFields {
        counter: 0,
        sets: IdentifierSets::default(),
    };
    for member in &group.members {
        // Exhaustive on purpose: a new field needs a merge rule here.
        let PageRecord {
            id: _,
            path: _,
            sets,
            comment_count,
            created_at: _,
        } = &member.page;
        merged.counter = merged
            .counter
            .checked_add(*comment_count)
            .ok_or(PlanError::CounterOverflow)?;
        merged.sets.absorb(sets);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::removable::decide;
    use crate::scanner::group_pages;
    use chrono::{Duration, TimeZone, Utc};

    fn page(path: &str, minutes: i64, id: u128, count: i64, seen: &[u128]) -> PageRecord {
        let base = Utc.with_ymd_and_hms(2018, 12, 20, 0, 0, 0).unwrap();
        let mut page = PageRecord::new(path, base + Duration::minutes(minutes));
        page.id = Uuid::from_u128(id);
        page.comment_count = count;
        page.sets
            .seen_users
            .extend(seen.iter().map(|n| Uuid::from_u128(*n)));
        page
    }

    fn resolve_all(pages: Vec<PageRecord>) -> Resolution {
        let groups = group_pages(pages);
        let decision = decide(&groups[0]);
        resolve(&groups[0], &decision).unwrap()
    }

    #[test]
    fn test_merge_sums_counters_and_unions_sets() {
        let resolution = resolve_all(vec![
            page("/y", 0, 1, 2, &[1, 2]),
            page("/y", 1, 2, 5, &[2, 3]),
        ]);

        let Resolution::Merge(plan) = resolution else {
            panic!("expected a merge plan");
        };
        assert_eq!(plan.survivor, Uuid::from_u128(1));
        assert_eq!(plan.remove_ids, vec![Uuid::from_u128(2)]);
        assert_eq!(plan.merged_counter, 7);
        let seen: Vec<u128> = plan.merged_sets.seen_users.iter().map(|u| u.as_u128()).collect();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_counts_zero_signal_members() {
        let resolution = resolve_all(vec![
            page("/y", 0, 1, 0, &[]),
            page("/y", 1, 2, 1, &[7]),
            page("/y", 2, 3, 4, &[]),
            page("/y", 3, 4, 2, &[8]),
        ]);

        let Resolution::Merge(plan) = resolution else {
            panic!("expected a merge plan");
        };
        // Oldest stateful member survives, every other member goes.
        assert_eq!(plan.survivor, Uuid::from_u128(2));
        assert_eq!(
            plan.remove_ids,
            vec![Uuid::from_u128(1), Uuid::from_u128(3), Uuid::from_u128(4)]
        );
        assert_eq!(plan.merged_counter, 7);
    }

    #[test]
    fn test_single_stateful_member_is_remove_only() {
        let resolution = resolve_all(vec![
            page("/z", 0, 1, 3, &[]),
            page("/z", 1, 2, 1, &[9]),
        ]);

        assert_eq!(
            resolution,
            Resolution::RemoveOnly {
                key: "/z".into(),
                survivor: Uuid::from_u128(2),
                remove_ids: vec![Uuid::from_u128(1)],
                merged_counter: 4,
            }
        );
    }

    #[test]
    fn test_all_empty_group_is_remove_only() {
        let resolution = resolve_all(vec![
            page("/x", 0, 1, 0, &[]),
            page("/x", 1, 2, 0, &[]),
            page("/x", 2, 3, 0, &[]),
        ]);

        assert_eq!(resolution.survivor(), Uuid::from_u128(1));
        assert_eq!(resolution.remove_ids().len(), 2);
        assert_eq!(resolution.key(), "/x");
    }

    #[test]
    fn test_counter_overflow_is_an_error() {
        let groups = group_pages(vec![
            page("/big", 0, 1, i64::MAX, &[1]),
            page("/big", 1, 2, 1, &[2]),
        ]);
        let err = resolve(&groups[0], &decide(&groups[0])).unwrap_err();
        assert_eq!(err, PlanError::CounterOverflow);
    }

    #[test]
    fn test_empty_group_is_an_error() {
        let group = DuplicateGroup {
            key: "/none".into(),
            members: Vec::new(),
        };
        let err = resolve(&group, &decide(&group)).unwrap_err();
        assert_eq!(err, PlanError::EmptyGroup);
    }
}
