//! Applies resolutions to the store.

use crate::dependents::DependentCollections;
use crate::error::StoreError;
use crate::planner::Resolution;
use crate::store::{PageStore, SurvivorUpdate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub groups: usize,
    pub merged: usize,
    pub deleted: u64,
    pub references_rewritten: u64,
}

/// Apply every resolution in order.
///
/// Per group, references are moved onto the survivor first. The survivor
/// update and the deletions then go to the store as one atomic step. A
/// failed run leaves each group either untouched or fully collapsed.
pub async fn apply<S: PageStore + ?Sized>(
    store: &S,
    resolutions: &[Resolution],
    dependents: &DependentCollections,
) -> Result<RewriteStats, StoreError> {
    let mut stats = RewriteStats::default();

    for resolution in resolutions {
        let survivor = resolution.survivor();
        let remove_ids = resolution.remove_ids();

        let mut rewritten = 0;
        if !remove_ids.is_empty() {
            for dependent in dependents.iter() {
                rewritten += store
                    .rewrite_references(dependent, remove_ids, survivor)
                    .await?;
            }
        }

        let update = match resolution {
            Resolution::RemoveOnly { merged_counter, .. } => SurvivorUpdate {
                comment_count: *merged_counter,
                sets: None,
            },
            Resolution::Merge(plan) => SurvivorUpdate {
                comment_count: plan.merged_counter,
                sets: Some(plan.merged_sets.clone()),
            },
        };
        let deleted = store.collapse_group(survivor, &update, remove_ids).await?;

        tracing::debug!(
            path = resolution.key(),
            %survivor,
            deleted,
            rewritten,
            merged = matches!(resolution, Resolution::Merge(_)),
            "resolved duplicate path"
        );

        stats.groups += 1;
        if matches!(resolution, Resolution::Merge(_)) {
            stats.merged += 1;
        }
        stats.deleted += deleted;
        stats.references_rewritten += rewritten;
    }

    Ok(stats)
}
