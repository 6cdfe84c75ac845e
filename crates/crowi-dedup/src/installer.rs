//! Drives the pipeline from index check to index creation.

use crate::dependents::DependentCollections;
use crate::error::StoreError;
use crate::index_state::{is_satisfied, IndexSpec};
use crate::planner::{resolve, Resolution};
use crate::removable::decide;
use crate::rewriter::{apply, RewriteStats};
use crate::scanner::{scan, DuplicateGroup};
use crate::store::PageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The index already existed; nothing was touched.
    AlreadySatisfied,
    /// Duplicates (if any) were resolved and the index was created.
    Installed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    pub duplicate_groups: usize,
    pub duplicate_documents: usize,
    pub rewrite: RewriteStats,
}

impl InstallReport {
    fn satisfied() -> Self {
        Self {
            outcome: InstallOutcome::AlreadySatisfied,
            duplicate_groups: 0,
            duplicate_documents: 0,
            rewrite: RewriteStats::default(),
        }
    }
}

enum Stage {
    Check,
    Scan,
    Plan(Vec<DuplicateGroup>),
    Rewrite(Vec<Resolution>),
    CreateIndex,
}

/// Make sure `spec` exists on the pages collection, resolving duplicate
/// keys first.
///
/// There are no checkpoints between stages. A run that fails part way can
/// simply be repeated: once references are rewritten and duplicates are
/// gone the scan comes back empty and the run goes straight to index
/// creation.
pub async fn install<S: PageStore + ?Sized>(
    store: &S,
    spec: &IndexSpec,
    dependents: &DependentCollections,
) -> Result<InstallReport, StoreError> {
    let mut report = InstallReport {
        outcome: InstallOutcome::Installed,
        ..InstallReport::satisfied()
    };
    let mut stage = Stage::Check;

    loop {
        stage = match stage {
            Stage::Check => {
                let live = store.index_information().await?;
                if is_satisfied(&live, spec) {
                    tracing::info!(index = %spec.name, "index already present, skipping");
                    return Ok(InstallReport::satisfied());
                }
                Stage::Scan
            }
            Stage::Scan => {
                let groups = scan(store).await?;
                report.duplicate_groups = groups.len();
                report.duplicate_documents = groups.iter().map(DuplicateGroup::len).sum();
                if groups.is_empty() {
                    Stage::CreateIndex
                } else {
                    tracing::info!(
                        "There are {} documents for {} paths.",
                        report.duplicate_documents,
                        report.duplicate_groups
                    );
                    Stage::Plan(groups)
                }
            }
            Stage::Plan(groups) => {
                let resolutions = groups
                    .iter()
                    .map(|group| {
                        resolve(group, &decide(group)).map_err(|source| StoreError::Plan {
                            key: group.key.clone(),
                            source,
                        })
                    })
                    .collect::<Result<Vec<Resolution>, _>>()?;
                let merges: Vec<&str> = resolutions
                    .iter()
                    .filter(|r| matches!(r, Resolution::Merge(_)))
                    .map(Resolution::key)
                    .collect();
                if !merges.is_empty() {
                    tracing::info!(paths = ?merges, "merging pages that hold state");
                }
                Stage::Rewrite(resolutions)
            }
            Stage::Rewrite(resolutions) => {
                report.rewrite = apply(store, &resolutions, dependents).await?;
                tracing::info!(
                    groups = report.rewrite.groups,
                    merged = report.rewrite.merged,
                    deleted = report.rewrite.deleted,
                    references = report.rewrite.references_rewritten,
                    "duplicate pages resolved"
                );
                Stage::CreateIndex
            }
            Stage::CreateIndex => {
                store.create_index(spec).await?;
                tracing::info!(index = %spec.name, "index created");
                return Ok(report);
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_state::page_path_index;
    use crate::memory::MemoryStore;
    use crate::model::PageRecord;
    use chrono::Utc;

    #[tokio::test]
    async fn test_empty_store_creates_index() {
        let store = MemoryStore::new();
        let report = install(&store, &page_path_index(), &DependentCollections::pages().unwrap())
            .await
            .unwrap();

        assert_eq!(report.outcome, InstallOutcome::Installed);
        assert_eq!(report.duplicate_groups, 0);
        assert_eq!(store.indexes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_index_short_circuits() {
        let store = MemoryStore::new();
        store.create_index(&page_path_index()).await.unwrap();
        store.insert_page(PageRecord::new("/a", Utc::now())).await.unwrap();

        let report = install(&store, &page_path_index(), &DependentCollections::pages().unwrap())
            .await
            .unwrap();

        assert_eq!(report, InstallReport::satisfied());
    }

    #[tokio::test]
    async fn test_duplicates_are_counted() {
        let store = MemoryStore::new();
        for path in ["/a", "/a", "/a", "/b", "/b", "/c"] {
            store.insert_page(PageRecord::new(path, Utc::now())).await.unwrap();
        }

        let report = install(&store, &page_path_index(), &DependentCollections::pages().unwrap())
            .await
            .unwrap();

        assert_eq!(report.duplicate_groups, 2);
        assert_eq!(report.duplicate_documents, 5);
        assert_eq!(report.rewrite.deleted, 3);
        assert_eq!(report.rewrite.merged, 0);
        assert_eq!(store.pages().await.len(), 3);
    }
}
