use async_trait::async_trait;
use uuid::Uuid;

use crate::dependents::DependentCollection;
use crate::error::StoreError;
use crate::index_state::{IndexSpec, LiveIndex};
use crate::model::{IdentifierSets, PageRecord};

/// Fields written onto a group's survivor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurvivorUpdate {
    pub comment_count: i64,
    /// Replaces the survivor's sets when present. Remove-only groups leave
    /// them untouched.
    pub sets: Option<IdentifierSets>,
}

/// Storage operations the deduplication pipeline needs.
///
/// Implementations are driven by a single task; no call is issued before the
/// previous one has completed.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Indexes currently defined on the pages collection.
    async fn index_information(&self) -> Result<Vec<LiveIndex>, StoreError>;

    /// Every page whose path is shared by at least one other page, over the
    /// whole collection.
    async fn colliding_pages(&self) -> Result<Vec<PageRecord>, StoreError>;

    /// Point every reference to one of `from` at `to`. Returns the number of
    /// rows rewritten.
    async fn rewrite_references(
        &self,
        dependent: &DependentCollection,
        from: &[Uuid],
        to: Uuid,
    ) -> Result<u64, StoreError>;

    /// Write `update` onto `survivor` and delete `remove_ids`, atomically:
    /// either both happen or neither does. Returns the number of pages
    /// deleted.
    async fn collapse_group(
        &self,
        survivor: Uuid,
        update: &SurvivorUpdate,
        remove_ids: &[Uuid],
    ) -> Result<u64, StoreError>;

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), StoreError>;
}
