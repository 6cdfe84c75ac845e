//! Page path deduplication and unique index installation.
//!
//! Pages were historically not unique on `path`. Before the unique index can
//! be created, pages that share a path are collapsed into one survivor:
//! pages that never held state are deleted, the rest are merged, and every
//! table referencing a removed page is pointed at the survivor.
//!
//! The pipeline is strictly staged:
//!
//! 1. [`index_state`] decides whether the index already exists.
//! 2. [`scanner`] groups colliding pages.
//! 3. [`removable`] picks the members that can be dropped outright.
//! 4. [`planner`] computes the survivor and merged fields.
//! 5. [`rewriter`] rewrites references, then updates the survivor and deletes
//!    the rest in one atomic store call.
//! 6. [`installer`] drives the stages and creates the index.

pub mod dependents;
pub mod error;
pub mod index_state;
pub mod installer;
pub mod memory;
pub mod model;
pub mod planner;
pub mod removable;
pub mod rewriter;
pub mod scanner;
pub mod sql;
pub mod store;

pub use dependents::{DependentCollection, DependentCollections, Discriminator, PAGE_DEPENDENTS};
pub use error::{ConfigError, PlanError, StoreError};
pub use index_state::{
    is_satisfied, page_path_index, IndexKey, IndexOptions, IndexSpec, KeyOrder, LiveIndex,
};
pub use installer::{install, InstallOutcome, InstallReport};
pub use memory::MemoryStore;
pub use model::{IdentifierSets, PageRecord};
pub use sql::SqlPageStore;
pub use store::{PageStore, SurvivorUpdate};
