use crowi_dedup::{install, page_path_index, DependentCollections, InstallOutcome, SqlPageStore};
use sea_orm_migration::prelude::*;

/// Make `pages.path` unique.
///
/// Pages sharing a path are collapsed first: pages nobody has seen, been
/// granted or liked are deleted, the rest are merged into the oldest
/// stateful page, and every table referencing a removed page is pointed at
/// the survivor. Skipped entirely when the unique index already exists.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let store = SqlPageStore::new(db);
        let dependents = DependentCollections::pages()?;

        let report = install(&store, &page_path_index(), &dependents).await?;
        if report.outcome == InstallOutcome::Installed {
            tracing::info!(
                groups = report.duplicate_groups,
                deleted = report.rewrite.deleted,
                "pages.path is now unique"
            );
        }
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // No-op: merged pages cannot be split again
        Ok(())
    }
}
