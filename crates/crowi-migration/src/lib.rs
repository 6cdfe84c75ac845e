pub use sea_orm_migration::prelude::*;

mod m20181201_000001_create_pages;
mod m20181201_000002_create_page_targets;
mod m20181201_000003_create_page_children;
mod m20181220_000004_make_page_path_unique;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20181201_000001_create_pages::Migration),
            Box::new(m20181201_000002_create_page_targets::Migration),
            Box::new(m20181201_000003_create_page_children::Migration),
            Box::new(m20181220_000004_make_page_path_unique::Migration),
        ]
    }
}
