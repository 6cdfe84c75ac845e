//! Postgres page store on top of sea-orm.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use crowi_db::entities::page::{self, UserIds};
use sea_orm::sea_query::{Alias, Expr, Query, UpdateStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::dependents::DependentCollection;
use crate::error::StoreError;
use crate::index_state::{IndexKey, IndexOptions, IndexSpec, KeyOrder, LiveIndex};
use crate::model::{IdentifierSets, PageRecord};
use crate::store::{PageStore, SurvivorUpdate};

const PAGES_TABLE: &str = "pages";

/// One row per indexed column, in key order. Expression columns have no
/// attribute name.
const INDEX_COLUMNS_SQL: &str = r#"
SELECT ic.relname AS index_name,
       ix.indisunique AS is_unique,
       ix.indpred IS NOT NULL AS is_partial,
       a.attname AS column_name,
       pg_index_column_has_property(ix.indexrelid, k.ord::int, 'desc') AS descending
FROM pg_index ix
JOIN pg_class t ON t.oid = ix.indrelid
JOIN pg_class ic ON ic.oid = ix.indexrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
LEFT JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
WHERE t.relname = $1
  AND n.nspname = current_schema()
ORDER BY ic.relname, k.ord
"#;

#[derive(Debug, FromQueryResult)]
struct IndexColumnRow {
    index_name: String,
    is_unique: bool,
    is_partial: bool,
    column_name: Option<String>,
    descending: Option<bool>,
}

/// Works on a pool or on the transaction a migration runs in.
pub struct SqlPageStore<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SqlPageStore<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }
}

impl From<page::Model> for PageRecord {
    fn from(model: page::Model) -> Self {
        Self {
            id: model.id,
            path: model.path,
            sets: IdentifierSets {
                seen_users: model.seen_users.0.into_iter().collect(),
                granted_users: model.granted_users.0.into_iter().collect(),
                liker: model.liker.0.into_iter().collect(),
            },
            comment_count: model.comment_count,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Fold per-column rows into one `LiveIndex` per index, keeping key order.
///
/// Partial indexes are left out: a `WHERE` clause means the index does not
/// cover every page, so it can never stand in for a full one.
fn fold_index_rows(rows: Vec<IndexColumnRow>) -> Vec<LiveIndex> {
    let mut indexes: BTreeMap<String, LiveIndex> = BTreeMap::new();
    for row in rows.into_iter().filter(|r| !r.is_partial) {
        let index = indexes
            .entry(row.index_name.clone())
            .or_insert_with(|| LiveIndex {
                name: row.index_name.clone(),
                keys: Vec::new(),
                options: IndexOptions {
                    unique: Some(row.is_unique),
                    background: None,
                },
            });
        let field = row.column_name.unwrap_or_else(|| "<expression>".to_string());
        index.keys.push(if row.descending.unwrap_or(false) {
            IndexKey::descending(field)
        } else {
            IndexKey::ascending(field)
        });
    }
    indexes.into_values().collect()
}

fn rewrite_statement(dependent: &DependentCollection, from: &[Uuid], to: Uuid) -> UpdateStatement {
    let mut stmt = Query::update();
    stmt.table(Alias::new(dependent.collection))
        .value(Alias::new(dependent.field), to)
        .and_where(Expr::col(Alias::new(dependent.field)).is_in(from.iter().copied()));
    if let Some(d) = dependent.discriminator {
        stmt.and_where(Expr::col(Alias::new(d.field)).eq(d.value));
    }
    stmt
}

/// Survivor update plus deletions on `conn`, which the caller wraps in a
/// transaction.
async fn collapse_in<C: ConnectionTrait>(
    conn: &C,
    survivor: Uuid,
    update: &SurvivorUpdate,
    remove_ids: &[Uuid],
) -> Result<u64, StoreError> {
    let mut model = page::ActiveModel {
        id: Set(survivor),
        comment_count: Set(update.comment_count),
        ..Default::default()
    };
    if let Some(sets) = &update.sets {
        model.seen_users = Set(sets.seen_users.iter().copied().collect::<UserIds>());
        model.granted_users = Set(sets.granted_users.iter().copied().collect::<UserIds>());
        model.liker = Set(sets.liker.iter().copied().collect::<UserIds>());
    }
    match model.update(conn).await {
        Ok(_) => {}
        Err(DbErr::RecordNotUpdated) => return Err(StoreError::PageNotFound(survivor)),
        Err(e) => return Err(e.into()),
    }

    if remove_ids.is_empty() {
        return Ok(0);
    }
    let result = page::Entity::delete_many()
        .filter(page::Column::Id.is_in(remove_ids.iter().copied()))
        .filter(page::Column::Id.ne(survivor))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn create_index_sql(table: &str, spec: &IndexSpec) -> String {
    let columns: Vec<String> = spec
        .keys
        .iter()
        .map(|k| {
            let order = match k.order {
                KeyOrder::Ascending => "ASC",
                KeyOrder::Descending => "DESC",
            };
            format!("{} {order}", quote_ident(&k.field))
        })
        .collect();
    format!(
        "CREATE {unique}INDEX {concurrently}{name} ON {table} ({columns})",
        unique = if spec.options.unique == Some(true) { "UNIQUE " } else { "" },
        // CONCURRENTLY cannot run inside a transaction block.
        concurrently = if spec.options.background == Some(true) {
            "CONCURRENTLY "
        } else {
            ""
        },
        name = quote_ident(&spec.name),
        table = quote_ident(table),
        columns = columns.join(", "),
    )
}

#[async_trait]
impl<'c, C> PageStore for SqlPageStore<'c, C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    async fn index_information(&self) -> Result<Vec<LiveIndex>, StoreError> {
        let rows = IndexColumnRow::find_by_statement(Statement::from_sql_and_values(
            self.backend(),
            INDEX_COLUMNS_SQL,
            [PAGES_TABLE.into()],
        ))
        .all(self.conn)
        .await?;
        Ok(fold_index_rows(rows))
    }

    async fn colliding_pages(&self) -> Result<Vec<PageRecord>, StoreError> {
        let paths: Vec<String> = page::Entity::find()
            .select_only()
            .column(page::Column::Path)
            .group_by(page::Column::Path)
            .having(Expr::expr(Expr::col(page::Column::Path).count()).gt(1))
            .into_tuple()
            .all(self.conn)
            .await?;
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let pages = page::Entity::find()
            .filter(page::Column::Path.is_in(paths))
            .order_by_asc(page::Column::Path)
            .order_by_asc(page::Column::CreatedAt)
            .order_by_asc(page::Column::Id)
            .all(self.conn)
            .await?;
        Ok(pages.into_iter().map(PageRecord::from).collect())
    }

    async fn rewrite_references(
        &self,
        dependent: &DependentCollection,
        from: &[Uuid],
        to: Uuid,
    ) -> Result<u64, StoreError> {
        let stmt = rewrite_statement(dependent, from, to);
        let result = self.conn.execute(self.backend().build(&stmt)).await?;
        Ok(result.rows_affected())
    }

    async fn collapse_group(
        &self,
        survivor: Uuid,
        update: &SurvivorUpdate,
        remove_ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        // Inside a migration this nests as a savepoint. Dropping the
        // transaction on error rolls it back.
        let txn = self.conn.begin().await?;
        let deleted = collapse_in(&txn, survivor, update, remove_ids).await?;
        txn.commit().await?;
        Ok(deleted)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), StoreError> {
        self.conn
            .execute_unprepared(&create_index_sql(PAGES_TABLE, spec))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_state::page_path_index;

    fn row(index: &str, unique: bool, column: Option<&str>, desc: bool) -> IndexColumnRow {
        IndexColumnRow {
            index_name: index.to_string(),
            is_unique: unique,
            is_partial: false,
            column_name: column.map(str::to_string),
            descending: Some(desc),
        }
    }

    #[test]
    fn test_fold_keeps_column_order() {
        let indexes = fold_index_rows(vec![
            row("idx_pages_path_created", false, Some("path"), false),
            row("idx_pages_path_created", false, Some("created_at"), true),
            row("pages_pkey", true, Some("id"), false),
        ]);

        assert_eq!(indexes.len(), 2);
        assert_eq!(
            indexes[0].keys,
            vec![IndexKey::ascending("path"), IndexKey::descending("created_at")]
        );
        assert_eq!(indexes[1].options.unique, Some(true));
        assert_eq!(indexes[1].options.background, None);
    }

    #[test]
    fn test_expression_columns_never_match_a_field() {
        let indexes = fold_index_rows(vec![row("idx_lower_path", true, None, false)]);
        assert_eq!(indexes[0].keys, vec![IndexKey::ascending("<expression>")]);
        assert!(!crate::index_state::is_satisfied(&indexes, &page_path_index()));
    }

    #[test]
    fn test_installed_path_index_is_recognised() {
        let indexes = fold_index_rows(vec![row("uq_pages_path", true, Some("path"), false)]);
        assert!(crate::index_state::is_satisfied(&indexes, &page_path_index()));
    }

    #[test]
    fn test_partial_index_does_not_satisfy_path_index() {
        let mut partial = row("uq_pages_path_live", true, Some("path"), false);
        partial.is_partial = true;
        let indexes = fold_index_rows(vec![partial, row("pages_pkey", true, Some("id"), false)]);

        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, "pages_pkey");
        assert!(!crate::index_state::is_satisfied(&indexes, &page_path_index()));
    }

    #[test]
    fn test_create_index_sql() {
        assert_eq!(
            create_index_sql("pages", &page_path_index()),
            r#"CREATE UNIQUE INDEX "uq_pages_path" ON "pages" ("path" ASC)"#
        );

        let mut spec = page_path_index();
        spec.options.background = Some(true);
        spec.keys.push(IndexKey::descending("created_at"));
        assert_eq!(
            create_index_sql("pages", &spec),
            r#"CREATE UNIQUE INDEX CONCURRENTLY "uq_pages_path" ON "pages" ("path" ASC, "created_at" DESC)"#
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_rewrite_statement_filters_on_discriminator() {
        let dependent =
            DependentCollection::polymorphic("watchers", "target_id", "target_model", "Page");
        let stmt = rewrite_statement(&dependent, &[Uuid::from_u128(1)], Uuid::from_u128(2));
        let sql = DbBackend::Postgres.build(&stmt).to_string();

        assert!(sql.starts_with(r#"UPDATE "watchers" SET "target_id" ="#));
        assert!(sql.contains(r#""target_id" IN ("#));
        assert!(sql.contains(r#""target_model" = 'Page'"#));
    }

    #[test]
    fn test_rewrite_statement_direct_reference() {
        let dependent = DependentCollection::direct("comments", "page_id");
        let stmt = rewrite_statement(&dependent, &[Uuid::from_u128(1)], Uuid::from_u128(2));
        let sql = DbBackend::Postgres.build(&stmt).to_string();

        assert!(sql.starts_with(r#"UPDATE "comments" SET "page_id" ="#));
        assert!(!sql.contains("target_model"));
    }
}
