use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// A wiki page. `path` is unique once the path-uniqueness migration has run.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub path: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub seen_users: UserIds,
    #[sea_orm(column_type = "JsonBinary")]
    pub granted_users: UserIds,
    #[sea_orm(column_type = "JsonBinary")]
    pub liker: UserIds,
    #[sea_orm(default_value = "0")]
    pub comment_count: i64,
    pub created_at: DateTimeWithTimeZone,
}

/// User ids stored as a JSON array on the page row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct UserIds(pub Vec<Uuid>);

impl FromIterator<Uuid> for UserIds {
    fn from_iter<I: IntoIterator<Item = Uuid>>(ids: I) -> Self {
        Self(ids.into_iter().collect())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::backlink::Entity")]
    Backlink,
}

impl Related<super::backlink::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Backlink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
