//! Deduplication error types.

use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("duplicate key {key} violates unique index {index}")]
    DuplicateKey { index: String, key: String },

    #[error("page not found: {0}")]
    PageNotFound(uuid::Uuid),

    #[error("index {0} already exists with different keys or options")]
    IndexConflict(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot plan path {key}: {source}")]
    Plan {
        key: String,
        #[source]
        source: PlanError,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error("group has no pages")]
    EmptyGroup,

    #[error("summed comment count overflows")]
    CounterOverflow,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dependent collection {collection}.{field} is listed more than once")]
    DuplicateDependent { collection: String, field: String },

    #[error("dependent collection entry has a blank collection or field name")]
    BlankDependent,
}

impl From<StoreError> for DbErr {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(inner) => inner,
            other => DbErr::Migration(other.to_string()),
        }
    }
}

impl From<ConfigError> for DbErr {
    fn from(err: ConfigError) -> Self {
        DbErr::Migration(err.to_string())
    }
}
