use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crowi_db::entities::backlink;
use crowi_db::AppState;

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct BacklinkParams {
    pub page_id: Uuid,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl BacklinkParams {
    /// `(limit, offset)` with defaults applied and the limit capped.
    fn window(&self) -> (u64, u64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}

#[derive(Debug, Serialize)]
pub struct BacklinkResponse {
    pub id: Uuid,
    pub page_id: Uuid,
    pub from_page_id: Uuid,
    pub from_revision_id: Option<Uuid>,
    pub updated_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<backlink::Model> for BacklinkResponse {
    fn from(m: backlink::Model) -> Self {
        Self {
            id: m.id,
            page_id: m.page_id,
            from_page_id: m.from_page_id,
            from_revision_id: m.from_revision_id,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BacklinkList {
    pub data: Vec<BacklinkResponse>,
}

/// GET /api/backlinks?page_id=…&limit=…&offset=…
///
/// Pages linking to `page_id`, most recently updated first.
pub async fn list_backlinks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BacklinkParams>,
) -> Result<Json<BacklinkList>, (StatusCode, String)> {
    let (limit, offset) = params.window();

    let rows = backlink::Entity::find()
        .filter(backlink::Column::PageId.eq(params.page_id))
        .order_by_desc(backlink::Column::UpdatedAt)
        .offset(offset)
        .limit(limit)
        .all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    Ok(Json(BacklinkList {
        data: rows.into_iter().map(BacklinkResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<u64>, offset: Option<u64>) -> BacklinkParams {
        BacklinkParams {
            page_id: Uuid::nil(),
            limit,
            offset,
        }
    }

    #[test]
    fn test_window_defaults() {
        assert_eq!(params(None, None).window(), (10, 0));
    }

    #[test]
    fn test_window_caps_limit() {
        assert_eq!(params(Some(5000), Some(20)).window(), (100, 20));
        assert_eq!(params(Some(0), None).window(), (1, 0));
    }

    #[test]
    fn test_params_from_query_string() {
        let id = Uuid::new_v4();
        let uri: axum::http::Uri = format!("/api/backlinks?page_id={id}&limit=5&offset=10")
            .parse()
            .unwrap();
        let Query(parsed) = Query::<BacklinkParams>::try_from_uri(&uri).unwrap();

        assert_eq!(parsed.page_id, id);
        assert_eq!(parsed.window(), (5, 10));
    }

    #[test]
    fn test_params_reject_bad_page_id() {
        let uri: axum::http::Uri = "/api/backlinks?page_id=not-a-uuid".parse().unwrap();
        assert!(Query::<BacklinkParams>::try_from_uri(&uri).is_err());
    }
}
