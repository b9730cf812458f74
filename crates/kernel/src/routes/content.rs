//! Content listing routes.
//!
//! Read-only JSON endpoints over online content.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{ContentType, TypedContent};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the content router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/content", get(list_content))
        .route("/api/content/{id}", get(view_content))
        .route("/api/types", get(list_types))
}

// -------------------------------------------------------------------------
// Request / response types
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListParams {
    /// Offset of the first record.
    #[serde(default)]
    start: i64,

    /// Restrict to content carrying this tag.
    tag: Option<i64>,

    /// Restrict to one content type.
    #[serde(rename = "type")]
    content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<serde_json::Value>,
    total: i64,
    start: i64,
    per_page: u32,
}

#[derive(Debug, Serialize)]
struct TypeSummary {
    #[serde(rename = "type")]
    content_type: ContentType,
    label: &'static str,
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// List online content, newest first.
async fn list_content(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ListResponse>> {
    let kind = params
        .content_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<ContentType>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let handler = state.content();
    let per_page = state.items_per_page();

    let mut criteria = handler.criteria();
    if let Some(tag) = params.tag {
        criteria.add_tag(tag)?;
    }
    criteria.set_offset(params.start)?;
    criteria.set_limit(i64::from(per_page))?;
    criteria.set_order("date", "DESC")?;
    criteria.set_secondary_order("submission_time", "DESC")?;

    debug!(?kind, start = params.start, tag = ?params.tag, "listing content");

    let (total, items) = match kind {
        Some(kind) => {
            let typed = handler.typed(kind);
            (
                typed.get_online_count(Some(criteria.clone())).await?,
                typed.get_online_objects(Some(criteria)).await?,
            )
        }
        None => (
            handler.get_online_count(Some(criteria.clone())).await?,
            handler.get_online_objects(Some(criteria)).await?,
        ),
    };

    Ok(Json(ListResponse {
        items: items.iter().map(TypedContent::to_json).collect(),
        total,
        start: params.start,
        per_page,
    }))
}

/// View a single online record and bump its counter.
async fn view_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let handler = state.content();

    let content = handler
        .get_object(id)
        .await?
        .filter(TypedContent::is_online)
        .ok_or(AppError::NotFound)?;

    handler.update_counter(id).await?;

    Ok(Json(content.to_json()))
}

/// Content types that have at least one record.
async fn list_types(State(state): State<AppState>) -> AppResult<Json<Vec<TypeSummary>>> {
    let types = state.content().get_types().await?;

    Ok(Json(
        types
            .into_iter()
            .map(|content_type| TypeSummary {
                content_type,
                label: content_type.label(),
            })
            .collect(),
    ))
}
