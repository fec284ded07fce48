use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    routing::post,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::bookmark::Bookmark;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct BookmarkCreateRequest {
    event_id: Uuid,
}

#[derive(Debug, Serialize)]
struct BookmarkResponse {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<Bookmark> for BookmarkResponse {
    fn from(bookmark: Bookmark) -> Self {
        BookmarkResponse {
            id: bookmark.id,
            event_id: bookmark.event_id,
            user_id: bookmark.user_id,
            created_at: bookmark.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookmarks", post(create_bookmark).get(list_bookmarks))
        .route("/bookmarks/{id}", get(get_bookmark).delete(delete_bookmark))
}

async fn create_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<BookmarkCreateRequest>,
) -> Result<(StatusCode, Json<BookmarkResponse>), AppError> {
    let bookmark = state.bookmarks.create(&claims.email, req.event_id).await?;
    Ok((StatusCode::CREATED, Json(BookmarkResponse::from(bookmark))))
}

async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<BookmarkResponse>>, AppError> {
    let bookmarks = state.bookmarks.list(&claims.email).await?;
    Ok(Json(
        bookmarks.into_iter().map(BookmarkResponse::from).collect(),
    ))
}

async fn get_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookmarkResponse>, AppError> {
    let bookmark = state.bookmarks.get(&claims.email, id).await?;
    Ok(Json(BookmarkResponse::from(bookmark)))
}

async fn delete_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.bookmarks.delete(&claims.email, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
