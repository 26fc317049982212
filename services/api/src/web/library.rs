//! services/api/src/web/library.rs
//!
//! Handlers for the per-user library: saved, favorite, and bookmark shelves
//! keyed by `(user, book, kind)`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use readwell_core::domain::{LibraryEntry, LibraryKind};

use crate::web::middleware::CurrentUser;
use crate::web::respond::{error_body, port_error, ErrorResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub book_id: String,
    pub book_title: String,
    pub book_author: Option<String>,
    pub book_cover: Option<String>,
    pub kind: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct KindQuery {
    pub kind: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntryDto {
    pub id: Uuid,
    pub book_id: String,
    pub book_title: String,
    pub book_author: String,
    pub book_cover: String,
    pub kind: String,
    pub added_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LibraryEntry> for LibraryEntryDto {
    fn from(e: LibraryEntry) -> Self {
        Self {
            id: e.id,
            book_id: e.book_id,
            book_title: e.book_title,
            book_author: e.book_author,
            book_cover: e.book_cover,
            kind: e.kind.as_str().to_string(),
            added_at: e.added_at,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryCheckResponse {
    pub in_library: bool,
    pub kind: Option<String>,
}

fn parse_kind(raw: &str) -> Result<LibraryKind, ErrorResponse> {
    LibraryKind::parse(raw).ok_or_else(|| {
        error_body(
            StatusCode::BAD_REQUEST,
            format!("'{raw}' is not a valid library kind"),
        )
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /library - The caller's library, optionally filtered by kind
#[utoipa::path(
    get,
    path = "/library",
    params(("kind" = Option<String>, Query, description = "favorite | bookmark | saved")),
    responses(
        (status = 200, description = "Entries ordered by added_at, newest first", body = [LibraryEntryDto]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<KindQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;
    let entries = state
        .library
        .list_entries(user_id, kind)
        .await
        .map_err(port_error)?;
    let dtos: Vec<LibraryEntryDto> = entries.into_iter().map(LibraryEntryDto::from).collect();
    Ok(Json(dtos))
}

/// POST /library - Add a book to a shelf (upsert; re-adding touches added_at)
#[utoipa::path(
    post,
    path = "/library",
    request_body = AddEntryRequest,
    responses(
        (status = 200, description = "The stored entry", body = LibraryEntryDto),
        (status = 400, description = "Missing book id or title"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn add_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<AddEntryRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = match req.kind.as_deref() {
        Some(raw) => parse_kind(raw)?,
        None => LibraryKind::Saved,
    };
    let entry = state
        .library
        .add_entry(
            user_id,
            &req.book_id,
            kind,
            &req.book_title,
            req.book_author.as_deref(),
            req.book_cover.as_deref(),
        )
        .await
        .map_err(port_error)?;
    Ok(Json(LibraryEntryDto::from(entry)))
}

/// DELETE /library/{bookId} - Remove a book from the library
///
/// With `?kind=` only that shelf's entry is removed; without it every kind
/// for the pair goes.
#[utoipa::path(
    delete,
    path = "/library/{bookId}",
    params(
        ("bookId" = String, Path, description = "Percent-encoded book id"),
        ("kind" = Option<String>, Query, description = "favorite | bookmark | saved")
    ),
    responses(
        (status = 200, description = "Removed"),
        (status = 404, description = "Nothing matched"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn remove_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(book_id): Path<String>,
    Query(query): Query<KindQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;
    state
        .library
        .remove_entry(user_id, &book_id, kind)
        .await
        .map_err(port_error)?;
    Ok(Json(
        serde_json::json!({ "message": "Book removed from library" }),
    ))
}

/// GET /library/check/{bookId} - Membership check; absence is a normal result
#[utoipa::path(
    get,
    path = "/library/check/{bookId}",
    params(("bookId" = String, Path, description = "Percent-encoded book id")),
    responses(
        (status = 200, description = "Membership and kind", body = LibraryCheckResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn check_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let check = state
        .library
        .check_entry(user_id, &book_id)
        .await
        .map_err(port_error)?;
    Ok(Json(LibraryCheckResponse {
        in_library: check.in_library,
        kind: check.kind.map(|k| k.as_str().to_string()),
    }))
}
