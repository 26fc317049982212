//! services/api/src/web/progress.rs
//!
//! Handlers for reading-progress saves, partial updates, and the embedded
//! quote collection. Note the asymmetry with ratings: a missing progress
//! record on the read path is a 404, not an empty result.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use readwell_core::domain::{ProgressFields, ProgressPatch, Quote, ReadingProgress};

use crate::web::middleware::CurrentUser;
use crate::web::respond::{port_error, ErrorResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub book_id: String,
    pub book_title: String,
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub paragraph: Option<i32>,
    pub line_number: Option<i32>,
}

/// Quote element accepted in a wholesale `quotes` replacement. Ids and
/// timestamps are kept when the client echoes them back and freshly
/// generated otherwise.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    pub id: Option<Uuid>,
    pub text: String,
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl QuoteInput {
    fn into_quote(self) -> Quote {
        Quote {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            text: self.text,
            chapter: self.chapter,
            page: self.page,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub paragraph: Option<i32>,
    pub line_number: Option<i32>,
    pub quotes: Option<Vec<QuoteInput>>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddQuoteRequest {
    pub text: String,
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub book_title: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub id: Uuid,
    pub text: String,
    pub chapter: Option<i32>,
    pub page: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDto {
    pub id: Uuid,
    pub book_id: String,
    pub book_title: String,
    pub chapter: i32,
    pub page: i32,
    pub paragraph: i32,
    pub line_number: i32,
    pub quotes: Vec<QuoteDto>,
    pub last_read_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReadingProgress> for ProgressDto {
    fn from(p: ReadingProgress) -> Self {
        Self {
            id: p.id,
            book_id: p.book_id,
            book_title: p.book_title,
            chapter: p.chapter,
            page: p.page,
            paragraph: p.paragraph,
            line_number: p.line_number,
            quotes: p
                .quotes
                .into_iter()
                .map(|q| QuoteDto {
                    id: q.id,
                    text: q.text,
                    chapter: q.chapter,
                    page: q.page,
                    created_at: q.created_at,
                })
                .collect(),
            last_read_at: p.last_read_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /reading-progress - All progress records for the caller
#[utoipa::path(
    get,
    path = "/reading-progress",
    responses(
        (status = 200, description = "Records ordered by last read, newest first", body = [ProgressDto]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let listed = state
        .progress
        .list_progress(user_id)
        .await
        .map_err(port_error)?;
    let dtos: Vec<ProgressDto> = listed.into_iter().map(ProgressDto::from).collect();
    Ok(Json(dtos))
}

/// POST /reading-progress - Save (create-or-merge) progress for a book
#[utoipa::path(
    post,
    path = "/reading-progress",
    request_body = SaveProgressRequest,
    responses(
        (status = 200, description = "The merged record", body = ProgressDto),
        (status = 400, description = "Missing book id or title"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn save_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<SaveProgressRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let fields = ProgressFields {
        chapter: req.chapter,
        page: req.page,
        paragraph: req.paragraph,
        line_number: req.line_number,
    };
    let progress = state
        .progress
        .save_progress(user_id, &req.book_id, &req.book_title, &fields)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressDto::from(progress)))
}

/// GET /reading-progress/{bookId} - Progress for one book
#[utoipa::path(
    get,
    path = "/reading-progress/{bookId}",
    params(("bookId" = String, Path, description = "Percent-encoded book id")),
    responses(
        (status = 200, description = "The record", body = ProgressDto),
        (status = 404, description = "No progress for this book"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let progress = state
        .progress
        .get_progress(user_id, &book_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressDto::from(progress)))
}

/// PUT /reading-progress/{bookId} - Partial update of an existing record
///
/// Never creates. A `quotes` field replaces the whole collection.
#[utoipa::path(
    put,
    path = "/reading-progress/{bookId}",
    params(("bookId" = String, Path, description = "Percent-encoded book id")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "The updated record", body = ProgressDto),
        (status = 404, description = "No progress for this book"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(book_id): Path<String>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let patch = ProgressPatch {
        chapter: req.chapter,
        page: req.page,
        paragraph: req.paragraph,
        line_number: req.line_number,
        quotes: req
            .quotes
            .map(|quotes| quotes.into_iter().map(QuoteInput::into_quote).collect()),
    };
    let progress = state
        .progress
        .update_progress(user_id, &book_id, &patch)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressDto::from(progress)))
}

/// POST /reading-progress/{bookId}/quotes - Append a quote
///
/// Auto-creates the parent record with default position fields when absent.
#[utoipa::path(
    post,
    path = "/reading-progress/{bookId}/quotes",
    params(("bookId" = String, Path, description = "Percent-encoded book id")),
    request_body = AddQuoteRequest,
    responses(
        (status = 200, description = "The record including the new quote", body = ProgressDto),
        (status = 400, description = "Empty quote text"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn add_quote_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(book_id): Path<String>,
    Json(req): Json<AddQuoteRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let progress = state
        .progress
        .add_quote(
            user_id,
            &book_id,
            req.book_title.as_deref().unwrap_or(""),
            &req.text,
            req.chapter,
            req.page,
        )
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressDto::from(progress)))
}

/// DELETE /reading-progress/{bookId}/quotes/{quoteId} - Remove a quote
///
/// Removing an id that is not present succeeds and leaves the collection
/// unchanged; only a missing parent record is a 404.
#[utoipa::path(
    delete,
    path = "/reading-progress/{bookId}/quotes/{quoteId}",
    params(
        ("bookId" = String, Path, description = "Percent-encoded book id"),
        ("quoteId" = Uuid, Path, description = "Quote id")
    ),
    responses(
        (status = 200, description = "The record after removal", body = ProgressDto),
        (status = 404, description = "No progress for this book"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete_quote_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((book_id, quote_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let progress = state
        .progress
        .delete_quote(user_id, &book_id, quote_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressDto::from(progress)))
}
