//! services/api/src/web/books.rs
//!
//! Handlers for the self-hosted seed catalog. These are public routes; the
//! catalog exists so the app works without the external provider.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use readwell_core::domain::{Book, BookFilter, NewBook};
use readwell_core::ports::PortError;

use crate::web::respond::{port_error, ErrorResponse};
use crate::web::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub min_rating: Option<f64>,
    pub language: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub cover: String,
    pub rating: f64,
    pub year: i32,
    pub genre: String,
    pub language: String,
    pub description: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub cover: String,
    pub rating: f64,
    pub year: i32,
    pub genre: String,
    pub language: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookDto {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            title: b.title,
            author: b.author,
            cover: b.cover,
            rating: b.rating,
            year: b.year,
            genre: b.genre,
            language: b.language,
            description: b.description,
            created_at: b.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookListResponse {
    pub books: Vec<BookDto>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /books - List the local catalog with filters
#[utoipa::path(
    get,
    path = "/books",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive title/author match"),
        ("genre" = Option<String>, Query, description = "Genre filter"),
        ("minRating" = Option<f64>, Query, description = "Minimum rating"),
        ("language" = Option<String>, Query, description = "Language filter, 'all' disables"),
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Matching page of books", body = BookListResponse)
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200);
    let page = query.page.unwrap_or(1).max(1);
    let filter = BookFilter {
        search: query.search.filter(|s| !s.is_empty()),
        genre: query.genre.filter(|g| !g.is_empty()),
        min_rating: query.min_rating,
        // "all" means no language filter, mirroring the front-end selector.
        language: query.language.filter(|l| !l.is_empty() && l != "all"),
        page,
        limit,
    };
    let (books, total) = state.db.list_books(&filter).await.map_err(port_error)?;
    Ok(Json(BookListResponse {
        books: books.into_iter().map(BookDto::from).collect(),
        total_pages: (total + limit - 1) / limit,
        current_page: page,
        total,
    }))
}

/// GET /books/{id} - Fetch a single local catalog book
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = BookDto),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let book = state
        .db
        .get_book(id)
        .await
        .map_err(port_error)?
        .ok_or_else(|| port_error(PortError::NotFound("Book not found".to_string())))?;
    Ok(Json(BookDto::from(book)))
}

/// POST /books - Add a book to the local catalog
#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "The created book", body = BookDto),
        (status = 400, description = "Invalid genre, language, or rating")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if req.title.trim().is_empty() || req.author.trim().is_empty() {
        return Err(port_error(PortError::Validation(
            "Title and author are required".to_string(),
        )));
    }
    let book = state
        .db
        .create_book(&NewBook {
            title: req.title,
            author: req.author,
            cover: req.cover,
            rating: req.rating,
            year: req.year,
            genre: req.genre,
            language: req.language,
            description: req.description,
        })
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(BookDto::from(book))))
}
