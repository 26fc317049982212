//! services/api/src/web/catalog.rs
//!
//! Pass-through handlers for the external Catalog Provider. Upstream
//! failures and timeouts surface as 503 responses; nothing here blocks past
//! the adapter's request timeout.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use readwell_core::domain::{CatalogBook, CatalogPage};

use crate::web::respond::{error_body, port_error, ErrorResponse};
use crate::web::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogBookDto {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover: String,
    pub year: Option<i32>,
    pub genre: Vec<String>,
    pub description: String,
    pub isbn: Option<String>,
}

impl From<CatalogBook> for CatalogBookDto {
    fn from(b: CatalogBook) -> Self {
        Self {
            id: b.id,
            title: b.title,
            author: b.author,
            cover: b.cover,
            year: b.year,
            genre: b.subjects,
            description: b.description,
            isbn: b.isbn,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPageResponse {
    pub books: Vec<CatalogBookDto>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl From<CatalogPage> for CatalogPageResponse {
    fn from(p: CatalogPage) -> Self {
        Self {
            books: p.books.into_iter().map(CatalogBookDto::from).collect(),
            total: p.total,
            page: p.page,
            total_pages: p.total_pages,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /catalog/search - Search the external catalog
#[utoipa::path(
    get,
    path = "/catalog/search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "One page of matches", body = CatalogPageResponse),
        (status = 400, description = "Missing query"),
        (status = 503, description = "Catalog unavailable")
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| error_body(StatusCode::BAD_REQUEST, "Search query is required"))?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let result = state
        .catalog
        .search(&q, page, limit)
        .await
        .map_err(port_error)?;
    Ok(Json(CatalogPageResponse::from(result)))
}

/// GET /catalog/book/{id} - Detail lookup by provider key
///
/// The id is the provider's hierarchical key (e.g. `/works/OL45883W`) and
/// arrives percent-encoded in the path.
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    params(("id" = String, Path, description = "Percent-encoded provider key")),
    responses(
        (status = 200, description = "Book detail", body = CatalogBookDto),
        (status = 503, description = "Catalog unavailable")
    )
)]
pub async fn book_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let book = state.catalog.book(&id).await.map_err(port_error)?;
    Ok(Json(CatalogBookDto::from(book)))
}

/// GET /catalog/popular - Trending books from the provider
#[utoipa::path(
    get,
    path = "/catalog/popular",
    responses(
        (status = 200, description = "Trending list", body = [CatalogBookDto]),
        (status = 503, description = "Catalog unavailable")
    )
)]
pub async fn popular_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let books = state.catalog.popular().await.map_err(port_error)?;
    let dtos: Vec<CatalogBookDto> = books.into_iter().map(CatalogBookDto::from).collect();
    Ok(Json(dtos))
}

/// GET /catalog/category/{genre} - Browse the provider by subject
#[utoipa::path(
    get,
    path = "/catalog/category/{genre}",
    params(
        ("genre" = String, Path, description = "Subject name"),
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "One page of the subject", body = CatalogPageResponse),
        (status = 503, description = "Catalog unavailable")
    )
)]
pub async fn category_handler(
    State(state): State<Arc<AppState>>,
    Path(genre): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let result = state
        .catalog
        .category(&genre, page, limit)
        .await
        .map_err(port_error)?;
    Ok(Json(CatalogPageResponse::from(result)))
}
