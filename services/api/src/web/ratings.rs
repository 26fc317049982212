//! services/api/src/web/ratings.rs
//!
//! Handlers for rating submission, per-user lookup, live book averages, and
//! the weekly popularity ranking.

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

use readwell_core::domain::{PopularBook, Rating};

use crate::web::middleware::CurrentUser;
use crate::web::respond::{port_error, ErrorResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub book_id: String,
    pub book_title: String,
    pub rating: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingDto {
    pub id: Uuid,
    pub book_id: String,
    pub book_title: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Rating> for RatingDto {
    fn from(r: Rating) -> Self {
        Self {
            id: r.id,
            book_id: r.book_id,
            book_title: r.book_title,
            rating: r.rating,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAverageResponse {
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopularBookDto {
    pub book_id: String,
    pub book_title: String,
    pub average_rating: f64,
    pub total_ratings: i64,
}

impl From<PopularBook> for PopularBookDto {
    fn from(p: PopularBook) -> Self {
        Self {
            book_id: p.book_id,
            book_title: p.book_title,
            average_rating: p.average_rating,
            total_ratings: p.total_ratings,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /ratings - Add or update the caller's rating for a book
#[utoipa::path(
    post,
    path = "/ratings",
    request_body = SubmitRatingRequest,
    responses(
        (status = 200, description = "Rating stored", body = RatingDto),
        (status = 400, description = "Missing or out-of-range fields"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn submit_rating_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let rating = state
        .ratings
        .submit_rating(user_id, &req.book_id, &req.book_title, req.rating)
        .await
        .map_err(port_error)?;
    Ok(Json(RatingDto::from(rating)))
}

/// GET /ratings/user - All ratings by the authenticated user
#[utoipa::path(
    get,
    path = "/ratings/user",
    responses(
        (status = 200, description = "The caller's ratings", body = [RatingDto]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_user_ratings_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let ratings = state
        .ratings
        .ratings_for_user(user_id)
        .await
        .map_err(port_error)?;
    let dtos: Vec<RatingDto> = ratings.into_iter().map(RatingDto::from).collect();
    Ok(Json(dtos))
}

/// GET /ratings/{bookId} - The caller's rating for one book
///
/// A missing rating is an empty result (`{"rating": null}`), not an error.
#[utoipa::path(
    get,
    path = "/ratings/{bookId}",
    params(("bookId" = String, Path, description = "Percent-encoded book id")),
    responses(
        (status = 200, description = "Rating, or {\"rating\": null} when absent"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_user_rating_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let rating = state
        .ratings
        .user_rating(user_id, &book_id)
        .await
        .map_err(port_error)?;
    let body = match rating {
        Some(r) => serde_json::to_value(RatingDto::from(r))
            .unwrap_or_else(|_| serde_json::json!({ "rating": null })),
        None => serde_json::json!({ "rating": null }),
    };
    Ok(Json(body))
}

/// GET /ratings/book/{bookId}/average - Live average rating for a book
#[utoipa::path(
    get,
    path = "/ratings/book/{bookId}/average",
    params(("bookId" = String, Path, description = "Percent-encoded book id")),
    responses(
        (status = 200, description = "Average and count", body = BookAverageResponse)
    )
)]
pub async fn book_average_handler(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let summary = state
        .ratings
        .book_average(&book_id)
        .await
        .map_err(port_error)?;
    Ok(Json(BookAverageResponse {
        average_rating: summary.average,
        total_ratings: summary.count,
    }))
}

/// GET /ratings/popular/week - Books ranked by ratings from the last 7 days
#[utoipa::path(
    get,
    path = "/ratings/popular/week",
    responses(
        (status = 200, description = "Up to 20 ranked books", body = [PopularBookDto])
    )
)]
pub async fn popular_week_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let popular = state
        .ratings
        .popular_this_week()
        .await
        .map_err(port_error)?;
    let dtos: Vec<PopularBookDto> = popular.into_iter().map(PopularBookDto::from).collect();
    Ok(Json(dtos))
}
