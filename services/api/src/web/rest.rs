//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the root index
//! handler.

use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::web::{auth, books, catalog, library, progress, ratings, respond};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::verify_handler,
        ratings::submit_rating_handler,
        ratings::list_user_ratings_handler,
        ratings::get_user_rating_handler,
        ratings::book_average_handler,
        ratings::popular_week_handler,
        progress::list_progress_handler,
        progress::save_progress_handler,
        progress::get_progress_handler,
        progress::update_progress_handler,
        progress::add_quote_handler,
        progress::delete_quote_handler,
        library::list_entries_handler,
        library::add_entry_handler,
        library::remove_entry_handler,
        library::check_entry_handler,
        books::list_books_handler,
        books::get_book_handler,
        books::create_book_handler,
        catalog::search_handler,
        catalog::book_detail_handler,
        catalog::popular_handler,
        catalog::category_handler,
    ),
    components(
        schemas(
            respond::ErrorBody,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserBody,
            ratings::SubmitRatingRequest,
            ratings::RatingDto,
            ratings::BookAverageResponse,
            ratings::PopularBookDto,
            progress::SaveProgressRequest,
            progress::UpdateProgressRequest,
            progress::AddQuoteRequest,
            progress::QuoteInput,
            progress::QuoteDto,
            progress::ProgressDto,
            library::AddEntryRequest,
            library::LibraryEntryDto,
            library::LibraryCheckResponse,
            books::CreateBookRequest,
            books::BookDto,
            books::BookListResponse,
            catalog::CatalogBookDto,
            catalog::CatalogPageResponse,
        )
    ),
    tags(
        (name = "ReadWell API", description = "Book discovery and reading tracking endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Root Index
//=========================================================================================

/// GET / - A short map of the API for anyone poking at the root.
pub async fn index_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "ReadWell backend API is running",
        "endpoints": {
            "getAllBooks": "GET /books",
            "searchBooks": "GET /books?search=query",
            "catalogSearch": "GET /catalog/search?q=query",
            "popularBooks": "GET /catalog/popular",
            "categoryBooks": "GET /catalog/category/{genre}",
            "signup": "POST /auth/signup",
            "login": "POST /auth/login",
            "verify": "GET /auth/verify",
            "readingProgress": "GET/POST /reading-progress",
            "ratings": "GET/POST /ratings",
            "popularThisWeek": "GET /ratings/popular/week",
            "library": "GET/POST/DELETE /library"
        }
    }))
}
