//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{catalog::OpenLibraryAdapter, db::PgStore},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, signup_handler, verify_handler},
        books::{create_book_handler, get_book_handler, list_books_handler},
        catalog::{book_detail_handler, category_handler, popular_handler, search_handler},
        index_handler,
        library::{
            add_entry_handler, check_entry_handler, list_entries_handler, remove_entry_handler,
        },
        middleware::require_auth,
        progress::{
            add_quote_handler, delete_quote_handler, get_progress_handler,
            list_progress_handler, save_progress_handler, update_progress_handler,
        },
        ratings::{
            book_average_handler, get_user_rating_handler, list_user_ratings_handler,
            popular_week_handler, submit_rating_handler,
        },
        state::AppState,
        ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Catalog Adapter ---
    let catalog = Arc::new(
        OpenLibraryAdapter::new(
            config.catalog_base_url.clone(),
            config.catalog_covers_url.clone(),
            Duration::from_secs(config.catalog_timeout_secs),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to build catalog client: {e}")))?,
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, catalog, config.clone()));

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {e}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(index_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/ratings/book/{book_id}/average", get(book_average_handler))
        .route("/ratings/popular/week", get(popular_week_handler))
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route("/books/{id}", get(get_book_handler))
        .route("/catalog/search", get(search_handler))
        .route("/catalog/book/{id}", get(book_detail_handler))
        .route("/catalog/popular", get(popular_handler))
        .route("/catalog/category/{genre}", get(category_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/verify", get(verify_handler))
        .route("/ratings", post(submit_rating_handler))
        .route("/ratings/user", get(list_user_ratings_handler))
        .route("/ratings/{book_id}", get(get_user_rating_handler))
        .route(
            "/reading-progress",
            get(list_progress_handler).post(save_progress_handler),
        )
        .route(
            "/reading-progress/{book_id}",
            get(get_progress_handler).put(update_progress_handler),
        )
        .route("/reading-progress/{book_id}/quotes", post(add_quote_handler))
        .route(
            "/reading-progress/{book_id}/quotes/{quote_id}",
            delete(delete_quote_handler),
        )
        .route(
            "/library",
            get(list_entries_handler).post(add_entry_handler),
        )
        .route("/library/{book_id}", delete(remove_entry_handler))
        .route("/library/check/{book_id}", get(check_entry_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete
    // application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
