//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::web::state::AppState;

/// The authenticated user's identity, inserted into request extensions by
/// `require_auth`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

/// Middleware that validates the bearer credential and extracts the user id.
///
/// If valid, inserts `CurrentUser` into request extensions for handlers to
/// use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse the bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate the session in the database, get the user id
    let user_id = state.db.validate_auth_session(token).await.map_err(|e| {
        debug!("Rejected auth session: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 4. Insert the identity into request extensions
    req.extensions_mut().insert(CurrentUser(user_id));

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
