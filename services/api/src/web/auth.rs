//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout, and token
//! verification. Sessions are opaque bearer tokens backed by the
//! `auth_sessions` table.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::CurrentUser;
use crate::web::respond::{error_body, ErrorResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserBody {
    pub id: Uuid,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserBody,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "A valid email is required",
        ));
    }
    if req.password.len() < 6 {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "Password must be at least 6 characters",
        ));
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password")
        })?
        .to_string();

    // 2. Create user in database
    let user = state
        .db
        .create_user_with_email(&req.email, &password_hash)
        .await
        .map_err(crate::web::respond::port_error)?;

    // 3. Issue a bearer session token
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&token, user.user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;

    let response = AuthResponse {
        token,
        user: UserBody {
            id: user.user_id,
            email: user.email.unwrap_or_default(),
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    // 1. Get user by email
    let user_creds = state.db.get_user_by_email(&req.email).await.map_err(|_| {
        error_body(StatusCode::UNAUTHORIZED, "Invalid email or password")
    })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        error_body(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error")
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err(error_body(
            StatusCode::UNAUTHORIZED,
            "Invalid email or password",
        ));
    }

    // 3. Issue a bearer session token
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&token, user_creds.user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;

    let response = AuthResponse {
        token,
        user: UserBody {
            id: user_creds.user_id,
            email: user_creds.email,
        },
    };
    Ok((StatusCode::OK, Json(response)))
}

/// POST /auth/logout - Logout and invalidate the session token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, ErrorResponse> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "No session found"))?;

    state.db.delete_auth_session(token).await.map_err(|e| {
        error!("Failed to delete auth session: {:?}", e);
        error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout")
    })?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "message": "Logged out" }))))
}

/// GET /auth/verify - Resolve the bearer token to its user
#[utoipa::path(
    get,
    path = "/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = UserBody),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(crate::web::respond::port_error)?;
    Ok(Json(UserBody {
        id: user.user_id,
        email: user.email.unwrap_or_default(),
    }))
}
