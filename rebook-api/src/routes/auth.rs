/// Authentication endpoints
///
/// Credentials are checked by the external identity provider; on success the
/// API issues its own access (24h) and refresh (30d) tokens.
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account and its salon
/// - `POST /v1/auth/login` - Sign in (creates the salon record on first sign-in)
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
/// - `POST /v1/auth/logout` - Publish a signed-out event (tokens are stateless)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rebook_shared::auth::context::AuthContext;
use rebook_shared::auth::jwt::{self, TokenPair};
use rebook_shared::auth::session::Session;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 2, max = 100, message = "Salon name must be 2 to 100 characters"))]
    pub salon_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Returned by signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub salon_id: String,
    pub email: String,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

fn auth_response(state: &AppState, session: Session) -> ApiResult<AuthResponse> {
    let tokens = jwt::issue_tokens(&session.user.uid, &session.salon.id, state.jwt_secret())?;

    Ok(AuthResponse {
        user_id: session.user.uid,
        salon_id: session.salon.id,
        email: session.user.email,
        tokens,
    })
}

/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed or password too weak
/// - `502 Bad Gateway`: Identity provider failure
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let session = state
        .sessions
        .sign_up(&req.email, &req.password, req.salon_name.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, session)?)))
}

/// # Errors
///
/// - `401 Unauthorized`: Invalid email or password
/// - `502 Bad Gateway`: Identity provider failure
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let session = state.sessions.sign_in(&req.email, &req.password).await?;
    tracing::info!(user_id = %session.user.uid, "User signed in");

    Ok(Json(auth_response(&state, session)?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;
    Ok(Json(RefreshResponse { access_token }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> StatusCode {
    state.sessions.sign_out(&auth.user_id);
    tracing::info!(user_id = %auth.user_id, "User signed out");
    StatusCode::NO_CONTENT
}
