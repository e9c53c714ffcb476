//! Registration and login handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use palaver_types::user::{RegisterRequest, Role, UserId};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Body of POST /auth/login. No `Debug`: it carries a password.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub role: Role,
}

/// POST /api/v1/auth/register - Create a user account (no token issued).
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Registered>>), AppError> {
    let timer = RequestTimer::start();

    let user = state.account_service.register(body).await?;

    let resp = timer
        .finish(Registered {
            user_id: user.id,
            username: user.username,
        })
        .with_link("login", "/api/v1/auth/login");

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/v1/auth/login - Verify credentials and issue a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let timer = RequestTimer::start();

    let issued = state
        .account_service
        .login(&*state.token_service, &body.username, &body.password)
        .await?;

    Ok(Json(timer.finish(LoginResponse {
        expires_at: issued.claims.expires_at(),
        role: issued.claims.role,
        token: issued.token.into_inner(),
    })))
}
