//! Session token authentication extractors.
//!
//! Reads `Authorization: Bearer <token>` and runs it through the access
//! control gate. [`CurrentUser`] admits any valid token; [`AdminUser`]
//! additionally requires the admin role. Handlers that take one of these
//! never run for a rejected caller.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use palaver_core::gate::AccessGate;
use palaver_types::error::{AccountError, AuthError};
use palaver_types::token::Claims;
use palaver_types::user::{Role, User};

use crate::http::error::AppError;
use crate::state::AppState;

/// A caller holding a valid session token.
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

/// A caller holding a valid session token with the admin role.
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, None).await
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, Some(Role::Admin))
            .await
            .map(AdminUser)
    }
}

async fn authenticate(
    parts: &Parts,
    state: &AppState,
    required: Option<Role>,
) -> Result<CurrentUser, AppError> {
    let header = match parts.headers.get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
        None => None,
    };

    let mut gate = AccessGate::new(&*state.token_service);
    if let Some(role) = required {
        gate = gate.require(role);
    }
    let claims = gate.authorize(header)?;

    // A signed token for an account that no longer exists is still rejected.
    let user = state
        .account_service
        .get_user_by_username(&claims.username)
        .await
        .map_err(|e| match e {
            AccountError::NotFound => AppError::Auth(AuthError::InvalidToken),
            other => AppError::Account(other),
        })?;

    Ok(CurrentUser { user, claims })
}
