//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Token failures share one message and credential failures another, so a
//! response never reveals which check rejected the caller. Storage and other
//! internal failures are logged here and answered with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use palaver_types::error::{AccountError, AuthError, ConversationError, ValidationError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Registration and credential errors.
    Account(AccountError),
    /// Access control rejections.
    Auth(AuthError),
    /// Chat turn and history errors.
    Conversation(ConversationError),
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        AppError::Account(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

const INTERNAL_MESSAGE: &str = "internal server error";

/// Status, machine-readable code, message, details.
type ErrorParts = (StatusCode, &'static str, String, Option<serde_json::Value>);

fn validation(v: &ValidationError) -> ErrorParts {
    (
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        v.to_string(),
        Some(json!({ "field": v.field })),
    )
}

fn internal(detail: &dyn std::fmt::Display) -> ErrorParts {
    tracing::error!(error = %detail, "Request failed with internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
        None,
    )
}

impl AppError {
    fn parts(&self) -> ErrorParts {
        match self {
            AppError::Auth(e @ AuthError::AuthRequired) => {
                (StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", e.to_string(), None)
            }
            AppError::Auth(e @ (AuthError::InvalidToken | AuthError::Expired)) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", e.to_string(), None)
            }
            AppError::Auth(e @ AuthError::InsufficientPermissions) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string(), None)
            }
            AppError::Account(e @ AccountError::InvalidCredential) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIAL", e.to_string(), None)
            }
            AppError::Account(e @ AccountError::DuplicateUsername) => {
                (StatusCode::CONFLICT, "USERNAME_TAKEN", e.to_string(), None)
            }
            AppError::Account(AccountError::Validation(v)) => validation(v),
            AppError::Account(e @ AccountError::NotFound) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", e.to_string(), None)
            }
            AppError::Account(e @ (AccountError::Token(_) | AccountError::Storage(_))) => {
                internal(e)
            }
            AppError::Conversation(ConversationError::Validation(v)) => validation(v),
            AppError::Conversation(e @ ConversationError::UnknownUser) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", e.to_string(), None)
            }
            AppError::Conversation(
                e @ (ConversationError::TurnNotOpen | ConversationError::Storage(_)),
            ) => internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        (status, Json(ApiResponse::error(code, &message, details))).into_response()
    }
}
