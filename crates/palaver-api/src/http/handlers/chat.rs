//! Chat turn and history handlers. All require a session token.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use palaver_types::chat::TurnRecord;

use crate::http::error::AppError;
use crate::http::extractors::auth::{AdminUser, CurrentUser};
use crate::http::extractors::query::{HistoryQuery, SearchQuery};
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Body of POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// POST /api/v1/chat - Send one message and receive the generated reply.
pub async fn send_message(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let timer = RequestTimer::start();

    let reply = state
        .chat_service
        .handle_turn(&caller.user.id, &body.message)
        .await?;

    Ok(Json(
        timer
            .finish(ChatReply {
                reply: reply.into_inner(),
            })
            .with_link("history", "/api/v1/history"),
    ))
}

/// GET /api/v1/history?limit= - The caller's most recent turns.
pub async fn history(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<TurnRecord>>>, AppError> {
    let timer = RequestTimer::start();

    let turns = state
        .chat_service
        .history(&caller.user.id, query.limit)
        .await?;

    Ok(Json(timer.finish(turns)))
}

/// GET /api/v1/history/search?q= - Search the caller's own turns.
pub async fn search(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<TurnRecord>>>, AppError> {
    let timer = RequestTimer::start();

    let turns = state
        .chat_service
        .search(&caller.user.id, &query.q)
        .await?;

    Ok(Json(timer.finish(turns)))
}

/// GET /api/v1/admin/users/{username}/history - Any user's history (admin only).
pub async fn user_history(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<TurnRecord>>>, AppError> {
    let timer = RequestTimer::start();

    let user = state
        .account_service
        .get_user_by_username(&username)
        .await?;

    tracing::info!(
        admin = %admin.claims.username,
        target_user = %user.username,
        "Admin history access"
    );

    let turns = state.chat_service.history(&user.id, query.limit).await?;

    Ok(Json(timer.finish(turns)))
}
