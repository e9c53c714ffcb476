//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `palaver-core`. Every statement
//! binds its inputs and filters on `user_id`, so one user's history is never
//! visible through another user's query.

use chrono::Utc;
use palaver_core::chat::repository::ConversationRepository;
use palaver_types::chat::{ChatTurn, TurnId, TurnRecord};
use palaver_types::error::RepositoryError;
use palaver_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain turns.
struct TurnRow {
    id: String,
    user_id: String,
    message: String,
    response: String,
    created_at: String,
    completed_at: Option<String>,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            message: row.try_get("message")?,
            response: row.try_get("response")?,
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    fn into_turn(self) -> Result<ChatTurn, RepositoryError> {
        let id = self
            .id
            .parse::<TurnId>()
            .map_err(|e| RepositoryError::Query(format!("invalid turn id: {e}")))?;
        let user_id = self
            .user_id
            .parse::<UserId>()
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;

        Ok(ChatTurn {
            id,
            user_id,
            message: self.message,
            response: self.response,
            created_at: parse_datetime(&self.created_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

fn rows_to_records(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<TurnRecord>, RepositoryError> {
    rows.iter()
        .map(|row| {
            let turn_row =
                TurnRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(TurnRecord::from(turn_row.into_turn()?))
        })
        .collect()
}

impl ConversationRepository for SqliteConversationRepository {
    async fn open_turn(&self, user_id: &UserId, message: &str) -> Result<TurnId, RepositoryError> {
        let turn = ChatTurn::open(*user_id, message.to_string());

        let result = sqlx::query(
            "INSERT INTO chat_turns
                 (id, user_id, message, message_folded, response, created_at, completed_at)
             VALUES (?, ?, ?, ?, '', ?, NULL)",
        )
        .bind(turn.id.to_string())
        .bind(user_id.to_string())
        .bind(&turn.message)
        .bind(turn.message.to_lowercase())
        .bind(format_datetime(&turn.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(turn.id),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => {
                Err(RepositoryError::NotFound)
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn complete_turn(
        &self,
        user_id: &UserId,
        turn_id: &TurnId,
        response: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_turns SET response = ?, completed_at = ?
             WHERE id = ? AND user_id = ? AND completed_at IS NULL",
        )
        .bind(response)
        .bind(format_datetime(&Utc::now()))
        .bind(turn_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TurnRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_turns WHERE user_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_records(&rows)
    }

    async fn search(
        &self,
        user_id: &UserId,
        keyword: &str,
    ) -> Result<Vec<TurnRecord>, RepositoryError> {
        // Both sides are folded in Rust so non-ASCII letters match too.
        // instr() treats the keyword literally; LIKE would give '%' and '_' meaning.
        let rows = sqlx::query(
            "SELECT * FROM chat_turns
             WHERE user_id = ? AND instr(message_folded, ?) > 0
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id.to_string())
        .bind(keyword.to_lowercase())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_records(&rows)
    }

    async fn get_turn(&self, turn_id: &TurnId) -> Result<Option<ChatTurn>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_turns WHERE id = ?")
            .bind(turn_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let turn_row =
                    TurnRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(turn_row.into_turn()?))
            }
            None => Ok(None),
        }
    }

    async fn count_turns(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_turns WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}
