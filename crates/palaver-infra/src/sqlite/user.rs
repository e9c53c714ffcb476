//! SQLite user repository implementation (the credential store).
//!
//! Implements `UserRepository` from `palaver-core` using sqlx with split
//! read/write pools. The UNIQUE constraint on `username` is the single source
//! of truth for duplicate detection, so concurrent registrations of one name
//! cannot both succeed.

use palaver_core::repository::user::UserRepository;
use palaver_types::error::RepositoryError;
use palaver_types::user::{Role, User, UserCredential, UserId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain users.
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    email: Option<String>,
    role: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_credential(self) -> Result<UserCredential, RepositoryError> {
        let id = self
            .id
            .parse::<UserId>()
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;

        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(UserCredential {
            user: User {
                id,
                username: self.username,
                email: self.email,
                role,
                created_at: parse_datetime(&self.created_at)?,
            },
            password_hash: self.password_hash,
        })
    }
}

impl SqliteUserRepository {
    async fn fetch_one_where(
        &self,
        sql: &str,
        value: String,
    ) -> Result<Option<UserCredential>, RepositoryError> {
        let row = sqlx::query(sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_credential()?))
            }
            None => Ok(None),
        }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, credential: &UserCredential) -> Result<User, RepositoryError> {
        let user = &credential.user;

        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, email, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&credential.password_hash)
        .bind(&user.email)
        .bind(user.role.to_string())
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("username '{}' already exists", user.username)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let credential = self
            .fetch_one_where("SELECT * FROM users WHERE id = ?", id.to_string())
            .await?;
        Ok(credential.map(|c| c.user))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let credential = self.get_credential(username).await?;
        Ok(credential.map(|c| c.user))
    }

    async fn get_credential(
        &self,
        username: &str,
    ) -> Result<Option<UserCredential>, RepositoryError> {
        self.fetch_one_where(
            "SELECT * FROM users WHERE username = ?",
            username.to_string(),
        )
        .await
    }

    async fn update_email(&self, id: &UserId, email: Option<&str>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(email)
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}
