//! UserRepository trait definition (the credential store).

use palaver_types::error::RepositoryError;
use palaver_types::user::{User, UserCredential, UserId};

/// Repository trait for user persistence.
///
/// Implementations live in palaver-infra (e.g., `SqliteUserRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait UserRepository: Send + Sync {
    /// Insert a new user with its password verifier.
    ///
    /// Returns `RepositoryError::Conflict` when the username is taken. Under
    /// concurrent inserts of one username exactly one call succeeds.
    fn create(
        &self,
        credential: &UserCredential,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by its unique ID.
    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by exact username.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user and its stored verifier by exact username.
    fn get_credential(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserCredential>, RepositoryError>> + Send;

    /// Replace (or clear) a user's email. The only mutable user field.
    fn update_email(
        &self,
        id: &UserId,
        email: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count registered users.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
