//! ConversationRepository trait definition.
//!
//! Follows the same RPITIT pattern as UserRepository.

use palaver_types::chat::{ChatTurn, TurnId, TurnRecord};
use palaver_types::error::RepositoryError;
use palaver_types::user::UserId;

/// Repository trait for chat turn persistence.
///
/// Implementations live in palaver-infra (e.g., `SqliteConversationRepository`).
/// Every query is scoped to one user and binds its parameters.
pub trait ConversationRepository: Send + Sync {
    /// Record a new turn with an empty response and return its ID.
    ///
    /// Returns `RepositoryError::NotFound` when `user_id` does not exist.
    fn open_turn(
        &self,
        user_id: &UserId,
        message: &str,
    ) -> impl std::future::Future<Output = Result<TurnId, RepositoryError>> + Send;

    /// Attach the response to an open turn owned by `user_id`.
    ///
    /// Returns `RepositoryError::NotFound` when the turn does not exist,
    /// belongs to another user, or was already completed.
    fn complete_turn(
        &self,
        user_id: &UserId,
        turn_id: &TurnId,
        response: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The user's most recent turns, newest first, at most `limit`.
    fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<TurnRecord>, RepositoryError>> + Send;

    /// The user's turns whose message contains `keyword`, ignoring case,
    /// newest first.
    fn search(
        &self,
        user_id: &UserId,
        keyword: &str,
    ) -> impl std::future::Future<Output = Result<Vec<TurnRecord>, RepositoryError>> + Send;

    /// Get a single turn by ID.
    fn get_turn(
        &self,
        turn_id: &TurnId,
    ) -> impl std::future::Future<Output = Result<Option<ChatTurn>, RepositoryError>> + Send;

    /// Count all turns stored for a user.
    fn count_turns(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
