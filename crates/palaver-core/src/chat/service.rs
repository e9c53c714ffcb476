//! Chat service orchestrating one conversation turn.
//!
//! `handle_turn` sanitizes the message, opens a turn, generates the reply and
//! completes that same turn by its ID. History and search are read-only
//! views over the same store.

use tracing::{debug, error};

use palaver_types::chat::TurnRecord;
use palaver_types::config::ChatConfig;
use palaver_types::error::{ConversationError, RepositoryError, ValidationError};
use palaver_types::text::{InputKind, SafeText};
use palaver_types::user::UserId;

use crate::chat::repository::ConversationRepository;
use crate::reply;
use crate::sanitize::validate_field;

/// Orchestrates chat turns and history queries.
///
/// Generic over `ConversationRepository` to maintain clean architecture
/// (palaver-core never depends on palaver-infra).
pub struct ChatService<R: ConversationRepository> {
    repo: R,
    config: ChatConfig,
}

impl<R: ConversationRepository> ChatService<R> {
    /// Create a new chat service with the given repository and limits.
    pub fn new(repo: R, config: ChatConfig) -> Self {
        Self { repo, config }
    }

    /// Access the conversation repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Run one message through sanitize, open, generate and complete.
    ///
    /// Nothing is written when the message fails validation.
    pub async fn handle_turn(
        &self,
        user_id: &UserId,
        raw_message: &str,
    ) -> Result<SafeText, ConversationError> {
        let message = validate_field("message", raw_message, InputKind::Plain)?;
        if message.is_empty() {
            return Err(ValidationError::new("message", "message cannot be empty").into());
        }

        let turn_id = self
            .repo
            .open_turn(user_id, message.as_str())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ConversationError::UnknownUser,
                other => storage_error("open turn", other),
            })?;

        let response = reply::generate(message.as_str());

        self.repo
            .complete_turn(user_id, &turn_id, response)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    error!(%user_id, %turn_id, "Turn was not open at completion");
                    ConversationError::TurnNotOpen
                }
                other => storage_error("complete turn", other),
            })?;

        debug!(
            %user_id,
            %turn_id,
            intent = ?reply::classify(message.as_str()),
            "Completed chat turn"
        );

        // Canned responses are trusted constants and need no escaping.
        Ok(SafeText::from_sanitized(response.to_string()))
    }

    /// The user's most recent turns, newest first.
    ///
    /// `None` uses the configured default; any limit is clamped to
    /// `[1, max_history_limit]`.
    pub async fn history(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<TurnRecord>, ConversationError> {
        let limit = self.effective_limit(limit);
        self.repo
            .recent(user_id, limit)
            .await
            .map_err(|e| storage_error("load history", e))
    }

    /// The user's turns whose message contains `keyword`, ignoring case.
    ///
    /// The keyword is sanitized like a message so it matches the stored form.
    /// Stored messages keep markup escaped, so a keyword such as `lt` or
    /// `amp` also matches messages that contained `<` or `&`.
    pub async fn search(
        &self,
        user_id: &UserId,
        keyword: &str,
    ) -> Result<Vec<TurnRecord>, ConversationError> {
        let keyword = validate_field("keyword", keyword, InputKind::Plain)?;
        if keyword.is_empty() {
            return Err(ValidationError::new("keyword", "keyword cannot be empty").into());
        }

        self.repo
            .search(user_id, keyword.as_str())
            .await
            .map_err(|e| storage_error("search history", e))
    }

    /// Count all turns stored for a user.
    pub async fn count_turns(&self, user_id: &UserId) -> Result<u64, ConversationError> {
        self.repo
            .count_turns(user_id)
            .await
            .map_err(|e| storage_error("count turns", e))
    }

    fn effective_limit(&self, requested: Option<u32>) -> u32 {
        let max = self.config.max_history_limit.max(1);
        requested
            .unwrap_or(self.config.default_history_limit)
            .clamp(1, max)
    }
}

fn storage_error(action: &str, e: RepositoryError) -> ConversationError {
    error!(error = %e, "Failed to {action}");
    ConversationError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use palaver_types::chat::{ChatTurn, TurnId};
    use std::collections::HashSet;
    use std::sync::Mutex;

    // --- Mocks ---

    #[derive(Default)]
    struct MemoryConversationRepository {
        users: Mutex<HashSet<UserId>>,
        turns: Mutex<Vec<ChatTurn>>,
    }

    impl MemoryConversationRepository {
        fn with_user(user_id: UserId) -> Self {
            let repo = Self::default();
            repo.users.lock().unwrap().insert(user_id);
            repo
        }

        fn add_user(&self, user_id: UserId) {
            self.users.lock().unwrap().insert(user_id);
        }

        fn newest_first(&self, user_id: &UserId) -> Vec<ChatTurn> {
            let mut turns: Vec<ChatTurn> = self
                .turns
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.user_id == *user_id)
                .cloned()
                .collect();
            turns.sort_by(|a, b| (b.created_at, b.id.0).cmp(&(a.created_at, a.id.0)));
            turns
        }
    }

    impl ConversationRepository for MemoryConversationRepository {
        async fn open_turn(
            &self,
            user_id: &UserId,
            message: &str,
        ) -> Result<TurnId, RepositoryError> {
            if !self.users.lock().unwrap().contains(user_id) {
                return Err(RepositoryError::NotFound);
            }
            let mut turns = self.turns.lock().unwrap();
            let mut turn = ChatTurn::open(*user_id, message.to_string());
            // Keep timestamps strictly increasing so ordering is deterministic.
            turn.created_at += Duration::microseconds(turns.len() as i64);
            let id = turn.id;
            turns.push(turn);
            Ok(id)
        }

        async fn complete_turn(
            &self,
            user_id: &UserId,
            turn_id: &TurnId,
            response: &str,
        ) -> Result<(), RepositoryError> {
            let mut turns = self.turns.lock().unwrap();
            let turn = turns
                .iter_mut()
                .find(|t| t.id == *turn_id && t.user_id == *user_id && t.is_open())
                .ok_or(RepositoryError::NotFound)?;
            turn.response = response.to_string();
            turn.completed_at = Some(Utc::now());
            Ok(())
        }

        async fn recent(
            &self,
            user_id: &UserId,
            limit: u32,
        ) -> Result<Vec<TurnRecord>, RepositoryError> {
            Ok(self
                .newest_first(user_id)
                .into_iter()
                .take(limit as usize)
                .map(TurnRecord::from)
                .collect())
        }

        async fn search(
            &self,
            user_id: &UserId,
            keyword: &str,
        ) -> Result<Vec<TurnRecord>, RepositoryError> {
            let needle = keyword.to_lowercase();
            Ok(self
                .newest_first(user_id)
                .into_iter()
                .filter(|t| t.message.to_lowercase().contains(&needle))
                .map(TurnRecord::from)
                .collect())
        }

        async fn get_turn(&self, turn_id: &TurnId) -> Result<Option<ChatTurn>, RepositoryError> {
            Ok(self.turns.lock().unwrap().iter().find(|t| t.id == *turn_id).cloned())
        }

        async fn count_turns(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
            Ok(self.newest_first(user_id).len() as u64)
        }
    }

    /// Store whose every call fails.
    struct BrokenRepository;

    impl ConversationRepository for BrokenRepository {
        async fn open_turn(&self, _: &UserId, _: &str) -> Result<TurnId, RepositoryError> {
            Err(RepositoryError::Connection)
        }

        async fn complete_turn(
            &self,
            _: &UserId,
            _: &TurnId,
            _: &str,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection)
        }

        async fn recent(&self, _: &UserId, _: u32) -> Result<Vec<TurnRecord>, RepositoryError> {
            Err(RepositoryError::Query("disk I/O error".to_string()))
        }

        async fn search(&self, _: &UserId, _: &str) -> Result<Vec<TurnRecord>, RepositoryError> {
            Err(RepositoryError::Query("disk I/O error".to_string()))
        }

        async fn get_turn(&self, _: &TurnId) -> Result<Option<ChatTurn>, RepositoryError> {
            Err(RepositoryError::Connection)
        }

        async fn count_turns(&self, _: &UserId) -> Result<u64, RepositoryError> {
            Err(RepositoryError::Connection)
        }
    }

    fn service_for(user_id: UserId) -> ChatService<MemoryConversationRepository> {
        ChatService::new(
            MemoryConversationRepository::with_user(user_id),
            ChatConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_handle_turn_stores_completed_turn() {
        let user = UserId::new();
        let svc = service_for(user);

        let reply = svc.handle_turn(&user, "  Hello there ").await.unwrap();
        assert_eq!(reply.as_str(), "Hello! How can I assist you today?");

        let history = svc.history(&user, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Hello there");
        assert_eq!(history[0].response, reply.as_str());

        let stored = svc.repo().get_turn(&history[0].id).await.unwrap().unwrap();
        assert!(!stored.is_open());
    }

    #[tokio::test]
    async fn test_handle_turn_escapes_markup_before_storage() {
        let user = UserId::new();
        let svc = service_for(user);

        svc.handle_turn(&user, "<script>alert('x')</script>").await.unwrap();

        let history = svc.history(&user, None).await.unwrap();
        assert!(!history[0].message.contains("<script>"));
        assert!(history[0].message.contains("&lt;"));
        assert!(history[0].message.contains("&gt;"));
    }

    #[tokio::test]
    async fn test_blank_message_writes_nothing() {
        let user = UserId::new();
        let svc = service_for(user);

        let err = svc.handle_turn(&user, "   ").await.unwrap_err();
        assert!(matches!(err, ConversationError::Validation(ref v) if v.field == "message"));
        assert_eq!(svc.count_turns(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let svc = service_for(UserId::new());
        let err = svc.handle_turn(&UserId::new(), "hello").await.unwrap_err();
        assert!(matches!(err, ConversationError::UnknownUser));
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_an_empty_success() {
        let svc = ChatService::new(BrokenRepository, ChatConfig::default());
        let user = UserId::new();

        assert!(matches!(
            svc.handle_turn(&user, "hello").await,
            Err(ConversationError::Storage(_))
        ));
        assert!(matches!(
            svc.history(&user, None).await,
            Err(ConversationError::Storage(_))
        ));
        assert!(matches!(
            svc.search(&user, "hello").await,
            Err(ConversationError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_bounded() {
        let user = UserId::new();
        let svc = service_for(user);
        for message in ["first", "second", "third"] {
            svc.handle_turn(&user, message).await.unwrap();
        }

        let history = svc.history(&user, Some(2)).await.unwrap();
        let messages: Vec<&str> = history.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["third", "second"]);
    }

    #[tokio::test]
    async fn test_history_is_repeatable() {
        let user = UserId::new();
        let svc = service_for(user);
        for i in 0..12 {
            svc.handle_turn(&user, &format!("message {i}")).await.unwrap();
        }

        let a = svc.history(&user, Some(10)).await.unwrap();
        let b = svc.history(&user, Some(10)).await.unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_history_limit_is_clamped() {
        let user = UserId::new();
        let svc = ChatService::new(
            MemoryConversationRepository::with_user(user),
            ChatConfig {
                default_history_limit: 2,
                max_history_limit: 3,
            },
        );
        for i in 0..5 {
            svc.handle_turn(&user, &format!("m{i}")).await.unwrap();
        }

        assert_eq!(svc.history(&user, None).await.unwrap().len(), 2);
        assert_eq!(svc.history(&user, Some(0)).await.unwrap().len(), 1);
        assert_eq!(svc.history(&user, Some(50)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_the_caller() {
        let alice = UserId::new();
        let bob = UserId::new();
        let svc = service_for(alice);
        svc.repo().add_user(bob);

        svc.handle_turn(&alice, "my secret plan").await.unwrap();
        svc.handle_turn(&bob, "bob's secret plan").await.unwrap();

        let found = svc.search(&alice, "SECRET").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "my secret plan");

        let found = svc.search(&alice, "' OR '1'='1").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_escaped_stored_text() {
        let user = UserId::new();
        let svc = service_for(user);
        svc.handle_turn(&user, "what's up").await.unwrap();

        let found = svc.search(&user, "what's").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_search_sees_entity_names_of_escaped_markup() {
        let user = UserId::new();
        let svc = service_for(user);
        svc.handle_turn(&user, "a < b").await.unwrap();
        svc.handle_turn(&user, "plain words").await.unwrap();

        let found = svc.search(&user, "lt").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "a &lt; b");
    }

    #[tokio::test]
    async fn test_blank_keyword_is_rejected() {
        let user = UserId::new();
        let svc = service_for(user);
        let err = svc.search(&user, "  ").await.unwrap_err();
        assert!(matches!(err, ConversationError::Validation(ref v) if v.field == "keyword"));
    }
}
