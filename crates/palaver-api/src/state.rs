//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/hasher/codec traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use palaver_core::chat::service::ChatService;
use palaver_core::service::account::AccountService;
use palaver_core::token::TokenService;
use palaver_infra::config::{load_global_config, load_signing_secret, resolve_data_dir};
use palaver_infra::crypto::password::Argon2CredentialHasher;
use palaver_infra::crypto::token::HmacTokenCodec;
use palaver_infra::sqlite::conversation::SqliteConversationRepository;
use palaver_infra::sqlite::pool::{DatabasePool, default_database_url};
use palaver_infra::sqlite::user::SqliteUserRepository;
use palaver_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAccountService = AccountService<SqliteUserRepository, Argon2CredentialHasher>;

pub type ConcreteChatService = ChatService<SqliteConversationRepository>;

pub type ConcreteTokenService = TokenService<HmacTokenCodec>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<ConcreteAccountService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub token_service: Arc<ConcreteTokenService>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config and secret, connect to
    /// DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let signing_secret = load_signing_secret(&data_dir).await?;
        let hasher = Argon2CredentialHasher::new()?;

        Self::build(&data_dir, config, signing_secret, hasher).await
    }

    /// Wire services from already-resolved parts.
    pub async fn build(
        data_dir: &Path,
        config: GlobalConfig,
        signing_secret: Vec<u8>,
        hasher: Argon2CredentialHasher,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&default_database_url(data_dir)).await?;

        let account_service =
            AccountService::new(SqliteUserRepository::new(db_pool.clone()), hasher);
        let chat_service = ChatService::new(
            SqliteConversationRepository::new(db_pool.clone()),
            config.chat.clone(),
        );
        let token_service = TokenService::new(
            HmacTokenCodec::new(signing_secret)?,
            config.auth.token_lifetime_secs,
        );

        tracing::debug!(data_dir = %data_dir.display(), "Application state initialized");

        Ok(Self {
            account_service: Arc::new(account_service),
            chat_service: Arc::new(chat_service),
            token_service: Arc::new(token_service),
            config: Arc::new(config),
            data_dir: data_dir.to_path_buf(),
            db_pool,
        })
    }

    /// Release the database pools. Call on every exit path.
    pub async fn shutdown(&self) {
        self.db_pool.close().await;
        tracing::debug!("Database pools closed");
    }
}
