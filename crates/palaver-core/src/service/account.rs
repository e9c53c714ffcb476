//! Account service: registration, credential checks and login.
//!
//! Passwords only ever reach the `CredentialHasher`; the repository stores and
//! returns verifiers. Unknown usernames and wrong passwords fail identically.
//!
//! Hashing is memory-hard and takes tens of milliseconds, so every hasher call
//! runs on tokio's blocking pool instead of an async worker thread.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use palaver_types::error::{AccountError, RepositoryError, ValidationError};
use palaver_types::text::InputKind;
use palaver_types::token::IssuedToken;
use palaver_types::user::{RegisterRequest, Role, User, UserCredential, UserId};

use crate::repository::user::UserRepository;
use crate::sanitize::{has_markup, validate_field};
use crate::service::clock::Clock;
use crate::service::credential::CredentialHasher;
use crate::token::{TokenCodec, TokenService};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Service orchestrating user registration and authentication.
///
/// Generic over repository and hashing traits to maintain clean
/// architecture -- palaver-core never depends on palaver-infra.
pub struct AccountService<U: UserRepository, H: CredentialHasher> {
    user_repo: U,
    hasher: Arc<H>,
}

impl<U: UserRepository, H: CredentialHasher> AccountService<U, H> {
    pub fn new(user_repo: U, hasher: H) -> Self {
        Self {
            user_repo,
            hasher: Arc::new(hasher),
        }
    }

    /// Access the user repository.
    pub fn user_repo(&self) -> &U {
        &self.user_repo
    }

    /// Register a regular user. No token is issued.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AccountError> {
        self.register_with_role(request, Role::User).await
    }

    /// Register a user with an explicit role (admin bootstrap).
    pub async fn register_with_role(
        &self,
        request: RegisterRequest,
        role: Role,
    ) -> Result<User, AccountError> {
        let username = normalize_username(&request.username)?;

        if request.password.is_empty() {
            return Err(ValidationError::new("password", "password cannot be empty").into());
        }

        let email = normalize_email(request.email.as_deref())?;

        let password_hash = self.hash_password(request.password).await?;

        let credential = UserCredential {
            user: User {
                id: UserId::new(),
                username,
                email,
                role,
                created_at: Utc::now(),
            },
            password_hash,
        };

        let user = self
            .user_repo
            .create(&credential)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::DuplicateUsername,
                other => storage_error("create user", other),
            })?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");
        Ok(user)
    }

    /// Check a username/password pair and return the stored role.
    pub async fn verify_credential(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Role, AccountError> {
        Ok(self.authenticate(username, password).await?.role)
    }

    /// Check a username/password pair and return the user.
    ///
    /// The username is an exact-match lookup key. Names that could never
    /// have been registered skip the lookup but still pay for a hash check.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let lookup = username.trim();

        let record = if lookup.is_empty() || !is_acceptable_username(lookup) {
            None
        } else {
            self.user_repo
                .get_credential(lookup)
                .await
                .map_err(|e| storage_error("load credential", e))?
        };

        match record {
            Some(credential) => {
                let verifier = credential.password_hash.clone();
                if self.verify_password(password, verifier).await {
                    Ok(credential.user)
                } else {
                    warn!(user_id = %credential.user.id, "Rejected login: credential mismatch");
                    Err(AccountError::InvalidCredential)
                }
            }
            None => {
                let decoy = self.hasher.decoy().to_string();
                let _ = self.verify_password(password, decoy).await;
                warn!("Rejected login: credential mismatch");
                Err(AccountError::InvalidCredential)
            }
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "Credential hashing task failed");
                AccountError::Storage(e.to_string())
            })?
            .map_err(|e| AccountError::Storage(e.to_string()))
    }

    /// A verification task that fails to complete counts as a mismatch.
    async fn verify_password(&self, password: &str, verifier: String) -> bool {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        match tokio::task::spawn_blocking(move || hasher.verify(&password, &verifier)).await {
            Ok(matched) => matched,
            Err(e) => {
                error!(error = %e, "Credential verification task failed");
                false
            }
        }
    }

    /// Verify credentials and issue a session token carrying the stored role.
    pub async fn login<C: TokenCodec, K: Clock>(
        &self,
        tokens: &TokenService<C, K>,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, AccountError> {
        let user = self.authenticate(username, password).await?;
        let issued = tokens.issue(&user.username, user.role)?;
        info!(user_id = %user.id, "Login succeeded");
        Ok(issued)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &UserId) -> Result<User, AccountError> {
        self.user_repo
            .get_by_id(id)
            .await
            .map_err(|e| storage_error("get user", e))?
            .ok_or(AccountError::NotFound)
    }

    /// Get a user by exact username (e.g., the subject of a verified token).
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, AccountError> {
        self.user_repo
            .get_by_username(username)
            .await
            .map_err(|e| storage_error("get user", e))?
            .ok_or(AccountError::NotFound)
    }

    /// Replace or clear a user's email.
    pub async fn update_email(&self, id: &UserId, email: Option<&str>) -> Result<(), AccountError> {
        let email = normalize_email(email)?;
        self.user_repo
            .update_email(id, email.as_deref())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AccountError::NotFound,
                other => storage_error("update email", other),
            })
    }

    /// Count registered users.
    pub async fn count_users(&self) -> Result<u64, AccountError> {
        self.user_repo
            .count()
            .await
            .map_err(|e| storage_error("count users", e))
    }
}

fn storage_error(action: &str, e: RepositoryError) -> AccountError {
    error!(error = %e, "Failed to {action}");
    AccountError::Storage(e.to_string())
}

fn is_acceptable_username(name: &str) -> bool {
    name.chars().count() <= MAX_USERNAME_LEN
        && !has_markup(name)
        && !name.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Trim and check a username.
///
/// Usernames are lookup keys and appear in tokens, so characters that would
/// need escaping or that hide in logs are rejected instead of rewritten.
fn normalize_username(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::new("username", "username cannot be empty"));
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::new(
            "username",
            format!("username exceeds {MAX_USERNAME_LEN} characters"),
        ));
    }
    if !is_acceptable_username(name) {
        return Err(ValidationError::new(
            "username",
            "username contains forbidden characters",
        ));
    }
    Ok(name.to_string())
}

fn normalize_email(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    match raw.map(str::trim) {
        Some(email) if !email.is_empty() => {
            Ok(Some(validate_field("email", email, InputKind::Email)?.into_inner()))
        }
        _ => Ok(None),
    }
}
