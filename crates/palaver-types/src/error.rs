use thiserror::Error;

/// A rejected input, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Re-label the error with the caller's field name.
    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

/// Errors related to registration and credential checks.
///
/// `InvalidCredential` covers both unknown usernames and wrong passwords so
/// callers cannot probe which usernames exist.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("invalid username or password")]
    InvalidCredential,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors raised while minting a session token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Errors raised by the access control gate and token verification.
///
/// `InvalidToken` and `Expired` share one message so that nothing
/// user-visible distinguishes a forged token from a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization required")]
    AuthRequired,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid or expired token")]
    Expired,

    #[error("insufficient permissions")]
    InsufficientPermissions,
}

/// Errors related to chat turns and history.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unknown user")]
    UnknownUser,

    #[error("turn is not open")]
    TurnNotOpen,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from repository operations (used by trait definitions in palaver-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
