//! Session token claim types.
//!
//! A session token is never persisted: it is a signed, self-contained claim
//! set that proves a user's identity and role until `expiry`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::user::Role;

/// The claim set carried inside a session token.
///
/// Timestamps are unix seconds so the decoded payload stays a flat,
/// language-neutral JSON object:
/// `{"username": "...", "role": "user", "issued_at": 1700000000, "expiry": 1700003600}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub role: Role,
    pub issued_at: i64,
    pub expiry: i64,
}

impl Claims {
    /// Whether the token is still valid at `now` (strictly before expiry).
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.expiry
    }

    /// Expiry as a UTC datetime, for display.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expiry, 0).single()
    }
}

/// An encoded, signed session token as handed to clients.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: SessionToken,
    pub claims: Claims,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(expiry: i64) -> Claims {
        Claims {
            username: "alice".to_string(),
            role: Role::User,
            issued_at: 1_000,
            expiry,
        }
    }

    #[test]
    fn test_claims_live_before_expiry() {
        let c = claims(2_000);
        let now = Utc.timestamp_opt(1_999, 0).unwrap();
        assert!(c.is_live_at(now));
    }

    #[test]
    fn test_claims_dead_at_expiry() {
        let c = claims(2_000);
        let now = Utc.timestamp_opt(2_000, 0).unwrap();
        assert!(!c.is_live_at(now));
    }

    #[test]
    fn test_claims_wire_shape() {
        let json = serde_json::to_value(claims(2_000)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "user");
        assert_eq!(json["issued_at"], 1_000);
        assert_eq!(json["expiry"], 2_000);
    }

    #[test]
    fn test_session_token_debug_is_redacted() {
        let token = SessionToken::new("abc.def".to_string());
        assert!(!format!("{token:?}").contains("abc"));
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc.def\"");
    }
}
