//! Session token issuance and verification.
//!
//! `TokenService` owns the claim rules (issued-at, lifetime, expiry check);
//! the signing scheme sits behind the `TokenCodec` port so the HMAC adapter
//! in palaver-infra can be swapped or mocked.

use chrono::Duration;
use tracing::debug;

use palaver_types::error::{AuthError, TokenError};
use palaver_types::token::{Claims, IssuedToken, SessionToken};
use palaver_types::user::Role;

use crate::service::clock::{Clock, SystemClock};

/// Shortest lifetime a token may be configured with.
pub const MIN_TOKEN_LIFETIME_SECS: u64 = 60;
/// Longest lifetime a token may be configured with (30 days).
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 30 * 24 * 3600;

/// Signs claims into an opaque token string and checks them back.
pub trait TokenCodec: Send + Sync {
    /// Serialize and sign `claims`.
    fn encode(&self, claims: &Claims) -> Result<SessionToken, TokenError>;

    /// Check the signature and structure of `token` and return its claims.
    ///
    /// Every failure is `AuthError::InvalidToken`. Expiry is not checked here.
    fn decode(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Issues and statelessly verifies session tokens.
pub struct TokenService<C: TokenCodec, K: Clock = SystemClock> {
    codec: C,
    clock: K,
    lifetime: Duration,
}

impl<C: TokenCodec> TokenService<C, SystemClock> {
    /// Create a token service on the wall clock.
    pub fn new(codec: C, lifetime_secs: u64) -> Self {
        Self::with_clock(codec, SystemClock, lifetime_secs)
    }
}

impl<C: TokenCodec, K: Clock> TokenService<C, K> {
    /// Create a token service with an explicit clock.
    ///
    /// `lifetime_secs` is clamped to
    /// `[MIN_TOKEN_LIFETIME_SECS, MAX_TOKEN_LIFETIME_SECS]`.
    pub fn with_clock(codec: C, clock: K, lifetime_secs: u64) -> Self {
        let secs = lifetime_secs.clamp(MIN_TOKEN_LIFETIME_SECS, MAX_TOKEN_LIFETIME_SECS);
        Self {
            codec,
            clock,
            lifetime: Duration::seconds(secs as i64),
        }
    }

    /// Configured token lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `username` carrying `role`.
    ///
    /// The role must come from a credential check, never from caller input.
    pub fn issue(&self, username: &str, role: Role) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            username: username.to_string(),
            role,
            issued_at: now.timestamp(),
            expiry: (now + self.lifetime).timestamp(),
        };
        let token = self.codec.encode(&claims)?;
        debug!(
            username = %claims.username,
            role = %claims.role,
            expiry = claims.expiry,
            "Issued session token"
        );
        Ok(IssuedToken { token, claims })
    }

    /// Verify a token's signature, structure and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.codec.decode(token)?;

        if claims.issued_at > claims.expiry {
            return Err(AuthError::InvalidToken);
        }
        if !claims.is_live_at(self.clock.now()) {
            debug!(username = %claims.username, "Rejected expired session token");
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::service::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    /// Toy codec: `signed|username|role|issued_at|expiry`.
    pub(crate) struct PlainCodec;

    impl TokenCodec for PlainCodec {
        fn encode(&self, claims: &Claims) -> Result<SessionToken, TokenError> {
            Ok(SessionToken::new(format!(
                "signed|{}|{}|{}|{}",
                claims.username, claims.role, claims.issued_at, claims.expiry
            )))
        }

        fn decode(&self, token: &str) -> Result<Claims, AuthError> {
            let parts: Vec<&str> = token.split('|').collect();
            match parts.as_slice() {
                ["signed", username, role, issued_at, expiry] => Ok(Claims {
                    username: username.to_string(),
                    role: role.parse().map_err(|_| AuthError::InvalidToken)?,
                    issued_at: issued_at.parse().map_err(|_| AuthError::InvalidToken)?,
                    expiry: expiry.parse().map_err(|_| AuthError::InvalidToken)?,
                }),
                _ => Err(AuthError::InvalidToken),
            }
        }
    }

    fn at(secs: i64) -> FixedClock {
        FixedClock(Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn test_issue_then_verify_roundtrips_claims() {
        let service = TokenService::with_clock(PlainCodec, at(1_000), 3600);
        let issued = service.issue("alice", Role::Admin).unwrap();
        assert_eq!(issued.claims.issued_at, 1_000);
        assert_eq!(issued.claims.expiry, 4_600);

        let claims = service.verify(issued.token.as_str()).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let issuer = TokenService::with_clock(PlainCodec, at(1_000), 60);
        let issued = issuer.issue("alice", Role::User).unwrap();

        let later = TokenService::with_clock(PlainCodec, at(1_060), 60);
        assert_eq!(later.verify(issued.token.as_str()), Err(AuthError::Expired));

        let just_before = TokenService::with_clock(PlainCodec, at(1_059), 60);
        assert!(just_before.verify(issued.token.as_str()).is_ok());
    }

    #[test]
    fn test_verify_rejects_malformed_token() {
        let service = TokenService::with_clock(PlainCodec, at(1_000), 60);
        assert_eq!(service.verify("garbage"), Err(AuthError::InvalidToken));
        assert_eq!(service.verify(""), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_rejects_inverted_timestamps() {
        let service = TokenService::with_clock(PlainCodec, at(1_000), 60);
        assert_eq!(
            service.verify("signed|alice|user|5000|2000"),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_lifetime_is_clamped() {
        let short = TokenService::with_clock(PlainCodec, at(0), 1);
        assert_eq!(short.lifetime().num_seconds(), MIN_TOKEN_LIFETIME_SECS as i64);

        let long = TokenService::with_clock(PlainCodec, at(0), u64::MAX);
        assert_eq!(long.lifetime().num_seconds(), MAX_TOKEN_LIFETIME_SECS as i64);
    }
}
