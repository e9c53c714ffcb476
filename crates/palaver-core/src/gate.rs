//! Access control gate for protected operations.
//!
//! The gate is a pure decision over three facts: is a token present, does it
//! verify, and does its role meet the configured minimum. Nothing is mutated;
//! the verified claims are handed to the wrapped operation.

use palaver_types::error::AuthError;
use palaver_types::token::Claims;
use palaver_types::user::Role;

use crate::service::clock::Clock;
use crate::token::{TokenCodec, TokenService};

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the raw token out of an `Authorization` header value.
///
/// The `"Bearer "` prefix is optional. Blank values count as missing.
pub fn extract_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim_start();
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Wraps protected operations with token and role checks.
pub struct AccessGate<'a, C: TokenCodec, K: Clock> {
    tokens: &'a TokenService<C, K>,
    required: Option<Role>,
}

impl<'a, C: TokenCodec, K: Clock> AccessGate<'a, C, K> {
    /// A gate that only requires a valid token.
    pub fn new(tokens: &'a TokenService<C, K>) -> Self {
        Self {
            tokens,
            required: None,
        }
    }

    /// Additionally require at least `role`.
    pub fn require(mut self, role: Role) -> Self {
        self.required = Some(role);
        self
    }

    /// Decide whether the caller presenting `header` may proceed.
    pub fn authorize(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_token(header).ok_or(AuthError::AuthRequired)?;
        let claims = self.tokens.verify(token)?;

        if let Some(required) = self.required {
            if !claims.role.satisfies(required) {
                tracing::debug!(
                    username = %claims.username,
                    role = %claims.role,
                    required = %required,
                    "Gate rejected caller role"
                );
                return Err(AuthError::InsufficientPermissions);
            }
        }

        Ok(claims)
    }

    /// Run `op` with the verified claims, or return the rejection.
    ///
    /// `op` runs exactly once on success and never on rejection. Async
    /// operations return their future, which the caller awaits.
    pub fn guard<T>(
        &self,
        header: Option<&str>,
        op: impl FnOnce(Claims) -> T,
    ) -> Result<T, AuthError> {
        let claims = self.authorize(header)?;
        Ok(op(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::clock::FixedClock;
    use crate::token::tests::PlainCodec;
    use chrono::{TimeZone, Utc};
    use std::cell::Cell;

    fn service(now: i64) -> TokenService<PlainCodec, FixedClock> {
        TokenService::with_clock(PlainCodec, FixedClock(Utc.timestamp_opt(now, 0).unwrap()), 60)
    }

    fn bearer(service: &TokenService<PlainCodec, FixedClock>, role: Role) -> String {
        let issued = service.issue("alice", role).unwrap();
        format!("Bearer {}", issued.token.as_str())
    }

    #[test]
    fn test_extract_token_handles_prefix_and_blanks() {
        assert_eq!(extract_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_token(Some("abc")), Some("abc"));
        assert_eq!(extract_token(Some("Bearer   ")), None);
        assert_eq!(extract_token(Some("")), None);
        assert_eq!(extract_token(None), None);
    }

    #[test]
    fn test_missing_token_is_auth_required() {
        let tokens = service(1_000);
        let gate = AccessGate::new(&tokens);
        assert_eq!(gate.authorize(None), Err(AuthError::AuthRequired));
    }

    #[test]
    fn test_forged_token_is_invalid() {
        let tokens = service(1_000);
        let gate = AccessGate::new(&tokens);
        assert_eq!(
            gate.authorize(Some("Bearer not-a-token")),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token_is_expired() {
        let issuer = service(1_000);
        let header = bearer(&issuer, Role::User);

        let later = service(5_000);
        let gate = AccessGate::new(&later);
        assert_eq!(gate.authorize(Some(&header)), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_role_is_insufficient_permissions() {
        let tokens = service(1_000);
        let header = bearer(&tokens, Role::User);
        let gate = AccessGate::new(&tokens).require(Role::Admin);
        assert_eq!(
            gate.authorize(Some(&header)),
            Err(AuthError::InsufficientPermissions)
        );
    }

    #[test]
    fn test_matching_role_invokes_operation_exactly_once() {
        let tokens = service(1_000);
        let header = bearer(&tokens, Role::Admin);
        let gate = AccessGate::new(&tokens).require(Role::Admin);

        let calls = Cell::new(0);
        let result = gate.guard(Some(&header), |claims| {
            calls.set(calls.get() + 1);
            claims.username
        });

        assert_eq!(result.unwrap(), "alice");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_rejected_caller_never_invokes_operation() {
        let tokens = service(1_000);
        let header = bearer(&tokens, Role::User);
        let gate = AccessGate::new(&tokens).require(Role::Admin);

        let calls = Cell::new(0);
        let result = gate.guard(Some(&header), |_| calls.set(calls.get() + 1));

        assert!(result.is_err());
        assert_eq!(calls.get(), 0);

        let result = gate.guard(None, |_| calls.set(calls.get() + 1));
        assert_eq!(result, Err(AuthError::AuthRequired));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_no_minimum_role_admits_any_valid_token() {
        let tokens = service(1_000);
        let header = bearer(&tokens, Role::User);
        let gate = AccessGate::new(&tokens);
        assert_eq!(gate.authorize(Some(&header)).unwrap().role, Role::User);
    }
}
