//! CredentialHasher trait for one-way password verifiers.
//!
//! Defined in palaver-core so the account service can hash and verify
//! passwords without coupling to a specific algorithm. The
//! `Argon2CredentialHasher` adapter lives in palaver-infra.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("credential hashing failed")]
pub struct CredentialHashError;

/// Abstraction over salted, one-way password verifiers.
///
/// Calls may be slow and blocking; the account service runs them on the
/// blocking pool, hence the `'static` bound.
pub trait CredentialHasher: Send + Sync + 'static {
    /// Produce a self-describing verifier (salt included) for `password`.
    fn hash(&self, password: &str) -> Result<String, CredentialHashError>;

    /// Check `password` against a stored verifier. Malformed verifiers
    /// never match.
    fn verify(&self, password: &str, verifier: &str) -> bool;

    /// A valid verifier for no real account, checked when a username is
    /// unknown so both failure paths do the same work.
    fn decoy(&self) -> &str;
}
