//! Argon2id password verifiers.
//!
//! Implements the `CredentialHasher` trait from `palaver-core` using the
//! `argon2` crate (RustCrypto ecosystem). Verifiers are PHC strings, so the
//! algorithm, parameters and per-password random salt travel with the hash:
//! `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`.
//!
//! SECURITY: errors never contain the password or the verifier.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use palaver_core::service::credential::{CredentialHashError, CredentialHasher};

/// Argon2id implementation of `CredentialHasher`.
///
/// Uses OWASP recommended parameters by default:
/// - 19 MiB memory (19456 KiB)
/// - 2 iterations
/// - 1 parallelism degree
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
    decoy: String,
}

impl Argon2CredentialHasher {
    /// Create a hasher with the default (OWASP) parameters.
    pub fn new() -> Result<Self, CredentialHashError> {
        Self::with_params(19456, 2, 1)
    }

    /// Create a hasher with explicit memory (KiB), iteration and lane counts.
    ///
    /// Cheap parameters are useful in tests; production uses [`Self::new`].
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, CredentialHashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|_| CredentialHashError)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Verifier for a random password nobody knows, same cost as real ones.
        let mut throwaway = [0u8; 32];
        OsRng.fill_bytes(&mut throwaway);
        let salt = SaltString::generate(&mut OsRng);
        let decoy = argon2
            .hash_password(&throwaway, &salt)
            .map_err(|_| CredentialHashError)?
            .to_string();

        Ok(Self { argon2, decoy })
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| CredentialHashError)
    }

    fn verify(&self, password: &str, verifier: &str) -> bool {
        match PasswordHash::new(verifier) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn decoy(&self) -> &str {
        &self.decoy
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Low-cost hasher so tests stay fast.
    pub(crate) fn fast_hasher() -> Argon2CredentialHasher {
        Argon2CredentialHasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hasher = fast_hasher();
        let verifier = hasher.hash("s3cret").unwrap();
        assert!(verifier.starts_with("$argon2id$v=19$"));
        assert!(!verifier.contains("s3cret"));
    }

    #[test]
    fn test_verify_correct_and_wrong_password() {
        let hasher = fast_hasher();
        let verifier = hasher.hash("s3cret").unwrap();
        assert!(hasher.verify("s3cret", &verifier));
        assert!(!hasher.verify("wrong_password", &verifier));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = fast_hasher();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same", &a));
        assert!(hasher.verify("same", &b));
    }

    #[test]
    fn test_malformed_verifier_never_matches() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn test_decoy_is_a_valid_verifier_matching_nothing_common() {
        let hasher = fast_hasher();
        assert!(PasswordHash::new(hasher.decoy()).is_ok());
        assert!(!hasher.verify("", hasher.decoy()));
        assert!(!hasher.verify("password", hasher.decoy()));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(Argon2CredentialHasher::with_params(0, 0, 0).is_err());
    }
}
