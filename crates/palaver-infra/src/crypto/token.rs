//! HMAC-SHA256 session token codec.
//!
//! Implements the `TokenCodec` trait from `palaver-core`. A token is two
//! base64url (unpadded) segments joined by a dot:
//!
//! ```text
//! base64url(json claims) "." base64url(hmac_sha256(secret, first segment))
//! ```
//!
//! Verification recomputes the MAC over the payload segment and compares it
//! in constant time before the payload is parsed.
//!
//! SECURITY: errors never contain the secret or the token.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;

use palaver_core::token::TokenCodec;
use palaver_types::error::{AuthError, TokenError};
use palaver_types::token::{Claims, SessionToken};

type HmacSha256 = Hmac<Sha256>;

/// Shortest signing secret accepted, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signs and verifies session tokens with a server-held secret.
pub struct HmacTokenCodec {
    secret: SecretSlice<u8>,
}

impl HmacTokenCodec {
    /// Create a codec from raw secret bytes (at least [`MIN_SECRET_LEN`]).
    pub fn new(secret: Vec<u8>) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::Encoding(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self {
            secret: SecretSlice::from(secret),
        })
    }

    fn mac(&self) -> Result<HmacSha256, hmac::digest::InvalidLength> {
        HmacSha256::new_from_slice(self.secret.expose_secret())
    }
}

impl TokenCodec for HmacTokenCodec {
    fn encode(&self, claims: &Claims) -> Result<SessionToken, TokenError> {
        let json = serde_json::to_vec(claims).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac().map_err(|e| TokenError::Encoding(e.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(SessionToken::new(format!("{payload}.{signature}")))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;

        // Constant-time verification (via hmac crate's `verify_slice`)
        let mut mac = self.mac().map_err(|_| AuthError::InvalidToken)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)
    }
}
