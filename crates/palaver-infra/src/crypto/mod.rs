//! Cryptographic operations for Palaver.
//!
//! - `password`: Argon2id password verifiers (PHC strings)
//! - `token`: HMAC-SHA256 session token codec

pub mod password;
pub mod token;
