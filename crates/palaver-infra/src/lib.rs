//! Infrastructure layer for Palaver.
//!
//! Contains implementations of the ports defined in `palaver-core`: SQLite
//! storage for users and chat turns, Argon2id password verifiers, the
//! HMAC-SHA256 token codec, and the config/secret loaders.

pub mod config;
pub mod crypto;
pub mod sqlite;
