//! Shared domain types for Palaver.
//!
//! This crate contains the core domain types used across the Palaver service:
//! users and roles, session token claims, chat turns, sanitized text, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod text;
pub mod token;
pub mod user;
