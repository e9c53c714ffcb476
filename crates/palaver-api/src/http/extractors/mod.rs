//! Custom axum extractors for authentication and query parameters.

pub mod auth;
pub mod query;
