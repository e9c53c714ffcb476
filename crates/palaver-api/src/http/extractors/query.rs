//! Query parameter extractors for history endpoints.

use serde::Deserialize;

/// Query parameters for history listings.
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    /// Maximum turns to return (clamped server-side).
    pub limit: Option<u32>,
}

/// Query parameters for history search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for in messages.
    pub q: String,
}
