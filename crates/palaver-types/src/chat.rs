//! Chat turn types for Palaver.
//!
//! A turn is one user message paired with its generated response. A turn is
//! opened with an empty response and completed exactly once, addressed by its
//! explicit `TurnId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::user::UserId;

/// Unique identifier for a chat turn, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TurnId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A chat turn as stored.
///
/// `response` is empty and `completed_at` is `None` while the turn is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: TurnId,
    pub user_id: UserId,
    /// Sanitized user message.
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChatTurn {
    /// Build a new open turn for `user_id`.
    pub fn open(user_id: UserId, message: String) -> Self {
        Self {
            id: TurnId::new(),
            user_id,
            message,
            response: String::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Read model returned by history and search queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: TurnId,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatTurn> for TurnRecord {
    fn from(turn: ChatTurn) -> Self {
        Self {
            id: turn.id,
            message: turn.message,
            response: turn.response,
            timestamp: turn.created_at,
        }
    }
}
