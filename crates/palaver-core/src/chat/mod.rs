//! Conversation persistence abstractions and the session orchestrator.
//!
//! This module defines the `ConversationRepository` trait that the
//! infrastructure layer implements, and `ChatService`, which runs one
//! sanitized message through storage and the reply generator.

pub mod repository;
pub mod service;
