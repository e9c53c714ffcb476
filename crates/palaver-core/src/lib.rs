//! Business logic and repository trait definitions for Palaver.
//!
//! This crate defines the "ports" (repository, hashing and token-codec traits)
//! that the infrastructure layer implements, plus the services built on them:
//! the sanitization pipeline, token service, access control gate, reply
//! generator and chat orchestrator. It depends only on `palaver-types` --
//! never on `palaver-infra` or any database/crypto crate.

pub mod chat;
pub mod gate;
pub mod reply;
pub mod repository;
pub mod sanitize;
pub mod service;
pub mod token;
