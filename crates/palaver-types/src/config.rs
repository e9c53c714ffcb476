//! Global configuration types for Palaver.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls token
//! lifetime, history limits, and the HTTP listener. The signing secret is
//! deliberately not part of this file; it is resolved separately from the
//! environment or a key file.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Palaver service.
///
/// Loaded from `~/.palaver/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Session token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Seconds a freshly issued token stays valid.
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
}

fn default_token_lifetime_secs() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: default_token_lifetime_secs(),
        }
    }
}

/// History query bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Turns returned by a history call that names no limit.
    #[serde(default = "default_history_limit")]
    pub default_history_limit: u32,

    /// Upper bound on any requested history limit.
    #[serde(default = "default_max_history_limit")]
    pub max_history_limit: u32,
}

fn default_history_limit() -> u32 {
    10
}

fn default_max_history_limit() -> u32 {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_history_limit: default_history_limit(),
            max_history_limit: default_max_history_limit(),
        }
    }
}

/// HTTP listener settings (overridable on the command line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
