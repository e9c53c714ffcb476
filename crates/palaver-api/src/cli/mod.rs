//! CLI command definitions and dispatch for the `palaver` binary.
//!
//! Uses clap derive macros for argument parsing. Account and history commands
//! talk to the services directly; `serve` starts the REST API.

pub mod history;
pub mod status;
pub mod token;
pub mod user;

use clap::{Parser, Subcommand};

/// Authenticated chat service with persistent history.
#[derive(Parser)]
#[command(name = "palaver", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PALAVER_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to config.toml `[server] port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to config.toml `[server] host`).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Issue session tokens.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Show a user's most recent chat turns.
    History {
        /// Username whose history to show.
        username: String,

        /// Maximum turns to show.
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Search a user's chat turns for a keyword (case-insensitive).
    Search {
        /// Username whose history to search.
        username: String,

        /// Text to look for in messages.
        keyword: String,
    },

    /// System status dashboard.
    Status,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a new user.
    Create {
        /// Unique username.
        username: String,

        /// Optional email address.
        #[arg(long)]
        email: Option<String>,

        /// Grant the admin role.
        #[arg(long)]
        admin: bool,

        /// Password (prompted securely if omitted).
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Verify a user's password and print a session token.
    Issue {
        /// Username to authenticate.
        username: String,

        /// Password (prompted securely if omitted).
        #[arg(long)]
        password: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "palaver", "user", "create", "alice", "--admin", "--email", "a@example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::User {
                action: UserCommand::Create { username, admin, email, password },
            } => {
                assert_eq!(username, "alice");
                assert!(admin);
                assert_eq!(email.as_deref(), Some("a@example.com"));
                assert!(password.is_none());
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["palaver", "history", "bob", "-l", "5", "--json", "-vv"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::History { limit: Some(5), .. }));
    }
}
