//! Palaver CLI and REST API entry point.
//!
//! Binary name: `palaver`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands, TokenCommand, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity (RUST_LOG still wins when set)
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,palaver=debug",
        _ => "trace",
    };
    palaver_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    let result = run(&state, cli).await;

    state.shutdown().await;
    palaver_observe::tracing_setup::shutdown_tracing();

    result
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            serve(state, &host, port, cli.quiet).await?;
        }

        Commands::User { action } => match action {
            UserCommand::Create {
                username,
                email,
                admin,
                password,
            } => {
                cli::user::create_user(state, username, email, admin, password, cli.json).await?;
            }
        },

        Commands::Token { action } => match action {
            TokenCommand::Issue { username, password } => {
                cli::token::issue_token(state, &username, password, cli.json).await?;
            }
        },

        Commands::History { username, limit } => {
            cli::history::show_history(state, &username, limit, cli.json).await?;
        }

        Commands::Search { username, keyword } => {
            cli::history::search_history(state, &username, &keyword, cli.json).await?;
        }

        Commands::Status => {
            cli::status::status(state, cli.json).await?;
        }
    }

    Ok(())
}

async fn serve(state: &AppState, host: &str, port: u16, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if !quiet {
        println!(
            "  {} Palaver API listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, "REST API started");

    let router = http::router::build_router(state.clone());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
