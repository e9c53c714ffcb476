//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display user count, token settings and storage location.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.account_service.count_users().await?;
    let lifetime_secs = state.token_service.lifetime().num_seconds();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "token_lifetime_secs": lifetime_secs,
            "default_history_limit": state.config.chat.default_history_limit,
            "max_history_limit": state.config.chat.max_history_limit,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Palaver v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Accounts ──").dim());
    println!("  Users:          {}", style(users).bold());
    println!("  Token lifetime: {}s", lifetime_secs);
    println!();

    println!("  {}", style("── History ──").dim());
    println!(
        "  Default limit:  {} (max {})",
        state.config.chat.default_history_limit, state.config.chat.max_history_limit
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
