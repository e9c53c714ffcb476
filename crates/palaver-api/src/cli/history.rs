//! Chat history CLI commands: history, search.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use palaver_types::chat::TurnRecord;

use crate::state::AppState;

/// Show a user's most recent turns, newest first.
pub async fn show_history(
    state: &AppState,
    username: &str,
    limit: Option<u32>,
    json: bool,
) -> Result<()> {
    let user = state.account_service.get_user_by_username(username).await?;
    let turns = state.chat_service.history(&user.id, limit).await?;
    let total = state.chat_service.count_turns(&user.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    print_turns(&turns, &format!("{username} has no chat history yet."));
    println!(
        "  {} of {} turn{}",
        style(turns.len()).bold(),
        total,
        if total == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Search a user's turns for `keyword`.
pub async fn search_history(
    state: &AppState,
    username: &str,
    keyword: &str,
    json: bool,
) -> Result<()> {
    let user = state.account_service.get_user_by_username(username).await?;
    let turns = state.chat_service.search(&user.id, keyword).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    print_turns(&turns, &format!("No turns matching '{keyword}'."));
    println!(
        "  {} match{}",
        style(turns.len()).bold(),
        if turns.len() == 1 { "" } else { "es" }
    );
    println!();

    Ok(())
}

fn print_turns(turns: &[TurnRecord], empty_message: &str) {
    println!();
    if turns.is_empty() {
        println!("  {} {}", style("i").blue().bold(), empty_message);
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("When").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Response").fg(Color::White),
    ]);

    for turn in turns {
        table.add_row(vec![
            Cell::new(turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()).fg(Color::DarkGrey),
            Cell::new(&turn.message).fg(Color::Cyan),
            Cell::new(&turn.response),
        ]);
    }

    println!("{table}");
    println!();
}
