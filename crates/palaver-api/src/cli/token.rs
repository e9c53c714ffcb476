//! Session token CLI commands.

use anyhow::Result;
use console::style;

use crate::cli::user::resolve_password;
use crate::state::AppState;

/// Verify credentials and print a bearer token for the REST API.
pub async fn issue_token(
    state: &AppState,
    username: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = resolve_password(username, password, false)?;

    let issued = state
        .account_service
        .login(&*state.token_service, username, &password)
        .await?;

    let expires_at = issued
        .claims
        .expires_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "token": issued.token.as_str(),
                "role": issued.claims.role,
                "expires_at": expires_at,
            })
        );
    } else {
        println!();
        println!(
            "  {} Token for '{}' ({}), expires {}",
            style("🔑").bold(),
            style(&issued.claims.username).bold(),
            issued.claims.role,
            style(&expires_at).dim()
        );
        println!();
        println!("  {}", style(issued.token.as_str()).yellow());
        println!();
    }

    Ok(())
}
