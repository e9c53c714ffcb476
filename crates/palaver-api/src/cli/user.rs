//! User account CLI commands.

use anyhow::Result;
use console::style;
use dialoguer::Password;

use palaver_types::user::{RegisterRequest, Role};

use crate::state::AppState;

/// Prompt for a password unless one was given on the command line.
pub(crate) fn resolve_password(
    username: &str,
    given: Option<String>,
    confirm: bool,
) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let mut prompt =
        Password::new().with_prompt(format!("Password for {}", style(username).bold()));
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

/// Register a user, optionally as admin.
///
/// # Examples
///
/// ```bash
/// # Secure prompt (recommended)
/// palaver user create alice --email alice@example.com
///
/// # Script/automation mode
/// palaver user create root --admin --password s3cret
/// ```
pub async fn create_user(
    state: &AppState,
    username: String,
    email: Option<String>,
    admin: bool,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = resolve_password(&username, password, true)?;
    let role = if admin { Role::Admin } else { Role::User };

    let user = state
        .account_service
        .register_with_role(
            RegisterRequest {
                username,
                password,
                email,
            },
            role,
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!(
            "  {} Created {} '{}' ({})",
            style("✓").green().bold(),
            user.role,
            style(&user.username).bold(),
            style(user.id).dim()
        );
    }

    Ok(())
}
