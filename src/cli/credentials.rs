use anyhow::{Result, bail};
use console::Term;

use pipio_studio::core::bridge::Credential;

pub const PIPIO_KEY_ENV: &str = "PIPIO_API_KEY";
pub const CHAT_KEY_ENV: &str = "OPENAI_API_KEY";

fn from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn interactive() -> bool {
    Term::stdout().is_term()
}

fn prompt_secret(label: &str, help: &str) -> Result<String> {
    let value = inquire::Password::new(label)
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()?;
    Ok(value.trim().to_string())
}

/// The Pipio key from the environment, else a password prompt.
pub fn pipio_credential() -> Result<Credential> {
    if let Some(key) = from_env(PIPIO_KEY_ENV) {
        return Ok(Credential::key(key));
    }
    if !interactive() {
        bail!("Set {} or run in a terminal to enter the Pipio API key", PIPIO_KEY_ENV);
    }
    let key = prompt_secret(
        "Pipio API key:",
        "Get your key from the Pipio dashboard. It is kept in memory for this session only.",
    )?;
    if key.is_empty() {
        bail!("Please enter an API Key first!");
    }
    Ok(Credential::key(key))
}

/// The chat key from the environment, else an optional prompt when `ask` is set.
pub fn chat_credential(ask: bool) -> Result<Option<Credential>> {
    if let Some(key) = from_env(CHAT_KEY_ENV) {
        return Ok(Some(Credential::bearer(key)));
    }
    if !ask || !interactive() {
        return Ok(None);
    }
    let key = prompt_secret(
        "Text-generation API key (Enter to skip):",
        "Enables AI script drafting. Kept in memory for this session only.",
    )?;
    Ok((!key.is_empty()).then(|| Credential::bearer(key)))
}
