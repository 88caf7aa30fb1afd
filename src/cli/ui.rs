//! Interactive prompts shared by the CLI commands.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use inquire::{ui::RenderConfig, Confirm, Password, PasswordDisplayMode};

use crate::auth::password::validate_password;

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

/// Prompt for yes/no confirmation (default: no)
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(false)
        .prompt()?;
    Ok(result)
}

/// Prompt for a new password, asking twice.
pub fn prompt_new_password(prompt: &str) -> Result<String> {
    let password = Password::new(prompt)
        .with_render_config(minimal_render_config())
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_custom_confirmation_message("Confirm:")
        .with_custom_confirmation_error_message("Passwords do not match")
        .prompt()?;
    validate_password(&password)?;
    Ok(password)
}

/// Parse a `YYYY-MM-DD` command-line argument.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}', expected YYYY-MM-DD", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29/02/2024").is_err());
    }
}
