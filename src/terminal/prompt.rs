use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, Password};

pub fn prompt(prompt: &str) -> Result<String> {
    Ok(Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()?)
}

/// Like [`prompt`], but doesn't echo the input
pub fn prompt_secret(prompt: &str) -> Result<String> {
    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()?)
}
