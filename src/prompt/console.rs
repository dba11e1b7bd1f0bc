//! @acp:module "Console Prompter"
//! @acp:summary "dialoguer-backed prompts for a real terminal"
//! @acp:domain cli
//! @acp:layer handler

use std::io;

use dialoguer::{theme::ColorfulTheme, Input, MultiSelect, Select};

use super::Prompter;
use crate::error::Result;

/// Terminal prompts with the colorful theme, prefixed with the app name
pub struct ConsolePrompter {
    theme: ColorfulTheme,
    prefix: Option<String>,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            prefix: None,
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    fn message(&self, message: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("[{prefix}] {message}"),
            None => message.to_string(),
        }
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Ctrl-C while reading a key surfaces as an interrupted read
fn cancel_on_interrupt<T>(
    result: std::result::Result<Option<T>, dialoguer::Error>,
) -> Result<Option<T>> {
    match result {
        Ok(answer) => Ok(answer),
        Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(err.into()),
    }
}

impl Prompter for ConsolePrompter {
    fn select(
        &mut self,
        message: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<Option<usize>> {
        let mut select = Select::with_theme(&self.theme)
            .with_prompt(self.message(message))
            .items(items);
        if let Some(default) = default {
            select = select.default(default);
        }
        cancel_on_interrupt(select.interact_opt())
    }

    fn multi_select(
        &mut self,
        message: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        let select = MultiSelect::with_theme(&self.theme)
            .with_prompt(self.message(message))
            .items(items)
            .defaults(defaults);
        cancel_on_interrupt(select.interact_opt())
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Result<Option<String>> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(self.message(message));
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        cancel_on_interrupt(input.interact_text().map(Some))
    }
}
