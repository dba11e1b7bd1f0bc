//! @acp:module "Prompts"
//! @acp:summary "Prompt backend abstraction used by the interactive binder"
//! @acp:domain cli
//! @acp:layer service
//!
//! Every method returns `Ok(None)` when the user backs out of the prompt.

pub mod console;
pub mod scripted;

pub use console::ConsolePrompter;
pub use scripted::{Answer, ScriptedPrompter};

use crate::error::Result;

/// @acp:summary "One question at a time, answered by a human or a script"
pub trait Prompter {
    /// Pick one item; returns its index
    fn select(&mut self, message: &str, items: &[String], default: Option<usize>)
        -> Result<Option<usize>>;

    /// Pick any number of items; `defaults` marks the preselected ones
    fn multi_select(
        &mut self,
        message: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>>;

    /// Free text
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<Option<String>>;
}
