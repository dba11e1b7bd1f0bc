//! @acp:module "Interactive Binder"
//! @acp:summary "Wizard that walks the command tree through prompts"
//! @acp:domain cli
//! @acp:layer service
//!
//! The walk is an explicit state machine: [`InteractiveBinder::advance`] takes
//! one [`WizardStep`] and returns the next, so every transition can be driven
//! and inspected on its own.

use std::collections::HashMap;

use serde_json::Map;

use super::cache::ChoiceCache;
use super::resolve::{resolve_param, ResolvedData};
use crate::error::{CliError, Result};
use crate::model::{CommandNode, Param};
use crate::prompt::Prompter;

/// Prompt shown at every level of the tree
pub const SELECT_COMMAND: &str = "please select the next command";

/// A leaf picked through the wizard, with its data resolved
#[derive(Debug)]
pub struct Selection<'t> {
    pub node: &'t CommandNode,
    pub path: Vec<String>,
    pub data: ResolvedData,
}

/// @acp:summary "One state of the wizard"
#[derive(Debug)]
pub enum WizardStep<'t> {
    /// Choose among `level`; `path` holds the nodes already chosen
    Selecting {
        level: &'t [CommandNode],
        path: Vec<&'t CommandNode>,
    },
    /// Ask for the leaf's parameters
    Prompting { path: Vec<&'t CommandNode> },
    /// Turn collected keys into values
    Resolving {
        path: Vec<&'t CommandNode>,
        answers: HashMap<String, Vec<String>>,
    },
    Done(Selection<'t>),
    Cancelled,
}

impl<'t> WizardStep<'t> {
    pub fn start(roots: &'t [CommandNode]) -> Self {
        WizardStep::Selecting {
            level: roots,
            path: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WizardStep::Done(_) | WizardStep::Cancelled)
    }
}

/// @acp:summary "Drives the wizard against a prompt backend"
pub struct InteractiveBinder<'p> {
    prompter: &'p mut dyn Prompter,
    cache: ChoiceCache,
}

impl<'p> InteractiveBinder<'p> {
    pub fn new(prompter: &'p mut dyn Prompter, cache: ChoiceCache) -> Self {
        Self { prompter, cache }
    }

    /// Run the wizard to completion; `Ok(None)` when the user cancelled
    pub fn run<'t>(&mut self, roots: &'t [CommandNode]) -> Result<Option<Selection<'t>>> {
        let mut step = WizardStep::start(roots);
        while !step.is_terminal() {
            step = self.advance(step)?;
        }
        match step {
            WizardStep::Done(selection) => Ok(Some(selection)),
            _ => {
                tracing::debug!("interactive session cancelled");
                Ok(None)
            }
        }
    }

    /// @acp:summary "Perform one transition"
    pub fn advance<'t>(&mut self, step: WizardStep<'t>) -> Result<WizardStep<'t>> {
        match step {
            WizardStep::Selecting { level, mut path } => {
                if level.is_empty() {
                    return Err(CliError::config("there are no commands to choose from"));
                }
                let items: Vec<String> = level.iter().map(CommandNode::label).collect();
                let Some(index) = self.prompter.select(SELECT_COMMAND, &items, Some(0))? else {
                    return Ok(WizardStep::Cancelled);
                };
                let node = level
                    .get(index)
                    .ok_or_else(|| CliError::config(format!("no command at position {index}")))?;
                path.push(node);

                if node.is_leaf() {
                    Ok(WizardStep::Prompting { path })
                } else {
                    Ok(WizardStep::Selecting {
                        level: node.children(),
                        path,
                    })
                }
            }
            WizardStep::Prompting { path } => {
                let Some(leaf) = path.last().copied() else {
                    return Err(CliError::config("no command was selected"));
                };
                let names = names(&path);
                let mut answers = HashMap::new();
                for param in leaf.params() {
                    match self.ask(&names, param)? {
                        Asked::Skip => {}
                        Asked::Keys(keys) => {
                            answers.insert(param.name().to_string(), keys);
                        }
                        Asked::Cancelled => return Ok(WizardStep::Cancelled),
                    }
                }
                Ok(WizardStep::Resolving { path, answers })
            }
            WizardStep::Resolving { path, mut answers } => {
                let Some(leaf) = path.last().copied() else {
                    return Err(CliError::config("no command was selected"));
                };
                let names = names(&path);

                let mut arguments = Map::new();
                for param in leaf.arguments() {
                    if let Some(value) = self.resolve(&names, param, answers.remove(param.name()))? {
                        arguments.insert(param.name().to_string(), value);
                    }
                }
                let mut options = Map::new();
                for param in leaf.options() {
                    if let Some(value) = self.resolve(&names, param, answers.remove(param.name()))? {
                        options.insert(param.name().to_string(), value);
                    }
                }

                Ok(WizardStep::Done(Selection {
                    node: leaf,
                    path: names,
                    data: ResolvedData::merge(arguments, options),
                }))
            }
            terminal => Ok(terminal),
        }
    }

    fn ask(&mut self, path: &[String], param: &Param) -> Result<Asked> {
        // Optional parameters are never prompted; defaults are filled in during resolution
        if param.is_optional() {
            return Ok(Asked::Skip);
        }

        let message = param.help().to_string();
        let defaults = param.default_keys();

        let Some(choices) = self.cache.choices(path, param)? else {
            let answer = self.prompter.input(&message, defaults.first().map(String::as_str))?;
            return Ok(match answer {
                None => Asked::Cancelled,
                Some(text) if param.is_multiple() => {
                    Asked::Keys(text.split_whitespace().map(str::to_string).collect())
                }
                Some(text) => Asked::Keys(vec![text]),
            });
        };

        let items: Vec<String> = choices.iter().map(|choice| choice.label.clone()).collect();

        if param.is_multiple() {
            let preselected: Vec<bool> = choices
                .iter()
                .map(|choice| defaults.contains(&choice.key))
                .collect();
            // A required set with no defaults cannot be left empty
            loop {
                let Some(indices) = self.prompter.multi_select(&message, &items, &preselected)? else {
                    return Ok(Asked::Cancelled);
                };
                let keys: Vec<String> = indices
                    .into_iter()
                    .filter_map(|index| choices.get(index))
                    .map(|choice| choice.key.clone())
                    .collect();
                if !keys.is_empty() || !param.requires_token() {
                    return Ok(Asked::Keys(keys));
                }
                tracing::debug!(param = param.name(), "empty selection for a required parameter");
            }
        }

        let preselected = defaults
            .first()
            .and_then(|key| choices.iter().position(|choice| &choice.key == key));
        let answer = self.prompter.select(&message, &items, preselected)?;
        Ok(match answer {
            None => Asked::Cancelled,
            Some(index) => match choices.get(index) {
                Some(choice) => Asked::Keys(vec![choice.key.clone()]),
                None => Asked::Skip,
            },
        })
    }

    fn resolve(
        &self,
        path: &[String],
        param: &Param,
        keys: Option<Vec<String>>,
    ) -> Result<Option<serde_json::Value>> {
        let choices = self.cache.choices(path, param)?;
        resolve_param(param, keys, choices.as_deref())
    }
}

enum Asked {
    Skip,
    Keys(Vec<String>),
    Cancelled,
}

fn names(path: &[&CommandNode]) -> Vec<String> {
    path.iter().map(|node| node.name().to_string()).collect()
}
