//! @acp:module "Command Nodes"
//! @acp:summary "Immutable command tree declarations and their construction-time checks"
//! @acp:domain cli
//! @acp:layer model

use std::collections::HashSet;
use std::fmt;

use crate::dispatch::ActionContext;
use crate::error::{CliError, Result};

use super::choice::{duplicate_key, Choice};
use super::param::{Param, ParamKind};

/// Callback run once a command's parameters are resolved
pub type Action = dyn Fn(&ActionContext<'_>) -> anyhow::Result<()>;

/// Names the backend claims for itself
const RESERVED_NAME: &str = "help";
const RESERVED_SHORT: char = 'h';

/// @acp:summary "One node of the command tree"
///
/// Owns its parameters and children exclusively. Nodes are only produced by
/// [`CommandBuilder::build`], so every node in a tree has passed validation.
pub struct CommandNode {
    name: String,
    description: Option<String>,
    arguments: Vec<Param>,
    options: Vec<Param>,
    children: Vec<CommandNode>,
    action: Option<Box<Action>>,
}

impl CommandNode {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            description: None,
            params: Vec::new(),
            children: Vec::new(),
            action: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, falling back to the name
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    /// Arguments in declaration order
    pub fn arguments(&self) -> &[Param] {
        &self.arguments
    }

    /// Options in declaration order
    pub fn options(&self) -> &[Param] {
        &self.options
    }

    /// Arguments first, then options
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.arguments.iter().chain(self.options.iter())
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params().find(|param| param.name() == name)
    }

    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn action(&self) -> Option<&Action> {
        self.action.as_deref()
    }

    /// Walk down by child names
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    /// Text shown when this node is offered in a selection list
    pub fn label(&self) -> String {
        match &self.description {
            Some(description) if description != &self.name => {
                format!("{} - {}", self.name, description)
            }
            _ => self.name.clone(),
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("children", &self.children)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// @acp:summary "Builder that validates a node before it can exist"
pub struct CommandBuilder {
    name: String,
    description: Option<String>,
    params: Vec<Param>,
    children: Vec<CommandNode>,
    action: Option<Box<Action>>,
}

impl CommandBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an argument or option; routed by [`Param::kind`]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params<I: IntoIterator<Item = Param>>(mut self, params: I) -> Self {
        self.params.extend(params);
        self
    }

    pub fn child(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children<I: IntoIterator<Item = CommandNode>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// @acp:summary "Validate and freeze the node"
    pub fn build(self) -> Result<CommandNode> {
        validate_command_name(&self.name)?;
        validate_params(&self.name, &self.params)?;
        validate_sibling_names(&self.name, &self.children)?;

        let (arguments, options): (Vec<Param>, Vec<Param>) = self
            .params
            .into_iter()
            .partition(|param| param.kind() == ParamKind::Argument);

        Ok(CommandNode {
            name: self.name,
            description: self.description,
            arguments,
            options,
            children: self.children,
            action: self.action,
        })
    }
}

fn validate_command_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(CliError::config(format!("`{name}` is not a valid command name")));
    }
    if name == RESERVED_NAME {
        return Err(CliError::config("`help` is reserved and cannot name a command"));
    }
    Ok(())
}

/// Sibling command names must be unique
pub(crate) fn validate_sibling_names(owner: &str, children: &[CommandNode]) -> Result<()> {
    let mut seen = HashSet::new();
    for child in children {
        if !seen.insert(child.name()) {
            return Err(CliError::config(format!(
                "`{owner}` declares the subcommand `{}` twice",
                child.name()
            )));
        }
    }
    Ok(())
}

fn validate_params(command: &str, params: &[Param]) -> Result<()> {
    let mut names = HashSet::new();
    let mut shorts = HashSet::new();

    for param in params {
        let name = param.name();
        if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
            return Err(CliError::config(format!(
                "`{command}`: `{name}` is not a valid parameter name"
            )));
        }
        if name == RESERVED_NAME {
            return Err(CliError::config(format!(
                "`{command}`: `help` is reserved and cannot name a parameter"
            )));
        }
        if !names.insert(name) {
            return Err(CliError::config(format!(
                "`{command}` declares the parameter `{name}` twice (arguments and options share one namespace)"
            )));
        }

        if let Some(short) = param.short() {
            if param.kind() == ParamKind::Argument {
                return Err(CliError::config(format!(
                    "`{command}`: argument `{name}` cannot have an alias"
                )));
            }
            if short == RESERVED_SHORT || !short.is_ascii_alphanumeric() {
                return Err(CliError::config(format!(
                    "`{command}`: `-{short}` cannot be used as an alias for `{name}`"
                )));
            }
            if !shorts.insert(short) {
                return Err(CliError::config(format!(
                    "`{command}`: alias `-{short}` is used twice"
                )));
            }
        }

        if !param.is_multiple() && param.default_keys().len() > 1 {
            return Err(CliError::config(format!(
                "`{command}`: `{name}` takes one value but declares {} defaults",
                param.default_keys().len()
            )));
        }

        if let Some(choices) = param.choices_source().and_then(|source| source.as_static()) {
            validate_choice_set(command, param, choices)?;
        }
    }

    validate_positionals(command, params)
}

/// Checks shared by static sets at construction and computed sets on evaluation
pub(crate) fn validate_choice_set(command: &str, param: &Param, choices: &[Choice]) -> Result<()> {
    let name = param.name();
    if choices.is_empty() {
        return Err(CliError::config(format!(
            "`{command}`: `{name}` declares an empty choice list"
        )));
    }
    if let Some(key) = duplicate_key(choices) {
        return Err(CliError::config(format!(
            "`{command}`: `{name}` declares the choice `{key}` twice"
        )));
    }
    if let Some(key) = param
        .default_keys()
        .iter()
        .find(|key| !choices.iter().any(|choice| &choice.key == *key))
    {
        return Err(CliError::config(format!(
            "`{command}`: default `{key}` of `{name}` is not one of its choices"
        )));
    }
    Ok(())
}

/// Positional order must be parseable: required before optional, variadic last
fn validate_positionals(command: &str, params: &[Param]) -> Result<()> {
    let arguments: Vec<&Param> = params
        .iter()
        .filter(|param| param.kind() == ParamKind::Argument)
        .collect();

    let mut optional_seen: Option<&str> = None;
    for (index, param) in arguments.iter().enumerate() {
        if param.is_multiple() && index + 1 != arguments.len() {
            return Err(CliError::config(format!(
                "`{command}`: variadic argument `{}` must be the last argument",
                param.name()
            )));
        }
        match optional_seen {
            Some(earlier) if param.requires_token() => {
                return Err(CliError::config(format!(
                    "`{command}`: required argument `{}` cannot follow optional argument `{earlier}`",
                    param.name()
                )));
            }
            None if !param.requires_token() => optional_seen = Some(param.name()),
            _ => {}
        }
    }
    Ok(())
}
