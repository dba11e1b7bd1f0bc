//! @acp:module "Application"
//! @acp:summary "Program facade: owns the command forest and runs one invocation"
//! @acp:domain cli
//! @acp:layer api
//!
//! ```rust,no_run
//! use cmdtree::{CliApp, CommandNode, Param};
//!
//! fn main() -> anyhow::Result<std::process::ExitCode> {
//!     let checkout = CommandNode::builder("checkout")
//!         .param(Param::argument("branch").choices(["master", "develop"]).default("master"))
//!         .action(|ctx| {
//!             let branch: Option<String> = ctx.data().get("branch")?;
//!             ctx.logger().info(&format!("checking out {branch:?}"));
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     let app = CliApp::builder("git-helper", "1.0.0")
//!         .command(CommandNode::builder("git").child(checkout).build()?)
//!         .build()?;
//!     Ok(app.run())
//! }
//! ```

use std::ffi::OsString;
use std::process::ExitCode;

use console::style;

use crate::binder::{ChoiceCache, DirectBinder, DirectParse, InteractiveBinder};
use crate::config::{AppConfig, LoggerConfig};
use crate::dispatch::{dispatch, Collaborators};
use crate::error::Result;
use crate::logger::Logger;
use crate::model::{validate_sibling_names, CommandNode};
use crate::prompt::{ConsolePrompter, Prompter};

/// @acp:summary "How one invocation ended"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command at this path ran its action (or had none)
    Dispatched(Vec<String>),
    /// The user backed out of the wizard; nothing ran
    Cancelled,
    /// Help or version text for stdout
    Printed(String),
    /// argv was rejected; `message` holds usage text for stderr
    Usage { message: String, code: i32 },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Usage { code, .. } => *code,
            _ => 0,
        }
    }

    fn from_clap(err: clap::Error) -> Self {
        let message = err.render().to_string();
        if err.use_stderr() {
            Outcome::Usage {
                message,
                code: err.exit_code(),
            }
        } else {
            Outcome::Printed(message)
        }
    }
}

/// @acp:summary "A command-line program built from a command forest"
pub struct CliApp {
    config: AppConfig,
    commands: Vec<CommandNode>,
    collaborators: Collaborators,
}

impl CliApp {
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> CliAppBuilder {
        Self::from_config(AppConfig::new(name, version))
    }

    pub fn from_config(config: AppConfig) -> CliAppBuilder {
        CliAppBuilder {
            config,
            commands: Vec::new(),
            logger: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn commands(&self) -> &[CommandNode] {
        &self.commands
    }

    pub fn logger(&self) -> &Logger {
        &self.collaborators.logger
    }

    /// The clap tree as it would be built for an invocation
    pub fn command(&self) -> clap::Command {
        DirectBinder::new(&self.config, &self.commands, ChoiceCache::new()).command()
    }

    /// @acp:summary "Run against the process arguments and terminal"
    pub fn run(&self) -> ExitCode {
        match self.execute(std::env::args_os()) {
            Ok(Outcome::Printed(text)) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Ok(Outcome::Usage { message, code }) => {
                eprint!("{message}");
                ExitCode::from(u8::try_from(code).unwrap_or(2))
            }
            Ok(Outcome::Dispatched(_) | Outcome::Cancelled) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{} {}", style("✗").red(), err);
                ExitCode::FAILURE
            }
        }
    }

    /// Run one invocation, prompting on the terminal if the wizard is entered
    pub fn execute<I, T>(&self, argv: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut prompter = ConsolePrompter::with_prefix(self.config.name.clone());
        self.execute_with(argv, &mut prompter)
    }

    /// @acp:summary "Run one invocation against the given prompt backend"
    pub fn execute_with<I, T>(&self, argv: I, prompter: &mut dyn Prompter) -> Result<Outcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.collaborators
            .logger
            .scope(|| self.invoke(argv, prompter))
    }

    fn invoke<I, T>(&self, argv: I, prompter: &mut dyn Prompter) -> Result<Outcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cache = ChoiceCache::new();
        let binder = DirectBinder::new(&self.config, &self.commands, cache.clone());

        let parsed = match binder.parse(argv) {
            Ok(parsed) => parsed,
            Err(err) => {
                // A computed choice set that failed its checks is not a usage error
                return match cache.failure() {
                    Some(failure) => Err(failure),
                    None => Ok(Outcome::from_clap(err)),
                };
            }
        };

        match parsed {
            DirectParse::Root { interactive } if interactive || self.config.interactive => {
                tracing::debug!("entering interactive mode");
                let mut wizard = InteractiveBinder::new(prompter, cache);
                let Some(selection) = wizard.run(&self.commands)? else {
                    return Ok(Outcome::Cancelled);
                };
                dispatch(
                    selection.node,
                    &selection.path,
                    selection.data,
                    &self.collaborators,
                )?;
                Ok(Outcome::Dispatched(selection.path))
            }
            DirectParse::Root { .. } => Ok(Outcome::Printed(binder.render_help(&[]))),
            DirectParse::Command { node, path, .. } if !node.is_leaf() && !node.has_action() => {
                Ok(Outcome::Printed(binder.render_help(&path)))
            }
            DirectParse::Command {
                node,
                path,
                matches,
            } => {
                tracing::debug!(command = %path.join(" "), "direct mode");
                let data = binder.resolve(node, &path, &matches)?;
                dispatch(node, &path, data, &self.collaborators)?;
                Ok(Outcome::Dispatched(path))
            }
        }
    }
}

impl std::fmt::Debug for CliApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliApp")
            .field("config", &self.config)
            .field("commands", &self.commands)
            .finish()
    }
}

/// @acp:summary "Collects the forest and settings, then validates them"
pub struct CliAppBuilder {
    config: AppConfig,
    commands: Vec<CommandNode>,
    logger: Option<Logger>,
}

impl CliAppBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    /// Make a bare invocation enter the wizard without `-i`
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.config.interactive = interactive;
        self
    }

    pub fn logger_config(mut self, logger: LoggerConfig) -> Self {
        self.config.logger = logger;
        self
    }

    /// Use an existing logger instead of building one from the config
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn command(mut self, command: CommandNode) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands<I: IntoIterator<Item = CommandNode>>(mut self, commands: I) -> Self {
        self.commands.extend(commands);
        self
    }

    /// @acp:summary "Validate top-level names and construct the collaborators"
    pub fn build(self) -> Result<CliApp> {
        validate_sibling_names(&self.config.name, &self.commands)?;

        let logger = match self.logger {
            Some(logger) => logger,
            None => {
                let mut logger_config = self.config.logger.clone();
                if logger_config.app_name.is_none() {
                    logger_config.app_name = Some(self.config.name.clone());
                }
                Logger::new(logger_config)?
            }
        };

        Ok(CliApp {
            config: self.config,
            commands: self.commands,
            collaborators: Collaborators::new(logger),
        })
    }
}
