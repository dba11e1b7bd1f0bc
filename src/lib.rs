#![forbid(unsafe_code)]

//! @acp:module "cmdtree Library"
//! @acp:summary "Declarative command trees bound to argv or an interactive wizard"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability experimental
//!
//! # cmdtree
//!
//! Declare a tree of commands once and run it two ways.
//!
//! ## Features
//!
//! - **Direct mode**: nested subcommands parsed with clap, with choice
//!   validation, defaults and help derived from the declaration
//! - **Interactive mode**: `-i` walks the same tree with dialoguer prompts
//! - **One resolution path**: both modes map choice keys to the same values
//! - **Collaborators**: actions get a logger, a shell runner, a task runner
//!   and a cron scheduler
//!
//! ## Example
//!
//! ```rust,no_run
//! use cmdtree::{CliApp, CommandNode, Param};
//!
//! fn main() -> anyhow::Result<std::process::ExitCode> {
//!     let push = CommandNode::builder("push")
//!         .param(Param::argument("remote").optional().default("origin"))
//!         .param(Param::option("tags").alias('t').multiple().choices(["a", "b", "c"]))
//!         .action(|ctx| {
//!             let remote: String = ctx.data().get("remote")?.unwrap_or_default();
//!             ctx.runner().run(&format!("git push {remote}"))?;
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     let app = CliApp::builder("git-helper", "1.0.0")
//!         .command(CommandNode::builder("git").child(push).build()?)
//!         .build()?;
//!     Ok(app.run())
//! }
//! ```

pub mod app;
pub mod binder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod model;
pub mod prompt;
pub mod runner;
pub mod schedule;
pub mod task;

// Re-exports
pub use app::{CliApp, CliAppBuilder, Outcome};
pub use binder::{resolve_param, ChoiceCache, ResolvedData};
pub use config::{AppConfig, LogLevel, LoggerConfig};
pub use dispatch::{ActionContext, Collaborators};
pub use error::{CliError, Result};
pub use logger::Logger;
pub use model::{
    normalize, Choice, ChoiceEntry, ChoiceSource, CommandBuilder, CommandNode, Param, ParamKind,
};
pub use prompt::{Answer, ConsolePrompter, Prompter, ScriptedPrompter};
pub use runner::{ProcessRunner, RunIn, StdioMode};
pub use schedule::{CronJob, Scheduler};
pub use task::{Task, TaskRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
