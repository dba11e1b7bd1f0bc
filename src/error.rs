//! @acp:module "Errors"
//! @acp:summary "Error types shared by the command model, binders and collaborators"
//! @acp:domain cli
//! @acp:layer model

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, CliError>;

/// @acp:summary "All errors raised by cmdtree"
#[derive(Debug, Error)]
pub enum CliError {
    /// The static command declaration is malformed
    #[error("invalid command configuration: {0}")]
    Configuration(String),

    /// A child process exited nonzero or could not be spawned
    #[error("command `{command}` failed in {}: {status}", cwd.display())]
    Execution {
        command: String,
        cwd: PathBuf,
        status: String,
    },

    /// A dispatched action returned an error
    #[error("action `{command}` failed: {cause:#}")]
    Action {
        command: String,
        cause: anyhow::Error,
    },

    /// The terminal prompt backend failed
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// A schedule pattern could not be parsed
    #[error("invalid schedule pattern `{pattern}`: {reason}")]
    Schedule { pattern: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        CliError::Configuration(message.into())
    }

    /// True for errors raised by the process runner
    pub fn is_execution(&self) -> bool {
        matches!(self, CliError::Execution { .. })
    }
}
