//! @acp:module "Process Runner"
//! @acp:summary "Runs shell command lines on behalf of actions"
//! @acp:domain cli
//! @acp:layer service

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{CliError, Result};
use crate::logger::Logger;

/// How the child's standard streams are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Share the terminal; output is streamed live
    #[default]
    Inherit,
    /// Capture stdout and return it
    Pipe,
}

/// @acp:summary "Shell command execution bound to the shared logger"
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    logger: Logger,
}

impl ProcessRunner {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Run in the current directory, streaming output and echoing the command
    pub fn run(&self, command: &str) -> Result<String> {
        let cwd = std::env::current_dir()?;
        self.in_dir(cwd).exec(command, StdioMode::Inherit, true)
    }

    /// Bind a working directory for subsequent executions
    pub fn in_dir(&self, dir: impl Into<PathBuf>) -> RunIn<'_> {
        RunIn {
            runner: self,
            dir: dir.into(),
        }
    }
}

/// A runner with a working directory chosen
#[derive(Debug)]
pub struct RunIn<'r> {
    runner: &'r ProcessRunner,
    dir: PathBuf,
}

impl RunIn<'_> {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// @acp:summary "Execute one command line and wait for it"
    ///
    /// Returns captured stdout in [`StdioMode::Pipe`], an empty string otherwise.
    /// A spawn failure or a nonzero exit is a [`CliError::Execution`].
    pub fn exec(&self, command: &str, stdio: StdioMode, echo: bool) -> Result<String> {
        if echo {
            self.runner
                .logger
                .info(&format!("running {command} in {}", self.dir.display()));
        }

        let mut child = shell(command);
        child.current_dir(&self.dir);
        let failed = |status: String| CliError::Execution {
            command: command.to_string(),
            cwd: self.dir.clone(),
            status,
        };

        match stdio {
            StdioMode::Inherit => {
                let status = child.status().map_err(|err| failed(err.to_string()))?;
                if !status.success() {
                    return Err(failed(status.to_string()));
                }
                Ok(String::new())
            }
            StdioMode::Pipe => {
                let output = child
                    .stdin(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .output()
                    .map_err(|err| failed(err.to_string()))?;
                if !output.status.success() {
                    return Err(failed(output.status.to_string()));
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
        }
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.args(["/C", command]);
    shell
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut shell = Command::new("sh");
    shell.args(["-c", command]);
    shell
}
