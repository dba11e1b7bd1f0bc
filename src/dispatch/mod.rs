//! @acp:module "Action Dispatch"
//! @acp:summary "Hands resolved data and shared collaborators to a command's action"
//! @acp:domain cli
//! @acp:layer handler

use crate::binder::ResolvedData;
use crate::error::{CliError, Result};
use crate::logger::Logger;
use crate::model::CommandNode;
use crate::runner::ProcessRunner;
use crate::schedule::Scheduler;
use crate::task::TaskRunner;

/// Handles built once per program and lent to every action
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub logger: Logger,
    pub runner: ProcessRunner,
}

impl Collaborators {
    pub fn new(logger: Logger) -> Self {
        Self {
            runner: ProcessRunner::new(logger.clone()),
            logger,
        }
    }
}

/// @acp:summary "Everything an action can see"
#[derive(Debug)]
pub struct ActionContext<'a> {
    path: &'a [String],
    data: ResolvedData,
    collaborators: &'a Collaborators,
}

impl<'a> ActionContext<'a> {
    pub fn new(path: &'a [String], data: ResolvedData, collaborators: &'a Collaborators) -> Self {
        Self {
            path,
            data,
            collaborators,
        }
    }

    pub fn data(&self) -> &ResolvedData {
        &self.data
    }

    /// Names from the root to the dispatched command
    pub fn command_path(&self) -> &[String] {
        self.path
    }

    pub fn logger(&self) -> &Logger {
        &self.collaborators.logger
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.collaborators.runner
    }

    /// Fresh task runner bound to the shared logger
    pub fn tasks(&self) -> TaskRunner {
        TaskRunner::new(self.collaborators.logger.clone())
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.collaborators.logger.clone())
    }
}

/// @acp:summary "Invoke the node's action once with its resolved data"
///
/// A node without an action is a no-op.
pub fn dispatch(
    node: &CommandNode,
    path: &[String],
    data: ResolvedData,
    collaborators: &Collaborators,
) -> Result<()> {
    let command = path.join(" ");
    let Some(action) = node.action() else {
        tracing::debug!(%command, "no action declared, nothing to dispatch");
        return Ok(());
    };

    tracing::debug!(%command, params = data.len(), "dispatching");
    let context = ActionContext::new(path, data, collaborators);
    action(&context).map_err(|cause| CliError::Action { command, cause })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Param;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collaborators() -> Collaborators {
        Collaborators::new(Logger::console_only("dispatch-test"))
    }

    #[test]
    fn test_action_receives_data_and_path() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let node = CommandNode::builder("push")
            .param(Param::argument("remote"))
            .action(move |ctx| {
                let remote: Option<String> = ctx.data().get("remote")?;
                *sink.borrow_mut() = Some((ctx.command_path().join(" "), remote));
                Ok(())
            })
            .build()
            .unwrap();

        let mut data = ResolvedData::new();
        data.insert("remote", json!("origin"));
        let path = vec!["git".to_string(), "push".to_string()];
        dispatch(&node, &path, data, &collaborators()).unwrap();

        assert_eq!(
            *seen.borrow(),
            Some(("git push".to_string(), Some("origin".to_string())))
        );
    }

    #[test]
    fn test_missing_action_is_a_no_op() {
        let node = CommandNode::builder("idle").build().unwrap();
        let path = vec!["idle".to_string()];
        dispatch(&node, &path, ResolvedData::new(), &collaborators()).unwrap();
    }

    #[test]
    fn test_action_error_is_wrapped() {
        let node = CommandNode::builder("boom")
            .action(|_| anyhow::bail!("exploded"))
            .build()
            .unwrap();
        let path = vec!["boom".to_string()];
        let err = dispatch(&node, &path, ResolvedData::new(), &collaborators()).unwrap_err();
        match err {
            CliError::Action { command, cause } => {
                assert_eq!(command, "boom");
                assert_eq!(cause.to_string(), "exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
