//! @acp:module "Task Runner"
//! @acp:summary "Ordered async steps with optional progress output"
//! @acp:domain cli
//! @acp:layer service

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::logger::Logger;

type StepFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;
type Step = Box<dyn FnOnce() -> StepFuture>;

/// One titled step
pub struct Task {
    title: String,
    step: Step,
}

impl Task {
    pub fn new<F, Fut>(title: impl Into<String>, step: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self {
            title: title.into(),
            step: Box::new(move || Box::pin(step())),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("title", &self.title).finish()
    }
}

/// @acp:summary "Runs tasks strictly in insertion order, stopping at the first failure"
#[derive(Debug)]
pub struct TaskRunner {
    logger: Logger,
    show_log: bool,
    tasks: Vec<Task>,
}

impl TaskRunner {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            show_log: false,
            tasks: Vec::new(),
        }
    }

    /// Log `START`/`DONE` per step and show a spinner
    pub fn show_log(mut self, show_log: bool) -> Self {
        self.show_log = show_log;
        self
    }

    pub fn add<F, Fut>(&mut self, title: impl Into<String>, step: F) -> &mut Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.tasks.push(Task::new(title, step));
        self
    }

    pub fn extend<I: IntoIterator<Item = Task>>(&mut self, tasks: I) -> &mut Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// @acp:summary "Await every step in order"
    pub async fn run(self) -> anyhow::Result<()> {
        for Task { title, step } in self.tasks {
            let spinner = self.show_log.then(|| spinner(&title));
            if self.show_log {
                self.logger.info(&format!("{title} START"));
            }

            let result = step().await.with_context(|| format!("task `{title}` failed"));

            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            match result {
                Ok(()) => {
                    if self.show_log {
                        self.logger.info(&format!("{title} DONE"));
                        eprintln!("{} {}", style("✓").green(), title);
                    }
                }
                Err(err) => {
                    if self.show_log {
                        eprintln!("{} {}", style("✗").red(), title);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Drive [`TaskRunner::run`] on a fresh current-thread runtime
    ///
    /// For synchronous actions; must not be called from inside a runtime.
    pub fn run_blocking(self) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start the task runtime")?;
        runtime.block_on(self.run())
    }
}

fn spinner(title: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(title.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn runner() -> TaskRunner {
        TaskRunner::new(Logger::console_only("task-test"))
    }

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Task {
        let log = Rc::clone(log);
        Task::new(name, move || async move {
            tokio::task::yield_now().await;
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_steps_run_in_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tasks = runner();
        tasks.extend([recorder(&log, "fetch"), recorder(&log, "build")]);
        tasks.add("ship", {
            let log = Rc::clone(&log);
            move || async move {
                log.borrow_mut().push("ship");
                Ok(())
            }
        });
        assert_eq!(tasks.len(), 3);

        tasks.run().await.unwrap();
        assert_eq!(*log.borrow(), vec!["fetch", "build", "ship"]);
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_run() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tasks = runner();
        tasks.extend([recorder(&log, "one")]);
        tasks.add("broken", || async { Err::<(), _>(anyhow::anyhow!("disk full")) });
        tasks.extend([recorder(&log, "never")]);

        let err = tasks.run().await.unwrap_err();
        assert_eq!(err.to_string(), "task `broken` failed");
        assert_eq!(format!("{err:#}"), "task `broken` failed: disk full");
        assert_eq!(*log.borrow(), vec!["one"]);
    }

    #[test]
    fn test_run_blocking_outside_a_runtime() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tasks = runner().show_log(true);
        tasks.extend([recorder(&log, "only")]);
        tasks.run_blocking().unwrap();
        assert_eq!(*log.borrow(), vec!["only"]);
    }

    #[tokio::test]
    async fn test_empty_runner_succeeds() {
        let tasks = runner();
        assert!(tasks.is_empty());
        tasks.run().await.unwrap();
    }
}
