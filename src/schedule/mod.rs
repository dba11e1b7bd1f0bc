//! @acp:module "Scheduler"
//! @acp:summary "Cron-style recurring jobs for long-running actions"
//! @acp:domain cli
//! @acp:layer service

use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local};
use cron::Schedule;

use crate::error::{CliError, Result};
use crate::logger::Logger;

/// Callback fired on every occurrence
pub type JobFn = dyn Fn() + Send + Sync;

/// @acp:summary "Creates cron jobs that log through the shared logger"
#[derive(Debug, Clone)]
pub struct Scheduler {
    logger: Logger,
}

impl Scheduler {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Parse `pattern` (seconds first, e.g. `0 */5 * * * *`) into a stopped job
    pub fn schedule<F>(&self, pattern: &str, callback: F) -> Result<CronJob>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let schedule = Schedule::from_str(pattern).map_err(|err| CliError::Schedule {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;

        Ok(CronJob {
            pattern: pattern.to_string(),
            schedule,
            callback: Arc::new(callback),
            logger: self.logger.clone(),
            worker: None,
        })
    }
}

struct Worker {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// @acp:summary "One recurring job; stopped on drop"
pub struct CronJob {
    pattern: String,
    schedule: Schedule,
    callback: Arc<JobFn>,
    logger: Logger,
    worker: Option<Worker>,
}

impl CronJob {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Next occurrence after now, in local time
    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.schedule.upcoming(Local).next()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Start firing; no effect when already running
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.stop();

        let (stop, signal) = mpsc::channel();
        let schedule = self.schedule.clone();
        let callback = Arc::clone(&self.callback);
        let logger = self.logger.clone();
        let pattern = self.pattern.clone();

        let handle = thread::spawn(move || {
            logger.debug(&format!("cron job `{pattern}` started"));
            while let Some(next) = schedule.upcoming(Local).next() {
                let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
                match signal.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => callback(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            logger.debug(&format!("cron job `{pattern}` stopped"));
        });

        self.worker = Some(Worker { stop, handle });
    }

    /// Stop firing and wait for the worker; no effect when not running
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            if worker.handle.join().is_err() {
                self.logger
                    .error(&format!("cron job `{}` panicked", self.pattern));
            }
        }
    }
}

impl Drop for CronJob {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CronJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronJob")
            .field("pattern", &self.pattern)
            .field("running", &self.is_running())
            .finish()
    }
}
