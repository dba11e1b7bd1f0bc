//! @acp:module "Logger"
//! @acp:summary "Injected logging handle with a console sink and a rotated file sink"
//! @acp:domain cli
//! @acp:layer service
//!
//! The handle owns its own [`Dispatch`] instead of installing a global
//! subscriber, so several programs (or tests) can coexist in one process.

pub mod rotate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggerConfig;
use crate::error::{CliError, Result};

pub use rotate::{parse_size, RotatingFile};
use rotate::SharedFile;

struct Inner {
    app_name: String,
    log_dir: Option<PathBuf>,
    dispatch: Dispatch,
}

/// @acp:summary "Cheap-to-clone logger shared by the program and its actions"
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("app_name", &self.inner.app_name)
            .field("log_dir", &self.inner.log_dir)
            .finish()
    }
}

impl Logger {
    /// @acp:summary "Build the console and file sinks from config"
    pub fn new(config: LoggerConfig) -> Result<Self> {
        let app_name = config
            .app_name
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        if app_name.is_empty() || app_name.contains(['/', '\\']) {
            return Err(CliError::config(format!(
                "`{app_name}` cannot name a log directory"
            )));
        }

        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter(&app_name, &config));

        let (file, log_dir) = if config.file {
            let base = config
                .base
                .clone()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            let dir = base.join("logs").join(&app_name);
            let max_size = parse_size(&config.max_size)?;
            let writer = SharedFile::new(RotatingFile::new(
                &dir,
                config.date_pattern.clone(),
                max_size,
                config.max_files,
            )?);

            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .with_filter(LevelFilter::from(config.log_level));
            (Some(layer), Some(dir))
        } else {
            (None, None)
        };

        let subscriber = tracing_subscriber::registry().with(console).with(file);

        Ok(Self {
            inner: Arc::new(Inner {
                app_name,
                log_dir,
                dispatch: Dispatch::new(subscriber),
            }),
        })
    }

    /// Console sink only, at the default levels
    pub fn console_only(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        let config = LoggerConfig::console_only();
        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter(&app_name, &config));

        Self {
            inner: Arc::new(Inner {
                app_name,
                log_dir: None,
                dispatch: Dispatch::new(tracing_subscriber::registry().with(console)),
            }),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// Directory holding the log files; `None` without a file sink
    pub fn log_dir(&self) -> Option<&Path> {
        self.inner.log_dir.as_deref()
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// Run `f` with this logger as the active subscriber
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.inner.dispatch, f)
    }

    pub fn error(&self, message: &str) {
        self.scope(|| tracing::error!("{message}"));
    }

    pub fn warn(&self, message: &str) {
        self.scope(|| tracing::warn!("{message}"));
    }

    pub fn info(&self, message: &str) {
        self.scope(|| tracing::info!("{message}"));
    }

    pub fn debug(&self, message: &str) {
        self.scope(|| tracing::debug!("{message}"));
    }

    pub fn trace(&self, message: &str) {
        self.scope(|| tracing::trace!("{message}"));
    }
}

/// `git-helper` reads its filter from `GIT_HELPER_LOG`
pub fn env_var_name(app_name: &str) -> String {
    let stem: String = app_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_LOG")
}

fn console_filter(app_name: &str, config: &LoggerConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.output_level).into())
        .with_env_var(env_var_name(app_name))
        .from_env_lossy()
}
