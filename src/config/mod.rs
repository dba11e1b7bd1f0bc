//! @acp:module "Configuration"
//! @acp:summary "Application and logger configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::error::Result;

/// @acp:summary "Top-level settings of a command-line program"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Program name shown in usage and used as the log directory
    pub name: String,

    pub version: String,

    /// Root help text; the name is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default for the root `--interactive` flag
    #[serde(default)]
    pub interactive: bool,

    #[serde(default)]
    pub logger: LoggerConfig,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            interactive: false,
            logger: LoggerConfig::default(),
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    /// Name the logger writes under, defaulting to the program name
    pub fn log_name(&self) -> &str {
        self.logger.app_name.as_deref().unwrap_or(&self.name)
    }

    /// @acp:summary "Load config from a JSON or YAML file"
    ///
    /// `.yaml` and `.yml` files are read as YAML, anything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if is_yaml(path) {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// @acp:summary "Save config as pretty JSON"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Severity threshold for a log sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn default_date_pattern() -> String {
    "%Y-%m-%d".to_string()
}

fn default_max_size() -> String {
    "20m".to_string()
}

fn default_max_files() -> usize {
    14
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_output_level() -> LogLevel {
    LogLevel::Info
}

fn default_file() -> bool {
    true
}

/// @acp:summary "Logger sinks, storage and rotation"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Directory name under `<base>/logs`; the program name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Storage root; the home directory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<PathBuf>,

    /// chrono format for log file names
    #[serde(default = "default_date_pattern")]
    pub date_pattern: String,

    /// Size at which a log file rolls, e.g. `20m`, `512k`, `1g`
    #[serde(default = "default_max_size")]
    pub max_size: String,

    /// Number of log files kept
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// File sink threshold
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Console sink threshold
    #[serde(default = "default_output_level")]
    pub output_level: LogLevel,

    /// Write log files at all
    #[serde(default = "default_file")]
    pub file: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            base: None,
            date_pattern: default_date_pattern(),
            max_size: default_max_size(),
            max_files: default_max_files(),
            log_level: default_log_level(),
            output_level: default_output_level(),
            file: default_file(),
        }
    }
}

impl LoggerConfig {
    /// Console output only, no files
    pub fn console_only() -> Self {
        Self {
            file: false,
            ..Self::default()
        }
    }
}
