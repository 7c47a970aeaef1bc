//! Worker configuration loaded from the environment.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_REPORTS_DIR: &str = "Reports";
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidConcurrency { name: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Directory reports are written into.
    pub reports_dir: PathBuf,
    /// Maximum number of reports generated at the same time.
    pub concurrency: usize,
    /// Overrides the machine name used in the subscriber id.
    pub host_name: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            host_name: None,
        }
    }
}

impl WorkerConfig {
    /// Load `.env` (if present) and read the worker settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let reports_dir = match lookup("REPORTS_DIR") {
            Some(value) if value.trim().is_empty() => return Err(ConfigError::Empty("REPORTS_DIR")),
            Some(value) => PathBuf::from(value.trim()),
            None => defaults.reports_dir,
        };

        let concurrency = match lookup("REPORT_WORKER_CONCURRENCY") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => {
                    return Err(ConfigError::InvalidConcurrency {
                        name: "REPORT_WORKER_CONCURRENCY",
                        value,
                    })
                }
            },
            None => defaults.concurrency,
        };

        let host_name = lookup("REPORT_HOST_NAME")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            reports_dir,
            concurrency,
            host_name,
        })
    }
}
