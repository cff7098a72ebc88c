use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the job file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A single job failed validation. `job` is the cron id, or `#<index>`
    /// when the cron id itself is missing.
    #[error("invalid job '{job}': {message}")]
    InvalidJob { job: String, message: String },

    #[error("duplicate cron_id '{0}': cron ids must be unique")]
    DuplicateCronId(String),
}

/// Result alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors from parsing a named descriptor such as `@daily` or `@every 5m`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("a valid time duration must follow the @every descriptor")]
    MissingInterval,

    #[error("invalid @every duration '{0}', expected e.g. '90s', '5m', '1h30m'")]
    InvalidInterval(String),

    #[error("@every duration must be at least 1s, got '{0}'")]
    IntervalTooShort(String),

    #[error(
        "descriptor '{0}' is not valid, expected one of @yearly, @annually, @monthly, \
         @weekly, @daily, @midnight, @hourly or '@every <duration>'"
    )]
    Unknown(String),
}
