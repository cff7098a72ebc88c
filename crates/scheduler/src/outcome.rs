use std::time::Duration;

use thiserror::Error;

/// Why a run was classified as failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("credential resolution failed: {0}")]
    CredentialResolution(String),

    #[error("binary '{binary}' not found: {message}")]
    BinaryNotFound { binary: String, message: String },

    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("killed after exceeding timeout of {0:?}")]
    Timeout(Duration),

    #[error("exited with status {}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    NonZeroExit { code: Option<i32> },

    #[error("process wrote to stderr")]
    Stderr,
}

impl FailureReason {
    /// Short, stable tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::CredentialResolution(_) => "credential-resolution",
            FailureReason::BinaryNotFound { .. } => "binary-not-found",
            FailureReason::Spawn(_) => "spawn",
            FailureReason::Timeout(_) => "timeout",
            FailureReason::NonZeroExit { .. } => "non-zero-exit",
            FailureReason::Stderr => "stderr",
        }
    }
}

/// Result of one job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub cron_id: String,
    pub user: String,
    pub succeeded: bool,
    /// Everything the process wrote to stderr, lossily decoded.
    pub stderr: String,
    pub failure: Option<FailureReason>,
}

impl ExecutionOutcome {
    pub fn succeeded(cron_id: &str, user: &str) -> Self {
        Self {
            cron_id: cron_id.to_string(),
            user: user.to_string(),
            succeeded: true,
            stderr: String::new(),
            failure: None,
        }
    }

    pub fn failed(cron_id: &str, user: &str, reason: FailureReason, stderr: String) -> Self {
        Self {
            cron_id: cron_id.to_string(),
            user: user.to_string(),
            succeeded: false,
            stderr,
            failure: Some(reason),
        }
    }
}
