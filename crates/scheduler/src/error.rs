use thiserror::Error;

/// Errors from building or reloading the trigger set.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("failed to register job '{cron_id}': {message}")]
    Build { cron_id: String, message: String },

    #[error("duplicate cron_id '{0}'")]
    DuplicateCronId(String),

    /// The replacement set failed to build; the previous set is still active.
    #[error("reload rejected, keeping the active job set: {0}")]
    Reload(#[source] Box<SchedulerError>),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors from mapping a user name to a numeric identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("user '{0}' does not exist")]
    UnknownUser(String),

    #[error("failed to look up user '{user}': {message}")]
    Lookup { user: String, message: String },
}
