//! Job scheduling and execution for cronwarden.
//!
//! - [`Scheduler`]: registers one trigger per job and fires them on time
//! - [`JobExecutor`]: runs a job's command as its configured user
//! - [`PrometheusReporter`]: counts run outcomes per job and user

pub mod credentials;
pub mod engine;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod reporter;

pub use credentials::{CredentialResolver, Credentials, SystemResolver};
pub use engine::{Scheduler, Trigger, TriggerHandle};
pub use error::{CredentialError, Result, SchedulerError};
pub use executor::{JobExecutor, JobRunner, DEFAULT_SHELL};
pub use outcome::{ExecutionOutcome, FailureReason};
pub use reporter::{PrometheusReporter, ResultReporter};
