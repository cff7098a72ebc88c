//! Job descriptors: one entry of the `cron_config` list.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::error::{ConfigError, Result};
use crate::schedule::ScheduleExpression;

/// A single scheduled job.
///
/// Exactly one of `descriptor` and `schedule` selects when it runs. The
/// command line executed is `binary` (resolved through `PATH`) followed by
/// `args` verbatim, run through a shell as `user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobDescriptor {
    /// Unique id, used as a metric label.
    #[serde(default)]
    pub cron_id: String,
    /// Named trigger such as `@daily` or `@every 5m`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleExpression>,
    /// OS account the command runs as.
    #[serde(default)]
    pub user: String,
    /// Executable name or path.
    #[serde(default)]
    pub binary: String,
    /// Raw argument string appended to the command line.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub args: String,
    /// Kill the run after this many seconds. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Where a job's trigger comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource<'a> {
    Named(&'a str),
    Schedule(&'a ScheduleExpression),
}

impl TriggerSource<'_> {
    /// The trigger token: the descriptor verbatim, or the rendered schedule.
    pub fn expression(&self) -> String {
        match self {
            TriggerSource::Named(token) => token.to_string(),
            TriggerSource::Schedule(schedule) => schedule.render(),
        }
    }
}

impl JobDescriptor {
    /// Job triggered by a named descriptor.
    pub fn named(
        cron_id: impl Into<String>,
        descriptor: impl Into<String>,
        user: impl Into<String>,
        binary: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self {
            cron_id: cron_id.into(),
            descriptor: Some(descriptor.into()),
            schedule: None,
            user: user.into(),
            binary: binary.into(),
            args: args.into(),
            timeout_secs: None,
        }
    }

    /// Job triggered by a six-field schedule.
    pub fn scheduled(
        cron_id: impl Into<String>,
        schedule: ScheduleExpression,
        user: impl Into<String>,
        binary: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self {
            cron_id: cron_id.into(),
            descriptor: None,
            schedule: Some(schedule),
            user: user.into(),
            binary: binary.into(),
            args: args.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The selected trigger source, or `None` when neither or both of
    /// `descriptor` and `schedule` are set.
    pub fn trigger_source(&self) -> Option<TriggerSource<'_>> {
        match (self.descriptor.as_deref(), self.schedule.as_ref()) {
            (Some(token), None) => Some(TriggerSource::Named(token)),
            (None, Some(schedule)) => Some(TriggerSource::Schedule(schedule)),
            _ => None,
        }
    }

    /// Drop an empty descriptor and default-fill blank schedule fields.
    pub fn normalize(&mut self) {
        if self
            .descriptor
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            self.descriptor = None;
        }
        if let Some(d) = self.descriptor.as_mut() {
            let trimmed = d.trim();
            if trimmed.len() != d.len() {
                *d = trimmed.to_string();
            }
        }
        if let Some(schedule) = self.schedule.as_mut() {
            schedule.normalize();
        }
    }

    /// Check a normalized job on its own (uniqueness is checked by the set).
    pub fn validate(&self, index: usize) -> Result<()> {
        let job = if self.cron_id.trim().is_empty() {
            format!("#{index}")
        } else {
            self.cron_id.clone()
        };
        let invalid = |message: String| ConfigError::InvalidJob {
            job: job.clone(),
            message,
        };

        if self.cron_id.trim().is_empty() {
            return Err(invalid("cron_id field cannot be empty".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(invalid("user field cannot be empty".to_string()));
        }
        if self.binary.trim().is_empty() {
            return Err(invalid("binary field cannot be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(invalid("timeout_secs must be at least 1".to_string()));
        }

        match (&self.descriptor, &self.schedule) {
            (None, None) => Err(invalid(
                "both descriptor and schedule are not set".to_string(),
            )),
            (Some(_), Some(_)) => Err(invalid(
                "descriptor and schedule are mutually exclusive, set only one".to_string(),
            )),
            (Some(token), None) => Descriptor::from_str(token)
                .map(|_| ())
                .map_err(|e| invalid(e.to_string())),
            (None, Some(schedule)) => {
                let expr = schedule.render();
                cron::Schedule::from_str(&schedule.trigger_expression())
                    .map(|_| ())
                    .map_err(|e| invalid(format!("invalid schedule '{expr}': {e}")))
            }
        }
    }
}
