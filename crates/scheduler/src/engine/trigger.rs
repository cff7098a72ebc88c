//! Trigger primitives: when does a registered job fire next.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, SubsecRound, TimeZone};
use cron::Schedule;
use cronwarden_core::{Descriptor, DescriptorTrigger, JobDescriptor, JobSet, TriggerSource};
use tracing::info;

use crate::error::{Result, SchedulerError};

/// Parsed firing rule of one job.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Calendar schedule, evaluated in local time.
    Cron(Box<Schedule>),
    /// Fixed delay, aligned to whole seconds.
    Every(Duration),
}

impl Trigger {
    /// Parse a job's trigger source.
    pub fn from_source(source: TriggerSource<'_>) -> std::result::Result<Self, String> {
        match source {
            TriggerSource::Named(token) => {
                let descriptor = Descriptor::from_str(token).map_err(|e| e.to_string())?;
                match descriptor.trigger() {
                    DescriptorTrigger::Cron(expr) => Self::cron(expr, token),
                    DescriptorTrigger::Interval(interval) => Ok(Self::every(interval)),
                }
            }
            TriggerSource::Schedule(schedule) => {
                Self::cron(&schedule.trigger_expression(), &schedule.render())
            }
        }
    }

    /// Parse `expr`; errors name the schedule as configured (`shown`).
    fn cron(expr: &str, shown: &str) -> std::result::Result<Self, String> {
        Schedule::from_str(expr)
            .map(|s| Trigger::Cron(Box::new(s)))
            .map_err(|e| format!("invalid schedule '{shown}': {e}"))
    }

    /// Interval trigger; sub-second remainders are dropped, minimum one second.
    pub fn every(interval: Duration) -> Self {
        Trigger::Every(Duration::from_secs(interval.as_secs().max(1)))
    }

    /// First fire time strictly after `after`, or `None` if the schedule has
    /// no future occurrence.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        match self {
            Trigger::Cron(schedule) => schedule.after(after).next(),
            Trigger::Every(interval) => {
                let step = chrono::Duration::from_std(*interval).ok()?;
                after.clone().trunc_subsecs(0).checked_add_signed(step)
            }
        }
    }
}

/// One job bound to its parsed trigger. Owns its copy of the job.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    pub job: Arc<JobDescriptor>,
    /// Trigger token as configured: the descriptor or the rendered schedule.
    pub expression: String,
    pub trigger: Trigger,
}

impl TriggerHandle {
    pub fn new(job: &JobDescriptor) -> Result<Self> {
        let build_error = |message: String| SchedulerError::Build {
            cron_id: job.cron_id.clone(),
            message,
        };
        let source = job.trigger_source().ok_or_else(|| {
            build_error("exactly one of descriptor or schedule must be set".to_string())
        })?;
        let trigger = Trigger::from_source(source).map_err(build_error)?;

        Ok(Self {
            job: Arc::new(job.clone()),
            expression: source.expression(),
            trigger,
        })
    }

    pub fn cron_id(&self) -> &str {
        &self.job.cron_id
    }

    pub fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.trigger.next_after(after)
    }
}

/// Build one trigger per job. Any bad job or duplicate id aborts the whole
/// pass and nothing is returned.
pub fn build_triggers(job_set: &JobSet) -> Result<Vec<TriggerHandle>> {
    let mut seen = HashSet::with_capacity(job_set.len());
    let mut handles = Vec::with_capacity(job_set.len());

    for job in job_set {
        if !seen.insert(job.cron_id.as_str()) {
            return Err(SchedulerError::DuplicateCronId(job.cron_id.clone()));
        }
        handles.push(TriggerHandle::new(job)?);
    }

    for handle in &handles {
        info!(
            cron_id = %handle.job.cron_id,
            user = %handle.job.user,
            binary = %handle.job.binary,
            trigger = %handle.expression,
            "registered job"
        );
    }
    Ok(handles)
}
