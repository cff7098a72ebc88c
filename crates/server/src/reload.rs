//! Re-reading the job file into the running scheduler.

use anyhow::Context;
use cronwarden_core::JobSet;
use tracing::info;

use crate::state::AppState;

/// Load the job file again and swap it into the scheduler.
///
/// Holds the job set lock for the whole pass so concurrent reloads apply in
/// order. On any error the scheduler and the published job set are left as
/// they were. Returns the number of jobs now active.
pub async fn reload_job_set(state: &AppState) -> anyhow::Result<usize> {
    let mut active = state.job_set.write().await;
    info!(path = %state.config_path.display(), "reloading job file");

    let job_set = JobSet::from_file(&state.config_path)
        .with_context(|| format!("failed to load {}", state.config_path.display()))?;
    state
        .scheduler
        .reload(&job_set)
        .await
        .context("scheduler rejected the new job set")?;

    let count = job_set.len();
    *active = job_set;
    Ok(count)
}
