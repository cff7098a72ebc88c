use std::path::PathBuf;
use std::sync::Arc;

use cronwarden_core::JobSet;
use cronwarden_scheduler::{PrometheusReporter, Scheduler};
use tokio::sync::RwLock;

/// State shared by the HTTP handlers and the signal tasks.
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub reporter: Arc<PrometheusReporter>,
    /// Job set the scheduler is currently running.
    pub job_set: RwLock<JobSet>,
    /// File re-read on SIGHUP.
    pub config_path: PathBuf,
}

impl AppState {
    pub fn new(
        scheduler: Arc<Scheduler>,
        reporter: Arc<PrometheusReporter>,
        job_set: JobSet,
        config_path: PathBuf,
    ) -> Self {
        Self {
            scheduler,
            reporter,
            job_set: RwLock::new(job_set),
            config_path,
        }
    }
}
