//! Reloading the job file into a running scheduler.

use std::path::Path;
use std::sync::Arc;

use cronwarden_core::JobSet;
use cronwarden_scheduler::{JobExecutor, PrometheusReporter, Scheduler, SystemResolver};
use cronwarden_server::{reload_job_set, AppState};

const INITIAL: &str = r#"
cron_config:
  - cron_id: backup
    descriptor: "@daily"
    user: root
    binary: "true"
"#;

const UPDATED: &str = r#"
cron_config:
  - cron_id: backup
    descriptor: "@daily"
    user: root
    binary: "true"
  - cron_id: rotate
    schedule:
      minute: "*/15"
      second: "0"
    user: root
    binary: "true"
"#;

async fn running_state(path: &Path) -> Arc<AppState> {
    let job_set = JobSet::from_file(path).unwrap();
    let reporter = Arc::new(PrometheusReporter::new().unwrap());
    let executor = Arc::new(JobExecutor::new(Arc::new(SystemResolver), reporter.clone()));
    let scheduler = Arc::new(Scheduler::build(&job_set, executor).unwrap());
    scheduler.start().await;
    Arc::new(AppState::new(
        scheduler,
        reporter,
        job_set,
        path.to_path_buf(),
    ))
}

#[tokio::test]
async fn reload_picks_up_new_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, INITIAL).unwrap();
    let state = running_state(&path).await;

    std::fs::write(&path, UPDATED).unwrap();
    let count = reload_job_set(&state).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(state.scheduler.cron_ids().await, vec!["backup", "rotate"]);
    assert_eq!(state.scheduler.generation().await, 1);
    assert!(state.scheduler.is_running().await);
    assert!(state.job_set.read().await.get("rotate").is_some());

    state.scheduler.stop().await;
}

#[tokio::test]
async fn invalid_file_keeps_running_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, INITIAL).unwrap();
    let state = running_state(&path).await;

    std::fs::write(&path, "cron_config:\n  - cron_id: broken\n    user: root\n").unwrap();
    let err = reload_job_set(&state).await.unwrap_err();

    assert!(format!("{err:#}").contains("config.yaml"), "{err:#}");
    assert_eq!(state.scheduler.cron_ids().await, vec!["backup"]);
    assert_eq!(state.scheduler.generation().await, 0);
    assert_eq!(state.job_set.read().await.len(), 1);
    assert!(state.scheduler.is_running().await);

    state.scheduler.stop().await;
}

#[tokio::test]
async fn missing_file_keeps_running_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, INITIAL).unwrap();
    let state = running_state(&path).await;

    std::fs::remove_file(&path).unwrap();
    assert!(reload_job_set(&state).await.is_err());
    assert_eq!(state.job_set.read().await.len(), 1);

    state.scheduler.stop().await;
}
