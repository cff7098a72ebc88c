//! Process signals: SIGHUP reloads, SIGINT/SIGTERM shut down.

use std::io;
use std::sync::Arc;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::reload::reload_job_set;
use crate::state::AppState;

/// Spawn a task that reloads the job file on every SIGHUP.
pub fn spawn_reload_on_sighup(state: Arc<AppState>) -> io::Result<JoinHandle<()>> {
    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("received SIGHUP");
            match reload_job_set(&state).await {
                Ok(jobs) => info!(jobs, "job file reloaded"),
                Err(e) => error!(error = %format!("{e:#}"), "reload failed, keeping active job set"),
            }
        }
    }))
}

/// Listens for SIGINT and SIGTERM.
pub struct ShutdownSignal {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignal {
    /// Register the handlers now so signals arriving before [`recv`](Self::recv)
    /// is awaited are not lost.
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("received SIGINT"),
            _ = self.terminate.recv() => info!("received SIGTERM"),
        }
    }
}
