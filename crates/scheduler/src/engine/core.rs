//! Core [`Scheduler`] struct: owns the active trigger set and the loop that
//! fires it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use cronwarden_core::JobSet;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::trigger::{build_triggers, TriggerHandle};
use crate::error::{Result, SchedulerError};
use crate::executor::JobRunner;

/// Counts runs that have been dispatched but not finished.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

struct RunningLoop {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct EngineState {
    triggers: Arc<Vec<TriggerHandle>>,
    /// Bumped on every successful reload.
    generation: u64,
    running: Option<RunningLoop>,
}

/// Time-based job scheduler.
///
/// Built stopped from a [`JobSet`]; [`start`](Self::start) spawns a single
/// trigger loop that fires every due job in its own task. The trigger set is
/// never mutated in place: [`reload`](Self::reload) builds a complete
/// replacement first and swaps it in while the loop is stopped.
pub struct Scheduler {
    state: Mutex<EngineState>,
    runner: Arc<dyn JobRunner>,
    in_flight: Arc<InFlight>,
}

impl Scheduler {
    /// Register one trigger per job. Fails without registering anything if
    /// any job is invalid or two jobs share a cron id.
    pub fn build(job_set: &JobSet, runner: Arc<dyn JobRunner>) -> Result<Self> {
        let triggers = build_triggers(job_set)?;
        Ok(Self {
            state: Mutex::new(EngineState {
                triggers: Arc::new(triggers),
                generation: 0,
                running: None,
            }),
            runner,
            in_flight: Arc::new(InFlight::default()),
        })
    }

    /// Start firing triggers. No-op when already running.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        self.start_locked(&mut state);
    }

    /// Stop firing triggers. Runs already dispatched keep going.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        Self::stop_locked(&mut state).await;
    }

    /// Replace the whole trigger set.
    ///
    /// The new set is built before anything is touched; on failure the
    /// active set keeps firing and [`SchedulerError::Reload`] is returned.
    pub async fn reload(&self, job_set: &JobSet) -> Result<()> {
        info!(jobs = job_set.len(), "reloading job set");
        let triggers = match build_triggers(job_set) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "reload rejected, keeping active job set");
                return Err(SchedulerError::Reload(Box::new(e)));
            }
        };

        let mut state = self.state.lock().await;
        Self::stop_locked(&mut state).await;
        state.triggers = Arc::new(triggers);
        state.generation += 1;
        self.start_locked(&mut state);

        info!(
            generation = state.generation,
            jobs = state.triggers.len(),
            "job set reloaded"
        );
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running.is_some()
    }

    pub async fn trigger_count(&self) -> usize {
        self.state.lock().await.triggers.len()
    }

    /// Cron ids of the active triggers, in registration order.
    pub async fn cron_ids(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .triggers
            .iter()
            .map(|h| h.cron_id().to_string())
            .collect()
    }

    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Runs dispatched and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// Wait until no run is in flight. Returns `false` if `timeout` elapsed
    /// first.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.in_flight.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight.get() == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.in_flight.get() == 0;
            }
        }
    }

    fn start_locked(&self, state: &mut EngineState) {
        if state.running.is_some() {
            debug!("scheduler already running");
            return;
        }
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_trigger_loop(
            Arc::clone(&state.triggers),
            Arc::clone(&self.runner),
            Arc::clone(&self.in_flight),
            stop_rx,
        ));
        state.running = Some(RunningLoop { stop, task });
        info!(jobs = state.triggers.len(), "scheduler started");
    }

    async fn stop_locked(state: &mut EngineState) {
        let Some(running) = state.running.take() else {
            return;
        };
        let _ = running.stop.send(true);
        if let Err(e) = running.task.await {
            warn!(error = %e, "trigger loop ended abnormally");
        }
        info!("scheduler stopped");
    }
}

/// Sleep until the earliest next fire time, fire every due trigger once, repeat.
async fn run_trigger_loop(
    triggers: Arc<Vec<TriggerHandle>>,
    runner: Arc<dyn JobRunner>,
    in_flight: Arc<InFlight>,
    mut stop: watch::Receiver<bool>,
) {
    let now = Local::now();
    let mut next: Vec<_> = triggers.iter().map(|h| h.next_after(&now)).collect();

    loop {
        if *stop.borrow() {
            return;
        }

        let Some(earliest) = next.iter().flatten().min().cloned() else {
            // Nothing left to fire; idle until stopped.
            let _ = stop.changed().await;
            return;
        };
        let wait = (earliest - Local::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = stop.changed() => return,
        }

        let now = Local::now();
        for (handle, slot) in triggers.iter().zip(next.iter_mut()) {
            let due = matches!(slot, Some(at) if *at <= now);
            if !due {
                continue;
            }
            *slot = handle.next_after(&now);
            dispatch(handle, &runner, &in_flight);
        }
    }
}

fn dispatch(handle: &TriggerHandle, runner: &Arc<dyn JobRunner>, in_flight: &Arc<InFlight>) {
    debug!(cron_id = %handle.job.cron_id, trigger = %handle.expression, "firing job");
    let job = Arc::clone(&handle.job);
    let runner = Arc::clone(runner);
    let guard = in_flight.enter();
    tokio::spawn(async move {
        let _guard = guard;
        runner.run(&job).await;
    });
}
