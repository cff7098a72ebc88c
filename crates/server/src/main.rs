//! cronwarden: runs configured jobs on their schedules as their configured
//! users and exposes run counters over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use cronwarden_core::{load_dotenv, JobSet};
use cronwarden_scheduler::{JobExecutor, PrometheusReporter, Scheduler, SystemResolver, DEFAULT_SHELL};
use cronwarden_server::signals::{spawn_reload_on_sighup, ShutdownSignal};
use cronwarden_server::startup::warn_on_missing_privileges;
use cronwarden_server::{build_router, AppState};

/// Exit code for an unusable job file at startup.
const EXIT_CONFIG_ERROR: i32 = 2;

// ── CLI ─────────────────────────────────────────────────────────────

/// Config-driven job scheduler.
#[derive(Parser, Debug)]
#[command(name = "cronwarden", version, about)]
struct Cli {
    /// Path to the YAML job file.
    #[arg(long, env = "CRONWARDEN_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Address the HTTP server binds to.
    #[arg(long, env = "CRONWARDEN_LISTEN", default_value = "0.0.0.0:9375")]
    listen: SocketAddr,

    /// Shell used to run job command lines (`<shell> -c`).
    #[arg(long, env = "CRONWARDEN_SHELL", default_value = DEFAULT_SHELL)]
    shell: String,

    /// Seconds to wait for running jobs on shutdown.
    #[arg(long, env = "CRONWARDEN_SHUTDOWN_TIMEOUT", default_value_t = 30)]
    shutdown_timeout: u64,
}

// ── Main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(config = %cli.config.display(), listen = %cli.listen, "starting cronwarden");

    let job_set = match JobSet::from_file(&cli.config) {
        Ok(set) => set,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "failed to load job file");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let resolver = Arc::new(SystemResolver);
    warn_on_missing_privileges(&job_set, resolver.as_ref());

    let reporter = Arc::new(PrometheusReporter::new().context("failed to register metrics")?);
    let executor =
        Arc::new(JobExecutor::new(resolver, reporter.clone()).with_shell(cli.shell.clone()));

    let scheduler = match Scheduler::build(&job_set, executor) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "failed to register jobs");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };
    scheduler.start().await;

    let state = Arc::new(AppState::new(
        scheduler.clone(),
        reporter,
        job_set,
        cli.config.clone(),
    ));
    let shutdown = ShutdownSignal::register().context("failed to register shutdown signals")?;
    let sighup = spawn_reload_on_sighup(state.clone()).context("failed to register SIGHUP")?;

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!(addr = %cli.listen, "HTTP server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.recv())
        .await
        .context("HTTP server error")?;

    sighup.abort();
    scheduler.stop().await;

    let timeout = Duration::from_secs(cli.shutdown_timeout);
    if scheduler.wait_idle(timeout).await {
        info!("all runs finished, exiting");
    } else {
        warn!(
            in_flight = scheduler.in_flight(),
            timeout_secs = cli.shutdown_timeout,
            "shutdown timeout elapsed with runs still in flight"
        );
    }
    Ok(())
}
