//! Job execution: run one job's command as its configured user and classify
//! the result.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cronwarden_core::JobDescriptor;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info, warn};

use crate::credentials::CredentialResolver;
use crate::outcome::{ExecutionOutcome, FailureReason};
use crate::reporter::ResultReporter;

/// Shell used to run the command line when none is configured.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Runs a job once. The engine calls this from its own task for every firing.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &JobDescriptor) -> ExecutionOutcome;
}

/// Spawns job commands under the job's user and reports every outcome.
pub struct JobExecutor {
    resolver: Arc<dyn CredentialResolver>,
    reporter: Arc<dyn ResultReporter>,
    shell: String,
}

impl JobExecutor {
    pub fn new(resolver: Arc<dyn CredentialResolver>, reporter: Arc<dyn ResultReporter>) -> Self {
        Self {
            resolver,
            reporter,
            shell: DEFAULT_SHELL.to_string(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Run `binary args` as `user` and report the outcome.
    ///
    /// Never fails: every problem becomes a failed outcome.
    pub async fn execute(
        &self,
        cron_id: &str,
        user: &str,
        binary: &str,
        args: &str,
        timeout: Option<Duration>,
    ) -> ExecutionOutcome {
        let outcome = self.spawn_and_wait(cron_id, user, binary, args, timeout).await;
        self.reporter.report(cron_id, user, outcome.succeeded);

        match &outcome.failure {
            None => info!(cron_id, user, binary, "job succeeded"),
            Some(reason) => warn!(
                cron_id,
                user,
                binary,
                reason = reason.kind(),
                error = %reason,
                stderr = %outcome.stderr.trim_end(),
                "job failed"
            ),
        }
        outcome
    }

    async fn spawn_and_wait(
        &self,
        cron_id: &str,
        user: &str,
        binary: &str,
        args: &str,
        timeout: Option<Duration>,
    ) -> ExecutionOutcome {
        let creds = match self.resolver.resolve(user) {
            Ok(c) => c,
            Err(e) => {
                return ExecutionOutcome::failed(
                    cron_id,
                    user,
                    FailureReason::CredentialResolution(e.to_string()),
                    String::new(),
                );
            }
        };

        let path = match which::which(binary) {
            Ok(p) => p,
            Err(e) => {
                return ExecutionOutcome::failed(
                    cron_id,
                    user,
                    FailureReason::BinaryNotFound {
                        binary: binary.to_string(),
                        message: e.to_string(),
                    },
                    String::new(),
                );
            }
        };
        debug!(cron_id, binary, path = %path.display(), "resolved binary");

        let command_line = if args.is_empty() {
            path.display().to_string()
        } else {
            format!("{} {}", path.display(), args)
        };

        // Setting the uid also clears supplementary groups when running as root.
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(&command_line)
            .uid(creds.uid)
            .gid(creds.gid)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                return ExecutionOutcome::failed(
                    cron_id,
                    user,
                    FailureReason::Spawn(e.to_string()),
                    String::new(),
                );
            }
        };
        debug!(cron_id, user, uid = creds.uid, gid = creds.gid, command = %command_line, "spawned job");

        // Stderr is read into `buf` as it arrives, so a timed out run still
        // keeps what it wrote before being killed.
        let mut pipe = child.stderr.take();
        let mut buf = Vec::new();
        let waited = match timeout {
            Some(limit) => {
                let wait = wait_collecting_stderr(&mut child, pipe.as_mut(), &mut buf);
                let result = tokio::time::timeout(limit, wait).await;
                match result {
                    Ok(result) => result,
                    Err(_) => {
                        if let Err(e) = child.start_kill() {
                            warn!(cron_id, error = %e, "failed to kill timed out job");
                        }
                        let _ = child.wait().await;
                        return ExecutionOutcome::failed(
                            cron_id,
                            user,
                            FailureReason::Timeout(limit),
                            String::from_utf8_lossy(&buf).into_owned(),
                        );
                    }
                }
            }
            None => wait_collecting_stderr(&mut child, pipe.as_mut(), &mut buf).await,
        };
        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                return ExecutionOutcome::failed(
                    cron_id,
                    user,
                    FailureReason::Spawn(e.to_string()),
                    String::from_utf8_lossy(&buf).into_owned(),
                );
            }
        };

        let stderr = String::from_utf8_lossy(&buf).into_owned();
        if !status.success() {
            let reason = FailureReason::NonZeroExit {
                code: status.code(),
            };
            return ExecutionOutcome::failed(cron_id, user, reason, stderr);
        }
        if !stderr.is_empty() {
            return ExecutionOutcome::failed(cron_id, user, FailureReason::Stderr, stderr);
        }
        ExecutionOutcome::succeeded(cron_id, user)
    }
}

/// Wait for the child while draining its stderr into `buf`.
async fn wait_collecting_stderr(
    child: &mut Child,
    pipe: Option<&mut ChildStderr>,
    buf: &mut Vec<u8>,
) -> io::Result<ExitStatus> {
    let read = async {
        match pipe {
            Some(pipe) => pipe.read_to_end(buf).await.map(|_| ()),
            None => Ok(()),
        }
    };
    let (read, status) = tokio::join!(read, child.wait());
    read?;
    status
}

#[async_trait]
impl JobRunner for JobExecutor {
    async fn run(&self, job: &JobDescriptor) -> ExecutionOutcome {
        self.execute(&job.cron_id, &job.user, &job.binary, &job.args, job.timeout())
            .await
    }
}
