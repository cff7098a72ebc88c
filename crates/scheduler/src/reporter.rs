//! Result reporting: run outcomes turned into Prometheus counters.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Sink for per-run results. Called once per run from concurrent tasks.
pub trait ResultReporter: Send + Sync {
    fn report(&self, cron_id: &str, user: &str, succeeded: bool);
}

const OUTCOME_SUCCESS: &str = "success";
const OUTCOME_FAILURE: &str = "failure";

/// Reporter backed by its own Prometheus registry.
#[derive(Clone)]
pub struct PrometheusReporter {
    registry: Registry,
    runs: IntCounterVec,
    failures: IntCounterVec,
}

impl PrometheusReporter {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let runs = IntCounterVec::new(
            Opts::new("cronwarden_job_runs_total", "Job runs by outcome."),
            &["cron_id", "user", "outcome"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("cronwarden_job_failures_total", "Failed job runs."),
            &["cron_id", "user"],
        )?;
        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            runs,
            failures,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Current run count for one label set. `with_label_values` creates the
    /// series on first lookup, so reads stay out of the exported registry
    /// outside tests.
    #[cfg(test)]
    pub(crate) fn run_count(&self, cron_id: &str, user: &str, succeeded: bool) -> u64 {
        let outcome = if succeeded {
            OUTCOME_SUCCESS
        } else {
            OUTCOME_FAILURE
        };
        self.runs
            .with_label_values(&[cron_id, user, outcome])
            .get()
    }

    #[cfg(test)]
    pub(crate) fn failure_count(&self, cron_id: &str, user: &str) -> u64 {
        self.failures.with_label_values(&[cron_id, user]).get()
    }
}

impl ResultReporter for PrometheusReporter {
    fn report(&self, cron_id: &str, user: &str, succeeded: bool) {
        if succeeded {
            self.runs
                .with_label_values(&[cron_id, user, OUTCOME_SUCCESS])
                .inc();
        } else {
            self.runs
                .with_label_values(&[cron_id, user, OUTCOME_FAILURE])
                .inc();
            self.failures.with_label_values(&[cron_id, user]).inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_counts_run_only() {
        let reporter = PrometheusReporter::new().unwrap();
        reporter.report("backup", "svc", true);
        reporter.report("backup", "svc", true);

        assert_eq!(reporter.run_count("backup", "svc", true), 2);
        assert_eq!(reporter.run_count("backup", "svc", false), 0);
        assert_eq!(reporter.failure_count("backup", "svc"), 0);
    }

    #[test]
    fn failure_counts_both() {
        let reporter = PrometheusReporter::new().unwrap();
        reporter.report("rotate", "logs", false);

        assert_eq!(reporter.run_count("rotate", "logs", false), 1);
        assert_eq!(reporter.failure_count("rotate", "logs"), 1);
    }

    #[test]
    fn render_exposes_labels() {
        let reporter = PrometheusReporter::new().unwrap();
        reporter.report("backup", "svc", false);

        let text = reporter.render().unwrap();
        assert!(text.contains("cronwarden_job_failures_total"), "{text}");
        assert!(text.contains("cron_id=\"backup\""), "{text}");
        assert!(text.contains("outcome=\"failure\""), "{text}");
    }

    #[test]
    fn render_omits_series_never_reported() {
        let reporter = PrometheusReporter::new().unwrap();
        reporter.report("backup", "svc", true);

        let text = reporter.render().unwrap();
        assert!(text.contains("outcome=\"success\""), "{text}");
        assert!(!text.contains("outcome=\"failure\""), "{text}");
        assert!(!text.contains("cronwarden_job_failures_total{"), "{text}");
    }

    #[test]
    fn reporters_do_not_share_state() {
        let a = PrometheusReporter::new().unwrap();
        let b = PrometheusReporter::new().unwrap();
        a.report("x", "u", true);
        assert_eq!(b.run_count("x", "u", true), 0);
    }
}
