//! Job file loading: YAML under a `cron_config` root, normalized and
//! validated into a [`JobSet`].

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::job::JobDescriptor;


/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// The full set of configured jobs, in file order.
///
/// A `JobSet` produced by [`from_yaml`](JobSet::from_yaml) or
/// [`from_file`](JobSet::from_file) is always normalized and valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSet {
    #[serde(rename = "cron_config", default)]
    jobs: Vec<JobDescriptor>,
}

impl JobSet {
    /// Wrap jobs without validating them. Call [`validate`](Self::validate)
    /// before handing the set to the engine.
    pub fn new(jobs: Vec<JobDescriptor>) -> Self {
        Self { jobs }
    }

    /// Parse, normalize and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut set: JobSet = serde_yaml::from_str(yaml)?;
        set.normalize();
        set.validate()?;
        Ok(set)
    }

    /// Read and parse a job file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_yaml(&content)?;
        info!(path = %path.display(), jobs = set.len(), "loaded job file");
        Ok(set)
    }

    pub fn normalize(&mut self) {
        for job in &mut self.jobs {
            job.normalize();
        }
    }

    /// Validate every job, then check cron ids are unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.jobs.len());
        for (index, job) in self.jobs.iter().enumerate() {
            job.validate(index)?;
            if !seen.insert(job.cron_id.as_str()) {
                return Err(ConfigError::DuplicateCronId(job.cron_id.clone()));
            }
            debug!(cron_id = %job.cron_id, user = %job.user, "job validated");
        }
        Ok(())
    }

    /// Serialize back to YAML under the `cron_config` root.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobDescriptor> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, cron_id: &str) -> Option<&JobDescriptor> {
        self.jobs.iter().find(|j| j.cron_id == cron_id)
    }
}

impl<'a> IntoIterator for &'a JobSet {
    type Item = &'a JobDescriptor;
    type IntoIter = std::slice::Iter<'a, JobDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}
