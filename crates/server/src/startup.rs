//! Startup checks run once the job file is loaded.

use std::collections::BTreeSet;

use cronwarden_core::JobSet;
use cronwarden_scheduler::{CredentialResolver, Credentials};
use tracing::warn;

/// Users whose jobs the current process cannot switch to.
///
/// Empty when running as root. Users that fail to resolve are left out;
/// their runs fail on their own with a credential error.
pub fn unreachable_users(
    job_set: &JobSet,
    resolver: &dyn CredentialResolver,
    current: Credentials,
) -> Vec<String> {
    if current.uid == 0 {
        return Vec::new();
    }
    let users: BTreeSet<&str> = job_set.iter().map(|j| j.user.as_str()).collect();
    users
        .into_iter()
        .filter(|user| matches!(resolver.resolve(user), Ok(c) if c.uid != current.uid))
        .map(str::to_string)
        .collect()
}

/// Log a warning for every job user the process lacks privileges for.
pub fn warn_on_missing_privileges(job_set: &JobSet, resolver: &dyn CredentialResolver) {
    let current = Credentials::current();
    for user in unreachable_users(job_set, resolver, current) {
        warn!(
            user = %user,
            uid = current.uid,
            "not running as root, jobs for this user will fail to spawn"
        );
    }
}
