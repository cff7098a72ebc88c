//! User name to uid/gid resolution.

use nix::unistd::{getgid, getuid, User};
use tracing::debug;

use crate::error::CredentialError;

/// Numeric identity a job's process runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub uid: u32,
    pub gid: u32,
}

impl Credentials {
    /// Identity of the current process.
    pub fn current() -> Self {
        Self {
            uid: getuid().as_raw(),
            gid: getgid().as_raw(),
        }
    }
}

/// Maps a user name to its credentials.
///
/// Called before every run with no caching, so accounts added or removed
/// between runs are picked up.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, user: &str) -> Result<Credentials, CredentialError>;
}

/// Resolver backed by the system account database (`getpwnam_r`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl CredentialResolver for SystemResolver {
    fn resolve(&self, user: &str) -> Result<Credentials, CredentialError> {
        let entry = User::from_name(user)
            .map_err(|e| CredentialError::Lookup {
                user: user.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| CredentialError::UnknownUser(user.to_string()))?;

        let creds = Credentials {
            uid: entry.uid.as_raw(),
            gid: entry.gid.as_raw(),
        };
        debug!(user, uid = creds.uid, gid = creds.gid, "resolved user");
        Ok(creds)
    }
}
