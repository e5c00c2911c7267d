//! Privilege checks for control file access
//!
//! Every control read and write is gated on the caller running as root. The
//! check is made through a [`Privilege`] probe so that it is re-evaluated on
//! each call and can be replaced when driving a fake sysfs tree.

use crate::error::{Error, Result};
use std::fmt;

/// Source of truth for whether the caller may touch control files
pub trait Privilege: fmt::Debug + Send + Sync {
    /// Whether the caller currently holds elevated privileges
    fn is_elevated(&self) -> bool;
}

/// Checks the effective user id of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveUser;

impl Privilege for EffectiveUser {
    fn is_elevated(&self) -> bool {
        running_as_root()
    }
}

/// Fixed answer, for callers that have already established privilege or for
/// exercising the controls against a fake tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed(pub bool);

impl Privilege for Fixed {
    fn is_elevated(&self) -> bool {
        self.0
    }
}

/// Whether the effective user is root
#[cfg(unix)]
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Whether the effective user is root
#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

/// Fail with `PrivilegeDenied` unless `probe` reports elevated privileges
///
/// # Security
/// Refusals are logged to leave an audit trail of attempted privileged
/// operations.
pub fn require(probe: &dyn Privilege, operation: &str) -> Result<()> {
    if probe.is_elevated() {
        return Ok(());
    }

    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".into());
    log::warn!("refused '{}' for unprivileged user {}", operation, user);
    Err(Error::PrivilegeDenied(operation.to_string()))
}
