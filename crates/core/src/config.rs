//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services. Request handlers never read process-wide environment variables,
//! which keeps behaviour consistent across multi-threaded runtimes and test
//! harnesses.

use std::path::{Path, PathBuf};

use crate::{ClinicError, ClinicResult};

/// Configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    data_dir: PathBuf,
    reminder_token: Option<String>,
}

impl ClinicConfig {
    /// Create a new `ClinicConfig`.
    ///
    /// A blank `reminder_token` is treated as absent: the reminder trigger
    /// endpoint is then open, matching an unset token.
    pub fn new(data_dir: PathBuf, reminder_token: Option<String>) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput("data_dir cannot be empty".into()));
        }

        let reminder_token = reminder_token
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        Ok(Self {
            data_dir,
            reminder_token,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Shared secret required by the reminder trigger endpoint, when set.
    pub fn reminder_token(&self) -> Option<&str> {
        self.reminder_token.as_deref()
    }
}
