//! Configuration loading for db-relay.
//!
//! Defaults for the per-call execution settings can be kept in a TOML file
//! and overridden per invocation on the command line. A missing file is not
//! an error; the built-in defaults apply.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::db::IsolationLevel;
use crate::error::{RelayError, Result};
use crate::query::QueryOptions;

/// Defaults applied to every operation unless overridden per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Default statement timeout in seconds; 0 disables the timeout.
    pub default_timeout_seconds: u64,

    /// Default transaction isolation level.
    pub default_isolation: IsolationLevel,

    /// Default failure policy: propagate errors (true) or fold them into an
    /// unsuccessful outcome (false).
    pub throw_on_failure: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: 60,
            default_isolation: IsolationLevel::DriverDefault,
            throw_on_failure: true,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| RelayError::config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Loads the file when given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Execution options seeded from these defaults.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            timeout_seconds: self.default_timeout_seconds,
            isolation_level: self.default_isolation,
            throw_on_failure: self.throw_on_failure,
        }
    }
}
