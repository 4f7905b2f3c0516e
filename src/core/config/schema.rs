//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$PLUMBVIEW_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/plumbview/config.toml`
//! 3. `~/.plumbview/config.toml`
//!
//! # Repo Config
//!
//! Located at `.git/plumbview/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing: the git binary and every
//! conflict label must be non-empty single-line strings.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// git_binary = "/usr/local/bin/git"
/// quote_paths = false
/// untracked = true
///
/// [labels]
/// common = "base"
/// ours = "mine"
/// theirs = "incoming"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Git executable to run (default: "git" from PATH)
    pub git_binary: Option<String>,

    /// Let git C-quote unusual paths
    pub quote_paths: Option<bool>,

    /// List untracked files in status
    pub untracked: Option<bool>,

    /// Conflict side labels
    pub labels: Option<LabelsConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(binary) = &self.git_binary {
            check_text("git_binary", binary)?;
        }
        if let Some(labels) = &self.labels {
            labels.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// The git binary is a user choice and cannot be set per repository.
///
/// # Example
///
/// ```toml
/// untracked = false
///
/// [labels]
/// ours = "local"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Let git C-quote unusual paths
    pub quote_paths: Option<bool>,

    /// List untracked files in status
    pub untracked: Option<bool>,

    /// Conflict side labels
    pub labels: Option<LabelsConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(labels) = &self.labels {
            labels.validate()?;
        }
        Ok(())
    }
}

/// Display labels for the sides of a conflict.
///
/// Unset labels fall back to the next scope, then to
/// `common` / `ours` / `theirs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LabelsConfig {
    pub common: Option<String>,
    pub ours: Option<String>,
    pub theirs: Option<String>,
}

impl LabelsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("labels.common", &self.common),
            ("labels.ours", &self.ours),
            ("labels.theirs", &self.theirs),
        ] {
            if let Some(value) = value {
                check_text(key, value)?;
            }
        }
        Ok(())
    }
}

fn check_text(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue(format!("{key} must not be empty")));
    }
    if value.contains(['\n', '\r']) {
        return Err(ConfigError::InvalidValue(format!(
            "{key} must be a single line, got {value:?}"
        )));
    }
    Ok(())
}
