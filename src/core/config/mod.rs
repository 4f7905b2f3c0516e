//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! plumbview has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$PLUMBVIEW_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/plumbview/config.toml`
//! 3. `~/.plumbview/config.toml`
//!
//! # Repo Config Location
//!
//! `.git/plumbview/config.toml`. A worktree or submodule whose `.git` is a
//! file has no repo config.
//!
//! # Example
//!
//! ```no_run
//! use plumbview::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! let config = result.config;
//!
//! println!("git: {}", config.git_binary());
//! println!("ours label: {}", config.labels().ours);
//! ```

pub mod schema;

pub use schema::{GlobalConfig, LabelsConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::git::RepoSettings;
use crate::views::conflict::SideLabels;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_path` is provided, also loads repo-specific config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(Self::find_global(), repo_path)
    }

    /// Load from an explicit global file instead of searching for one.
    pub fn load_from(
        global_file: Option<PathBuf>,
        repo_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = match &global_file {
            Some(path) => read_config::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let (repo, repo_file) = match repo_path {
            Some(path) => Self::load_repo(path, &mut warnings)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(
            global = ?global_file,
            repo = ?repo_file,
            "loaded configuration"
        );

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path: global_file,
                repo_path: repo_file,
            },
            warnings,
        })
    }

    /// First existing global config file, if any.
    fn find_global() -> Option<PathBuf> {
        let candidates = [
            std::env::var_os("PLUMBVIEW_CONFIG").map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME")
                .map(|xdg| PathBuf::from(xdg).join("plumbview/config.toml")),
            dirs::home_dir().map(|home| home.join(".plumbview/config.toml")),
        ];
        candidates.into_iter().flatten().find(|path| path.exists())
    }

    /// Load repository configuration from `.git/plumbview/config.toml`.
    fn load_repo(
        repo_path: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let git_dir = repo_path.join(".git");
        if !git_dir.is_dir() {
            if git_dir.is_file() {
                warnings.push(ConfigWarning {
                    message: "linked worktree or submodule; repo config not read".to_string(),
                    path: git_dir,
                });
            }
            return Ok((None, None));
        }

        let path = Self::repo_config_path(repo_path);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = read_config::<RepoConfig>(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Get the path for repo config.
    ///
    /// Returns `.git/plumbview/config.toml` relative to the given repo path.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(".git/plumbview/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the git executable.
    ///
    /// Defaults to "git" if not configured.
    pub fn git_binary(&self) -> &str {
        self.global.git_binary.as_deref().unwrap_or("git")
    }

    /// Check if git may C-quote paths.
    ///
    /// Defaults to `false` if not configured.
    pub fn quote_paths(&self) -> bool {
        self.repo
            .as_ref()
            .and_then(|r| r.quote_paths)
            .or(self.global.quote_paths)
            .unwrap_or(false)
    }

    /// Check if status lists untracked files.
    ///
    /// Defaults to `true` if not configured.
    pub fn include_untracked(&self) -> bool {
        self.repo
            .as_ref()
            .and_then(|r| r.untracked)
            .or(self.global.untracked)
            .unwrap_or(true)
    }

    /// Conflict labels, resolved per label.
    pub fn labels(&self) -> SideLabels {
        let defaults = SideLabels::default();
        let repo = self.repo.as_ref().and_then(|r| r.labels.as_ref());
        let global = self.global.labels.as_ref();
        let pick = |repo: Option<&String>, global: Option<&String>, fallback: String| {
            repo.or(global).cloned().unwrap_or(fallback)
        };
        SideLabels {
            common: pick(
                repo.and_then(|l| l.common.as_ref()),
                global.and_then(|l| l.common.as_ref()),
                defaults.common,
            ),
            ours: pick(
                repo.and_then(|l| l.ours.as_ref()),
                global.and_then(|l| l.ours.as_ref()),
                defaults.ours,
            ),
            theirs: pick(
                repo.and_then(|l| l.theirs.as_ref()),
                global.and_then(|l| l.theirs.as_ref()),
                defaults.theirs,
            ),
        }
    }

    /// Invocation settings for repositories opened under this config.
    pub fn repo_settings(&self) -> RepoSettings {
        RepoSettings {
            quote_paths: self.quote_paths(),
            include_untracked: self.include_untracked(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

/// Read and parse a config file.
fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_with_config(contents: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".git/plumbview");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), contents).unwrap();
        temp
    }

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(None, Some(temp.path())).unwrap();
        let config = result.config;

        assert_eq!(config.git_binary(), "git");
        assert!(!config.quote_paths());
        assert!(config.include_untracked());
        assert_eq!(config.labels(), SideLabels::default());
        assert!(config.repo_config_loaded_from().is_none());
    }

    #[test]
    fn load_global_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            git_binary = "/opt/git"
            untracked = false
            "#,
        )
        .unwrap();

        let result = Config::load_from(Some(path.clone()), None).unwrap();
        assert_eq!(result.config.git_binary(), "/opt/git");
        assert!(!result.config.include_untracked());
        assert_eq!(result.config.global_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn load_repo_config() {
        let temp = repo_with_config(
            r#"
            quote_paths = true

            [labels]
            theirs = "upstream"
            "#,
        );

        let result = Config::load_from(None, Some(temp.path())).unwrap();
        let config = result.config;

        assert!(config.quote_paths());
        assert_eq!(config.labels().theirs, "upstream");
        assert_eq!(config.labels().ours, "ours");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn gitfile_repo_warns() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".git"), "gitdir: ../elsewhere\n").unwrap();

        let result = Config::load_from(None, Some(temp.path())).unwrap();
        assert!(result.config.repo.is_none());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = repo_with_config(
            r#"
            untracked = true
            unknown_field = true
            "#,
        );
        assert!(matches!(
            Config::load_from(None, Some(temp.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_label_rejected() {
        let temp = repo_with_config("[labels]\nours = \"\"\n");
        assert!(matches!(
            Config::load_from(None, Some(temp.path())),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn precedence_repo_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                untracked: Some(false),
                labels: Some(LabelsConfig {
                    ours: Some("mine".to_string()),
                    theirs: Some("incoming".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                untracked: Some(true),
                labels: Some(LabelsConfig {
                    ours: Some("local".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            global_path: None,
            repo_path: None,
        };

        assert!(config.include_untracked());
        let labels = config.labels();
        assert_eq!(labels.ours, "local");
        assert_eq!(labels.theirs, "incoming");
        assert_eq!(labels.common, "common");

        let settings = config.repo_settings();
        assert!(settings.include_untracked);
        assert!(!settings.quote_paths);
    }
}
