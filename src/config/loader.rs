//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed configuration tier, lowest priority first.
///
/// Built-in defaults sit below these and environment variables above them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Project-level config ($CWD/task-calendar/)
    Project,
    /// User-level config (~/.task-calendar/)
    User,
    /// File named by `--config` or `TASK_CALENDAR_CONFIG_PATH`
    Explicit,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Explicit => write!(f, "explicit"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration directories from the environment and home directory.
    pub fn discover() -> Self {
        let user_dir = std::env::var("TASK_CALENDAR_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-calendar")));

        let project_dir = std::env::var("TASK_CALENDAR_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-calendar")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loads [`Config`] from all tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    paths: ConfigPaths,
    config: Config,
    /// Files that contributed, lowest tier first.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load from discovered paths and the process environment.
    ///
    /// `explicit` (or `TASK_CALENDAR_CONFIG_PATH`) replaces the project and user tiers.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("TASK_CALENDAR_CONFIG_PATH").ok().map(PathBuf::from));
        Self::load_with(ConfigPaths::discover(), explicit.as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Load with explicit paths and environment lookup.
    pub fn load_with(
        paths: ConfigPaths,
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut layers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        if let Some(path) = explicit {
            let value = read_yaml(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            layers.push(value);
            sources.push((ConfigTier::Explicit, path.to_path_buf()));
        } else {
            let tiers = [
                (ConfigTier::Project, paths.project_dir.as_ref()),
                (ConfigTier::User, paths.user_dir.as_ref()),
            ];
            for (tier, dir) in tiers {
                let Some(file) = dir.map(|d| d.join("config.yaml")) else {
                    continue;
                };
                if !file.exists() {
                    continue;
                }
                match read_yaml(&file) {
                    Ok(value) => {
                        debug!(tier = %tier, file = %file.display(), "Loaded config tier");
                        layers.push(value);
                        sources.push((tier, file));
                    }
                    Err(e) => {
                        warn!(file = %file.display(), error = %e, "Ignoring unreadable config")
                    }
                }
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(layers))?;
        apply_env_overrides(&mut config, env);

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)?;
    Ok(value)
}

fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if let Some(db_path) = env("TASK_CALENDAR_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(upload_dir) = env("TASK_CALENDAR_UPLOAD_DIR") {
        config.uploads.dir = PathBuf::from(upload_dir);
    }

    if let Some(port) = env("TASK_CALENDAR_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "Ignoring invalid TASK_CALENDAR_PORT"),
        }
    }
}
