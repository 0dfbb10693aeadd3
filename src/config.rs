//! Configuration for the repository watcher.
//!
//! Layered with figment:
//! - Default values
//! - Config file (TOML, or JSON when the file ends in `.json`)
//! - Environment variable overrides
//!
//! Keys may be written in snake_case (`repos_root`) or in the camelCase used
//! by legacy `config.json` files (`reposRoot`).
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `REPOWATCH_` and use double
//! underscores to separate nested levels:
//! - `REPOWATCH_REPOS_ROOT=/srv/repos` sets `repos_root`
//! - `REPOWATCH_LOGGING__DEFAULT=debug` sets `logging.default`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized, Toml};
use figment::value::{Dict, Map};
use figment::{Figment, Metadata, Profile, Provider};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "REPOWATCH_";

/// Legacy config file, used when present in the working directory.
pub const LEGACY_CONFIG_FILE: &str = "config.json";

/// Default config file.
pub const DEFAULT_CONFIG_FILE: &str = "repowatch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("repos_root is not configured")]
    MissingReposRoot,

    #[error("Repos root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("Specified repos root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("watch_path must be relative to the repository: {0}")]
    AbsoluteWatchPath(PathBuf),

    #[error("Invalid watch_regexp `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("execute is not configured")]
    MissingExecute,

    #[error("Failed to write config: {0}")]
    Write(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory whose children are repositories
    #[serde(default)]
    pub repos_root: PathBuf,

    /// Subpath watched inside each repository
    #[serde(default = "default_watch_path")]
    pub watch_path: PathBuf,

    /// Pattern matched against changed file basenames
    #[serde(default = "default_watch_regexp")]
    pub watch_regexp: String,

    /// Shell command run in the repository on a match
    #[serde(default)]
    pub execute: String,

    /// Shell used as `<shell> -c <execute>`
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Watch subdirectories of the watch path too
    #[serde(default)]
    pub recursive: bool,

    /// Directory receiving info.log and error.log
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_watch_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_watch_regexp() -> String {
    ".*".to_string()
}
fn default_shell() -> String {
    "sh".to_string()
}
fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repos_root: PathBuf::new(),
            watch_path: default_watch_path(),
            watch_regexp: default_watch_regexp(),
            execute: String::new(),
            shell: default_shell(),
            recursive: false,
            log_dir: default_log_dir(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

/// Validated, immutable settings the watcher runs on.
#[derive(Debug, Clone)]
pub struct WatchPlan {
    /// Canonical repos root.
    pub repos_root: PathBuf,
    pub watch_path: PathBuf,
    pub pattern: Regex,
    pub execute: String,
    pub shell: String,
    pub recursive: bool,
}

impl Settings {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from(path),
            None => Self::load_from(Self::default_config_path()),
        }
    }

    /// Config file used when none is given on the command line.
    pub fn default_config_path() -> PathBuf {
        let legacy = PathBuf::from(LEGACY_CONFIG_FILE);
        if legacy.exists() {
            legacy
        } else {
            PathBuf::from(DEFAULT_CONFIG_FILE)
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::figment(path.as_ref(), ENV_PREFIX)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    fn figment(path: &Path, env_prefix: &str) -> Figment {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        let figment = if is_json {
            figment.merge(SnakeCaseKeys(Json::file(path)))
        } else {
            figment.merge(SnakeCaseKeys(Toml::file(path)))
        };

        figment.merge(Env::prefixed(env_prefix).map(|key| {
            key.as_str()
                .to_lowercase()
                .replace("__", ".") // Double underscore becomes dot
                .into()
        }))
    }

    /// Check the settings and compile them into a `WatchPlan`.
    pub fn validate(&self) -> Result<WatchPlan, ConfigError> {
        if self.repos_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingReposRoot);
        }
        if !self.repos_root.exists() {
            return Err(ConfigError::RootMissing(self.repos_root.clone()));
        }
        if !self.repos_root.is_dir() {
            return Err(ConfigError::RootNotDirectory(self.repos_root.clone()));
        }
        if self.watch_path.is_absolute() {
            return Err(ConfigError::AbsoluteWatchPath(self.watch_path.clone()));
        }
        if self.execute.trim().is_empty() {
            return Err(ConfigError::MissingExecute);
        }

        let pattern =
            Regex::new(&self.watch_regexp).map_err(|source| ConfigError::InvalidPattern {
                pattern: self.watch_regexp.clone(),
                source,
            })?;

        // Notification backends report canonical paths, so the root must be
        // canonical too for prefix matching to work.
        let repos_root = self
            .repos_root
            .canonicalize()
            .map_err(|_| ConfigError::RootMissing(self.repos_root.clone()))?;

        Ok(WatchPlan {
            repos_root,
            watch_path: self.watch_path.clone(),
            pattern,
            execute: self.execute.clone(),
            shell: self.shell.clone(),
            recursive: self.recursive,
        })
    }

    /// Save current configuration to file as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let toml_string =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(path, toml_string).map_err(|e| ConfigError::Write(e.to_string()))
    }

    /// Render as TOML for display.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))
    }

    /// A starter configuration written by `repowatch init`.
    pub fn example() -> Self {
        Self {
            repos_root: PathBuf::from("/srv/repos"),
            watch_path: PathBuf::from("src"),
            watch_regexp: r"\.md$".to_string(),
            execute: "make".to_string(),
            ..Self::default()
        }
    }
}

/// Provider adapter that rewrites camelCase keys to snake_case.
struct SnakeCaseKeys<P>(P);

impl<P: Provider> Provider for SnakeCaseKeys<P> {
    fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(self
            .0
            .data()?
            .into_iter()
            .map(|(profile, dict)| (profile, snake_dict(dict)))
            .collect())
    }
}

/// Only top-level keys are renamed; nested tables such as
/// `logging.modules` are keyed by user-chosen names.
fn snake_dict(dict: Dict) -> Dict {
    dict.into_iter()
        .map(|(key, value)| (to_snake_case(&key), value))
        .collect()
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
