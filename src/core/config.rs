//! Configuration management with layered hierarchy
//!
//! Later layers win: built-in defaults, global user config
//! (`~/.config/qms/config.yaml`), local `.qms/config.yaml`, environment
//! variables, then command-line flags.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::store::SNAPSHOT_KEY;

/// Directory holding the local config file, relative to the working directory
pub const LOCAL_DIR: &str = ".qms";

/// Which repository adapter to construct
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite in memory, persisted to a local slot file
    #[default]
    Embedded,
    /// PostgREST-style REST service
    Hosted,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Embedded => write!(f, "embedded"),
            BackendKind::Hosted => write!(f, "hosted"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "embedded" | "local" | "sqlite" => Ok(BackendKind::Embedded),
            "hosted" | "remote" | "rest" => Ok(BackendKind::Hosted),
            _ => Err(format!("unknown backend '{}', use embedded or hosted", s)),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    #[diagnostic(code(qms::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    #[diagnostic(code(qms::config::parse))]
    Parse { path: PathBuf, message: String },

    #[error("invalid value '{value}' for {var}: {message}")]
    #[diagnostic(code(qms::config::env))]
    InvalidEnv {
        var: String,
        value: String,
        message: String,
    },
}

/// Settings for the hosted backend
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedConfig {
    /// REST root, e.g. `https://<project>.supabase.co/rest/v1`
    pub url: Option<String>,

    /// Sent as both `apikey` and bearer token
    pub api_key: Option<String>,

    /// Request timeout; unset means no timeout
    pub timeout_secs: Option<u64>,
}

impl HostedConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn merge(&mut self, other: HostedConfig) {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

/// QMS configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend (default: embedded)
    pub backend: Option<BackendKind>,

    /// Slot file for the embedded backend
    pub storage_path: Option<PathBuf>,

    /// Key inside the slot file holding the database image
    pub storage_key: Option<String>,

    pub hosted: HostedConfig,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Result<Self, ConfigError> {
        let local = Self::local_config_path();
        Self::load_from(
            Self::global_config_path().as_deref(),
            Some(&local),
            |var| std::env::var(var).ok(),
        )
    }

    /// Load from explicit file locations and an environment lookup
    pub fn load_from<F>(
        global: Option<&Path>,
        local: Option<&Path>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // Global user config, then local
        for path in [global, local].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path)? {
                tracing::debug!(path = %path.display(), "merging config file");
                config.merge(layer);
            }
        }

        // Environment variables
        if let Some(value) = env("QMS_BACKEND") {
            let backend = value.parse().map_err(|message| ConfigError::InvalidEnv {
                var: "QMS_BACKEND".to_string(),
                value: value.clone(),
                message,
            })?;
            config.backend = Some(backend);
        }
        if let Some(path) = env("QMS_STORAGE_PATH") {
            config.storage_path = Some(PathBuf::from(path));
        }
        if let Some(url) = env("QMS_HOSTED_URL") {
            config.hosted.url = Some(url);
        }
        if let Some(key) = env("QMS_HOSTED_API_KEY") {
            config.hosted.api_key = Some(key);
        }
        if let Some(value) = env("QMS_HOSTED_TIMEOUT_SECS") {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnv {
                    var: "QMS_HOSTED_TIMEOUT_SECS".to_string(),
                    value: value.clone(),
                    message: e.to_string(),
                })?;
            config.hosted.timeout_secs = Some(secs);
        }

        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Option<Config>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_yml::from_str::<Config>(&contents)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "qms")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path of the local config file, relative to the working directory
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(LOCAL_DIR).join("config.yaml")
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.storage_path.is_some() {
            self.storage_path = other.storage_path;
        }
        if other.storage_key.is_some() {
            self.storage_key = other.storage_key;
        }
        self.hosted.merge(other.hosted);
    }

    /// Apply command-line overrides (highest precedence)
    pub fn with_overrides(mut self, backend: Option<BackendKind>, storage: Option<PathBuf>) -> Self {
        if backend.is_some() {
            self.backend = backend;
        }
        if storage.is_some() {
            self.storage_path = storage;
        }
        self
    }

    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    /// Slot file, defaulting to the per-user data directory
    pub fn storage_path(&self) -> PathBuf {
        if let Some(ref path) = self.storage_path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "qms")
            .map(|dirs| dirs.data_dir().join("storage.json"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_DIR).join("storage.json"))
    }

    pub fn storage_key(&self) -> &str {
        self.storage_key.as_deref().unwrap_or(SNAPSHOT_KEY)
    }
}
