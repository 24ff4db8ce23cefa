use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENV: &str = "TMDB_API_KEY";
const CONFIG_FILE: &str = "config.toml";

/// Errors raised while resolving the startup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No TMDB API key configured")]
    MissingApiKey,
}

impl ConfigError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::MissingApiKey => format!(
                "No TMDB API key configured. Set {} or add `api_key` to {}",
                API_KEY_ENV,
                default_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| CONFIG_FILE.to_string())
            ),
            other => other.to_string(),
        }
    }
}

/// Catalog access settings. Resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub image_base_url: String,
    pub language: String,
    /// chrono format string used for release dates.
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
            language: "pt-BR".to_string(),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

/// Values supplied on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub language: Option<String>,
}

impl Config {
    /// Resolve the configuration: defaults, then the TOML file, then the
    /// environment, then command-line overrides.
    ///
    /// An explicit `path` must exist. Without one the project config dir is
    /// consulted and a missing file is not an error.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = key;
            }
        }
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(key) = &overrides.api_key {
            self.api_key = key.clone();
        }
        if let Some(language) = &overrides.language {
            self.language = language.clone();
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        self.api_key = self.api_key.trim().to_string();
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let trimmed = self.api_base_url.trim_end_matches('/').len();
        self.api_base_url.truncate(trimmed);
        Ok(())
    }
}

/// `<config dir>/config.toml` for this application, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "cinema-explorer", "cinema-explorer")
}
