//! Configuration file for the vocabulary service.
//!
//! ```toml
//! database_path = "/home/me/.local/share/lexis/vocabulary.db"
//! language = "zh"
//!
//! [generator]
//! base_url = "http://localhost:8084"
//! timeout_secs = 10
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::Language;

const APP_DIR: &str = "lexis";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "vocabulary.db";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Could not determine the {0} directory")]
    DirNotFound(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding the vocabulary; defaults under the data directory
    pub database_path: Option<PathBuf>,
    /// Language of placeholder and countdown text
    pub language: Language,
    pub generator: GeneratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            language: Language::En,
            generator: GeneratorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    /// Upper bound on one definition request
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8084".to_string(),
            timeout_secs: 10,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(e) => {
                    log::debug!("{}, using default config", e);
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?;
        config.validate()?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config dir>/lexis/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::DirNotFound("config"))
    }

    /// Configured database path, or `<data dir>/lexis/vocabulary.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR).join(DATABASE_FILE))
                .ok_or(ConfigError::DirNotFound("data")),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.generator.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generator.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.generator.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("generator.base_url is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(Some(&temp_dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.generator.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "database_path = \"/tmp/words.db\"\nlanguage = \"zh\"\n\n[generator]\ntimeout_secs = 3\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.language, Language::Zh);
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/words.db"));
        assert_eq!(config.generator.timeout_secs, 3);
        assert_eq!(config.generator.base_url, "http://localhost:8084");
    }

    #[test]
    fn test_invalid_files_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        fs::write(&path, "language = \"fr\"\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Toml { .. })));

        fs::write(&path, "[generator]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Invalid(_))));
    }
}
