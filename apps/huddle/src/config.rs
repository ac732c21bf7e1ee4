//! Runtime configuration of the `huddle` binary.
//!
//! Layers, lowest first: built-in defaults, a TOML file, environment
//! variables, command-line flags.
//!
//! ```toml
//! [log]
//! format = "json"        # or "text"
//! filter = "huddle=debug"
//!
//! [backend]
//! fixture = "fixtures/community.toml"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "HUDDLE_CONFIG";
/// Environment variable overriding `log.format`.
pub const LOG_FORMAT_ENV: &str = "HUDDLE_LOG_FORMAT";
/// Environment variable overriding `backend.fixture`.
pub const FIXTURE_ENV: &str = "HUDDLE_FIXTURE";

/// Filter used when neither `RUST_LOG` nor `log.filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "huddle=info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// TOML fixture seeding the in-memory backend.
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuddleConfig {
    pub log: LogConfig,
    pub backend: BackendConfig,
}

impl HuddleConfig {
    /// Load from `path`, or from `$HUDDLE_CONFIG`, then apply environment overrides.
    ///
    /// No path at all yields the defaults. A named file that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply overrides looked up by variable name. Blank values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(raw) = value(LOG_FORMAT_ENV) {
            self.log.format = LogFormat::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: LOG_FORMAT_ENV.to_string(),
                value: raw,
            })?;
        }
        if let Some(raw) = value(FIXTURE_ENV) {
            self.backend.fixture = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    /// The tracing filter directive to use when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

// =============================================================================
// TESTS
// =============================================================================
