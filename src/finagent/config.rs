//! Process configuration.
//!
//! One explicit [`AgentConfig`] struct, built from a TOML file at process
//! start and passed by reference into every component constructor. There is no
//! ambient/global lookup and no hot-reload.
//!
//! File shape:
//!
//! ```toml
//! [secrets]
//! GOOGLE_API_KEY = "..."
//!
//! [mcp-urls]
//! YFINANCE = "http://localhost:8000/mcp"
//!
//! [agent-urls]
//! TECHNICAL_ANALYST = "http://localhost:9999"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Config file name looked for when the caller does not pass a path.
pub const DEFAULT_CONFIG_PATH: &str = "env.toml";

#[derive(Deserialize, Default)]
struct RawSecrets {
    #[serde(rename = "GOOGLE_API_KEY", default)]
    google_api_key: String,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    secrets: RawSecrets,
    #[serde(rename = "mcp-urls", default)]
    mcp_urls: BTreeMap<String, String>,
    #[serde(rename = "agent-urls", default)]
    agent_urls: BTreeMap<String, String>,
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// API key for the hosted generation service.
    pub google_api_key: String,
    /// Named remote tool-service endpoints, e.g. `YFINANCE`.
    pub mcp_urls: BTreeMap<String, String>,
    /// Named peer-agent task endpoints.
    pub agent_urls: BTreeMap<String, String>,
}

impl AgentConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::parse(&text, path)
    }

    /// Parse config from an in-memory TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, Path::new("<inline>"))
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        if raw.secrets.google_api_key.is_empty() {
            return Err(ConfigError::MissingKey {
                section: "secrets",
                key: "GOOGLE_API_KEY",
            });
        }

        if raw.mcp_urls.is_empty() {
            log::warn!("{}: no tool-service endpoints configured", path.display());
        }

        Ok(AgentConfig {
            google_api_key: raw.secrets.google_api_key,
            mcp_urls: raw.mcp_urls,
            agent_urls: raw.agent_urls,
        })
    }

    /// Endpoint URL for a named tool service.
    pub fn mcp_url(&self, name: &str) -> Option<&str> {
        self.mcp_urls.get(name).map(String::as_str)
    }

    /// Endpoint URL for a named peer agent.
    pub fn agent_url(&self, name: &str) -> Option<&str> {
        self.agent_urls.get(name).map(String::as_str)
    }
}

/// Failure loading or validating the config file.
#[derive(Debug)]
pub enum ConfigError {
    NotFound {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    MissingKey {
        section: &'static str,
        key: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound { path } => {
                write!(f, "config file not found: {}", path.display())
            }
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config file {}: {}", path.display(), source)
            }
            ConfigError::MissingKey { section, key } => {
                write!(f, "config is missing required key {}.{}", section, key)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
