// Settings for the analysis service, read from an optional JSON file

use crate::error::ConfigError;
use pagescope_scanner::VerifierConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/pagescope/config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub fetch: FetchSettings,
    pub verifier: VerifierConfig,
    pub keywords: KeywordSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request, link verification included.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_page_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (compatible; Pagescope/0.1; +https://github.com/trapdoorsec/pagescope)"
                .to_string(),
            max_page_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_keywords: usize,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 20,
            max_keywords: 10,
        }
    }
}

impl KeywordSettings {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Expand a leading `~` the way the CLI documents paths.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl Settings {
    /// Load settings. An explicit path must exist; the default path is
    /// optional and falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = expand_path(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No config file at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };

        settings.apply_env(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// `PAGESCOPE_HOST` and `PAGESCOPE_PORT` override the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PAGESCOPE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PAGESCOPE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| {
                    ConfigError::Invalid(format!("PAGESCOPE_PORT={} is not a port", port))
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verifier.concurrency == 0 {
            return Err(ConfigError::Invalid("verifier.concurrency must be at least 1".to_string()));
        }
        if self.verifier.timeout_secs == 0 || self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least one second".to_string()));
        }
        if self.fetch.max_page_bytes == 0 {
            return Err(ConfigError::Invalid("fetch.max_page_bytes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
