//! Configuration file parser for ~/.config/spacetraveling/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde but logged as a warning, since they are
//! usually typos.
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `api_endpoint` from the file.
pub const ENDPOINT_ENV_VAR: &str = "SPACETRAVELING_API_ENDPOINT";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CMS API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub api_endpoint: String,

    /// Custom type of the blog posts in the CMS.
    pub document_type: String,

    /// Posts per listing page.
    pub page_size: u32,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Shown instead of a publish date that is missing or unparseable.
    pub date_placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            document_type: "posts".to_string(),
            page_size: 20,
            request_timeout_secs: 30,
            date_placeholder: "--".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "api_endpoint",
        "document_type",
        "page_size",
        "request_timeout_secs",
        "date_placeholder",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file gives `Config::default()`. Unknown keys are
    /// accepted and logged. Invalid TOML or a wrongly typed value is
    /// `ConfigError::Parse`, with the position from the TOML parser.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_capped(path, Self::MAX_FILE_SIZE)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let table: toml::Table = content.parse()?;
        for key in unknown_keys(&table) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }

        let config: Config = toml::Value::Table(table).try_into()?;
        tracing::info!(
            path = %path.display(),
            document_type = %config.document_type,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Applies an endpoint override from the environment, if set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_endpoint_override(std::env::var(ENDPOINT_ENV_VAR).ok())
    }

    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.api_endpoint = endpoint;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads at most `max` bytes of `path`. `Ok(None)` when the file does not exist.
fn read_capped(path: &Path, max: u64) -> Result<Option<String>, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    // One byte past the cap is enough to tell an oversized file apart.
    let mut content = String::new();
    file.take(max + 1).read_to_string(&mut content)?;
    if content.len() as u64 > max {
        return Err(ConfigError::TooLarge(format!(
            "{} is over {max} bytes",
            path.display()
        )));
    }
    Ok(Some(content))
}

fn unknown_keys(table: &toml::Table) -> impl Iterator<Item = &str> {
    table
        .keys()
        .map(String::as_str)
        .filter(|key| !Config::KNOWN_KEYS.contains(key))
}

// ============================================================================
// Tests
// ============================================================================
