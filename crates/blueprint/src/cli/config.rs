//! CLI configuration
//!
//! Reads settings from `~/.blueprint/config.toml` (or `--config`):
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080"
//! timeout_secs = 7
//! token = "..."
//! ```
//!
//! A missing file means defaults. `BLUEPRINT_API_URL` overrides `base_url`.

use blueprint_schema::HttpSchemaService;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_URL_ENV: &str = "BLUEPRINT_API_URL";

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not determine the Blueprint home directory: {0}")]
    Home(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

/// Persistence service connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout; a timed-out commit is reported as failed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    7
}

impl AppConfig {
    /// Apply environment overrides on top of file values.
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
        self
    }

    /// HTTP client for the configured service.
    pub fn connect(&self) -> anyhow::Result<HttpSchemaService> {
        let service = HttpSchemaService::new(
            self.api.base_url.clone(),
            Duration::from_secs(self.api.timeout_secs),
        )?;
        Ok(match &self.api.token {
            Some(token) => service.with_token(token.clone()),
            None => service,
        })
    }
}

/// Default config location: `<blueprint home>/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let home = blueprint_logging::blueprint_home().map_err(|e| ConfigError::Home(e.to_string()))?;
    Ok(home.join("config.toml"))
}

/// Load config from a path; a missing file yields defaults.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: config_path.to_path_buf(),
        source,
    })
}

/// Resolve the effective config: explicit path or default, then env overrides.
pub fn resolve(config_path: Option<&Path>) -> Result<(PathBuf, AppConfig)> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let config = load_config(&path)?.with_api_url_override(std::env::var(API_URL_ENV).ok());
    Ok((path, config))
}

/// Arguments for `blueprint config`
#[derive(Debug)]
pub struct ConfigArgs {
    pub json: bool,
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    config_path: String,
    config_exists: bool,
    logs_dir: Option<String>,
    base_url: &'a str,
    timeout_secs: u64,
    token_set: bool,
}

/// Print the resolved configuration. The token itself is never printed.
pub fn run(args: ConfigArgs, path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    let report = ConfigReport {
        config_path: path.display().to_string(),
        config_exists: path.exists(),
        logs_dir: blueprint_logging::logs_dir()
            .ok()
            .map(|p| p.display().to_string()),
        base_url: &config.api.base_url,
        timeout_secs: config.api.timeout_secs,
        token_set: config.api.token.is_some(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("BLUEPRINT CONFIGURATION");
    println!();
    let exists = if report.config_exists { "" } else { " (not found, using defaults)" };
    println!("Config file:  {}{}", report.config_path, exists);
    if let Some(logs) = &report.logs_dir {
        println!("Logs:         {}", logs);
    }
    println!("API URL:      {}", report.base_url);
    println!("Timeout:      {}s", report.timeout_secs);
    println!("Token:        {}", if report.token_set { "set" } else { "not set" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_secs, 7);
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_empty_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();
        assert_eq!(load_config(&config_path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_partial_api_section() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[api]
base_url = "https://schema.internal:9000"
token = "s3cret"
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.api.base_url, "https://schema.internal:9000");
        assert_eq!(config.api.timeout_secs, 7);
        assert_eq!(config.api.token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        std::fs::write(&config_path, "[api\nbase_url = ").unwrap();
        assert!(matches!(load_config(&config_path), Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn test_env_override() {
        let config = AppConfig::default()
            .with_api_url_override(Some("http://override:1234".to_string()));
        assert_eq!(config.api.base_url, "http://override:1234");

        let config = AppConfig::default().with_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api.base_url, "http://localhost:8080");

        let config = AppConfig::default().with_api_url_override(None);
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_connect_uses_base_url() {
        let mut config = AppConfig::default();
        config.api.base_url = "http://localhost:9999/".to_string();
        let service = config.connect().unwrap();
        assert_eq!(service.base_url(), "http://localhost:9999");
    }
}
