//! Application configuration for releasebot.
//!
//! Config lives in `config.toml` in the working directory (overridable from the
//! CLI). Missing optional sections fall back to defaults; the `[reddit]`
//! credentials have no defaults and are checked by [`AppConfig::validate`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ReleaseBotError, Result};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

// ---------------------------------------------------------------------------
// Config structs (matching config.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Release notes page.
    #[serde(default)]
    pub source: SourceConfig,

    /// Posted-entry ledger.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Log file settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reddit credentials and target subreddit.
    #[serde(default)]
    pub reddit: RedditConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the release notes page.
    #[serde(default = "default_source_url")]
    pub url: String,

    /// HTTP timeout for the page fetch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_source_url() -> String {
    "https://app.ryzom.com/app_releasenotes/index.php?lang=en&ig=1".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[ledger]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the append-only file of posted entry keys.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("posted_news.txt")
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Plain-text log file appended to on every run. Empty disables it.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

fn default_log_file() -> String {
    "app.log".into()
}

/// `[reddit]` section.
#[derive(Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Client id of the "script" type Reddit app.
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Target subreddit, without the `r/` prefix.
    #[serde(default)]
    pub subreddit: String,

    /// Base URL for the OAuth token endpoint.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Base URL for authenticated API calls.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            subreddit: String::new(),
            auth_url: default_auth_url(),
            api_url: default_api_url(),
        }
    }
}

// Secrets stay out of debug logs.
impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("subreddit", &self.subreddit)
            .field("auth_url", &self.auth_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn default_auth_url() -> String {
    "https://www.reddit.com".into()
}
fn default_api_url() -> String {
    "https://oauth.reddit.com".into()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Trim the required values and check that none is missing, and that all
    /// URLs parse. Returns the first problem found.
    pub fn validate(&mut self) -> Result<()> {
        let reddit = &mut self.reddit;
        let required = [
            ("reddit.username", &mut reddit.username),
            ("reddit.password", &mut reddit.password),
            ("reddit.client_id", &mut reddit.client_id),
            ("reddit.client_secret", &mut reddit.client_secret),
            ("reddit.subreddit", &mut reddit.subreddit),
        ];

        for (key, value) in required {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ReleaseBotError::config(format!(
                    "missing config value: {key}"
                )));
            }
            *value = trimmed.to_string();
        }

        for (key, value) in [
            ("source.url", &self.source.url),
            ("reddit.auth_url", &self.reddit.auth_url),
            ("reddit.api_url", &self.reddit.api_url),
        ] {
            Url::parse(value).map_err(|e| {
                ReleaseBotError::config(format!("invalid URL in {key} ({value}): {e}"))
            })?;
        }

        Ok(())
    }

    /// Config with every secret replaced by `***`, for display.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for secret in [&mut masked.reddit.password, &mut masked.reddit.client_secret] {
            if !secret.is_empty() {
                *secret = "***".into();
            }
        }
        masked
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReleaseBotError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ReleaseBotError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a config template with defaults and empty credentials to `path`.
///
/// Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ReleaseBotError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ReleaseBotError::io(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ReleaseBotError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ReleaseBotError::io(path, e))?;
    tracing::info!(?path, "created config template");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> AppConfig {
        let toml_str = r#"
[reddit]
username = "  bot  "
password = "hunter2"
client_id = "abc"
client_secret = "shh"
subreddit = "Ryzom"
"#;
        toml::from_str(toml_str).expect("parse")
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("releasebot-config-test-{}", uuid::Uuid::now_v7()))
            .join(name)
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = full_config();
        assert_eq!(
            config.source.url,
            "https://app.ryzom.com/app_releasenotes/index.php?lang=en&ig=1"
        );
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.ledger.path, PathBuf::from("posted_news.txt"));
        assert_eq!(config.logging.file, "app.log");
        assert_eq!(config.reddit.api_url, "https://oauth.reddit.com");
    }

    #[test]
    fn validate_trims_values() {
        let mut config = full_config();
        config.validate().expect("valid");
        assert_eq!(config.reddit.username, "bot");
    }

    #[test]
    fn validate_reports_missing_key() {
        let mut config = full_config();
        config.reddit.client_secret = "   ".into();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config error: missing config value: reddit.client_secret"
        );
    }

    #[test]
    fn validate_rejects_bad_source_url() {
        let mut config = full_config();
        config.source.url = "not a url".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.url"));
    }

    #[test]
    fn default_config_is_invalid() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn masked_hides_secrets() {
        let config = full_config().masked();
        assert_eq!(config.reddit.password, "***");
        assert_eq!(config.reddit.client_secret, "***");
        assert_eq!(config.reddit.client_id, "abc");

        let debug = format!("{:?}", full_config().reddit);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("shh"));
    }

    #[test]
    fn template_roundtrip() {
        let path = temp_path(DEFAULT_CONFIG_FILE);
        init_config(&path).expect("write template");

        let loaded = load_config_from(&path).expect("load template");
        assert_eq!(loaded.reddit.auth_url, "https://www.reddit.com");
        assert!(loaded.reddit.username.is_empty());

        // Never overwrites.
        assert!(init_config(&path).is_err());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let path = temp_path("missing.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ReleaseBotError::Io { .. }));
    }

    #[test]
    fn load_malformed_file_is_config_error() {
        let path = temp_path("broken.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[reddit\nusername = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ReleaseBotError::Config { .. }));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
