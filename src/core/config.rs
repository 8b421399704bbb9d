//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.postfeed/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostfeedConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    /// Whole-request timeout. 0 disables it.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Resolved Config (concrete values)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub username: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.postfeed/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".postfeed").join("config.toml"))
}

/// Load config from `~/.postfeed/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `PostfeedConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<PostfeedConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PostfeedConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<PostfeedConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(PostfeedConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: PostfeedConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    // Never log the password
    debug!(
        "Config: base_url={:?} timeout_secs={:?} username={:?}",
        config.server.base_url, config.server.timeout_secs, config.auth.username
    );
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# postfeed configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://127.0.0.1:5000"   # Or set POSTFEED_BASE_URL
# timeout_secs = 30                    # 0 disables the request timeout

# [auth]
# username = "alice"                   # Or set POSTFEED_USERNAME
# password = "..."                     # Or set POSTFEED_PASSWORD
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` and `cli_user` are from CLI flags (None = not specified).
pub fn resolve(
    config: &PostfeedConfig,
    cli_base_url: Option<&str>,
    cli_user: Option<&str>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("POSTFEED_BASE_URL").ok())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let timeout = match config.server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    // Username: CLI → env → config
    let username = cli_user
        .map(|s| s.to_string())
        .or_else(|| std::env::var("POSTFEED_USERNAME").ok())
        .or_else(|| config.auth.username.clone());

    // Password: env → config (never a CLI flag)
    let password = std::env::var("POSTFEED_PASSWORD")
        .ok()
        .or_else(|| config.auth.password.clone());

    ResolvedConfig {
        base_url,
        timeout,
        username,
        password,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = PostfeedConfig::default();
        assert!(config.server.base_url.is_none());
        assert!(config.auth.username.is_none());
    }

    #[test]
    fn test_resolve_uses_default_timeout_when_empty() {
        // Base URL and credentials may come from the environment; timeout never does
        let config = PostfeedConfig::default();
        let resolved = resolve(&config, Some("http://cli:5000"), None);
        assert_eq!(resolved.base_url, "http://cli:5000");
        assert_eq!(resolved.timeout, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
    }

    #[test]
    fn test_resolve_config_timeout() {
        let config = PostfeedConfig {
            server: ServerConfig {
                base_url: None,
                timeout_secs: Some(5),
            },
            ..Default::default()
        };
        assert_eq!(resolve(&config, None, None).timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_resolve_cli_wins_over_config() {
        let config = PostfeedConfig {
            server: ServerConfig {
                base_url: Some("http://config:5000".to_string()),
                timeout_secs: None,
            },
            auth: AuthConfig {
                username: Some("config-user".to_string()),
                password: None,
            },
        };
        let resolved = resolve(&config, Some("http://cli:5000"), Some("cli-user"));
        assert_eq!(resolved.base_url, "http://cli:5000");
        assert_eq!(resolved.username.as_deref(), Some("cli-user"));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = PostfeedConfig {
            server: ServerConfig {
                base_url: None,
                timeout_secs: Some(0),
            },
            ..Default::default()
        };
        assert_eq!(resolve(&config, None, None).timeout, None);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[server]
base_url = "http://blog.local:8080"
timeout_secs = 5

[auth]
username = "alice"
password = "secret"
"#;
        let config: PostfeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.base_url.as_deref(), Some("http://blog.local:8080"));
        assert_eq!(config.server.timeout_secs, Some(5));
        assert_eq!(config.auth.username.as_deref(), Some("alice"));
        assert_eq!(config.auth.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing; everything else stays default
        let toml_str = r#"
[auth]
username = "bob"
"#;
        let config: PostfeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.auth.username.as_deref(), Some("bob"));
        assert!(config.server.base_url.is_none());
        assert!(config.auth.password.is_none());
    }

    #[test]
    fn test_missing_file_generates_commented_default() {
        let dir = std::env::temp_dir().join(format!("postfeed-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_file(&path);

        let config = load_config_from(&path).unwrap();
        assert!(config.server.base_url.is_none());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("# [server]"));

        // The generated file is all comments, so it parses to defaults
        let reloaded = load_config_from(&path).unwrap();
        assert!(reloaded.auth.username.is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("postfeed-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[server\nbase_url = 1").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
