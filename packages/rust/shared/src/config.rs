//! Application configuration for the `dcp` tool.
//!
//! User config lives at `~/.dcp/dcp.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DcpError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "dcp.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".dcp";

// ---------------------------------------------------------------------------
// Config structs (matching dcp.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider document storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging defaults.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the libSQL database holding provider documents. `~` is expanded.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Open the database read-only (lookups only, no imports).
    #[serde(default)]
    pub readonly: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            readonly: false,
        }
    }
}

fn default_db_path() -> String {
    "~/.dcp/providers.db".into()
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "dcp=info".into()
}

impl StorageConfig {
    /// Resolve `db_path`, expanding a leading `~/`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        expand_home(&self.db_path)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| DcpError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Get the path to the config directory (`~/.dcp/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DcpError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.dcp/dcp.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DcpError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DcpError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DcpError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| DcpError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DcpError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("dcp=info"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.storage.db_path, "~/.dcp/providers.db");
        assert!(!parsed.storage.readonly);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[storage]
db_path = "/var/lib/dcp/providers.db"
readonly = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.storage.db_path, "/var/lib/dcp/providers.db");
        assert!(config.storage.readonly);
        assert_eq!(config.logging.filter, "dcp=info");
    }

    #[test]
    fn absolute_paths_are_not_expanded() {
        let path = expand_home("/tmp/providers.db").expect("expand");
        assert_eq!(path, PathBuf::from("/tmp/providers.db"));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("dcp_cfg_{}.toml", std::process::id()));
        std::fs::write(&path, "[logging]\nfilter = \"dcp=debug\"\n").expect("write");
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.logging.filter, "dcp=debug");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let path = std::env::temp_dir().join(format!("dcp_bad_cfg_{}.toml", std::process::id()));
        std::fs::write(&path, "[storage\n").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, DcpError::Config { .. }));
        std::fs::remove_file(&path).ok();
    }
}
