//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML config file and maps it onto [`NavigationConfig`].
//! Value handling (defaults for absent keys, clamping) lives in
//! `NavigationConfig::from_toml`; this module only does I/O.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

use mf_core::config::NavigationConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "MEMBERFLOW_CONFIG";

const APP_DIR_NAME: &str = "memberflow";
const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_FILE_NAME: &str = "navigation_state.json";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<NavigationConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    NavigationConfig::from_toml(&toml_value)
}

/// `MEMBERFLOW_CONFIG` if set, else `<config_dir>/memberflow/config.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)),
    }
}

/// Loads the config at `path`, or defaults when there is no file.
/// A file that exists but cannot be parsed is still an error.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<NavigationConfig> {
    match path {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "loading config");
            load_config(path.to_path_buf())
        }
        Some(path) => {
            info!(path = %path.display(), "config file not found, using defaults");
            Ok(NavigationConfig::default())
        }
        None => Ok(NavigationConfig::default()),
    }
}

/// Where the durable navigation state lives. An empty `state_path` means
/// `<data_dir>/memberflow/navigation_state.json`.
pub fn resolve_state_path(config: &NavigationConfig) -> Option<PathBuf> {
    if !config.state_path.as_os_str().is_empty() {
        return Some(config.state_path.clone());
    }
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(STATE_FILE_NAME))
}

/// `<data_dir>/memberflow/logs`
pub fn logs_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [navigation]
            allowed_lookahead = 3
            completed_destination = "/portal/home"

            [verification]
            session_ttl_ms = 600000

            [storage]
            state_path = "/var/lib/memberflow/state.json"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(config.allowed_lookahead, 3);
        assert_eq!(config.completed_destination, "/portal/home");
        assert_eq!(config.session_ttl_ms, 600_000);
        assert_eq!(config.poll_interval_ms, 300);
        assert_eq!(
            resolve_state_path(&config),
            Some(PathBuf::from("/var/lib/memberflow/state.json"))
        );
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[navigation\nallowed_lookahead = ").unwrap();

        let err = load_config(temp_file.path().to_path_buf()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");

        let err = load_config(path.clone()).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        assert_eq!(
            load_or_default(Some(&path)).unwrap(),
            NavigationConfig::default()
        );
        assert_eq!(load_or_default(None).unwrap(), NavigationConfig::default());
    }
}
