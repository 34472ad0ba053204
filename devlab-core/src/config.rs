//! Client configuration — environment variables with an optional TOML file.
//!
//! Resolution order per field: explicit override, environment, config file,
//! built-in default. `DEVLAB_ENV=dev` switches every endpoint to the dev
//! stack. The config file lives at `~/.config/devlab/config.toml`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ApiError;

const PROD_API_URL: &str = "https://api.devlab.run";
const DEV_API_URL: &str = "https://api.devlab.pro";
const PROD_SSH_PROXY: &str = "ssh.devlab.run:443";
const DEV_SSH_PROXY: &str = "ssh.devlab.pro:443";
const PROD_DASHBOARD_URL: &str = "https://app.devlab.run";
const DEV_DASHBOARD_URL: &str = "https://app.devlab.pro";

/// Fully-resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub ssh_proxy: String,
    pub dashboard_url: String,
}

/// Optional overrides from `config.toml`. Unknown keys are rejected so a
/// typo'd field name fails loudly instead of being ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    ssh_proxy: Option<String>,
    dashboard_url: Option<String>,
}

impl Config {
    /// Resolve configuration from the process environment and config file.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_env_with(None)
    }

    /// Same as [`Config::from_env`], with an explicit environment name
    /// (e.g. from a `--env` flag) taking precedence over `DEVLAB_ENV`.
    pub fn from_env_with(env_override: Option<&str>) -> Result<Self, ApiError> {
        let file = load_file_config()?;
        let env_name = env_override
            .map(str::to_string)
            .or_else(|| std::env::var("DEVLAB_ENV").ok());
        let api_key = std::env::var("DEVLAB_API_KEY").ok();
        Self::resolve(api_key, env_name.as_deref(), file)
    }

    fn resolve(
        api_key: Option<String>,
        env_name: Option<&str>,
        file: FileConfig,
    ) -> Result<Self, ApiError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or(file.api_key)
            .ok_or_else(|| {
                ApiError::Config("DEVLAB_API_KEY must be set in the environment".into())
            })?;

        let dev = env_name.is_some_and(|e| e.eq_ignore_ascii_case("dev"));
        let base_url = file
            .base_url
            .unwrap_or_else(|| if dev { DEV_API_URL } else { PROD_API_URL }.to_string());
        let ssh_proxy = file
            .ssh_proxy
            .unwrap_or_else(|| if dev { DEV_SSH_PROXY } else { PROD_SSH_PROXY }.to_string());
        let dashboard_url = file.dashboard_url.unwrap_or_else(|| {
            if dev {
                DEV_DASHBOARD_URL
            } else {
                PROD_DASHBOARD_URL
            }
            .to_string()
        });

        Ok(Self {
            api_key,
            base_url,
            ssh_proxy,
            dashboard_url,
        })
    }
}

fn load_file_config() -> Result<FileConfig, ApiError> {
    let Some(path) = config_file_path() else {
        return Ok(FileConfig::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content)
            .map_err(|e| ApiError::Config(format!("{}: {e}", path.display()))),
        Err(_) => Ok(FileConfig::default()),
    }
}

/// Path of the optional config file (`~/.config/devlab/config.toml`).
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("devlab").join("config.toml"))
}

/// Directory where per-devbox SSH private keys are written.
pub fn ssh_key_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devlab")
        .join("ssh_keys")
}

/// Directory where the TUI persists UI state.
pub fn state_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devlab")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prod_defaults() {
        let c = Config::resolve(Some("key_123".into()), None, FileConfig::default()).unwrap();
        assert_eq!(c.base_url, PROD_API_URL);
        assert_eq!(c.ssh_proxy, PROD_SSH_PROXY);
        assert_eq!(c.api_key, "key_123");
    }

    #[test]
    fn dev_env_switches_endpoints() {
        let c = Config::resolve(Some("key_123".into()), Some("dev"), FileConfig::default())
            .unwrap();
        assert_eq!(c.base_url, DEV_API_URL);
        assert_eq!(c.ssh_proxy, DEV_SSH_PROXY);
        assert_eq!(c.dashboard_url, DEV_DASHBOARD_URL);

        // Case-insensitive, anything else means prod.
        let c = Config::resolve(Some("k".into()), Some("DEV"), FileConfig::default()).unwrap();
        assert_eq!(c.base_url, DEV_API_URL);
        let c = Config::resolve(Some("k".into()), Some("staging"), FileConfig::default()).unwrap();
        assert_eq!(c.base_url, PROD_API_URL);
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = Config::resolve(None, None, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("DEVLAB_API_KEY"));
    }

    #[test]
    fn empty_env_key_falls_through_to_file() {
        let file = FileConfig {
            api_key: Some("from_file".into()),
            ..FileConfig::default()
        };
        let c = Config::resolve(Some(String::new()), None, file).unwrap();
        assert_eq!(c.api_key, "from_file");
    }

    #[test]
    fn file_overrides_win_over_env_defaults() {
        let file = FileConfig {
            base_url: Some("http://localhost:8080".into()),
            ..FileConfig::default()
        };
        let c = Config::resolve(Some("k".into()), Some("dev"), file).unwrap();
        assert_eq!(c.base_url, "http://localhost:8080");
        assert_eq!(c.ssh_proxy, DEV_SSH_PROXY);
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        let parsed: Result<FileConfig, _> = toml::from_str("api_key = \"k\"\nbogus = 1\n");
        assert!(parsed.is_err());
    }
}
