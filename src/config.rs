use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, OptionExt, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::netease_rs::NeteaseClientConfig;

const APP_DIR: &str = "playlist-reconcile";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    api_base_url: String,
    batch_size: usize,
    requests_per_second: u32,
    /// humantime duration, e.g. "15s"
    request_timeout: String,
    retries: usize,
    /// humantime duration, "0s" disables the fetch cache
    cache_ttl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_directory: Option<String>,
    output_directory: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://music.163.com".to_string(),
            batch_size: 500,
            requests_per_second: 2,
            request_timeout: "15s".to_string(),
            retries: 3,
            cache_ttl: "1h".to_string(),
            cache_directory: None,
            output_directory: ".".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIR).join("config.toml"))
    }

    /// Load config from the default path, falling back to defaults when no
    /// file exists there
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default path unless a file is
    /// already there. Returns the path.
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        Self::default().write_if_missing(&path)?;
        Ok(path)
    }

    fn write_if_missing(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            log::info!("Config file already exists at {}", path.display());
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .context(format!("Failed to write config file: {}", path.display()))?;
        Ok(true)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get expanded output directory for fetched playlists
    pub fn output_directory_path(&self) -> PathBuf {
        self.expand_path(&self.output_directory)
    }

    /// Get expanded cache directory, defaulting to the platform cache dir
    pub fn cache_directory_path(&self) -> Option<PathBuf> {
        match &self.cache_directory {
            Some(directory) => Some(self.expand_path(directory)),
            None => dirs::cache_dir().map(|path| path.join(APP_DIR)),
        }
    }

    pub fn cache_ttl(&self) -> Result<Duration> {
        humantime::parse_duration(&self.cache_ttl)
            .context(format!("Invalid cache_ttl: {:?}", self.cache_ttl))
    }

    pub fn netease_client_config(&self) -> Result<NeteaseClientConfig> {
        Ok(NeteaseClientConfig {
            base_url: Url::parse(&self.api_base_url)
                .context(format!("Invalid api_base_url: {:?}", self.api_base_url))?,
            batch_size: NonZeroUsize::new(self.batch_size)
                .ok_or_eyre("batch_size must be at least 1")?,
            requests_per_second: NonZeroU32::new(self.requests_per_second)
                .ok_or_eyre("requests_per_second must be at least 1")?,
            request_timeout: humantime::parse_duration(&self.request_timeout)
                .context(format!("Invalid request_timeout: {:?}", self.request_timeout))?,
            retries: self.retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let (_dir, path) = write_config("batch_size = 100\n");
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.batch_size, 100);
        assert_eq!(config.api_base_url, "https://music.163.com");
        assert_eq!(config.cache_ttl().unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_client_config() {
        let (_dir, path) = write_config(
            r#"
api_base_url = "http://localhost:3000"
batch_size = 50
requests_per_second = 5
request_timeout = "2s 500ms"
retries = 0
"#,
        );
        let client = Config::from_file(&path)
            .unwrap()
            .netease_client_config()
            .unwrap();

        assert_eq!(client.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(client.batch_size.get(), 50);
        assert_eq!(client.requests_per_second.get(), 5);
        assert_eq!(client.request_timeout, Duration::from_millis(2500));
        assert_eq!(client.retries, 0);
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let (_dir, path) = write_config("batch_size = 0\n");
        let error = Config::from_file(&path)
            .unwrap()
            .netease_client_config()
            .unwrap_err();
        assert!(error.to_string().contains("batch_size"));
    }

    #[test]
    fn test_rejects_bad_durations() {
        let (_dir, path) = write_config("cache_ttl = \"soon\"\n");
        assert!(Config::from_file(&path).unwrap().cache_ttl().is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let (_dir, path) = write_config("batch_size = \"many\"\n");
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(Config::default().write_if_missing(&path).unwrap());
        assert!(!Config::default().write_if_missing(&path).unwrap());
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_explicit_cache_directory() {
        let config: Config = toml::from_str("cache_directory = \"/tmp/reconcile\"").unwrap();
        assert_eq!(
            config.cache_directory_path(),
            Some(PathBuf::from("/tmp/reconcile"))
        );
    }
}
