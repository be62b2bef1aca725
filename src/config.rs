//! Settings at ~/.siglocate/config.json.
//!
//! Missing file or missing fields fall back to defaults. The API key default
//! is baked in at build time from `GOOGLE_API_KEY`.

use crate::location::DEFAULT_ENDPOINT;
use crate::sensors::iw::DEFAULT_INTERFACE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const BUILD_API_KEY: Option<&str> = option_env!("GOOGLE_API_KEY");

/// Language of the status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ja" => Ok(Self::Ja),
            "en" => Ok(Self::En),
            other => Err(format!("Unknown language '{}'. Use 'ja' or 'en'.", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Upper bound on pipelines running at once.
    pub workers: usize,
    pub locale: Locale,
    pub wifi_interface: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: BUILD_API_KEY.unwrap_or_default().to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 10,
            workers: 4,
            locale: Locale::default(),
            wifi_interface: DEFAULT_INTERFACE.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, String),
    Parse(PathBuf, String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, msg) => write!(f, "Cannot read {}: {}", path.display(), msg),
            Self::Parse(path, msg) => write!(f, "Cannot parse {}: {}", path.display(), msg),
            Self::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load from the default location. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        let config: Config =
            serde_json::from_str(&data).map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".siglocate")
            .join("config.json")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid(format!("endpoint '{}' is not an http(s) URL", self.endpoint)));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(body: &str) -> (PathBuf, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, body).unwrap();
        (path, dir)
    }

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(c.timeout(), Duration::from_secs(10));
        assert_eq!(c.locale, Locale::Ja);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let (path, _dir) = write_config(r#"{"api_key": "abc", "locale": "en"}"#);
        let c = Config::load_from(&path).unwrap();
        assert_eq!(c.api_key, "abc");
        assert_eq!(c.locale, Locale::En);
        assert_eq!(c.workers, 4);
        assert_eq!(c.wifi_interface, "wlan0");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let (path, _dir) = write_config(r#"{"workers": 0}"#);
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let (path, _dir) = write_config(r#"{"endpoint": "ftp://example.com"}"#);
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_file() {
        let (path, _dir) = write_config("{ nope");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_, _))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("absent.json")),
            Err(ConfigError::Io(_, _))
        ));
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }
}
