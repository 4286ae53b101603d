//! Runtime settings: defaults, then an optional RON file, then the
//! environment, then command-line flags (applied by the binary).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use psgen_engine::BackendSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "PSGEN_API_BASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub generate_timeout_secs: u64,
    pub download_dir: PathBuf,
    pub similarity_threshold: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        Self {
            base_url: backend.base_url,
            poll_interval_ms: psgen_core::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            connect_timeout_secs: backend.connect_timeout.as_secs(),
            request_timeout_secs: backend.request_timeout.as_secs(),
            generate_timeout_secs: backend.generate_timeout.as_secs(),
            download_dir: PathBuf::from("downloads"),
            similarity_threshold: None,
        }
    }
}

impl AppConfig {
    /// Loads the file if given, then applies `PSGEN_API_BASE`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.override_base_url(std::env::var(BASE_URL_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Blank values are ignored.
    pub fn override_base_url(&mut self, base_url: Option<String>) {
        if let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            generate_timeout: Duration::from_secs(self.generate_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_contract() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.similarity_threshold, None);
    }

    #[test]
    fn partial_ron_file_keeps_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("psgen.ron");
        fs::write(
            &path,
            r#"(base_url: "http://backend:8080", similarity_threshold: Some(0.25))"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "http://backend:8080");
        assert_eq!(config.similarity_threshold, Some(0.25));
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn malformed_file_is_reported_with_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("broken.ron");
        fs::write(&path, "(base_url: ").unwrap();

        match AppConfig::from_file(&path) {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut config = AppConfig::default();
        config.override_base_url(Some("   ".to_string()));
        assert_eq!(config.base_url, "http://localhost:5000");
        config.override_base_url(Some(" http://other:1 ".to_string()));
        assert_eq!(config.base_url, "http://other:1");
    }

    #[test]
    fn backend_settings_carry_timeouts() {
        let config = AppConfig {
            request_timeout_secs: 5,
            generate_timeout_secs: 60,
            ..AppConfig::default()
        };
        let settings = config.backend_settings();
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.generate_timeout, Duration::from_secs(60));
    }
}
