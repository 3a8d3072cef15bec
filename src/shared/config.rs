//! Application configuration. Backend selection, credentials, paths, timings.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_CAROUSEL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_PROFILE_WRITE_ATTEMPTS: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Which identity provider / document store pair to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process, nothing persisted. Useful for demos and tests.
    #[default]
    Memory,
    /// libsql file under `data_dir`.
    Local,
    /// Firebase Auth + Firestore over REST.
    Firebase,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Read from FIT_TOGETHER_BACKEND.
    #[serde(default)]
    pub backend: Option<Backend>,
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Firebase Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Web API key. Read from FIT_TOGETHER_FIREBASE_API_KEY.
    #[serde(default)]
    pub firebase_api_key: Option<String>,

    /// Read from FIT_TOGETHER_FIREBASE_PROJECT_ID.
    #[serde(default)]
    pub firebase_project_id: Option<String>,

    /// HTTP timeout for provider calls. Read from FIT_TOGETHER_REQUEST_TIMEOUT_SECS.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Behaviour
    // ─────────────────────────────────────────────────────────────────────────
    /// Landing carousel period (default 5). Read from FIT_TOGETHER_CAROUSEL_INTERVAL_SECS.
    #[serde(default)]
    pub carousel_interval_secs: Option<u64>,

    /// Tries for the profile write after sign-up (default 3). Read from FIT_TOGETHER_PROFILE_WRITE_ATTEMPTS.
    #[serde(default)]
    pub profile_write_attempts: Option<u32>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("FIT_TOGETHER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("FIT_TOGETHER").try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn backend_or_default(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Returns carousel period. Zero is treated as unset.
    pub fn carousel_interval_or_default(&self) -> Duration {
        let secs = self
            .carousel_interval_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_CAROUSEL_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn profile_write_attempts_or_default(&self) -> u32 {
        self.profile_write_attempts
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PROFILE_WRITE_ATTEMPTS)
    }

    pub fn request_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Both credentials, or `None` if either is missing or blank.
    pub fn firebase_credentials(&self) -> Option<(String, String)> {
        let key = self.firebase_api_key.clone().filter(|s| !s.trim().is_empty())?;
        let project = self
            .firebase_project_id
            .clone()
            .filter(|s| !s.trim().is_empty())?;
        Some((key, project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.backend_or_default(), Backend::Memory);
        assert_eq!(cfg.data_dir_or_default(), PathBuf::from("./data"));
        assert_eq!(cfg.carousel_interval_or_default(), Duration::from_secs(5));
        assert_eq!(cfg.profile_write_attempts_or_default(), 3);
        assert_eq!(cfg.request_timeout_or_default(), Duration::from_secs(10));
        assert_eq!(cfg.firebase_credentials(), None);
    }

    #[test]
    fn firebase_needs_both_credentials() {
        let cfg = AppConfig {
            firebase_api_key: Some("key".into()),
            firebase_project_id: Some("  ".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.firebase_credentials(), None);
        let cfg = AppConfig {
            firebase_project_id: Some("fit-together".into()),
            ..cfg
        };
        assert_eq!(
            cfg.firebase_credentials(),
            Some(("key".to_string(), "fit-together".to_string()))
        );
    }

    #[test]
    fn reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "backend = \"local\"\ndata_dir = \"/tmp/fit\"\ncarousel_interval_secs = 0\nprofile_write_attempts = 5"
        )
        .unwrap();
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from(file.path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.backend_or_default(), Backend::Local);
        assert_eq!(cfg.data_dir_or_default(), PathBuf::from("/tmp/fit"));
        assert_eq!(cfg.carousel_interval_or_default(), Duration::from_secs(5));
        assert_eq!(cfg.profile_write_attempts_or_default(), 5);
    }
}
