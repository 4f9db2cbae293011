//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

const DEFAULT_API_URL: &str = "http://localhost:3333/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file holding the persisted session
    pub database_path: PathBuf,
    /// Base URL of the GoBarber API, checked when the app starts
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("gobarber.db"),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("GoBarber"))
            .unwrap_or_else(|| PathBuf::from(".gobarber"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply `GOBARBER_API_URL`, `GOBARBER_DATABASE_PATH` and
    /// `GOBARBER_REQUEST_TIMEOUT_SECS` from the environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GOBARBER_API_URL") {
            self.api_url = url;
        }

        if let Some(path) = lookup("GOBARBER_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }

        if let Some(secs) = lookup("GOBARBER_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.parse().map_err(|_| {
                CoreError::Config(format!(
                    "GOBARBER_REQUEST_TIMEOUT_SECS is not a number: {secs}"
                ))
            })?;
        }

        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
