use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::domain::MaxRecords;
use crate::error::GdeltError;

pub const DEFAULT_CONFIG_FILE: &str = "gdelt-daily.json";
pub const DEFAULT_PROJECT_ID: &str = "gdelt-483607";
pub const DEFAULT_DB_DIR: &str = "db";
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub db_dir: Option<String>,
    #[serde(default)]
    pub max_records: Option<u64>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Process environment captured once at the entry point.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub project_id: Option<String>,
    pub access_token: Option<String>,
}

impl EnvVars {
    pub fn capture() -> Self {
        Self {
            project_id: non_empty(std::env::var(PROJECT_ENV).ok()),
            access_token: non_empty(std::env::var(ACCESS_TOKEN_ENV).ok()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project_id: Option<String>,
    pub max_records: Option<u64>,
    pub db_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub project_id: String,
    pub db_dir: Utf8PathBuf,
    pub max_records: MaxRecords,
    pub endpoint: String,
    pub timeout: Duration,
    pub access_token: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `gdelt-daily.json` when present, then layers the
    /// environment and CLI overrides on top.
    pub fn resolve(
        path: Option<&str>,
        env: &EnvVars,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, GdeltError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| GdeltError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| GdeltError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, env, overrides)
    }

    pub fn resolve_config(
        config: Config,
        env: &EnvVars,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, GdeltError> {
        let project_id = overrides
            .project_id
            .or_else(|| env.project_id.clone())
            .or(config.project_id)
            .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());

        let max_records = match overrides.max_records.or(config.max_records) {
            Some(value) => MaxRecords::new(value)?,
            None => MaxRecords::DEFAULT,
        };

        let db_dir = overrides
            .db_dir
            .or(config.db_dir)
            .unwrap_or_else(|| DEFAULT_DB_DIR.to_string());

        Ok(ResolvedConfig {
            project_id,
            db_dir: Utf8PathBuf::from(db_dir),
            max_records,
            endpoint: config
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            access_token: env.access_token.clone(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
