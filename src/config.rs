use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::parser::SqlDialect;

pub const ENV_PREDICTOR_URL: &str = "SQL_ADVISOR_PREDICTOR_URL";
pub const ENV_PREDICTOR_TIMEOUT_MS: &str = "SQL_ADVISOR_PREDICTOR_TIMEOUT_MS";
pub const ENV_DIALECT: &str = "SQL_ADVISOR_DIALECT";

pub const DEFAULT_PREDICTOR_URL: &str = "http://localhost:8000";
pub const DEFAULT_PREDICTOR_TIMEOUT_MS: u64 = 3000;

/// Analyzer settings.
///
/// `predictor_url = None` disables the remote prediction service; every
/// prediction then comes from the heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub predictor_url: Option<String>,
    pub predictor_timeout_ms: u64,
    pub dialect: SqlDialect,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            predictor_url: Some(DEFAULT_PREDICTOR_URL.to_string()),
            predictor_timeout_ms: DEFAULT_PREDICTOR_TIMEOUT_MS,
            dialect: SqlDialect::Generic,
        }
    }
}

impl AdvisorConfig {
    /// Defaults overridden by `SQL_ADVISOR_*` environment variables.
    ///
    /// An empty `SQL_ADVISOR_PREDICTOR_URL` disables the remote predictor.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_PREDICTOR_URL) {
            let url = url.trim();
            config.predictor_url = (!url.is_empty()).then(|| url.to_string());
        }

        if let Some(raw) = lookup(ENV_PREDICTOR_TIMEOUT_MS) {
            config.predictor_timeout_ms = raw.trim().parse::<u64>().map_err(|e| {
                AdvisorError::InvalidConfig(format!("{ENV_PREDICTOR_TIMEOUT_MS}='{raw}': {e}"))
            })?;
        }

        if let Some(raw) = lookup(ENV_DIALECT) {
            config.dialect = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.predictor_timeout_ms == 0 {
            return Err(AdvisorError::InvalidConfig(
                "predictor timeout must be > 0 ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_millis(self.predictor_timeout_ms)
    }

    /// Heuristic-only configuration
    pub fn offline(mut self) -> Self {
        self.predictor_url = None;
        self
    }
}
