use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// When to insert the inter-batch delay that lets replicas catch up during
/// large bulk operations. `Auto` follows the store's replica predicate; the
/// other two exist because the heuristic is tuning policy, not a guarantee.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThrottlePolicy {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub throttle: ThrottlePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            batch_delay_ms: 100,
            throttle: ThrottlePolicy::Auto,
        }
    }
}

impl EngineConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e.to_string()))?;
            toml::from_str::<EngineConfig>(&contents)
                .map_err(|e| ConfigError::ParseToml(e.to_string()))?
        } else {
            EngineConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GRANTLINE_BATCH_SIZE")
            && let Ok(n) = v.parse()
        {
            self.batch_size = n;
        }
        if let Ok(v) = std::env::var("GRANTLINE_BATCH_DELAY_MS")
            && let Ok(n) = v.parse()
        {
            self.batch_delay_ms = n;
        }
        if let Ok(v) = std::env::var("GRANTLINE_THROTTLE") {
            match v.as_str() {
                "auto" => self.throttle = ThrottlePolicy::Auto,
                "always" => self.throttle = ThrottlePolicy::Always,
                "never" => self.throttle = ThrottlePolicy::Never,
                _ => {}
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse TOML config: {0}")]
    ParseToml(String),

    #[error("config validation failed: {0}")]
    Validation(String),
}
