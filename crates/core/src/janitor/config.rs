//! Configuration for the janitor.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for expiring transient uploads and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Whether the server runs the sweep loop at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Entries older than this are removed.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Time between sweeps.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_age() -> u64 {
    600 // 10 minutes
}

fn default_interval() -> u64 {
    60
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_age_secs: default_max_age(),
            interval_secs: default_interval(),
        }
    }
}

impl JanitorConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn with_max_age_secs(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }

    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_age(), Duration::from_secs(600));
        assert_eq!(config.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_toml() {
        let config: JanitorConfig = toml::from_str("max_age_secs = 30").unwrap();
        assert_eq!(config.max_age_secs, 30);
        assert_eq!(config.interval_secs, 60);
        assert!(config.enabled);
    }
}
