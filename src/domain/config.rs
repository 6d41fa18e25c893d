use serde::{Deserialize, Serialize};

use crate::domain::ticket::Priority;
use crate::error::{DeskError, Result};

/// Counter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Id prefix for urgent tickets
    pub urgent_prefix: String,
    /// Id prefix for normal tickets
    pub normal_prefix: String,
    /// Urgent tickets served in a row before a waiting normal ticket gets its turn
    pub urgent_burst: u8,
    /// Lower bound (inclusive) of the simulated service time
    pub min_service_minutes: f64,
    /// Upper bound (exclusive) of the simulated service time
    pub max_service_minutes: f64,
    /// Seed for reproducible service times (None = random)
    pub seed: Option<u64>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            urgent_prefix: "U".to_string(),
            normal_prefix: "N".to_string(),
            urgent_burst: 2,
            min_service_minutes: 5.0,
            max_service_minutes: 20.0,
            seed: None,
        }
    }
}

impl DeskConfig {
    /// Parses a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DeskConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Id prefix used for the given priority
    pub fn prefix_for(&self, priority: Priority) -> &str {
        match priority {
            Priority::Urgent => &self.urgent_prefix,
            Priority::Normal => &self.normal_prefix,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for prefix in [&self.urgent_prefix, &self.normal_prefix] {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(DeskError::ConfigError(format!(
                    "ticket prefix must be non-empty ASCII letters, got '{}'",
                    prefix
                )));
            }
        }
        if self.urgent_prefix.eq_ignore_ascii_case(&self.normal_prefix) {
            return Err(DeskError::ConfigError(
                "urgent and normal prefixes must differ".to_string(),
            ));
        }
        if self.urgent_burst == 0 {
            return Err(DeskError::ConfigError(
                "urgent_burst must be at least 1".to_string(),
            ));
        }
        let (min, max) = (self.min_service_minutes, self.max_service_minutes);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min >= max {
            return Err(DeskError::ConfigError(format!(
                "service time range must satisfy 0 < min < max, got [{}, {})",
                min, max
            )));
        }
        Ok(())
    }
}
