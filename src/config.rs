//! Tunable settings for scheduling and placement.
//!
//! Defaults reproduce the stock scoring table; a TOML file may override
//! any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Used when a caller does not give an appointment length.
    pub default_appointment_minutes: i64,
    pub placement: PlacementWeights,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_appointment_minutes: 30,
            placement: PlacementWeights::default(),
        }
    }
}

impl SchedulingConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SchedulingConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_appointment_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_appointment_minutes must be positive, got {}",
                self.default_appointment_minutes
            )));
        }
        Ok(())
    }
}

/// Points awarded by each placement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementWeights {
    pub preferred_care_level: i64,
    pub preferred_specialty: i64,
    pub preferred_class_has_bed: i64,
    pub assignment_care_level: i64,
    pub assignment_specialty: i64,
    pub assignment_min_capacity: i64,
    pub assignment_max_capacity: i64,
    pub ward_has_bed: i64,
    pub bed_care_level: i64,
    pub bed_specialty: i64,
    pub bed_preferred_class: i64,
}

impl Default for PlacementWeights {
    fn default() -> Self {
        Self {
            preferred_care_level: 10,
            preferred_specialty: 10,
            preferred_class_has_bed: 5,
            assignment_care_level: 5,
            assignment_specialty: 5,
            assignment_min_capacity: 2,
            assignment_max_capacity: 2,
            ward_has_bed: 3,
            bed_care_level: 10,
            bed_specialty: 10,
            bed_preferred_class: 5,
        }
    }
}
