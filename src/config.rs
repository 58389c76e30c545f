//! Configuration of a dating analysis.
//!
//! A [DatingConfig] holds the birth-death rates, the per-vertex cap on
//! calibrations and the list of calibrations. It is read from JSON:
//!
//! ```json
//! {
//!   "birth_rate": 1.0,
//!   "death_rate": 0.5,
//!   "max_calibrations_per_node": 10,
//!   "calibrations": [
//!     { "clade_id": "AB", "taxa": ["A", "B"], "lower": -2.0, "upper": -1.0 }
//!   ]
//! }
//! ```
//!
//! Every field is optional. A calibration without `lower` is unbounded into
//! the past, one without `upper` is bounded by the present.

use crate::dating::{BirthDeath, Calibration, CalibrationStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while loading or validating a [DatingConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn default_birth_rate() -> f64 {
    1.0
}

fn default_max_calibrations_per_node() -> usize {
    CalibrationStore::DEFAULT_MAX_PER_NODE
}

fn default_primary() -> bool {
    true
}

/// Settings of a dating analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatingConfig {
    #[serde(default = "default_birth_rate")]
    pub birth_rate: f64,

    #[serde(default)]
    pub death_rate: f64,

    #[serde(default = "default_max_calibrations_per_node")]
    pub max_calibrations_per_node: usize,

    #[serde(default)]
    pub calibrations: Vec<CalibrationConfig>,
}

/// One calibration as written in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    pub clade_id: String,

    pub taxa: Vec<String>,

    /// Oldest admissible time, `-inf` if missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,

    /// Youngest admissible time, `0` if missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,

    #[serde(default = "default_primary")]
    pub primary: bool,
}

impl CalibrationConfig {
    /// Converts into a [Calibration], filling in missing bounds.
    pub fn to_calibration(&self) -> Calibration {
        Calibration::new(
            self.clade_id.clone(),
            self.taxa.clone(),
            self.lower.unwrap_or(f64::NEG_INFINITY),
            self.upper.unwrap_or(0.0),
        )
        .with_primary(self.primary)
    }
}

impl Default for DatingConfig {
    fn default() -> Self {
        DatingConfig {
            birth_rate: default_birth_rate(),
            death_rate: 0.0,
            max_calibrations_per_node: default_max_calibrations_per_node(),
            calibrations: Vec::new(),
        }
    }
}

impl DatingConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Example
    /// ```
    /// use caldate::config::DatingConfig;
    ///
    /// let config = DatingConfig::from_json_str(r#"{
    ///     "death_rate": 0.5,
    ///     "calibrations": [{ "clade_id": "AB", "taxa": ["A", "B"], "upper": -1.0 }]
    /// }"#).unwrap();
    /// assert_eq!(config.birth_rate, 1.0);
    /// assert_eq!(config.calibrations[0].to_calibration().lower(), f64::NEG_INFINITY);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DatingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes this configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks rates, the calibration cap and every calibration.
    ///
    /// Contradicting or inverted bounds are not checked here; they are
    /// reported once calibrations are bound to the tree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        BirthDeath::new(self.birth_rate, self.death_rate).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.max_calibrations_per_node == 0 {
            return Err(ConfigError::Invalid(
                "max_calibrations_per_node must be at least 1".to_string(),
            ));
        }

        let mut primary_clades = HashSet::new();
        for cal in &self.calibrations {
            cal.to_calibration()
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if cal.primary && !primary_clades.insert(cal.clade_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "clade '{}' has more than one primary calibration",
                    cal.clade_id
                )));
            }
        }
        Ok(())
    }

    /// Returns the validated birth-death rates.
    pub fn rates(&self) -> Result<BirthDeath, ConfigError> {
        BirthDeath::new(self.birth_rate, self.death_rate).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Converts all calibrations.
    pub fn to_calibrations(&self) -> Vec<Calibration> {
        self.calibrations.iter().map(CalibrationConfig::to_calibration).collect()
    }
}
