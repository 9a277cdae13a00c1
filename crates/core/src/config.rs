//! JSON configuration for landscape generation, environment and sweeps

use crate::core_types::EnvironmentParams;
use crate::error::SimError;
use crate::grid::LandscapeConfig;
use crate::simulation::DEFAULT_SWEEP_VALUES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to set up a run or a sweep
///
/// Missing sections fall back to their defaults, so a file containing only
/// `{"environment": {...}}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub landscape: LandscapeConfig,
    pub environment: EnvironmentParams,
    pub sweep_values: Vec<f32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            landscape: LandscapeConfig::default(),
            environment: EnvironmentParams::default(),
            sweep_values: DEFAULT_SWEEP_VALUES.to_vec(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    /// [`SimError::Io`] if the file cannot be read, [`SimError::Serialization`]
    /// if it is not valid JSON, or a validation error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    ///
    /// # Errors
    /// [`SimError::Serialization`] or [`SimError::Io`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// # Errors
    /// The first invalid landscape, environment or sweep value.
    pub fn validate(&self) -> Result<(), SimError> {
        self.landscape.validate()?;
        self.environment.validate()?;
        if self.sweep_values.is_empty() {
            return Err(SimError::InvalidConfig("sweep_values must not be empty".into()));
        }
        if let Some(bad) = self
            .sweep_values
            .iter()
            .find(|v| !(0.0..=1.0).contains(*v))
        {
            return Err(SimError::InvalidConfig(format!(
                "sweep value {bad} is outside [0, 1]"
            )));
        }
        Ok(())
    }
}
