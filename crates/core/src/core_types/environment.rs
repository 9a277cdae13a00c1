//! Environment parameters driving ignition, rain and drying
//!
//! The four user-facing scalars all live in `[0, 1]`. A run receives one
//! immutable [`EnvironmentParams`] value; the sweep builds a fresh value per
//! parameter combination instead of mutating shared state.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Base ignition chance before humidity/precipitation and wind/drying adjustments
const BASE_IGNITION_CHANCE: f32 = 0.65;

/// Percentage points removed per 0.1 of combined humidity + precipitation strength
const SUPPRESSION_PERCENT_PER_TENTH: f32 = 5.0;

/// Percentage points added per 0.1 of combined wind strength + drying effect
const PROMOTION_PERCENT_PER_TENTH: f32 = 3.0;

/// Precipitation strength above which active rain extinguishes burning cells
const RAIN_EXTINGUISH_THRESHOLD: f32 = 0.6;

/// Environmental conditions for a single run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParams {
    /// Air humidity (0.0-1.0), suppresses ignition
    pub humidity: f32,
    /// Rain strength (0.0-1.0), suppresses ignition and extinguishes when above 0.6
    pub precipitation_strength: f32,
    /// Per-step probability that it rains (0.0-1.0)
    pub precipitation_chance: f32,
    /// Wind strength (0.0-1.0), promotes ignition and drives drying
    pub wind_strength: f32,
    /// Explicit drying effect; `None` ties it to the wind strength
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drying_override: Option<f32>,
}

impl Default for EnvironmentParams {
    fn default() -> Self {
        Self::new(0.8, 0.6, 0.7, 0.2)
    }
}

impl EnvironmentParams {
    /// Create parameters with the drying effect tied to the wind strength.
    pub const fn new(
        humidity: f32,
        precipitation_strength: f32,
        precipitation_chance: f32,
        wind_strength: f32,
    ) -> Self {
        Self {
            humidity,
            precipitation_strength,
            precipitation_chance,
            wind_strength,
            drying_override: None,
        }
    }

    /// Decouple the drying effect from the wind strength.
    pub fn with_drying_effect(mut self, drying_effect: f32) -> Self {
        self.drying_override = Some(drying_effect);
        self
    }

    /// Drying effect used for ignition and the global moisture loss.
    #[inline]
    pub fn drying_effect(&self) -> f32 {
        self.drying_override.unwrap_or(self.wind_strength)
    }

    /// Check every scalar is finite and within `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`SimError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("humidity", self.humidity),
            ("precipitation_strength", self.precipitation_strength),
            ("precipitation_chance", self.precipitation_chance),
            ("wind_strength", self.wind_strength),
            ("drying_effect", self.drying_effect()),
        ];
        for (name, value) in fields {
            check_unit_interval(name, value)?;
        }
        Ok(())
    }

    /// Probability that a burning cell ignites one flammable neighbour in one step.
    ///
    /// `0.65 - (humidity + precipitation) * 10 * 5 / 100 + (wind + drying) * 10 * 3 / 100`,
    /// clamped to `[0, 1]`.
    pub fn ignition_probability(&self) -> f32 {
        let reduction =
            (self.humidity + self.precipitation_strength) * 10.0 * SUPPRESSION_PERCENT_PER_TENTH;
        let increase =
            (self.wind_strength + self.drying_effect()) * 10.0 * PROMOTION_PERCENT_PER_TENTH;
        (BASE_IGNITION_CHANCE - reduction / 100.0 + increase / 100.0).clamp(0.0, 1.0)
    }

    /// Whether active rain puts out burning cells outright.
    #[inline]
    pub fn rain_extinguishes(&self) -> bool {
        self.precipitation_strength > RAIN_EXTINGUISH_THRESHOLD
    }

    /// Moisture removed from every cell per step.
    #[inline]
    pub fn moisture_loss(&self) -> f32 {
        self.drying_effect() * self.wind_strength
    }

    /// Apply raw text inputs, all or nothing.
    ///
    /// Every field is parsed before anything is assigned, so a single bad
    /// entry leaves all prior values in place.
    ///
    /// # Errors
    /// Returns [`SimError::InvalidInput`] for the first field that is not a
    /// number in `[0, 1]`.
    pub fn apply_inputs(&mut self, inputs: &ParameterInputs) -> Result<(), SimError> {
        let humidity = parse_unit_interval("humidity", &inputs.humidity)?;
        let precipitation_strength =
            parse_unit_interval("precipitation_strength", &inputs.precipitation_strength)?;
        let precipitation_chance =
            parse_unit_interval("precipitation_chance", &inputs.precipitation_chance)?;
        let wind_strength = parse_unit_interval("wind_strength", &inputs.wind_strength)?;

        self.humidity = humidity;
        self.precipitation_strength = precipitation_strength;
        self.precipitation_chance = precipitation_chance;
        self.wind_strength = wind_strength;
        Ok(())
    }
}

/// Raw, unparsed parameter text as typed by a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterInputs {
    pub humidity: String,
    pub precipitation_strength: String,
    pub precipitation_chance: String,
    pub wind_strength: String,
}

impl ParameterInputs {
    /// Pre-fill the inputs with the current parameter values.
    pub fn from_params(params: &EnvironmentParams) -> Self {
        Self {
            humidity: params.humidity.to_string(),
            precipitation_strength: params.precipitation_strength.to_string(),
            precipitation_chance: params.precipitation_chance.to_string(),
            wind_strength: params.wind_strength.to_string(),
        }
    }
}

/// Parse a single scalar that must lie in `[0, 1]`.
///
/// # Errors
/// Returns [`SimError::InvalidInput`] when `text` is not a finite number in range.
pub fn parse_unit_interval(field: &'static str, text: &str) -> Result<f32, SimError> {
    let trimmed = text.trim();
    let value: f32 = trimmed.parse().map_err(|_| {
        SimError::invalid_input(field, format!("expected a number between 0 and 1, got '{trimmed}'"))
    })?;
    check_unit_interval(field, value)?;
    Ok(value)
}

fn check_unit_interval(field: &'static str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid_input(
            field,
            format!("must be between 0 and 1, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ignition_probability_reference_values() {
        // 0.65 - 70/100 + 12/100
        let params = EnvironmentParams::new(0.8, 0.6, 0.7, 0.2);
        assert_relative_eq!(params.ignition_probability(), 0.07, epsilon = 1e-5);
    }

    #[test]
    fn test_ignition_probability_clamped() {
        let soaked = EnvironmentParams::new(1.0, 1.0, 0.0, 0.0);
        assert_eq!(soaked.ignition_probability(), 0.0);

        let gale = EnvironmentParams::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(gale.ignition_probability(), 1.0);
    }

    #[test]
    fn test_drying_effect_follows_wind_until_overridden() {
        let params = EnvironmentParams::new(0.5, 0.5, 0.5, 0.3);
        assert_eq!(params.drying_effect(), 0.3);
        assert_relative_eq!(params.moisture_loss(), 0.09, epsilon = 1e-6);

        let decoupled = params.with_drying_effect(0.0);
        assert_eq!(decoupled.drying_effect(), 0.0);
        assert_eq!(decoupled.moisture_loss(), 0.0);
    }

    #[test]
    fn test_rain_threshold_is_strict() {
        assert!(!EnvironmentParams::new(0.0, 0.6, 1.0, 0.0).rain_extinguishes());
        assert!(EnvironmentParams::new(0.0, 0.7, 1.0, 0.0).rain_extinguishes());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(EnvironmentParams::default().validate().is_ok());
        let bad = EnvironmentParams::new(1.5, 0.0, 0.0, 0.0);
        assert!(matches!(
            bad.validate(),
            Err(SimError::InvalidInput { field: "humidity", .. })
        ));
        let nan = EnvironmentParams::new(0.0, 0.0, 0.0, 0.0).with_drying_effect(f32::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_apply_inputs_accepts_valid_text() {
        let mut params = EnvironmentParams::default();
        let inputs = ParameterInputs {
            humidity: " 0.1 ".into(),
            precipitation_strength: "0".into(),
            precipitation_chance: "1".into(),
            wind_strength: "0.9".into(),
        };
        params.apply_inputs(&inputs).unwrap();
        assert_eq!(params, EnvironmentParams::new(0.1, 0.0, 1.0, 0.9));
    }

    #[test]
    fn test_apply_inputs_failure_keeps_prior_values() {
        let mut params = EnvironmentParams::default();
        let before = params;
        let mut inputs = ParameterInputs::from_params(&params);
        inputs.humidity = "0.3".into();
        inputs.wind_strength = "windy".into();

        let err = params.apply_inputs(&inputs).unwrap_err();
        assert!(matches!(err, SimError::InvalidInput { field: "wind_strength", .. }));
        assert_eq!(params, before);

        inputs.wind_strength = "1.2".into();
        assert!(params.apply_inputs(&inputs).is_err());
        assert_eq!(params, before);
    }

    #[test]
    fn test_parse_unit_interval() {
        assert_eq!(parse_unit_interval("humidity", "0.25").unwrap(), 0.25);
        assert!(parse_unit_interval("humidity", "").is_err());
        assert!(parse_unit_interval("humidity", "-0.1").is_err());
        assert!(parse_unit_interval("humidity", "inf").is_err());
    }
}
