use crate::data::point::AccidentPoint;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the linear heat weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    /// Weight of an accident with no casualties; keeps every point visible
    pub base: f64,
    /// Added per death
    pub fatality_weight: f64,
    /// Added per injured person
    pub injury_weight: f64,
}

impl IntensityConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base.is_finite() && self.base > 0.0) {
            return Err(MapError::Config(format!(
                "intensity base must be positive, got {}",
                self.base
            )));
        }
        if !(self.injury_weight.is_finite() && self.injury_weight >= 0.0) {
            return Err(MapError::Config(format!(
                "injury weight must be non-negative, got {}",
                self.injury_weight
            )));
        }
        if !(self.fatality_weight.is_finite() && self.fatality_weight > self.injury_weight) {
            return Err(MapError::Config(format!(
                "fatality weight ({}) must exceed injury weight ({})",
                self.fatality_weight, self.injury_weight
            )));
        }
        Ok(())
    }
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            base: 0.3,
            fatality_weight: 0.5,
            injury_weight: 0.1,
        }
    }
}

/// Maps an accident's casualty counts to a heat-layer weight.
///
/// `weight = base + fatalities * fatality_weight + injuries * injury_weight`.
/// The result is unbounded above; the heat layer clamps it to its color domain.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityModel {
    config: IntensityConfig,
}

impl IntensityModel {
    pub fn new(config: IntensityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn weight(&self, point: &AccidentPoint) -> f64 {
        self.weight_for(point.fatalities, point.injuries)
    }

    pub fn weight_for(&self, fatalities: u32, injuries: u32) -> f64 {
        self.config.base
            + fatalities as f64 * self.config.fatality_weight
            + injuries as f64 * self.config.injury_weight
    }

    pub fn config(&self) -> &IntensityConfig {
        &self.config
    }
}

impl Default for IntensityModel {
    fn default() -> Self {
        Self {
            config: IntensityConfig::default(),
        }
    }
}
