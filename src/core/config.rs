//! Configuration for the map view and its layers
//!
//! `MapViewConfig` groups every tunable of the controller. Hosts either pick a
//! preset through [`MapViewProfile`] or load overrides from JSON; every field
//! has a default, so partial documents are accepted.

use crate::core::{
    constants::{
        DEFAULT_CENTER, DEFAULT_SETTLE_DELAY_MS, DEFAULT_ZOOM, FIT_PADDING_PX, MAX_ZOOM,
        MIN_SETTLE_DELAY_MS, MIN_ZOOM, SINGLE_POINT_ZOOM,
    },
    geo::LatLng,
};
use crate::data::intensity::IntensityConfig;
use crate::layers::heatmap::HeatmapConfig;
use crate::spatial::clustering::ClusteringConfig;
use crate::{MapError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Map presets matching the dashboard's two map placements
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MapViewProfile {
    /// Compact overview card
    Dashboard,
    /// Full-screen map page
    #[default]
    FullScreen,
    Custom(Box<MapViewConfig>),
}

impl MapViewProfile {
    pub fn resolve(&self) -> MapViewConfig {
        match self {
            Self::Dashboard => MapViewConfig {
                heatmap: HeatmapConfig::dashboard(),
                intensity: IntensityConfig {
                    base: 0.5,
                    fatality_weight: 0.5,
                    injury_weight: 0.0,
                },
                view: ViewConfig {
                    fit_padding: 20.0,
                    ..ViewConfig::default()
                },
                ..MapViewConfig::default()
            },
            Self::FullScreen => MapViewConfig::default(),
            Self::Custom(config) => (**config).clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    pub heatmap: HeatmapConfig,
    pub clustering: ClusteringConfig,
    pub intensity: IntensityConfig,
    pub view: ViewConfig,
    pub interaction: InteractionConfig,
    pub retry: RetryConfig,
}

impl MapViewConfig {
    pub fn validate(&self) -> Result<()> {
        self.heatmap.validate()?;
        self.clustering.validate()?;
        self.intensity.validate()?;
        self.view.validate()?;
        self.interaction.validate()?;
        self.retry.validate()
    }

    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapViewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading map config {}", path.display()))?;
        let config = Self::from_json_str(&json)
            .with_context(|| format!("parsing map config {}", path.display()))?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Camera defaults and bounds-fit behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Center shown before any data arrives
    pub default_center: LatLng,
    pub default_zoom: f64,
    /// Zoom used when every point shares one coordinate
    pub single_point_zoom: f64,
    /// Pixels kept free on every side when fitting
    pub fit_padding: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl ViewConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.default_center.is_valid() {
            return Err(MapError::Config(format!(
                "default center {:?} is not a valid coordinate",
                self.default_center
            )));
        }
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite() && self.min_zoom <= self.max_zoom)
        {
            return Err(MapError::Config(format!(
                "zoom range [{}, {}] is invalid",
                self.min_zoom, self.max_zoom
            )));
        }
        for (name, zoom) in [
            ("default", self.default_zoom),
            ("single point", self.single_point_zoom),
        ] {
            if !(self.min_zoom..=self.max_zoom).contains(&zoom) {
                return Err(MapError::Config(format!(
                    "{name} zoom {zoom} is outside [{}, {}]",
                    self.min_zoom, self.max_zoom
                )));
            }
        }
        if !(self.fit_padding.is_finite() && self.fit_padding >= 0.0) {
            return Err(MapError::Config(format!(
                "fit padding must be non-negative, got {}",
                self.fit_padding
            )));
        }
        Ok(())
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_center: LatLng::from(DEFAULT_CENTER),
            default_zoom: DEFAULT_ZOOM,
            single_point_zoom: SINGLE_POINT_ZOOM,
            fit_padding: FIT_PADDING_PX,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Quiet time after the last pan/zoom before data may re-render
    pub settle_delay_ms: u64,
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.settle_delay_ms < MIN_SETTLE_DELAY_MS {
            return Err(MapError::Config(format!(
                "settle delay must be at least {MIN_SETTLE_DELAY_MS} ms, got {} ms",
                self.settle_delay_ms
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

/// Backoff for attaching to a widget whose container is not laid out yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.retry_delay_ms == 0 || self.max_delay_ms < self.retry_delay_ms {
            return Err(MapError::Config(format!(
                "retry delays must satisfy 0 < base ({}) <= max ({})",
                self.retry_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.retry_delay_ms;
        let ms = if self.exponential_backoff {
            let shift = attempt.saturating_sub(1).min(31);
            base.saturating_mul(1u64 << shift)
        } else {
            base
        };
        Duration::from_millis(ms.min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_ms: 100,
            exponential_backoff: true,
            max_delay_ms: 2_000,
        }
    }
}
