use crate::core::{
    constants::MIN_GRADIENT_STOPS,
    geo::{LatLng, LatLngBounds, Point},
    viewport::Viewport,
};
use crate::data::{intensity::IntensityModel, point::AccidentPoint};
use crate::layers::base::{LayerProperties, LayerType, RenderGeneration};
use crate::ui::style::Color;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// One color stop of the heat gradient; `offset` is in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Configuration for the heat layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Radius of influence for each data point (in pixels)
    pub radius: f64,
    /// Gaussian falloff width (in pixels)
    pub blur: f64,
    /// Weights at or below this map to the bottom of the gradient
    pub min_intensity: f64,
    /// Weights at or above this saturate the gradient
    pub max_intensity: f64,
    /// Overall opacity of the heat layer
    pub opacity: f32,
    /// Zoom at which a single point reaches full intensity
    pub max_zoom: f64,
    /// Gradient stops from low to high intensity
    pub gradient: Vec<GradientStop>,
}

impl HeatmapConfig {
    /// The compact map embedded in the dashboard overview
    pub fn dashboard() -> Self {
        Self {
            radius: 20.0,
            blur: 15.0,
            max_zoom: 10.0,
            gradient: vec![
                GradientStop::new(0.4, Color::BLUE),
                GradientStop::new(0.65, Color::LIME),
                GradientStop::new(0.9, Color::YELLOW),
                GradientStop::new(1.0, Color::RED),
            ],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(MapError::Config(format!(
                "heat radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.blur.is_finite() && self.blur >= 0.0) {
            return Err(MapError::Config(format!(
                "heat blur must be non-negative, got {}",
                self.blur
            )));
        }
        if !(self.min_intensity.is_finite()
            && self.max_intensity.is_finite()
            && self.max_intensity > self.min_intensity)
        {
            return Err(MapError::Config(format!(
                "heat intensity domain [{}, {}] is empty",
                self.min_intensity, self.max_intensity
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(MapError::Config(format!(
                "heat opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        if self.gradient.len() < MIN_GRADIENT_STOPS {
            return Err(MapError::Config(format!(
                "heat gradient needs at least {MIN_GRADIENT_STOPS} stops, got {}",
                self.gradient.len()
            )));
        }
        let in_range = self
            .gradient
            .iter()
            .all(|stop| (0.0..=1.0).contains(&stop.offset));
        let ascending = self
            .gradient
            .windows(2)
            .all(|pair| pair[0].offset < pair[1].offset);
        if !(in_range && ascending) {
            return Err(MapError::Config(
                "heat gradient offsets must be strictly ascending within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Position of `weight` inside the intensity domain, clamped to `[0, 1]`
    pub fn normalize(&self, weight: f64) -> f64 {
        let clamped = weight.clamp(self.min_intensity, self.max_intensity);
        (clamped - self.min_intensity) / (self.max_intensity - self.min_intensity)
    }

    /// Map a normalized intensity to a color using the gradient
    pub fn color_at(&self, normalized: f64) -> Color {
        let (first, last) = match (self.gradient.first(), self.gradient.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::TRANSPARENT,
        };
        let t = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };

        let color = if t <= first.offset {
            // Fade in from transparent below the first stop
            let fade = if first.offset > 0.0 { t / first.offset } else { 1.0 };
            first.color.with_opacity(fade as f32)
        } else if t >= last.offset {
            last.color
        } else {
            self.gradient
                .windows(2)
                .find(|pair| t >= pair[0].offset && t <= pair[1].offset)
                .map(|pair| {
                    let local = (t - pair[0].offset) / (pair[1].offset - pair[0].offset);
                    pair[0].color.lerp(&pair[1].color, local)
                })
                .unwrap_or(last.color)
        };

        color.with_opacity(self.opacity)
    }

    /// Per-point attenuation below `max_zoom`, halving per zoom level (capped at 12 levels)
    pub fn zoom_scale(&self, zoom: f64) -> f64 {
        let levels = (self.max_zoom - zoom).clamp(0.0, 12.0);
        1.0 / 2_f64.powf(levels)
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: 15.0,
            blur: 20.0,
            min_intensity: 0.0,
            max_intensity: 1.0,
            opacity: 0.8,
            max_zoom: 17.0,
            gradient: vec![
                GradientStop::new(0.4, Color::BLUE),
                GradientStop::new(0.6, Color::LIME),
                GradientStop::new(0.8, Color::YELLOW),
                GradientStop::new(1.0, Color::RED),
            ],
        }
    }
}

/// A weighted heat sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub position: LatLng,
    /// Raw weight from the intensity model, not yet clamped
    pub weight: f64,
}

/// Accumulated heat over the visible area, one value per square cell
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub cell_size: f64,
    pub width: usize,
    pub height: usize,
    /// Row-major normalized intensities in `[0, 1]`
    pub values: Vec<f64>,
}

impl DensityGrid {
    pub fn value_at(&self, col: usize, row: usize) -> f64 {
        if col >= self.width || row >= self.height {
            return 0.0;
        }
        self.values[row * self.width + col]
    }

    /// Container-pixel center of a cell
    pub fn cell_center(&self, col: usize, row: usize) -> Point {
        Point::new(
            (col as f64 + 0.5) * self.cell_size,
            (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Non-empty cells as `(center, value)`
    pub fn hot_cells(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(move |(i, v)| (self.cell_center(i % self.width, i / self.width), *v))
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone)]
struct DensityCache {
    viewport: Viewport,
    grid: DensityGrid,
}

/// Heat layer built from one accident batch
#[derive(Debug, Clone)]
pub struct HeatLayer {
    properties: LayerProperties,
    config: HeatmapConfig,
    points: Vec<HeatPoint>,
    cache: Option<DensityCache>,
}

impl HeatLayer {
    /// Builds a heat layer; every point must carry finite, in-range coordinates
    pub fn build(
        points: &[&AccidentPoint],
        model: &IntensityModel,
        config: &HeatmapConfig,
        generation: RenderGeneration,
    ) -> Result<Self> {
        config.validate()?;

        let mut heat_points = Vec::with_capacity(points.len());
        for point in points {
            let position = point
                .position()
                .filter(LatLng::is_valid)
                .ok_or_else(|| {
                    MapError::InvalidGeometry(format!(
                        "accident {} has no placeable coordinates ({:?}, {:?})",
                        point.id, point.latitude, point.longitude
                    ))
                })?;
            let weight = model.weight(point);
            if !weight.is_finite() {
                return Err(MapError::InvalidGeometry(format!(
                    "accident {} produced non-finite weight {weight}",
                    point.id
                )));
            }
            heat_points.push(HeatPoint { position, weight });
        }

        Ok(Self {
            properties: LayerProperties::new(LayerType::Heatmap, generation)
                .with_opacity(config.opacity),
            config: config.clone(),
            points: heat_points,
            cache: None,
        })
    }

    pub fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn points(&self) -> &[HeatPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(self.points.iter().map(|p| p.position))
    }

    /// Weight of each point as the gradient sees it
    pub fn normalized_weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| self.config.normalize(p.weight))
    }

    /// Heat accumulated over the viewport; cached until the view changes
    pub fn density_grid(&mut self, viewport: &Viewport) -> &DensityGrid {
        if self
            .cache
            .as_ref()
            .map_or(false, |cache| cache.viewport != *viewport)
        {
            self.cache = None;
        }

        let config = &self.config;
        let points = &self.points;
        &self
            .cache
            .get_or_insert_with(|| DensityCache {
                viewport: viewport.clone(),
                grid: compute_grid(config, points, viewport),
            })
            .grid
    }
}

fn compute_grid(config: &HeatmapConfig, points: &[HeatPoint], viewport: &Viewport) -> DensityGrid {
    let cell_size = (config.radius / 2.0).max(1.0);
    let width = (viewport.size.x.max(0.0) / cell_size).ceil() as usize;
    let height = (viewport.size.y.max(0.0) / cell_size).ceil() as usize;
    let mut values = vec![0.0; width * height];

    if width == 0 || height == 0 {
        return DensityGrid {
            cell_size,
            width,
            height,
            values,
        };
    }

    let reach = config.radius + config.blur;
    let sigma = config.blur.max(1.0);
    let two_sigma_sq = 2.0 * sigma * sigma;
    let zoom_scale = config.zoom_scale(viewport.zoom);

    for point in points {
        let px = viewport.lat_lng_to_pixel(&point.position);
        if px.x < -reach
            || px.y < -reach
            || px.x > viewport.size.x + reach
            || px.y > viewport.size.y + reach
        {
            continue;
        }

        let weight = config.normalize(point.weight) * zoom_scale;
        let col_min = ((px.x - reach) / cell_size).floor().max(0.0) as usize;
        let row_min = ((px.y - reach) / cell_size).floor().max(0.0) as usize;
        let col_max = (((px.x + reach) / cell_size).ceil() as usize).min(width - 1);
        let row_max = (((px.y + reach) / cell_size).ceil() as usize).min(height - 1);

        for row in row_min..=row_max {
            for col in col_min..=col_max {
                let center = Point::new(
                    (col as f64 + 0.5) * cell_size,
                    (row as f64 + 0.5) * cell_size,
                );
                let distance_sq = (center.x - px.x).powi(2) + (center.y - px.y).powi(2);
                if distance_sq <= reach * reach {
                    values[row * width + col] += weight * (-distance_sq / two_sigma_sq).exp();
                }
            }
        }
    }

    for value in &mut values {
        *value = value.min(1.0);
    }

    DensityGrid {
        cell_size,
        width,
        height,
        values,
    }
}
