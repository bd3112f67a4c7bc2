use crate::core::constants::{CLUSTER_LARGE_THRESHOLD, CLUSTER_MEDIUM_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::from_rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::from_rgb(255, 255, 255);
    pub const BLACK: Color = Color::from_rgb(0, 0, 0);
    pub const BLUE: Color = Color::from_rgb(0, 0, 255);
    pub const LIME: Color = Color::from_rgb(0, 255, 0);
    pub const YELLOW: Color = Color::from_rgb(255, 255, 0);
    pub const RED: Color = Color::from_rgb(255, 0, 0);

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba(r, g, b, 255)
    }

    /// CSS-style `rgba(r, g, b, alpha)` with a fractional alpha
    pub fn from_rgb_alpha(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self::from_rgba(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Parses `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Linear interpolation between two colors, `t` in [0, 1]
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
        Color::from_rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Scales the alpha channel by `factor`
    pub fn with_opacity(&self, factor: f32) -> Color {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Color::from_rgba(self.r, self.g, self.b, a)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(feature = "egui")]
impl From<Color> for egui::Color32 {
    fn from(color: Color) -> Self {
        egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

/// Size tier of a cluster badge, chosen by child count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterTier {
    Small,
    Medium,
    Large,
}

impl ClusterTier {
    pub fn for_count(count: usize, medium_threshold: usize, large_threshold: usize) -> Self {
        if count >= large_threshold {
            ClusterTier::Large
        } else if count >= medium_threshold {
            ClusterTier::Medium
        } else {
            ClusterTier::Small
        }
    }

    /// Tier using the dashboard's default thresholds (<10, <100, >=100)
    pub fn for_count_default(count: usize) -> Self {
        Self::for_count(count, CLUSTER_MEDIUM_THRESHOLD, CLUSTER_LARGE_THRESHOLD)
    }
}

/// Visual style of one cluster badge: a translucent halo around a filled disc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterStyle {
    pub halo: Color,
    pub fill: Color,
    pub text: Color,
    pub diameter: f32,
    /// CSS class the badge carries in HTML hosts
    pub class_name: &'static str,
}

/// Per-tier styles for plain and fatal clusters
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPalette {
    pub plain: [ClusterStyle; 3],
    pub fatal: [ClusterStyle; 3],
}

impl ClusterPalette {
    pub fn style_for(&self, tier: ClusterTier, fatal: bool) -> &ClusterStyle {
        let styles = if fatal { &self.fatal } else { &self.plain };
        match tier {
            ClusterTier::Small => &styles[0],
            ClusterTier::Medium => &styles[1],
            ClusterTier::Large => &styles[2],
        }
    }
}

impl Default for ClusterPalette {
    fn default() -> Self {
        let style = |halo: Color, fill: Color, class_name: &'static str| ClusterStyle {
            halo,
            fill,
            text: Color::WHITE,
            diameter: 40.0,
            class_name,
        };

        Self {
            plain: [
                style(
                    Color::from_rgb_alpha(181, 226, 140, 0.6),
                    Color::from_rgb_alpha(110, 204, 57, 0.6),
                    "marker-cluster-small",
                ),
                style(
                    Color::from_rgb_alpha(241, 211, 87, 0.6),
                    Color::from_rgb_alpha(240, 194, 12, 0.6),
                    "marker-cluster-medium",
                ),
                style(
                    Color::from_rgb_alpha(253, 156, 115, 0.6),
                    Color::from_rgb_alpha(241, 128, 23, 0.6),
                    "marker-cluster-large",
                ),
            ],
            fatal: [
                style(
                    Color::from_rgb_alpha(255, 152, 150, 0.6),
                    Color::from_rgb_alpha(211, 47, 47, 0.6),
                    "marker-cluster-fatal-small",
                ),
                style(
                    Color::from_rgb_alpha(255, 132, 130, 0.6),
                    Color::from_rgb_alpha(211, 47, 47, 0.7),
                    "marker-cluster-fatal-medium",
                ),
                style(
                    Color::from_rgb_alpha(255, 112, 110, 0.6),
                    Color::from_rgb_alpha(211, 47, 47, 0.8),
                    "marker-cluster-fatal-large",
                ),
            ],
        }
    }
}

/// Severity class of a single accident marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerSeverity {
    Fatal,
    Injured,
    Simple,
}

impl MarkerSeverity {
    pub fn for_counts(fatalities: u32, injuries: u32) -> Self {
        if fatalities > 0 {
            MarkerSeverity::Fatal
        } else if injuries > 0 {
            MarkerSeverity::Injured
        } else {
            MarkerSeverity::Simple
        }
    }

    /// Pin color
    pub fn marker_color(&self) -> Color {
        match self {
            MarkerSeverity::Fatal => Color::from_rgb(0xd3, 0x2f, 0x2f),
            MarkerSeverity::Injured => Color::from_rgb(0xf5, 0x7c, 0x00),
            MarkerSeverity::Simple => Color::from_rgb(0x19, 0x76, 0xd2),
        }
    }

    /// Popup header color
    pub fn header_color(&self) -> Color {
        self.marker_color()
    }

    /// Popup casualty box background
    pub fn background_color(&self) -> Color {
        match self {
            MarkerSeverity::Fatal => Color::from_rgb(0xff, 0xeb, 0xee),
            MarkerSeverity::Injured => Color::from_rgb(0xff, 0xf3, 0xe0),
            MarkerSeverity::Simple => Color::from_rgb(0xe3, 0xf2, 0xfd),
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            MarkerSeverity::Fatal => "acidente-fatal-marker",
            MarkerSeverity::Injured => "acidente-feridos-marker",
            MarkerSeverity::Simple => "acidente-simples-marker",
        }
    }
}

/// Style configuration for hosts that paint the map themselves
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    /// Background color behind the data layers
    pub background_color: Color,
    /// Radius of an unclustered marker, in pixels
    pub marker_radius: f32,
    /// Outline drawn around unclustered markers
    pub marker_outline: Color,
    /// Cluster badge styles
    pub clusters: ClusterPalette,
    /// Color of the error notice text
    pub error_text: Color,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background_color: Color::from_rgb(0xe5, 0xe3, 0xdf),
            marker_radius: 6.0,
            marker_outline: Color::WHITE,
            clusters: ClusterPalette::default(),
            error_text: Color::from_rgb(0xd3, 0x2f, 0x2f),
        }
    }
}
