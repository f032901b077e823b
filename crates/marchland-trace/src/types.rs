//! Shared types for the marchland border tracer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An exact RGB pixel color.
///
/// Region rasters encode region identity as a discrete color, so colors
/// are compared exactly. Alpha is ignored when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Pure black, the default background sentinel.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Error returned when a string is not a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseColorError {
    /// Not six ASCII characters after the optional `#`.
    #[error("expected a color of the form #rrggbb, got {0:?}")]
    Format(String),

    /// A channel is not a hexadecimal byte.
    #[error("invalid color {input:?}: {source}")]
    Channel {
        /// The rejected input.
        input: String,
        /// Hex parse failure for the channel.
        source: std::num::ParseIntError,
    },
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError::Format(s.to_owned()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|source| ParseColorError::Channel {
                input: s.to_owned(),
                source,
            })
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a region in a [`RegionIndex`](crate::region::RegionIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sequential identifier of a [`Border`](crate::border::Border), assigned
/// in creation order within one trace run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorderId(pub u32);

impl fmt::Display for BorderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A 2D point in normalized image coordinates.
///
/// `x` runs from the left edge (0.0) to the right edge (1.0); `y` runs
/// from the bottom row (0.0) to the top edge (1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (`u`).
    pub x: f64,
    /// Vertical position (`v`).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points forming one border run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Returns `true` if the first and last points coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.len() > 2 && self.first() == self.last()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count, or `None` if it does not fit in `usize`.
    #[must_use]
    pub fn pixel_count(self) -> Option<usize> {
        let w = usize::try_from(self.width).ok()?;
        let h = usize::try_from(self.height).ok()?;
        w.checked_mul(h)
    }
}

/// Configuration for a trace run.
///
/// All parameters have sensible defaults. Call [`validate`](Self::validate)
/// before use when the values come from an untrusted source; the trace
/// entry points validate on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Ramer-Douglas-Peucker tolerance in normalized image units.
    /// Higher values remove more points. `0.0` only drops exactly
    /// collinear points.
    pub simplify_tolerance: f64,

    /// The reserved "no region" color. Background pixels are never
    /// traced and never belong to a border.
    pub background: Color,

    /// Keep each run's unsimplified points on its border alongside the
    /// simplified polyline.
    pub retain_raw: bool,
}

impl TraceConfig {
    /// Default RDP tolerance (normalized units).
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.001;

    /// Default background sentinel.
    pub const DEFAULT_BACKGROUND: Color = Color::BLACK;

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidConfig`] if the simplification
    /// tolerance is negative, NaN, or infinite.
    pub fn validate(&self) -> Result<(), TraceError> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(TraceError::InvalidConfig(format!(
                "simplify_tolerance must be a finite non-negative number, got {}",
                self.simplify_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
            background: Self::DEFAULT_BACKGROUND,
            retain_raw: false,
        }
    }
}

/// Errors that can occur while building inputs for, or running, a trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// A traced or bordering pixel color has no region in the registry.
    /// Fatal: the whole run aborts.
    #[error("no region registered for color {color} at pixel ({x}, {y})")]
    UnknownRegionColor {
        /// The unresolved color.
        color: Color,
        /// Pixel column.
        x: u32,
        /// Pixel row (0 = bottom).
        y: u32,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The pixel buffer does not match the declared dimensions.
    #[error("raster has {actual} pixels but {expected} were expected")]
    RasterSizeMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// `width * height` does not fit in memory addressing.
    #[error("raster dimensions {width}x{height} are too large")]
    DimensionOverflow {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Trace configuration is invalid.
    #[error("invalid trace configuration: {0}")]
    InvalidConfig(String),

    /// Two region definitions share a color or an id.
    #[error("duplicate region definition: {0}")]
    DuplicateRegion(String),

    /// A region definition uses the background color.
    #[error("region color {0} is the background color")]
    BackgroundRegion(Color),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Color tests ---

    #[test]
    fn color_display_is_lowercase_hex() {
        assert_eq!(Color::new(255, 10, 0).to_string(), "#ff0a00");
    }

    #[test]
    fn color_parse_with_and_without_hash() {
        assert_eq!("#10ff20".parse::<Color>().unwrap(), Color::new(16, 255, 32));
        assert_eq!("10FF20".parse::<Color>().unwrap(), Color::new(16, 255, 32));
    }

    #[test]
    fn color_parse_rejects_bad_input() {
        assert_eq!(
            "#fff".parse::<Color>(),
            Err(ParseColorError::Format("#fff".to_owned()))
        );
        assert!(matches!(
            "#gg0000".parse::<Color>(),
            Err(ParseColorError::Channel { ref input, .. }) if input == "#gg0000"
        ));
        assert!(matches!(
            "#ff00ñ".parse::<Color>(),
            Err(ParseColorError::Format(_))
        ));
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::new(1, 2, 3));
    }

    // --- Point / Polyline tests ---

    #[test]
    fn point_distance() {
        let d = Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn polyline_closed_detection() {
        let open = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(!open.is_closed());
        let closed = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        assert!(closed.is_closed());
    }

    #[test]
    fn polyline_serializes_as_point_array() {
        let pl = Polyline::new(vec![Point::new(0.5, 0.25)]);
        let json = serde_json::to_string(&pl).unwrap();
        assert_eq!(json, r#"[{"x":0.5,"y":0.25}]"#);
    }

    // --- Dimensions tests ---

    #[test]
    fn dimensions_pixel_count() {
        let dims = Dimensions {
            width: 7,
            height: 3,
        };
        assert_eq!(dims.pixel_count(), Some(21));
    }

    // --- TraceConfig tests ---

    #[test]
    fn default_config_is_valid() {
        assert!(TraceConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let config = TraceConfig {
            simplify_tolerance: -0.5,
            ..TraceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TraceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn nan_tolerance_is_rejected() {
        let config = TraceConfig {
            simplify_tolerance: f64::NAN,
            ..TraceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_missing_fields() {
        let config: TraceConfig = serde_json::from_str(r#"{"retain_raw":true}"#).unwrap();
        assert!(config.retain_raw);
        assert_eq!(config.background, Color::BLACK);
        assert!((config.simplify_tolerance - TraceConfig::DEFAULT_SIMPLIFY_TOLERANCE).abs() < 1e-12);
    }
}
