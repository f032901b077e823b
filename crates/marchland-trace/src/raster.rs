//! Region rasters: the row-major color buffer the tracer walks.
//!
//! Rows are stored bottom-up: row 0 is the bottom edge of the map and
//! `y` grows upward, matching the texture convention the direction table
//! in [`crate::grid`] assumes. [`decode`] flips the top-down rows of a
//! PNG/BMP into this layout.

use image::RgbaImage;

use crate::types::{Color, Dimensions, TraceError};

/// A rectangular buffer of region colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRaster {
    dimensions: Dimensions,
    pixels: Vec<Color>,
}

impl RegionRaster {
    /// Wrap a bottom-up, row-major pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::DimensionOverflow`] if `width * height`
    /// does not fit in `usize`, and [`TraceError::RasterSizeMismatch`]
    /// if `pixels` has the wrong length.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, TraceError> {
        let dimensions = Dimensions { width, height };
        let expected = dimensions
            .pixel_count()
            .ok_or(TraceError::DimensionOverflow { width, height })?;
        if pixels.len() != expected {
            return Err(TraceError::RasterSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { dimensions, pixels })
    }

    /// Build a raster from rows listed top-down, the way a picture reads.
    ///
    /// Convenient for hand-written fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::RasterSizeMismatch`] if the rows are ragged.
    pub fn from_rows_top_down(rows: &[&[Color]]) -> Result<Self, TraceError> {
        let width = rows.first().map_or(0, |r| r.len());
        let mut pixels = Vec::with_capacity(width * rows.len());
        for row in rows.iter().rev() {
            if row.len() != width {
                return Err(TraceError::RasterSizeMismatch {
                    expected: width * rows.len(),
                    actual: rows.iter().map(|r| r.len()).sum(),
                });
            }
            pixels.extend_from_slice(row);
        }
        let width = u32::try_from(width).map_err(|_| TraceError::DimensionOverflow {
            width: u32::MAX,
            height: u32::MAX,
        })?;
        let height = u32::try_from(rows.len()).map_err(|_| TraceError::DimensionOverflow {
            width,
            height: u32::MAX,
        })?;
        Self::new(width, height, pixels)
    }

    /// Convert a decoded RGBA image (top-down rows) into a raster.
    /// Alpha is discarded.
    #[must_use]
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let pixels = image
            .rows()
            .rev()
            .flat_map(|row| row.map(|p| Color::new(p.0[0], p.0[1], p.0[2])))
            .collect();
        Self {
            dimensions: Dimensions {
                width: image.width(),
                height: image.height(),
            },
            pixels,
        }
    }

    /// Raster dimensions in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// All pixels, bottom row first.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Returns `true` if the raster has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Color at `(x, y)` with `y = 0` at the bottom, if in bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let index = usize::try_from(y).ok()? * usize::try_from(self.width()).ok()?
            + usize::try_from(x).ok()?;
        self.pixels.get(index).copied()
    }
}

/// Decode raw image bytes (PNG, BMP) into a [`RegionRaster`].
///
/// # Errors
///
/// Returns [`TraceError::EmptyInput`] if `bytes` is empty.
/// Returns [`TraceError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RegionRaster, TraceError> {
    if bytes.is_empty() {
        return Err(TraceError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(RegionRaster::from_rgba(&img.to_rgba8()))
}
