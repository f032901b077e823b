//! marchland-trace: region border tracing over color-coded rasters (sans-IO).
//!
//! Takes a raster where every region is painted in one exact color and
//! produces one [`Border`] per pair of touching regions, each a list of
//! simplified polylines in normalized `[0, 1]` coordinates:
//!
//! raster -> boundary walk -> point runs -> simplification -> borders.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers and returns structured data. Reading
//! files and writing SVG/JSON lives in `marchland-cli` and
//! `marchland-export`.

pub mod border;
pub mod diagnostics;
pub mod emit;
pub mod grid;
pub mod raster;
pub mod region;
pub mod simplify;
pub mod tracer;
pub mod types;

pub use border::{Border, BorderGraph, BorderRenderer, RegionPair};
pub use grid::{Direction, PixelGrid};
pub use raster::{RegionRaster, decode};
pub use region::{RegionDefinition, RegionIndex, RegionRegistry};
pub use tracer::{BoundaryTracer, TraceOutput, TraceSeed, TraceStats, TraceStatus};
pub use types::{
    BorderId, Color, Dimensions, ParseColorError, Point, Polyline, RegionId, TraceConfig,
    TraceError,
};

/// Trace every border of `raster` against a host region index.
///
/// Runs the [`BoundaryTracer`] to completion. Borders are registered on
/// `regions` through [`RegionIndex::link`] as they are discovered.
///
/// # Errors
///
/// Returns [`TraceError::InvalidConfig`] if `config` is invalid and
/// [`TraceError::UnknownRegionColor`] if a traced pixel's color is not
/// in `regions`; no partial result is returned in that case.
pub fn trace_borders<R: RegionIndex + ?Sized>(
    raster: &RegionRaster,
    regions: &mut R,
    config: &TraceConfig,
) -> Result<TraceOutput, TraceError> {
    let mut tracer = BoundaryTracer::new(raster, regions, config)?;
    tracer.run_to_completion()?;
    Ok(tracer.finish())
}

/// Decode image bytes (PNG, BMP) and trace them, registering every
/// distinct non-background color as a region.
///
/// Region ids are assigned in raster order (bottom row first) starting
/// at 0; the returned registry maps them back to colors.
///
/// # Errors
///
/// Returns [`TraceError::EmptyInput`] if `image_bytes` is empty,
/// [`TraceError::ImageDecode`] if the image cannot be decoded, and
/// [`TraceError::InvalidConfig`] if `config` is invalid.
pub fn trace_image(
    image_bytes: &[u8],
    config: &TraceConfig,
) -> Result<(TraceOutput, RegionRegistry), TraceError> {
    config.validate()?;
    let raster = raster::decode(image_bytes)?;
    let mut regions = RegionRegistry::from_raster(&raster, config.background);
    let output = trace_borders(&raster, &mut regions, config)?;
    Ok((output, regions))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode an RGBA image as PNG bytes.
    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn trace_image_empty_input() {
        let result = trace_image(&[], &TraceConfig::default());
        assert!(matches!(result, Err(TraceError::EmptyInput)));
    }

    #[test]
    fn trace_image_corrupt_input() {
        let result = trace_image(&[0xFF, 0x00], &TraceConfig::default());
        assert!(matches!(result, Err(TraceError::ImageDecode(_))));
    }

    #[test]
    fn trace_image_uniform_image_has_no_borders() {
        let img = image::RgbaImage::from_fn(12, 12, |_, _| image::Rgba([90, 120, 30, 255]));
        let (output, regions) = trace_image(&encode_png(&img), &TraceConfig::default()).unwrap();
        assert!(output.borders.is_empty());
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn trace_image_black_image_has_no_regions() {
        let img = image::RgbaImage::from_fn(5, 5, |_, _| image::Rgba([0, 0, 0, 255]));
        let (output, regions) = trace_image(&encode_png(&img), &TraceConfig::default()).unwrap();
        assert!(output.borders.is_empty());
        assert!(regions.is_empty());
        assert_eq!(output.stats.pixel_steps, 0);
    }

    #[test]
    fn trace_image_horizontal_split() {
        // Top half (image rows 0..5) is region drawn in red, bottom half blue.
        let img = image::RgbaImage::from_fn(10, 10, |_, y| {
            if y < 5 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        let (output, regions) = trace_image(&encode_png(&img), &TraceConfig::default()).unwrap();
        assert_eq!(output.borders.len(), 1);
        assert_eq!(
            output.dimensions,
            Dimensions {
                width: 10,
                height: 10
            }
        );

        // The bottom rows are blue, so blue is registered first.
        let blue = regions.lookup_by_color(Color::new(0, 0, 255)).unwrap();
        let red = regions.lookup_by_color(Color::new(255, 0, 0)).unwrap();
        assert_eq!((blue, red), (RegionId(0), RegionId(1)));

        let border = output.find(blue, red).unwrap();
        for polyline in border.polylines() {
            for p in polyline.points() {
                assert!((p.y - 0.5).abs() < 1e-12, "point off the seam: {p:?}");
            }
        }
    }

    #[test]
    fn custom_background_is_never_a_region() {
        let img = image::RgbaImage::from_fn(6, 6, |x, _| match x {
            0 | 5 => image::Rgba([255, 255, 255, 255]),
            1..=2 => image::Rgba([10, 200, 10, 255]),
            _ => image::Rgba([200, 10, 10, 255]),
        });
        let config = TraceConfig {
            background: Color::new(255, 255, 255),
            ..TraceConfig::default()
        };
        let (output, regions) = trace_image(&encode_png(&img), &config).unwrap();
        assert_eq!(regions.len(), 2);
        assert!(
            regions
                .lookup_by_color(Color::new(255, 255, 255))
                .is_none()
        );
        assert_eq!(output.borders.len(), 1);
    }

    #[test]
    fn trace_borders_rejects_bad_config() {
        let raster = RegionRaster::new(1, 1, vec![Color::new(1, 1, 1)]).unwrap();
        let mut regions = RegionRegistry::from_raster(&raster, Color::BLACK);
        let config = TraceConfig {
            simplify_tolerance: -1.0,
            ..TraceConfig::default()
        };
        assert!(matches!(
            trace_borders(&raster, &mut regions, &config),
            Err(TraceError::InvalidConfig(_))
        ));
    }
}
