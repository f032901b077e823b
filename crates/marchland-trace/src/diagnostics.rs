//! Run diagnostics: timing and counts for each stage of a trace.
//!
//! The core crate never reads a clock itself. Hosts pass a [`Clock`]
//! so the same code runs natively, in a browser, or under a fake clock
//! in tests.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::raster;
use crate::region::{RegionDefinition, RegionRegistry};
use crate::tracer::{BoundaryTracer, TraceOutput};
use crate::types::{Color, TraceConfig, TraceError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source supplied by the host.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from one decode-and-trace run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Region registry construction.
    pub registry: StageDiagnostics,
    /// Boundary tracing, including simplification.
    pub trace: StageDiagnostics,
    /// Wall-clock duration of the whole run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts.
    pub summary: TraceSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
        /// `width * height`.
        pixel_count: u64,
    },
    /// Registry construction metrics.
    Registry {
        /// Whether regions came from host definitions rather than the
        /// raster's own colors.
        from_definitions: bool,
        /// Number of registered regions.
        region_count: usize,
        /// Background color in effect.
        background: Color,
    },
    /// Tracing metrics.
    Trace {
        /// RDP tolerance in normalized units.
        tolerance: f64,
        /// Boundary components walked.
        components: usize,
        /// Pixels walked.
        pixel_steps: usize,
        /// Borders created.
        border_count: usize,
        /// Runs flushed into borders.
        polyline_count: usize,
        /// Points emitted before simplification.
        points_before: usize,
        /// Points kept after simplification.
        points_after: usize,
        /// `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
}

/// High-level summary counts for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Registered regions.
    pub region_count: usize,
    /// Borders produced.
    pub border_count: usize,
    /// Simplified points across every border.
    pub final_point_count: usize,
}

impl TraceDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Trace Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in [
            ("Decode", &self.decode),
            ("Registry", &self.registry),
            ("Trace", &self.trace),
        ] {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Regions: {}  |  Borders: {}  |  Final points: {}",
            self.summary.region_count, self.summary.border_count, self.summary.final_point_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Registry {
            from_definitions,
            region_count,
            background,
        } => {
            let source = if *from_definitions {
                "definitions"
            } else {
                "raster"
            };
            format!("{region_count} regions from {source}, background {background}")
        }
        StageMetrics::Trace {
            tolerance,
            components,
            pixel_steps,
            border_count,
            polyline_count,
            points_before,
            points_after,
            reduction_ratio,
        } => format!(
            "{components} walks, {pixel_steps} steps, {border_count} borders, \
             {polyline_count} polys, tol={tolerance} {points_before}->{points_after} pts \
             ({:.1}% reduction)",
            reduction_ratio * 100.0,
        ),
    }
}

/// `1.0 - after / before`, or `0.0` when nothing was emitted.
#[allow(clippy::cast_precision_loss)]
fn reduction_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        1.0 - after as f64 / before as f64
    }
}

/// Decode an image, build its region registry, and trace it, timing
/// each stage.
///
/// With `definitions` the registry is built from them; otherwise every
/// distinct non-background color of the image becomes a region.
///
/// # Errors
///
/// Returns the first [`TraceError`] from decoding, registry
/// construction, or tracing.
pub fn trace_image_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    definitions: Option<Vec<RegionDefinition>>,
    config: &TraceConfig,
    clock: &C,
) -> Result<(TraceOutput, RegionRegistry, TraceDiagnostics), TraceError> {
    config.validate()?;
    let run_start = clock.now();

    let start = clock.now();
    let raster = raster::decode(image_bytes)?;
    let dimensions = raster.dimensions();
    let pixel_count = u64::from(dimensions.width) * u64::from(dimensions.height);
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
            pixel_count,
        },
    };

    let start = clock.now();
    let from_definitions = definitions.is_some();
    let mut regions = match definitions {
        Some(definitions) => RegionRegistry::from_definitions(definitions, config.background)?,
        None => RegionRegistry::from_raster(&raster, config.background),
    };
    let registry = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Registry {
            from_definitions,
            region_count: regions.len(),
            background: config.background,
        },
    };

    let start = clock.now();
    let mut tracer = BoundaryTracer::new(&raster, &mut regions, config)?;
    tracer.run_to_completion()?;
    let output = tracer.finish();
    let stats = &output.stats;
    let trace = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Trace {
            tolerance: config.simplify_tolerance,
            components: stats.components_traced,
            pixel_steps: stats.pixel_steps,
            border_count: output.borders.len(),
            polyline_count: stats.runs_flushed,
            points_before: stats.raw_points,
            points_after: stats.simplified_points,
            reduction_ratio: reduction_ratio(stats.raw_points, stats.simplified_points),
        },
    };

    let diagnostics = TraceDiagnostics {
        decode,
        registry,
        trace,
        total_duration: clock.elapsed(&run_start),
        summary: TraceSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count,
            region_count: regions.len(),
            border_count: output.borders.len(),
            final_point_count: output.point_count(),
        },
    };

    Ok((output, regions, diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Advances one millisecond every time it is read.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn split_png() -> Vec<u8> {
        let img = image::RgbaImage::from_fn(8, 6, |x, _| {
            if x < 4 {
                image::Rgba([200, 40, 40, 255])
            } else {
                image::Rgba([40, 40, 200, 255])
            }
        });
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
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn reduction_ratio_of_nothing_is_zero() {
        assert!(reduction_ratio(0, 0).abs() < f64::EPSILON);
        assert!((reduction_ratio(10, 4) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let clock = TickClock(Cell::new(0));
        let (output, regions, diag) =
            trace_image_with_diagnostics(&split_png(), None, &TraceConfig::default(), &clock)
                .unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(output.borders.len(), 1);
        assert_eq!(diag.summary.border_count, 1);
        assert_eq!(diag.summary.pixel_count, 48);
        assert!(diag.total_duration >= diag.trace.duration);
        assert!(matches!(
            diag.registry.metrics,
            StageMetrics::Registry {
                from_definitions: false,
                region_count: 2,
                ..
            }
        ));
    }

    #[test]
    fn definitions_drive_the_registry() {
        let definitions: Vec<RegionDefinition> = serde_json::from_str(
            r##"[{"id": 10, "color": "#c82828"}, {"id": 20, "color": "#2828c8"}]"##,
        )
        .unwrap();
        let clock = TickClock(Cell::new(0));
        let (output, _, _) = trace_image_with_diagnostics(
            &split_png(),
            Some(definitions),
            &TraceConfig::default(),
            &clock,
        )
        .unwrap();
        let pair = output.borders[0].pair();
        assert_eq!((pair.low().0, pair.high().0), (10, 20));
    }

    #[test]
    fn missing_definition_is_reported() {
        let definitions = vec![RegionDefinition {
            id: crate::RegionId(1),
            color: Color::new(200, 40, 40),
            name: None,
        }];
        let clock = TickClock(Cell::new(0));
        let result = trace_image_with_diagnostics(
            &split_png(),
            Some(definitions),
            &TraceConfig::default(),
            &clock,
        );
        assert!(matches!(result, Err(TraceError::UnknownRegionColor { .. })));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = TickClock(Cell::new(0));
        let (_, _, diag) =
            trace_image_with_diagnostics(&split_png(), None, &TraceConfig::default(), &clock)
                .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert!(json["total_duration"].is_f64());
        assert_eq!(json["trace"]["metrics"]["Trace"]["border_count"], 1);

        let report = diag.report();
        assert!(report.contains("Trace Diagnostics Report"));
        assert!(report.contains("Registry"));
        assert!(report.contains("Borders: 1"));
    }
}
