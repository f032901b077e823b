//! marchland: trace region borders out of a region map image.
//!
//! Reads a color-coded region map (every region painted in one exact
//! color), traces the border between every pair of touching regions, and
//! prints a diagnostics report. Useful for:
//!
//! - Exporting borders as SVG for inspection or JSON for a host application
//! - Tuning the simplification tolerance against point counts
//! - Measuring per-stage durations on large maps
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin marchland -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use marchland_trace::diagnostics::{Clock, TraceDiagnostics};
use marchland_trace::{Color, RegionDefinition, RegionRegistry, TraceConfig, TraceOutput};

/// Region border tracing for color-coded maps.
///
/// Traces one border per pair of touching regions and prints per-stage
/// timing and count diagnostics.
#[derive(Parser)]
#[command(name = "marchland", version)]
struct Cli {
    /// Path to the region map image (PNG, BMP).
    image_path: PathBuf,

    /// RDP simplification tolerance in normalized units.
    #[arg(long, default_value_t = TraceConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    simplify_tolerance: f64,

    /// Color meaning "no region", as `#rrggbb`.
    #[arg(long, default_value_t = TraceConfig::DEFAULT_BACKGROUND)]
    background: Color,

    /// Keep unsimplified runs alongside the simplified ones.
    #[arg(long)]
    retain_raw: bool,

    /// Full trace config as a JSON string.
    ///
    /// When provided, all other trace parameter flags are ignored.
    /// The JSON must be a valid `TraceConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// JSON file holding an array of region definitions.
    ///
    /// Without it every distinct non-background color becomes a region.
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write border records as JSON to file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    report_json: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build a [`TraceConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<TraceConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        TraceConfig {
            simplify_tolerance: cli.simplify_tolerance,
            background: cli.background,
            retain_raw: cli.retain_raw,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn read_definitions(path: &Path) -> Result<Vec<RegionDefinition>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let definitions = match cli.regions.as_deref().map(read_definitions).transpose() {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match marchland_trace::diagnostics::trace_image_with_diagnostics(
            &image_bytes,
            definitions.clone(),
            &config,
            &StdClock,
        ) {
            Ok((output, regions, diagnostics)) => {
                if run == 0 {
                    log_regions(&regions);
                }

                if cli.report_json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write outputs on the first run only.
                if run == 0 && !write_outputs(&cli, &config, &output) {
                    return ExitCode::FAILURE;
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Trace error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

fn log_regions(regions: &RegionRegistry) {
    for region in regions.regions() {
        log::debug!(
            "region {} {} {}: {} neighbors",
            region.id(),
            region.color(),
            region.name().unwrap_or("-"),
            region.borders().len(),
        );
    }
}

/// Write the requested SVG and JSON files. Returns `false` on failure.
fn write_outputs(cli: &Cli, config: &TraceConfig, output: &TraceOutput) -> bool {
    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("marchland");
        let config_json = serde_json::to_string(config).ok();
        let metadata = marchland_export::SvgMetadata {
            title: Some(title),
            description: Some("Region borders traced by marchland"),
            config_json: config_json.as_deref(),
        };
        let svg = marchland_export::to_svg(
            &output.borders,
            output.dimensions,
            &metadata,
            &marchland_export::SvgStyle::default(),
        );
        if !write_file(svg_path, &svg, "SVG") {
            return false;
        }
    }

    if let Some(ref json_path) = cli.json {
        match marchland_export::to_json(&output.borders, output.dimensions) {
            Ok(json) => {
                if !write_file(json_path, &json, "JSON") {
                    return false;
                }
            }
            Err(e) => {
                eprintln!("Error serializing borders: {e}");
                return false;
            }
        }
    }

    true
}

fn write_file(path: &Path, contents: &str, kind: &str) -> bool {
    match std::fs::write(path, contents) {
        Ok(()) => {
            eprintln!(
                "{kind} written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
            true
        }
        Err(e) => {
            eprintln!("Error writing {kind} to {}: {e}", path.display());
            false
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&TraceDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[TraceDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| d.decode.duration),
        ("Region Registry", |d| d.registry.duration),
        ("Border Trace", |d| d.trace.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("marchland").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_trace_config() {
        let cli = parse(&["map.png"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, TraceConfig::default());
        assert_eq!(cli.runs, 1);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "map.png",
            "--simplify-tolerance",
            "0.01",
            "--background",
            "#ffffff",
            "--retain-raw",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.simplify_tolerance - 0.01).abs() < 1e-12);
        assert_eq!(config.background, Color::new(255, 255, 255));
        assert!(config.retain_raw);
    }

    #[test]
    fn config_json_wins_over_flags() {
        let cli = parse(&[
            "map.png",
            "--simplify-tolerance",
            "0.5",
            "--config-json",
            r##"{"simplify_tolerance":0.0,"background":"#102030"}"##,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!(config.simplify_tolerance.abs() < 1e-12);
        assert_eq!(config.background, Color::new(0x10, 0x20, 0x30));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let cli = parse(&["map.png", "--simplify-tolerance=-1"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn zero_runs_is_rejected() {
        let result = Cli::try_parse_from(["marchland", "map.png", "--runs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn bad_background_is_rejected() {
        let result = Cli::try_parse_from(["marchland", "map.png", "--background", "red"]);
        assert!(result.is_err());
    }
}
