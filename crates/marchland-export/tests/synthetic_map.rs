//! Integration test: trace a synthetic three-province map and export it to SVG and JSON.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use marchland_trace::{Color, RegionIndex, TraceConfig, trace_image};

const RED: [u8; 4] = [200, 30, 30, 255];
const GREEN: [u8; 4] = [30, 200, 30, 255];
const BLUE: [u8; 4] = [30, 30, 200, 255];

/// Three vertical bands: red, green, blue.
fn banded_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, _y| {
        image::Rgba(match x * 3 / width {
            0 => RED,
            1 => GREEN,
            _ => BLUE,
        })
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
fn banded_map_to_svg_and_json() {
    let png = banded_png(12, 9);
    let config = TraceConfig::default();
    let (output, regions) = trace_image(&png, &config).expect("trace should succeed");

    let red = regions.lookup_by_color(Color::new(200, 30, 30)).unwrap();
    let green = regions.lookup_by_color(Color::new(30, 200, 30)).unwrap();
    let blue = regions.lookup_by_color(Color::new(30, 30, 200)).unwrap();

    eprintln!(
        "Traced {} borders with {} points, image {}x{}",
        output.borders.len(),
        output.point_count(),
        output.dimensions.width,
        output.dimensions.height,
    );
    assert_eq!(output.borders.len(), 2);
    assert!(output.find(red, green).is_some());
    assert!(output.find(green, blue).is_some());
    assert!(output.find(red, blue).is_none());

    // Export to SVG.
    let config_json = serde_json::to_string(&config).unwrap();
    let metadata = marchland_export::SvgMetadata {
        title: Some("banded"),
        config_json: Some(&config_json),
        ..marchland_export::SvgMetadata::default()
    };
    let svg = marchland_export::to_svg(
        &output.borders,
        output.dimensions,
        &metadata,
        &marchland_export::SvgStyle::default(),
    );
    assert!(svg.contains("<svg"));
    assert!(svg.contains(r#"viewBox="0 0 12 9""#));
    assert_eq!(svg.matches("<g").count(), 2);
    // Both seams are vertical lines at pixel columns 4 and 8.
    assert!(svg.contains("M4,0 L4,9") || svg.contains("M4,9 L4,0"));
    assert!(svg.contains("M8,0 L8,9") || svg.contains("M8,9 L8,0"));
    assert!(svg.contains("</svg>"));

    // Export to JSON and read it back.
    let json = marchland_export::to_json(&output.borders, output.dimensions).unwrap();
    let doc = marchland_export::from_json(&json).unwrap();
    assert_eq!(doc.borders.len(), 2);
    for (record, border) in doc.borders.iter().zip(&output.borders) {
        assert_eq!(record.id, border.id().0);
        assert_eq!(record.to_polylines(), border.polylines());
    }

    // Write both outputs under target/ so they can be inspected.
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();
    let target = workspace_root.join("target");
    std::fs::create_dir_all(&target).unwrap();
    let svg_path = target.join("banded-output.svg");
    std::fs::write(&svg_path, &svg).unwrap();
    std::fs::write(target.join("banded-output.json"), &json).unwrap();
    eprintln!("SVG written to {svg_path:?} ({} bytes)", svg.len());
}
