//! Fixtures shared by the integration tests.
//!
//! Rasters are written as small region numbers, rows listed bottom-up
//! (`rows[0]` is `y = 0`). Region `k` is painted `(k, 0, 0)` and has id
//! `k`, so `0` is the background.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeSet;

use marchland_trace::{
    Color, Point, RegionDefinition, RegionId, RegionRaster, RegionRegistry, TraceOutput,
};

pub fn color(k: u8) -> Color {
    Color::new(k, 0, 0)
}

pub fn raster(rows: &[&[u8]]) -> RegionRaster {
    let width = u32::try_from(rows[0].len()).unwrap();
    let height = u32::try_from(rows.len()).unwrap();
    let pixels = rows
        .iter()
        .flat_map(|row| row.iter().map(|&k| color(k)))
        .collect();
    RegionRaster::new(width, height, pixels).unwrap()
}

pub fn raster_from_ids(width: usize, height: usize, ids: &[u8]) -> RegionRaster {
    let pixels = ids.iter().map(|&k| color(k)).collect();
    RegionRaster::new(
        u32::try_from(width).unwrap(),
        u32::try_from(height).unwrap(),
        pixels,
    )
    .unwrap()
}

/// Registry with one region per non-background color of `raster`.
pub fn registry(raster: &RegionRaster) -> RegionRegistry {
    let mut ids: Vec<u8> = raster
        .pixels()
        .iter()
        .map(|c| c.r)
        .filter(|&k| k > 0)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    RegionRegistry::from_definitions(
        ids.into_iter().map(|k| RegionDefinition {
            id: RegionId(u32::from(k)),
            color: color(k),
            name: None,
        }),
        Color::BLACK,
    )
    .unwrap()
}

/// Owned rows from a generator over `(x, y)`.
pub fn rows_from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> Vec<Vec<u8>> {
    (0..height)
        .map(|y| (0..width).map(|x| f(x, y)).collect())
        .collect()
}

pub fn as_slices(rows: &[Vec<u8>]) -> Vec<&[u8]> {
    rows.iter().map(Vec::as_slice).collect()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Half-pixel grid coordinates of a normalized point.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn half_units(p: Point, raster: &RegionRaster) -> (i64, i64) {
    (
        (p.x * f64::from(raster.width()) * 2.0).round() as i64,
        (p.y * f64::from(raster.height()) * 2.0).round() as i64,
    )
}

/// Midpoints (in half-pixel units) of every edge between two different
/// non-background regions. Lone pixels are not excluded, so only use it
/// on rasters without them.
pub fn expected_edges(raster: &RegionRaster) -> Vec<(i64, i64)> {
    let mut edges = Vec::new();
    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let here = raster.get(x, y).unwrap();
            let (hx, hy) = (i64::from(x) * 2, i64::from(y) * 2);
            let differs = |c: Option<Color>| {
                c.is_some_and(|c| c != here && c != Color::BLACK && here != Color::BLACK)
            };
            if differs(raster.get(x + 1, y)) {
                edges.push((hx + 2, hy + 1));
            }
            if differs(raster.get(x, y + 1)) {
                edges.push((hx + 1, hy + 2));
            }
        }
    }
    edges.sort_unstable();
    edges
}

/// Mid-edge points found in the unsimplified runs of an output traced
/// with `retain_raw`. Corners sit on whole pixel coordinates, mid-edge
/// points have exactly one half coordinate.
pub fn traced_edges(output: &TraceOutput, raster: &RegionRaster) -> Vec<(i64, i64)> {
    let mut edges: Vec<(i64, i64)> = output
        .borders
        .iter()
        .flat_map(|b| b.raw_polylines())
        .flat_map(|pl| pl.points().iter().copied())
        .map(|p| half_units(p, raster))
        .filter(|(u, v)| (u % 2 == 1) != (v % 2 == 1))
        .collect();
    edges.sort_unstable();
    edges
}

/// Region id pairs `(low, high)` that share at least one edge.
pub fn touching_pairs(raster: &RegionRaster) -> BTreeSet<(u32, u32)> {
    let mut pairs = BTreeSet::new();
    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let here = raster.get(x, y).unwrap();
            for there in [raster.get(x + 1, y), raster.get(x, y + 1)].into_iter().flatten() {
                if here != there && here != Color::BLACK && there != Color::BLACK {
                    let (a, b) = (u32::from(here.r), u32::from(there.r));
                    pairs.insert((a.min(b), a.max(b)));
                }
            }
        }
    }
    pairs
}
