//! Boundary point emission in normalized image coordinates.
//!
//! A run of border points starts with the trailing ("behind") corner of
//! the first boundary edge, continues with one mid-edge point per direct
//! boundary step, and ends with the leading ("ahead") corner of the last
//! edge. Two traces that meet at a shared corner therefore produce
//! bit-identical coordinates for it: every value is an exact half- or
//! full-pixel offset of `(x, y)` divided by the grid size.
//!
//! All three functions return `None` for diagonal directions, which
//! never emit points.

use crate::grid::Direction;
use crate::types::Point;

/// `(x + ox) / width, (y + oy) / height` in `f64`.
fn offset_point(x: usize, y: usize, (ox, oy): (f64, f64), width: usize, height: usize) -> Point {
    #[allow(clippy::cast_precision_loss)]
    let (x, y, w, h) = (x as f64, y as f64, width as f64, height as f64);
    Point::new((x + ox) / w, (y + oy) / h)
}

/// Corner at the trailing end of the pixel edge facing `dir`.
#[must_use]
pub fn corner_behind(
    dir: Direction,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Option<Point> {
    let offset = match dir {
        Direction::Right => (1.0, 1.0),
        Direction::Down => (1.0, 0.0),
        Direction::Left => (0.0, 0.0),
        Direction::Up => (0.0, 1.0),
        _ => return None,
    };
    Some(offset_point(x, y, offset, width, height))
}

/// Corner at the leading end of the pixel edge facing `dir`.
#[must_use]
pub fn corner_ahead(
    dir: Direction,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Option<Point> {
    let offset = match dir {
        Direction::Right => (1.0, 0.0),
        Direction::Down => (0.0, 0.0),
        Direction::Left => (0.0, 1.0),
        Direction::Up => (1.0, 1.0),
        _ => return None,
    };
    Some(offset_point(x, y, offset, width, height))
}

/// Midpoint of the pixel edge facing `dir`.
#[must_use]
pub fn edge_midpoint(
    dir: Direction,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Option<Point> {
    let offset = match dir {
        Direction::Right => (1.0, 0.5),
        Direction::Down => (0.5, 0.0),
        Direction::Left => (0.0, 0.5),
        Direction::Up => (0.5, 1.0),
        _ => return None,
    };
    Some(offset_point(x, y, offset, width, height))
}
