//! Border run simplification (Ramer-Douglas-Peucker).
//!
//! Each flushed run is reduced to the subsequence of its points that
//! deviates from the chord between kept neighbors by more than the
//! tolerance. First and last points are always kept, so runs that meet
//! at a junction still share their endpoint exactly.
//!
//! Runs along long straight seams can hold thousands of points, so the
//! split recursion is driven by an explicit stack instead of the call
//! stack.

use crate::types::{Point, Polyline};

/// Simplify a run of points with tolerance `epsilon` (normalized units).
///
/// A point is dropped only if its perpendicular distance to the chord is
/// at most `epsilon`, so `0.0` removes exactly collinear points and
/// nothing else. Runs with fewer than 3 points are returned unchanged.
/// The result is deterministic for a given input and tolerance.
#[must_use = "returns the simplified points"]
pub fn simplify_points(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[last] = true;

    let mut pending = vec![(0, last)];
    while let Some((start, end)) = pending.pop() {
        if end <= start + 1 {
            continue;
        }
        let (max_idx, max_dist) = farthest_from_chord(points, start, end);
        if max_dist > epsilon {
            kept[max_idx] = true;
            // Right half pushed first so the left half is split first.
            pending.push((max_idx, end));
            pending.push((start, max_idx));
        }
    }

    points
        .iter()
        .zip(&kept)
        .filter_map(|(&p, &k)| k.then_some(p))
        .collect()
}

/// Simplify a polyline. See [`simplify_points`].
#[must_use = "returns the simplified polyline"]
pub fn simplify(polyline: &Polyline, epsilon: f64) -> Polyline {
    Polyline::new(simplify_points(polyline.points(), epsilon))
}

/// Index and distance of the interior point farthest from the chord
/// `points[start]..points[end]`. Ties keep the earliest index.
fn farthest_from_chord(points: &[Point], start: usize, end: usize) -> (usize, f64) {
    let (a, b) = (points[start], points[end]);
    points[start + 1..end]
        .iter()
        .enumerate()
        .fold((start, 0.0), |(best_idx, best), (offset, &p)| {
            let d = perpendicular_distance(p, a, b);
            if d > best {
                (start + 1 + offset, d)
            } else {
                (best_idx, best)
            }
        })
}

/// Perpendicular distance from point `p` to the line through `a` and `b`.
///
/// When `a` and `b` coincide (a closed run), returns the distance from
/// `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
