//! JSON export of border records.
//!
//! Each [`Border`] is written as a [`BorderRecord`]:
//! `{ "id", "region_a", "region_b", "polylines": [[[u, v], ...], ...] }`
//! with coordinates normalized to `[0, 1]` and `v` growing upward.

use serde::{Deserialize, Serialize};

use marchland_trace::{Border, Dimensions, Point, Polyline};

use crate::ExportError;

/// Flat, host-facing form of a [`Border`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderRecord {
    /// Sequential border id, in discovery order.
    pub id: u32,
    /// Region on the first side of the border.
    pub region_a: u32,
    /// Region on the other side.
    pub region_b: u32,
    /// Simplified runs as `[u, v]` pairs, normalized with `v` up.
    pub polylines: Vec<Vec<[f64; 2]>>,
}

impl From<&Border> for BorderRecord {
    fn from(border: &Border) -> Self {
        Self {
            id: border.id().0,
            region_a: border.region_a().0,
            region_b: border.region_b().0,
            polylines: border
                .polylines()
                .iter()
                .map(|pl| pl.points().iter().map(|p| [p.x, p.y]).collect())
                .collect(),
        }
    }
}

impl BorderRecord {
    /// Rebuild the polylines as [`Polyline`] values.
    #[must_use]
    pub fn to_polylines(&self) -> Vec<Polyline> {
        self.polylines
            .iter()
            .map(|pl| Polyline::new(pl.iter().map(|&[u, v]| Point::new(u, v)).collect()))
            .collect()
    }
}

/// A complete export: raster size plus every border record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderDocument {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// One record per border, in id order.
    pub borders: Vec<BorderRecord>,
}

impl BorderDocument {
    /// Collect `borders` into a document for a raster of `dimensions`.
    #[must_use]
    pub fn new(borders: &[Border], dimensions: Dimensions) -> Self {
        Self {
            width: dimensions.width,
            height: dimensions.height,
            borders: borders.iter().map(BorderRecord::from).collect(),
        }
    }
}

/// Serialize borders as a pretty-printed [`BorderDocument`].
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(borders: &[Border], dimensions: Dimensions) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&BorderDocument::new(
        borders, dimensions,
    ))?)
}

/// Parse a document written by [`to_json`].
///
/// # Errors
///
/// Returns [`ExportError::Json`] if `json` is not a valid document.
pub fn from_json(json: &str) -> Result<BorderDocument, ExportError> {
    Ok(serde_json::from_str(json)?)
}
