//! Borders between region pairs and the graph that owns them.
//!
//! Regions and borders live in two flat tables (the region index and
//! [`BorderGraph`]) cross-referenced by id. There is exactly one
//! [`Border`] per unordered region pair for the lifetime of a run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::region::RegionIndex;
use crate::types::{BorderId, Polyline, RegionId};

/// An unordered pair of distinct regions, stored as `(low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionPair {
    low: RegionId,
    high: RegionId,
}

impl RegionPair {
    /// Build the pair `{a, b}`, or `None` if `a == b`.
    #[must_use]
    pub fn new(a: RegionId, b: RegionId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The smaller region id.
    #[must_use]
    pub const fn low(self) -> RegionId {
        self.low
    }

    /// The larger region id.
    #[must_use]
    pub const fn high(self) -> RegionId {
        self.high
    }

    /// Whether `region` is one side of the pair.
    #[must_use]
    pub fn contains(self, region: RegionId) -> bool {
        self.low == region || self.high == region
    }
}

/// The shared boundary of two regions.
///
/// `region_a` is the region whose trace first discovered the border and
/// `region_b` the region across from it. Polylines are appended in the
/// order the tracer flushes them and are in normalized `[0, 1]`
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    id: BorderId,
    region_a: RegionId,
    region_b: RegionId,
    polylines: Vec<Polyline>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    raw_polylines: Vec<Polyline>,
}

impl Border {
    fn new(id: BorderId, region_a: RegionId, region_b: RegionId) -> Self {
        Self {
            id,
            region_a,
            region_b,
            polylines: Vec::new(),
            raw_polylines: Vec::new(),
        }
    }

    /// Sequential border id.
    #[must_use]
    pub const fn id(&self) -> BorderId {
        self.id
    }

    /// The region that discovered the border.
    #[must_use]
    pub const fn region_a(&self) -> RegionId {
        self.region_a
    }

    /// The region across the border from [`region_a`](Self::region_a).
    #[must_use]
    pub const fn region_b(&self) -> RegionId {
        self.region_b
    }

    /// The unordered region pair this border separates.
    #[must_use]
    pub fn pair(&self) -> RegionPair {
        RegionPair {
            low: self.region_a.min(self.region_b),
            high: self.region_a.max(self.region_b),
        }
    }

    /// Simplified polylines, one per flushed run.
    #[must_use]
    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    /// Unsimplified runs; empty unless the trace retained them.
    #[must_use]
    pub fn raw_polylines(&self) -> &[Polyline] {
        &self.raw_polylines
    }

    /// Total simplified points across all polylines.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Polyline::len).sum()
    }

    /// Returns `true` if no run was ever flushed into this border.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }
}

/// Receives each finished border after a trace completes.
///
/// This is the hand-off to rendering: the tracer itself draws nothing.
pub trait BorderRenderer {
    /// Consume one finished border.
    fn render(&mut self, border: &Border);
}

/// All borders of one run, keyed by region pair.
#[derive(Debug, Clone, Default)]
pub struct BorderGraph {
    borders: Vec<Border>,
    by_pair: HashMap<RegionPair, BorderId>,
}

impl BorderGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The border between `a` and `b`, creating it with the next
    /// sequential id (and registering it on both regions) if this pair
    /// has not been seen. Returns `None` if `a == b`.
    pub fn get_or_create<R: RegionIndex + ?Sized>(
        &mut self,
        regions: &mut R,
        a: RegionId,
        b: RegionId,
    ) -> Option<BorderId> {
        let pair = RegionPair::new(a, b)?;
        if let Some(&id) = self.by_pair.get(&pair) {
            return Some(id);
        }
        // A host index may already know the pair from an earlier run; the
        // graph is still authoritative for this run's ids.
        let id = BorderId(u32::try_from(self.borders.len()).ok()?);
        self.borders.push(Border::new(id, a, b));
        self.by_pair.insert(pair, id);
        regions.link(a, b, id);
        log::debug!("border {id} created between regions {a} and {b}");
        Some(id)
    }

    /// Look up a border by id.
    #[must_use]
    pub fn get(&self, id: BorderId) -> Option<&Border> {
        usize::try_from(id.0).ok().and_then(|i| self.borders.get(i))
    }

    /// The border between `a` and `b`, if one exists.
    #[must_use]
    pub fn find(&self, a: RegionId, b: RegionId) -> Option<&Border> {
        let pair = RegionPair::new(a, b)?;
        self.by_pair.get(&pair).and_then(|&id| self.get(id))
    }

    /// All borders in creation (id) order.
    #[must_use]
    pub fn borders(&self) -> &[Border] {
        &self.borders
    }

    /// Number of borders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.borders.len()
    }

    /// Returns `true` if no border has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }

    /// Consume the graph, yielding borders in id order.
    #[must_use]
    pub fn into_borders(self) -> Vec<Border> {
        self.borders
    }

    /// Append a finished run to a border. Runs with no points are ignored.
    pub(crate) fn append(&mut self, id: BorderId, simplified: Polyline, raw: Option<Polyline>) {
        let Some(border) = usize::try_from(id.0)
            .ok()
            .and_then(|i| self.borders.get_mut(i))
        else {
            return;
        };
        if simplified.is_empty() {
            return;
        }
        border.polylines.push(simplified);
        if let Some(raw) = raw {
            border.raw_polylines.push(raw);
        }
    }
}
