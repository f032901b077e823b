//! Region lookup: mapping pixel colors to region identities.
//!
//! The tracer only needs the narrow [`RegionIndex`] contract: resolve a
//! color to a region, and record which border separates two regions.
//! [`RegionRegistry`] is the arena-backed implementation used by the
//! CLI and tests; hosts with their own region tables implement the trait
//! directly.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::raster::RegionRaster;
use crate::types::{BorderId, Color, RegionId, TraceError};

/// Color-to-region resolution and per-region border adjacency.
pub trait RegionIndex {
    /// The region drawn in `color`, if any.
    fn lookup_by_color(&self, color: Color) -> Option<RegionId>;

    /// Record that `border` separates `a` and `b`, on both regions.
    fn link(&mut self, a: RegionId, b: RegionId, border: BorderId);

    /// The border recorded between `a` and `b`, if any.
    fn border_between(&self, a: RegionId, b: RegionId) -> Option<BorderId>;
}

/// A host-supplied region definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Region identifier.
    pub id: RegionId,
    /// Exact pixel color of the region, written `#rrggbb`.
    pub color: Color,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A region and the borders discovered around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    id: RegionId,
    color: Color,
    name: Option<String>,
    borders: BTreeMap<RegionId, BorderId>,
}

impl Region {
    /// Region identifier.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Pixel color.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Display name, if one was defined.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Neighboring regions and the border shared with each, ordered by
    /// neighbor id.
    #[must_use]
    pub const fn borders(&self) -> &BTreeMap<RegionId, BorderId> {
        &self.borders
    }
}

/// Arena of regions keyed by id, with a color index.
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    regions: Vec<Region>,
    by_id: HashMap<RegionId, usize>,
    by_color: HashMap<Color, usize>,
    background: Color,
}

impl RegionRegistry {
    /// An empty registry that refuses regions drawn in `background`.
    #[must_use]
    pub fn new(background: Color) -> Self {
        Self {
            regions: Vec::new(),
            by_id: HashMap::new(),
            by_color: HashMap::new(),
            background,
        }
    }

    /// Build a registry from host-supplied definitions.
    ///
    /// # Errors
    ///
    /// Fails on the first definition rejected by [`insert`](Self::insert).
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = RegionDefinition>,
        background: Color,
    ) -> Result<Self, TraceError> {
        let mut registry = Self::new(background);
        for definition in definitions {
            registry.insert(definition)?;
        }
        Ok(registry)
    }

    /// Register every distinct non-background color of `raster`, in
    /// raster order, with sequential ids starting at 0.
    #[must_use]
    pub fn from_raster(raster: &RegionRaster, background: Color) -> Self {
        let mut registry = Self::new(background);
        for &color in raster.pixels() {
            if color == background || registry.by_color.contains_key(&color) {
                continue;
            }
            let id = RegionId(u32::try_from(registry.regions.len()).unwrap_or(u32::MAX));
            registry.push(RegionDefinition {
                id,
                color,
                name: None,
            });
        }
        registry
    }

    /// Add one region.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::BackgroundRegion`] if the color is the
    /// background color, and [`TraceError::DuplicateRegion`] if the id or
    /// color is already registered.
    pub fn insert(&mut self, definition: RegionDefinition) -> Result<RegionId, TraceError> {
        if definition.color == self.background {
            return Err(TraceError::BackgroundRegion(definition.color));
        }
        if self.by_id.contains_key(&definition.id) {
            return Err(TraceError::DuplicateRegion(format!(
                "region id {} is defined twice",
                definition.id
            )));
        }
        if let Some(&existing) = self.by_color.get(&definition.color) {
            return Err(TraceError::DuplicateRegion(format!(
                "color {} is used by regions {} and {}",
                definition.color, self.regions[existing].id, definition.id
            )));
        }
        Ok(self.push(definition))
    }

    fn push(&mut self, definition: RegionDefinition) -> RegionId {
        let slot = self.regions.len();
        let id = definition.id;
        self.by_id.insert(id, slot);
        self.by_color.insert(definition.color, slot);
        self.regions.push(Region {
            id,
            color: definition.color,
            name: definition.name,
            borders: BTreeMap::new(),
        });
        id
    }

    /// Look up a region by id.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.by_id.get(&id).map(|&slot| &self.regions[slot])
    }

    /// All regions in registration order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Ids of the regions bordering `id`, ascending.
    pub fn neighbors(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        self.region(id)
            .into_iter()
            .flat_map(|region| region.borders.keys().copied())
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if no region is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl RegionIndex for RegionRegistry {
    fn lookup_by_color(&self, color: Color) -> Option<RegionId> {
        self.by_color.get(&color).map(|&slot| self.regions[slot].id)
    }

    fn link(&mut self, a: RegionId, b: RegionId, border: BorderId) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(&slot) = self.by_id.get(&from) {
                self.regions[slot].borders.entry(to).or_insert(border);
            }
        }
    }

    fn border_between(&self, a: RegionId, b: RegionId) -> Option<BorderId> {
        self.region(a)
            .and_then(|region| region.borders.get(&b).copied())
    }
}
