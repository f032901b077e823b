//! Pixel-grid neighborhood queries, the visited bitmap and the
//! emitted-edge mask.
//!
//! Directions are indexed 0..7 clockwise starting at [`Direction::Right`]
//! with `y` growing upward, so "down" is `y - 1`. Even indices are the
//! four direct (edge-sharing) neighbors, odd indices the diagonals.

use crate::raster::RegionRaster;
use crate::types::Color;

/// One of the eight compass directions around a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `(+1, 0)`
    Right,
    /// `(+1, -1)`
    RightDown,
    /// `(0, -1)`
    Down,
    /// `(-1, -1)`
    LeftDown,
    /// `(-1, 0)`
    Left,
    /// `(-1, +1)`
    LeftUp,
    /// `(0, +1)`
    Up,
    /// `(+1, +1)`
    RightUp,
}

impl Direction {
    /// All directions in spin (clockwise) order.
    pub const ALL: [Self; 8] = [
        Self::Right,
        Self::RightDown,
        Self::Down,
        Self::LeftDown,
        Self::Left,
        Self::LeftUp,
        Self::Up,
        Self::RightUp,
    ];

    /// The four direct neighbors in spin order.
    pub const DIRECT: [Self; 4] = [Self::Right, Self::Down, Self::Left, Self::Up];

    /// Spin index 0..7.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for a spin index, wrapping modulo 8.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 8]
    }

    /// `true` for the edge-sharing directions.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        self.index() % 2 == 0
    }

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 4)
    }

    /// The next direction in the spin.
    #[must_use]
    pub const fn next_clockwise(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Where the spin restarts after stepping onto a neighbor in this
    /// direction: two positions back for direct steps, three for diagonal
    /// ones, so the next spin begins just outside the followed outline.
    #[must_use]
    pub const fn rewind(self) -> Self {
        let back = if self.is_direct() { 2 } else { 3 };
        Self::from_index(self.index() + 8 - back)
    }

    /// `(dx, dy)` offset of a neighbor in this direction.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Self::Right => (1, 0),
            Self::RightDown => (1, -1),
            Self::Down => (0, -1),
            Self::LeftDown => (-1, -1),
            Self::Left => (-1, 0),
            Self::LeftUp => (-1, 1),
            Self::Up => (0, 1),
            Self::RightUp => (1, 1),
        }
    }
}

/// Read-only neighborhood view over a [`RegionRaster`].
#[derive(Debug, Clone, Copy)]
pub struct PixelGrid<'a> {
    pixels: &'a [Color],
    width: usize,
    height: usize,
    background: Color,
}

impl<'a> PixelGrid<'a> {
    /// Borrow a raster, treating `background` as the "no region" color.
    #[must_use]
    pub fn new(raster: &'a RegionRaster, background: Color) -> Self {
        let pixels = raster.pixels();
        let width = usize::try_from(raster.width()).unwrap_or(0);
        let height = if width == 0 { 0 } else { pixels.len() / width };
        Self {
            pixels,
            width,
            height,
            background,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total pixel count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns `true` if the grid has no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Color of the pixel at a flat index.
    #[must_use]
    pub fn color(&self, index: usize) -> Color {
        self.pixels[index]
    }

    /// `(x, y)` of a flat index.
    #[must_use]
    pub const fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Whether the pixel at `index` carries the background color.
    #[must_use]
    pub fn is_background(&self, index: usize) -> bool {
        self.pixels[index] == self.background
    }

    /// Whether `color` is the background color.
    #[must_use]
    pub fn is_background_color(&self, color: Color) -> bool {
        color == self.background
    }

    /// Flat index of the direct or diagonal neighbor of `index`.
    #[must_use]
    pub const fn neighbor(&self, index: usize, dir: Direction) -> Option<usize> {
        let (x, y) = self.coords(index);
        self.neighbor_at(x, y, 1, dir)
    }

    /// Flat index of the pixel `distance` steps from `(x, y)` in `dir`,
    /// or `None` when that lands outside the grid.
    #[must_use]
    pub const fn neighbor_at(
        &self,
        x: usize,
        y: usize,
        distance: usize,
        dir: Direction,
    ) -> Option<usize> {
        let (dx, dy) = dir.offset();
        let Some(nx) = step(x, dx, distance, self.width) else {
            return None;
        };
        let Some(ny) = step(y, dy, distance, self.height) else {
            return None;
        };
        Some(nx + ny * self.width)
    }

    /// A lone pixel has no direct neighbor of its own color.
    #[must_use]
    pub fn is_lone(&self, index: usize) -> bool {
        let color = self.pixels[index];
        !Direction::DIRECT.iter().any(|&dir| {
            self.neighbor(index, dir)
                .is_some_and(|n| self.pixels[n] == color)
        })
    }
}

/// Move `coord` by `delta * distance`, staying inside `0..limit`.
const fn step(coord: usize, delta: i64, distance: usize, limit: usize) -> Option<usize> {
    match delta {
        0 => Some(coord),
        1 => match coord.checked_add(distance) {
            Some(c) if c < limit => Some(c),
            _ => None,
        },
        _ => coord.checked_sub(distance),
    }
}

/// One flag per pixel; flags only ever go from unvisited to visited.
#[derive(Debug, Clone)]
pub struct VisitedMap {
    flags: Vec<bool>,
    count: usize,
}

impl VisitedMap {
    /// A map with every pixel unvisited.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
            count: 0,
        }
    }

    /// Mark a pixel visited. Marking twice is a no-op.
    pub fn mark(&mut self, index: usize) {
        if !self.flags[index] {
            self.flags[index] = true;
            self.count += 1;
        }
    }

    /// Whether a pixel has been visited.
    #[must_use]
    pub fn is_visited(&self, index: usize) -> bool {
        self.flags[index]
    }

    /// Number of visited pixels.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }
}

/// Which direct edges of each pixel already carry a boundary point.
///
/// An edge is shared by two pixels, so marking it from one side marks it
/// from the other side too.
#[derive(Debug, Clone)]
pub struct EdgeMask {
    bits: Vec<u8>,
}

impl EdgeMask {
    /// A mask with no edge emitted.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { bits: vec![0; len] }
    }

    const fn bit(dir: Direction) -> u8 {
        1 << (dir.index() / 2)
    }

    /// Whether the edge of `index` facing `dir` has been emitted.
    #[must_use]
    pub fn is_emitted(&self, index: usize, dir: Direction) -> bool {
        self.bits[index] & Self::bit(dir) != 0
    }

    /// Mark the edge between `index` and its direct neighbor `neighbor`,
    /// which lies in direction `dir`.
    pub fn mark(&mut self, index: usize, dir: Direction, neighbor: usize) {
        debug_assert!(dir.is_direct());
        self.bits[index] |= Self::bit(dir);
        self.bits[neighbor] |= Self::bit(dir.opposite());
    }
}
