//! The boundary-walking state machine.
//!
//! [`BoundaryTracer`] follows the outline of each region component
//! clockwise, spinning through the eight neighbors of the current pixel
//! to find the next outline pixel. Direct neighbors belonging to another
//! region emit boundary points into the run for that region pair's
//! border; a change of neighboring region, the grid edge, or background
//! flushes the run into its [`Border`]. Every newly met neighbor is
//! queued as a seed so the far side of each boundary gets walked too.
//!
//! Each pixel edge carries at most one boundary point. Emission is gated
//! on an [`EdgeMask`], not on whether the pixel across was visited, and
//! once the seeds run dry a row-major scan starts a fresh walk at any
//! region pixel that still has an untraced edge. Enclaves whose whole
//! surroundings were already walked get their border that way.
//!
//! The tracer is driven one discrete step at a time
//! ([`step_once`](BoundaryTracer::step_once)) so a host can slice the
//! work across frames, or run it in one go with
//! [`run_to_completion`](BoundaryTracer::run_to_completion).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::border::{Border, BorderGraph, BorderRenderer};
use crate::emit;
use crate::grid::{Direction, EdgeMask, PixelGrid, VisitedMap};
use crate::raster::RegionRaster;
use crate::region::RegionIndex;
use crate::simplify::simplify_points;
use crate::types::{
    BorderId, Color, Dimensions, Point, Polyline, RegionId, TraceConfig, TraceError,
};

/// A queued walk: start at `index`, spinning from `dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSeed {
    /// Flat pixel index of the starting pixel.
    pub index: usize,
    /// Direction the first spin starts from.
    pub dir: Direction,
}

/// Coarse state reported after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    /// Between components: popping seeds or probing for new ones.
    Scanning,
    /// Walking one boundary component.
    Tracing,
    /// Every seed is consumed and the scan cursor is exhausted.
    Done,
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Pixels walked (one full spin each).
    pub pixel_steps: usize,
    /// Boundary components started.
    pub components_traced: usize,
    /// Seeds queued, including the initial one.
    pub seeds_enqueued: usize,
    /// Seeds dropped because their pixel was already visited.
    pub seeds_discarded_visited: usize,
    /// Seeds dropped because their pixel was lone.
    pub seeds_suppressed_lone: usize,
    /// Walks started by the scan rather than from a queued seed.
    pub scan_starts: usize,
    /// Lone pixels skipped while looking for a new bordering region.
    pub lone_neighbors_skipped: usize,
    /// Pixels whose spin found no way out.
    pub degenerate_spins: usize,
    /// Component walks cut short by the step budget.
    pub budget_exhausted: usize,
    /// Runs appended to borders.
    pub runs_flushed: usize,
    /// Points emitted before simplification.
    pub raw_points: usize,
    /// Points kept after simplification.
    pub simplified_points: usize,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceOutput {
    /// Borders in id order.
    pub borders: Vec<Border>,
    /// Size of the traced raster.
    pub dimensions: Dimensions,
    /// Run counters.
    pub stats: TraceStats,
}

impl TraceOutput {
    /// Hand every border, in id order, to a renderer.
    pub fn render_with<B: BorderRenderer + ?Sized>(&self, renderer: &mut B) {
        for border in &self.borders {
            renderer.render(border);
        }
    }

    /// The border between `a` and `b`, if the run produced one.
    #[must_use]
    pub fn find(&self, a: RegionId, b: RegionId) -> Option<&Border> {
        self.borders
            .iter()
            .find(|border| border.region_a() == a && border.region_b() == b)
            .or_else(|| {
                self.borders
                    .iter()
                    .find(|border| border.region_a() == b && border.region_b() == a)
            })
    }

    /// Total simplified points across every border.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.borders.iter().map(Border::point_count).sum()
    }
}

enum TraceState {
    Scanning,
    Tracing(ActiveTrace),
    Done,
}

/// Per-component walk state. Lives only inside [`TraceState::Tracing`].
#[derive(Debug)]
struct ActiveTrace {
    start: usize,
    start_dir: Direction,
    cursor: usize,
    dir: Direction,
    region: RegionId,
    /// Color of the region across the boundary being followed.
    bordering: Option<Color>,
    border: Option<BorderId>,
    run: Vec<Point>,
    /// Direction and pixel of the most recent mid-edge point.
    last: Option<(Direction, usize, usize)>,
    steps: usize,
}

impl ActiveTrace {
    const fn new(seed: TraceSeed, region: RegionId) -> Self {
        Self {
            start: seed.index,
            start_dir: seed.dir,
            cursor: seed.index,
            dir: seed.dir,
            region,
            bordering: None,
            border: None,
            run: Vec::new(),
            last: None,
            steps: 0,
        }
    }

    /// Emit the mid-edge point of the edge facing `dir`, preceded by the
    /// trailing corner when it opens a new run.
    fn emit(&mut self, grid: &PixelGrid<'_>, dir: Direction, x: usize, y: usize) {
        let (width, height) = (grid.width(), grid.height());
        if self.run.is_empty() {
            self.run
                .extend(emit::corner_behind(dir, x, y, width, height));
        }
        if let Some(point) = emit::edge_midpoint(dir, x, y, width, height) {
            self.run.push(point);
            self.last = Some((dir, x, y));
        }
    }
}

/// Walks every region boundary of one raster.
///
/// Holds the raster read-only and the region index mutably for the
/// length of the run; borders accumulate in an owned [`BorderGraph`]
/// handed back by [`finish`](Self::finish).
pub struct BoundaryTracer<'a, R: RegionIndex + ?Sized> {
    grid: PixelGrid<'a>,
    dimensions: Dimensions,
    regions: &'a mut R,
    graph: BorderGraph,
    visited: VisitedMap,
    edges: EdgeMask,
    queue: VecDeque<TraceSeed>,
    scan_cursor: usize,
    state: TraceState,
    config: TraceConfig,
    walk_budget: usize,
    stats: TraceStats,
}

impl<'a, R: RegionIndex + ?Sized> BoundaryTracer<'a, R> {
    /// Prepare a run over `raster`.
    ///
    /// The first seed is the first non-background pixel in raster order,
    /// spinning from [`Direction::Left`]. A raster with no region pixels
    /// starts out [`TraceStatus::Done`].
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        raster: &'a RegionRaster,
        regions: &'a mut R,
        config: &TraceConfig,
    ) -> Result<Self, TraceError> {
        config.validate()?;
        let grid = PixelGrid::new(raster, config.background);

        let mut queue = VecDeque::new();
        let state = match (0..grid.len()).find(|&i| !grid.is_background(i)) {
            Some(first) => {
                queue.push_back(TraceSeed {
                    index: first,
                    dir: Direction::Left,
                });
                TraceState::Scanning
            }
            None => {
                log::debug!("raster has no region pixels, nothing to trace");
                TraceState::Done
            }
        };

        Ok(Self {
            grid,
            dimensions: raster.dimensions(),
            regions,
            graph: BorderGraph::new(),
            visited: VisitedMap::new(grid.len()),
            edges: EdgeMask::new(grid.len()),
            scan_cursor: 0,
            state,
            config: config.clone(),
            walk_budget: grid.len().saturating_mul(8).saturating_add(8),
            stats: TraceStats {
                seeds_enqueued: queue.len(),
                ..TraceStats::default()
            },
            queue,
        })
    }

    /// Current coarse state.
    #[must_use]
    pub const fn status(&self) -> TraceStatus {
        match self.state {
            TraceState::Scanning => TraceStatus::Scanning,
            TraceState::Tracing(_) => TraceStatus::Tracing,
            TraceState::Done => TraceStatus::Done,
        }
    }

    /// Region of the component being walked, if any.
    #[must_use]
    pub const fn active_region(&self) -> Option<RegionId> {
        match &self.state {
            TraceState::Tracing(trace) => Some(trace.region),
            _ => None,
        }
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// Borders found so far.
    #[must_use]
    pub const fn graph(&self) -> &BorderGraph {
        &self.graph
    }

    /// Number of pixels marked visited so far.
    #[must_use]
    pub const fn visited_count(&self) -> usize {
        self.visited.count()
    }

    /// Seeds waiting to be walked.
    #[must_use]
    pub fn pending_seeds(&self) -> usize {
        self.queue.len()
    }

    /// Advance by one discrete step: one seed pop, one scan for an
    /// untraced edge, or one full spin of the current pixel.
    ///
    /// Calling this after [`TraceStatus::Done`] is a no-op. A host that
    /// wants to cancel simply stops calling it; state is never left
    /// mid-spin.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnknownRegionColor`] if a traced or
    /// bordering pixel has no region in the index. The run is over after
    /// an error: the tracer reports [`TraceStatus::Done`] from then on.
    pub fn step_once(&mut self) -> Result<TraceStatus, TraceError> {
        let next = match std::mem::replace(&mut self.state, TraceState::Done) {
            TraceState::Done => return Ok(TraceStatus::Done),
            TraceState::Tracing(trace) => self.walk(trace)?,
            TraceState::Scanning => match self.queue.pop_front() {
                Some(seed) => self.begin(seed)?,
                None => self.scan()?,
            },
        };
        if matches!(next, TraceState::Done) {
            log::info!(
                "traced {} borders from {} components in {} pixel-steps",
                self.graph.len(),
                self.stats.components_traced,
                self.stats.pixel_steps,
            );
        }
        self.state = next;
        Ok(self.status())
    }

    /// Run at most `max_steps` steps, stopping early when done.
    ///
    /// # Errors
    ///
    /// See [`step_once`](Self::step_once).
    pub fn run_for(&mut self, max_steps: usize) -> Result<TraceStatus, TraceError> {
        for _ in 0..max_steps {
            if self.step_once()? == TraceStatus::Done {
                break;
            }
        }
        Ok(self.status())
    }

    /// Step until [`TraceStatus::Done`].
    ///
    /// # Errors
    ///
    /// See [`step_once`](Self::step_once).
    pub fn run_to_completion(&mut self) -> Result<(), TraceError> {
        while self.step_once()? != TraceStatus::Done {}
        Ok(())
    }

    /// Release the region index and return the borders found.
    ///
    /// Call after [`TraceStatus::Done`]; an unfinished run yields the
    /// borders found so far.
    #[must_use]
    pub fn finish(self) -> TraceOutput {
        TraceOutput {
            borders: self.graph.into_borders(),
            dimensions: self.dimensions,
            stats: self.stats,
        }
    }

    fn begin(&mut self, seed: TraceSeed) -> Result<TraceState, TraceError> {
        if self.visited.is_visited(seed.index) {
            self.stats.seeds_discarded_visited += 1;
            return Ok(TraceState::Scanning);
        }
        if self.grid.is_lone(seed.index) {
            self.visited.mark(seed.index);
            self.stats.seeds_suppressed_lone += 1;
            log::debug!(
                "suppressed lone pixel at {:?}",
                self.grid.coords(seed.index)
            );
            return Ok(TraceState::Scanning);
        }

        let region = self.resolve(seed.index)?;
        self.stats.components_traced += 1;
        log::debug!(
            "tracing region {region} from {:?} spinning {:?}",
            self.grid.coords(seed.index),
            seed.dir,
        );
        Ok(TraceState::Tracing(ActiveTrace::new(seed, region)))
    }

    fn walk(&mut self, mut trace: ActiveTrace) -> Result<TraceState, TraceError> {
        let here = trace.cursor;
        self.visited.mark(here);
        trace.steps += 1;
        self.stats.pixel_steps += 1;

        if trace.steps > self.walk_budget {
            log::warn!(
                "walk of region {} from {:?} exceeded {} steps, ending it",
                trace.region,
                self.grid.coords(trace.start),
                self.walk_budget,
            );
            self.stats.budget_exhausted += 1;
            self.flush(&mut trace);
            return Ok(TraceState::Scanning);
        }

        let own = self.grid.color(here);
        let mut moved = false;
        for _ in 0..Direction::ALL.len() {
            let dir = trace.dir;
            match self.grid.neighbor(here, dir) {
                Some(n) if self.grid.color(n) == own => {
                    trace.cursor = n;
                    trace.dir = dir.rewind();
                    moved = true;
                    break;
                }
                Some(n) => self.meet(&mut trace, n, dir)?,
                None => {
                    self.flush(&mut trace);
                    trace.bordering = None;
                }
            }
            trace.dir = dir.next_clockwise();
        }

        if !moved {
            self.stats.degenerate_spins += 1;
            log::debug!(
                "no way out of {:?}, discarding {} points",
                self.grid.coords(here),
                trace.run.len(),
            );
            return Ok(TraceState::Scanning);
        }
        if trace.cursor == trace.start {
            self.flush(&mut trace);
            return Ok(TraceState::Scanning);
        }
        Ok(TraceState::Tracing(trace))
    }

    /// Classify a neighbor of another color than the walked region.
    fn meet(
        &mut self,
        trace: &mut ActiveTrace,
        neighbor: usize,
        dir: Direction,
    ) -> Result<(), TraceError> {
        let here = trace.cursor;
        let (x, y) = self.grid.coords(here);
        let color = self.grid.color(neighbor);

        if trace.bordering == Some(color) {
            if dir.is_direct() && !self.edges.is_emitted(here, dir) {
                self.edges.mark(here, dir, neighbor);
                trace.emit(&self.grid, dir, x, y);
            }
            return Ok(());
        }
        if !dir.is_direct() {
            return Ok(());
        }

        // A new bordering color: whatever was pending belongs to the old one.
        self.flush(trace);
        if self.grid.is_background_color(color) {
            trace.bordering = None;
            return Ok(());
        }
        if self.grid.is_lone(neighbor) {
            self.stats.lone_neighbors_skipped += 1;
            return Ok(());
        }

        let across = self.resolve(neighbor)?;
        trace.bordering = Some(color);
        trace.border = self
            .graph
            .get_or_create(&mut *self.regions, trace.region, across);

        let unvisited = !self.visited.is_visited(neighbor);
        // Leaving the start pixel in another direction than the seed's
        // would re-walk this component from its far side.
        let off_start = here == trace.start && dir != trace.start_dir;
        if unvisited && !off_start {
            self.queue.push_back(TraceSeed {
                index: neighbor,
                dir: dir.opposite(),
            });
            self.stats.seeds_enqueued += 1;
        }
        if !self.edges.is_emitted(here, dir) {
            self.edges.mark(here, dir, neighbor);
            trace.emit(&self.grid, dir, x, y);
        }
        Ok(())
    }

    /// Close the pending run with the leading corner of its last edge,
    /// simplify it, and append it to the current border.
    fn flush(&mut self, trace: &mut ActiveTrace) {
        let mut run = std::mem::take(&mut trace.run);
        let (Some(border), Some((dir, x, y))) = (trace.border, trace.last) else {
            return;
        };
        if run.is_empty() {
            return;
        }

        run.extend(emit::corner_ahead(
            dir,
            x,
            y,
            self.grid.width(),
            self.grid.height(),
        ));
        let simplified = simplify_points(&run, self.config.simplify_tolerance);
        self.stats.runs_flushed += 1;
        self.stats.raw_points += run.len();
        self.stats.simplified_points += simplified.len();

        let raw = self.config.retain_raw.then(|| Polyline::new(run));
        self.graph.append(border, Polyline::new(simplified), raw);
    }

    /// Find the next region pixel, in raster order, with an untraced
    /// edge toward another region and start walking from it, spinning
    /// from that edge.
    ///
    /// The cursor stays on a pixel until all of its edges are traced, so a
    /// pixel that borders several components is revisited.
    fn scan(&mut self) -> Result<TraceState, TraceError> {
        while self.scan_cursor < self.grid.len() {
            let index = self.scan_cursor;
            if let Some(dir) = self.untraced_edge(index) {
                let region = self.resolve(index)?;
                self.stats.components_traced += 1;
                self.stats.scan_starts += 1;
                log::debug!(
                    "rescanning region {region} at {:?} toward {dir:?}",
                    self.grid.coords(index),
                );
                return Ok(TraceState::Tracing(ActiveTrace::new(
                    TraceSeed { index, dir },
                    region,
                )));
            }
            self.scan_cursor += 1;
        }
        Ok(TraceState::Done)
    }

    /// A direct edge of `index` that separates two non-lone region pixels
    /// and has no boundary point yet.
    fn untraced_edge(&self, index: usize) -> Option<Direction> {
        if self.grid.is_background(index) || self.grid.is_lone(index) {
            return None;
        }
        let color = self.grid.color(index);
        Direction::DIRECT.into_iter().find(|&dir| {
            self.grid.neighbor(index, dir).is_some_and(|n| {
                let other = self.grid.color(n);
                other != color
                    && !self.grid.is_background_color(other)
                    && !self.edges.is_emitted(index, dir)
                    && !self.grid.is_lone(n)
            })
        })
    }

    fn resolve(&self, index: usize) -> Result<RegionId, TraceError> {
        let color = self.grid.color(index);
        self.regions.lookup_by_color(color).ok_or_else(|| {
            let (x, y) = self.grid.coords(index);
            TraceError::UnknownRegionColor {
                color,
                x: u32::try_from(x).unwrap_or(u32::MAX),
                y: u32::try_from(y).unwrap_or(u32::MAX),
            }
        })
    }
}
