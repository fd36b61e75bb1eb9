//! Bounded single-source least-cost search over the 8-connected pixel grid.
//!
//! Dijkstra with a binary heap keyed by accumulated cost. Equal costs pop
//! in insertion order (FIFO), so a run is fully reproducible. Only pixels
//! inside a square window around the source are expanded.
//!
//! The search owns its scratch buffers and reuses them across runs: a
//! generation counter marks which cells were touched by the current run,
//! so nothing is cleared or reallocated per pointer event.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;

use super::cost::{CostModel, NEIGHBOR_OFFSETS};
use super::features::ImageFeatures;
use super::types::Point;

const NO_PREDECESSOR: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f32,
    order: u64,
    index: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed: BinaryHeap is a max-heap, we pop the cheapest, oldest entry
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Reusable shortest-path workspace and its latest result.
#[derive(Debug, Default)]
pub struct PathSearch {
    width: usize,
    height: usize,
    cost: Vec<f32>,
    prev: Vec<u32>,
    /// Cell has a valid cost/prev in the current generation
    touched: Vec<u32>,
    /// Cell was finalized in the current generation
    settled: Vec<u32>,
    generation: u32,
    heap: BinaryHeap<QueueEntry>,
    source: Option<Point>,
    window: usize,
    expanded: usize,
}

impl PathSearch {
    pub fn new(width: usize, height: usize) -> Self {
        let mut search = Self::default();
        search.resize(width, height);
        search
    }

    fn resize(&mut self, width: usize, height: usize) {
        let n = width * height;
        self.width = width;
        self.height = height;
        self.cost = vec![f32::INFINITY; n];
        self.prev = vec![NO_PREDECESSOR; n];
        self.touched = vec![0; n];
        self.settled = vec![0; n];
        self.generation = 0;
        self.source = None;
    }

    /// Forget the latest result without releasing the buffers.
    pub fn invalidate(&mut self) {
        self.next_generation();
        self.source = None;
    }

    fn next_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.touched.fill(0);
            self.settled.fill(0);
            self.generation = 1;
        }
    }

    /// Source of the latest run.
    pub fn source(&self) -> Option<Point> {
        self.source
    }

    /// Half-width of the window of the latest run.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Pixels finalized by the latest run.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// True if `p` lies in the window of the latest run.
    pub fn in_window(&self, p: Point) -> bool {
        match self.source {
            Some(s) => {
                let w = self.window as i64;
                (p.x as i64 - s.x as i64).abs() <= w && (p.y as i64 - s.y as i64).abs() <= w
            }
            None => false,
        }
    }

    /// Run the search from `source`, expanding only pixels within `window`
    /// (Chebyshev distance) of it.
    ///
    /// An out-of-bounds source is a no-op that keeps the previous result.
    ///
    /// # Returns
    /// `true` if a search ran
    pub fn run(&mut self, features: &ImageFeatures, model: &CostModel, source: Point, window: usize) -> bool {
        let (width, height) = (features.width(), features.height());
        if !source.in_bounds(width, height) {
            return false;
        }
        if width != self.width || height != self.height {
            self.resize(width, height);
        }

        self.next_generation();
        let generation = self.generation;
        self.source = Some(source);
        self.window = window;
        self.expanded = 0;
        self.heap.clear();

        let w = window as i64;
        let (sx, sy) = (source.x as i64, source.y as i64);
        let x_lo = (sx - w).max(0);
        let x_hi = (sx + w).min(width as i64 - 1);
        let y_lo = (sy - w).max(0);
        let y_hi = (sy + w).min(height as i64 - 1);

        let start = source.y as usize * width + source.x as usize;
        self.cost[start] = 0.0;
        self.prev[start] = NO_PREDECESSOR;
        self.touched[start] = generation;

        let mut order = 0u64;
        self.heap.push(QueueEntry { cost: 0.0, order, index: start });

        while let Some(entry) = self.heap.pop() {
            let idx = entry.index;
            if self.settled[idx] == generation || entry.cost > self.cost[idx] {
                continue;
            }
            self.settled[idx] = generation;
            self.expanded += 1;

            let px = idx % width;
            let py = idx / width;

            for (k, &(dx, dy)) in NEIGHBOR_OFFSETS.iter().enumerate() {
                let qx = px as i64 + dx as i64;
                let qy = py as i64 + dy as i64;
                if qx < x_lo || qx > x_hi || qy < y_lo || qy > y_hi {
                    continue;
                }

                let qidx = qy as usize * width + qx as usize;
                if self.settled[qidx] == generation {
                    continue;
                }

                let new_cost = entry.cost + model.link_cost(features, px, py, k);
                let old_cost = if self.touched[qidx] == generation {
                    self.cost[qidx]
                } else {
                    f32::INFINITY
                };

                if new_cost < old_cost {
                    self.cost[qidx] = new_cost;
                    self.prev[qidx] = idx as u32;
                    self.touched[qidx] = generation;
                    order += 1;
                    self.heap.push(QueueEntry { cost: new_cost, order, index: qidx });
                }
            }
        }

        log::trace!(
            "search from ({}, {}) window {} expanded {}",
            source.x,
            source.y,
            window,
            self.expanded
        );
        true
    }

    #[inline]
    fn index_of(&self, p: Point) -> Option<usize> {
        if p.in_bounds(self.width, self.height) {
            let idx = p.y as usize * self.width + p.x as usize;
            (self.touched[idx] == self.generation && self.generation != 0).then_some(idx)
        } else {
            None
        }
    }

    /// Accumulated cost from the source to `p`, infinite if unreached.
    pub fn cost_at(&self, p: Point) -> f32 {
        self.index_of(p).map_or(f32::INFINITY, |idx| self.cost[idx])
    }

    /// Predecessor of `p` on its least-cost path, `None` for the source and
    /// unreached pixels.
    pub fn predecessor(&self, p: Point) -> Option<Point> {
        let idx = self.index_of(p)?;
        let prev = self.prev[idx];
        (prev != NO_PREDECESSOR).then(|| self.point_of(prev as usize))
    }

    #[inline]
    fn point_of(&self, idx: usize) -> Point {
        Point::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    /// Least-cost path from the source to `dest`, both ends included.
    ///
    /// `None` if `dest` was not reached by the latest run.
    pub fn trace(&self, dest: Point) -> Option<Vec<Point>> {
        let mut idx = self.index_of(dest)?;
        let mut path = vec![dest];

        // A predecessor chain can never be longer than the grid
        for _ in 0..self.width * self.height {
            let prev = self.prev[idx];
            if prev == NO_PREDECESSOR {
                path.reverse();
                return Some(path);
            }
            idx = prev as usize;
            path.push(self.point_of(idx));
        }

        log::warn!("predecessor chain from ({}, {}) does not terminate", dest.x, dest.y);
        None
    }

    /// Snapshot of the cost field (height, width); unreached cells are infinite.
    pub fn cost_field(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.height, self.width), |(y, x)| {
            self.cost_at(Point::new(x as i32, y as i32))
        })
    }

    /// Snapshot of the predecessor field (height, width).
    pub fn predecessor_field(&self) -> Array2<Option<Point>> {
        Array2::from_shape_fn((self.height, self.width), |(y, x)| {
            self.predecessor(Point::new(x as i32, y as i32))
        })
    }
}
