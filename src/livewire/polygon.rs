//! Committed polygon and seed bookkeeping.
//!
//! A single point buffer holds the whole boundary. Seeds are an index view
//! into it: `seed_positions[j]` is the buffer index of seed `j`, strictly
//! increasing, and `points[seed_positions[j]] == seeds[j]`. A closed polygon
//! repeats its first point at the end of the buffer.
//!
//! Editing a seed freezes the unaffected stretches into [`SplitHalves`] so
//! the polygon can be rebuilt by concatenation while the seed is dragged.

use super::types::Point;
use crate::error::LiveWireError;

/// Frozen polygon stretches around an actively edited seed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitHalves {
    /// Seed being edited
    pub active: usize,
    /// Points before the previous seed (PolyA)
    pub before: Vec<Point>,
    /// Points after the next seed (PolyB); for seed 0 of a closed polygon
    /// this runs up to and including the last seed
    pub after: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPolygon {
    points: Vec<Point>,
    seeds: Vec<Point>,
    seed_positions: Vec<usize>,
    closed: bool,
}

impl SeedPolygon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a polygon from persisted parts.
    ///
    /// A closed polygon whose last point differs from its first gets the
    /// first point appended. An open polygon must end at its last seed.
    ///
    /// # Errors
    /// `InvalidPolygon` when the seed view does not match the point buffer.
    pub fn from_parts(
        points: Vec<Point>,
        seeds: Vec<Point>,
        seed_positions: Vec<usize>,
        closed: bool,
    ) -> Result<Self, LiveWireError> {
        if seeds.len() != seed_positions.len() {
            return Err(LiveWireError::InvalidPolygon(format!(
                "{} seeds but {} seed positions",
                seeds.len(),
                seed_positions.len()
            )));
        }
        if seeds.is_empty() || points.is_empty() {
            return Err(LiveWireError::InvalidPolygon("empty polygon".to_string()));
        }
        if closed && seeds.len() < 2 {
            return Err(LiveWireError::InvalidPolygon(
                "a closed polygon needs two seeds".to_string(),
            ));
        }

        let mut polygon = Self {
            points,
            seeds,
            seed_positions,
            closed,
        };
        if closed && polygon.points.first() != polygon.points.last() {
            let first = polygon.points[0];
            polygon.points.push(first);
        }
        polygon.check()?;
        Ok(polygon)
    }

    /// Verify the seed view against the point buffer.
    pub fn check(&self) -> Result<(), LiveWireError> {
        if self.seeds.len() != self.seed_positions.len() {
            return Err(LiveWireError::InvalidPolygon("seed count mismatch".to_string()));
        }
        if self.seed_positions.first().is_some_and(|&p| p != 0) {
            return Err(LiveWireError::InvalidPolygon(
                "first seed must start the polygon".to_string(),
            ));
        }
        if !self.seed_positions.windows(2).all(|w| w[0] < w[1]) {
            return Err(LiveWireError::InvalidPolygon(
                "seed positions not strictly increasing".to_string(),
            ));
        }
        if !self.closed
            && self
                .seed_positions
                .last()
                .is_some_and(|&pos| pos + 1 != self.points.len())
        {
            return Err(LiveWireError::InvalidPolygon(
                "an open polygon must end at its last seed".to_string(),
            ));
        }
        for (j, (&seed, &pos)) in self.seeds.iter().zip(&self.seed_positions).enumerate() {
            if self.points.get(pos) != Some(&seed) {
                return Err(LiveWireError::InvalidPolygon(format!(
                    "seed {j} is not at polygon index {pos}"
                )));
            }
        }
        Ok(())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn seeds(&self) -> &[Point] {
        &self.seeds
    }

    pub fn seed_positions(&self) -> &[usize] {
        &self.seed_positions
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn seed_count(&self) -> usize {
        self.seeds.len()
    }

    pub fn last_seed(&self) -> Option<Point> {
        self.seeds.last().copied()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.seeds.clear();
        self.seed_positions.clear();
        self.closed = false;
    }

    /// Start a new open polygon at `seed`.
    pub fn start(&mut self, seed: Point) {
        self.clear();
        self.points.push(seed);
        self.seeds.push(seed);
        self.seed_positions.push(0);
    }

    /// Append a path and make `seed` (its end) a new seed.
    ///
    /// `segment` must not repeat the current last point.
    pub fn commit_segment(&mut self, segment: &[Point], seed: Point) {
        self.points.extend_from_slice(segment);
        if self.points.last() != Some(&seed) {
            self.points.push(seed);
        }
        self.seeds.push(seed);
        self.seed_positions.push(self.points.len() - 1);
    }

    /// Append the closing path (ending at the first point) and mark the
    /// polygon closed.
    pub fn close_with(&mut self, segment: &[Point]) {
        let Some(&first) = self.points.first() else {
            return;
        };
        self.points.extend_from_slice(segment);
        if self.points.last() != Some(&first) {
            self.points.push(first);
        }
        self.closed = true;
    }

    /// Cut the polygon back to the last point within `tolerance` of `cursor`.
    ///
    /// The matched point is kept; seeds past it are dropped and, if the
    /// matched point is not itself a seed, it becomes one.
    ///
    /// # Returns
    /// Index of the new last point, `None` if nothing was within tolerance
    pub fn trim_to(&mut self, cursor: Point, tolerance: i32) -> Option<usize> {
        let keep = self.points.iter().rposition(|p| p.manhattan(cursor) < tolerance)?;

        self.points.truncate(keep + 1);
        let valid = self.seed_positions.partition_point(|&pos| pos <= keep);
        self.seed_positions.truncate(valid);
        self.seeds.truncate(valid);

        if self.seed_positions.last() != Some(&keep) {
            self.seed_positions.push(keep);
            self.seeds.push(self.points[keep]);
        }
        self.closed = false;
        Some(keep)
    }

    /// Nearest seed within `tolerance` (Manhattan, exclusive) of `cursor`.
    pub fn nearest_seed(&self, cursor: Point, tolerance: i32) -> Option<usize> {
        self.seeds
            .iter()
            .enumerate()
            .map(|(j, s)| (s.manhattan(cursor), j))
            .filter(|&(d, _)| d < tolerance)
            .min()
            .map(|(_, j)| j)
    }

    /// Make the polygon point nearest to `cursor` a new seed.
    ///
    /// Only points strictly between two seeds qualify (for a closed polygon
    /// this includes the closing stretch, but not the repeated first point).
    ///
    /// # Returns
    /// Index of the inserted seed, `None` if no edge point is within tolerance
    pub fn insert_seed(&mut self, cursor: Point, tolerance: i32) -> Option<usize> {
        let last_seed_pos = *self.seed_positions.last()?;
        let end = if self.closed {
            self.points.len().saturating_sub(1)
        } else {
            last_seed_pos
        };

        let (_, index) = (0..end)
            .filter(|i| self.seed_positions.binary_search(i).is_err())
            .map(|i| (self.points[i].manhattan(cursor), i))
            .filter(|&(d, _)| d < tolerance)
            .min()?;

        let slot = self.seed_positions.partition_point(|&pos| pos < index);
        self.seed_positions.insert(slot, index);
        self.seeds.insert(slot, self.points[index]);
        Some(slot)
    }

    /// Seeds joined to seed `i` by a polygon stretch: (previous, next).
    pub fn neighbours(&self, i: usize) -> (Option<usize>, Option<usize>) {
        let n = self.seeds.len();
        if i >= n {
            return (None, None);
        }
        let wrap = self.closed && n > 1;
        let prev = if i > 0 {
            Some(i - 1)
        } else if wrap {
            Some(n - 1)
        } else {
            None
        };
        let next = if i + 1 < n {
            Some(i + 1)
        } else if wrap {
            Some(0)
        } else {
            None
        };
        (prev, next)
    }

    /// Freeze the stretches not touched by moving seed `i`.
    pub fn split(&self, i: usize) -> SplitHalves {
        let mut halves = SplitHalves {
            active: i,
            ..SplitHalves::default()
        };
        if i >= self.seeds.len() {
            return halves;
        }

        if i > 0 {
            halves.before = self.points[..self.seed_positions[i - 1]].to_vec();
        }

        if let (_, Some(next)) = self.neighbours(i) {
            if next > 0 {
                let from = self.seed_positions[next] + 1;
                let to = if i == 0 && self.closed {
                    self.seed_positions[self.seeds.len() - 1] + 1
                } else {
                    self.points.len()
                };
                if from < to {
                    halves.after = self.points[from..to].to_vec();
                }
            }
        }

        halves
    }

    /// True if seed `i` may move to `to`: it must not land on a seed it is
    /// linked to, or two seeds would share a polygon index.
    pub fn can_move_seed(&self, i: usize, to: Point) -> bool {
        if i >= self.seeds.len() {
            return false;
        }
        let (prev, next) = self.neighbours(i);
        prev.into_iter()
            .chain(next)
            .all(|j| self.seeds[j] != to)
    }

    /// Rebuild the polygon after moving the active seed of `halves` to `to`.
    ///
    /// `incoming` is the traced path previous seed -> `to`, `outgoing` the
    /// path `to` -> next seed, both with their end points. A missing path is
    /// replaced by a direct jump. Seed positions after the edited stretches
    /// shift by the change in length.
    ///
    /// # Returns
    /// `false` and no change if `to` is a neighbouring seed
    pub fn rebuild(
        &mut self,
        halves: &SplitHalves,
        to: Point,
        incoming: Option<Vec<Point>>,
        outgoing: Option<Vec<Point>>,
    ) -> bool {
        let i = halves.active;
        if !self.can_move_seed(i, to) {
            return false;
        }
        let (prev, next) = self.neighbours(i);
        self.seeds[i] = to;

        let incoming = prev.map(|p| incoming.unwrap_or_else(|| vec![self.seeds[p], to]));
        let outgoing = next.map(|q| outgoing.unwrap_or_else(|| vec![to, self.seeds[q]]));

        let mut points = Vec::with_capacity(self.points.len());

        if i > 0 {
            points.extend_from_slice(&halves.before);
            if let Some(path) = &incoming {
                points.extend_from_slice(path);
            }
            self.seed_positions[i] = points.len() - 1;

            if let (Some(q), Some(path)) = (next, &outgoing) {
                points.extend_from_slice(&path[1..]);
                if q > 0 {
                    self.shift_positions_from(q, points.len() - 1);
                    points.extend_from_slice(&halves.after);
                }
            }
        } else {
            self.seed_positions[0] = 0;
            match &outgoing {
                Some(path) => {
                    points.extend_from_slice(path);
                    self.shift_positions_from(1, points.len() - 1);
                    points.extend_from_slice(&halves.after);
                    if self.closed {
                        if let Some(path) = &incoming {
                            points.extend_from_slice(&path[1..]);
                        }
                    }
                }
                None => points.push(to),
            }
        }

        self.points = points;
        true
    }

    /// Move seed `from` to buffer index `index` and shift all later seeds
    /// by the same amount.
    fn shift_positions_from(&mut self, from: usize, index: usize) {
        let offset = index as isize - self.seed_positions[from] as isize;
        for pos in &mut self.seed_positions[from..] {
            *pos = (*pos as isize + offset) as usize;
        }
    }
}
