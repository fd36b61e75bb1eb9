//! Interactive live-wire engine.
//!
//! Owns the image features, cost model, search workspace and the seed
//! polygon, and turns pointer/keyboard events into polygon edits:
//!
//! - `Idle`: no polygon. A left press places the first seed.
//! - `Tracing`: the preview follows the cursor from the last seed. Left
//!   press commits it, right press trims the polygon back.
//! - `SeedEditing`: the polygon is complete (frozen, restored or linked from
//!   seeds). Presses select or insert seeds, dragging re-traces the two
//!   stretches around the selected seed.
//!
//! Escape returns to `Idle` from anywhere. No interactive call ever fails:
//! invalid input is ignored and reported through the return value.

use ndarray::{Array2, Array3};

use super::config::{GradientOperator, LiveWireConfig};
use super::cost::{CostModel, GradientCostCurve};
use super::features::ImageFeatures;
use super::polygon::{SeedPolygon, SplitHalves};
use super::search::PathSearch;
use super::types::{Buttons, GrayImage, Key, Modifiers, MouseButton, Point};

/// Manhattan distance (exclusive) within which an external seed is matched
/// to a guess-curve point.
const GUESS_CURVE_TOLERANCE: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Tracing,
    SeedEditing,
}

/// Window that always contains the least-cost link between `a` and `b`
/// found when the pair was first linked.
fn seed_link_window(a: Point, b: Point) -> usize {
    (a.chebyshev(b) as usize * 3) / 2
}

#[derive(Debug, Default)]
pub struct LiveWireEngine {
    config: LiveWireConfig,
    image: Option<GrayImage>,
    features: Option<ImageFeatures>,
    model: CostModel,
    search: PathSearch,

    polygon: SeedPolygon,
    preview: Vec<Point>,
    state: InteractionState,
    active_seed: Option<usize>,
    halves: Option<SplitHalves>,

    guess_curve: Vec<Point>,
    propagate: bool,
    seed_move_mode: bool,
}

impl LiveWireEngine {
    pub fn new() -> Self {
        Self::with_config(LiveWireConfig::default())
    }

    pub fn with_config(config: LiveWireConfig) -> Self {
        let config = config.sanitized();
        Self {
            model: CostModel::from_config(&config),
            config,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Image and configuration
    // ------------------------------------------------------------------

    /// Load a row-major 8-bit buffer. Invalid geometry leaves the engine
    /// untouched.
    pub fn set_image_data(&mut self, width: usize, height: usize, data: &[u8]) -> bool {
        match GrayImage::from_raw(width, height, data) {
            Ok(image) => {
                self.set_image(image);
                true
            }
            Err(err) => {
                log::warn!("image rejected: {err}");
                false
            }
        }
    }

    /// Replace the image, recompute all derived fields and clear the polygon.
    pub fn set_image(&mut self, image: GrayImage) {
        let (width, height) = (image.width(), image.height());
        self.features = Some(ImageFeatures::compute(&image, &self.config));
        self.image = Some(image);
        self.search = PathSearch::new(width, height);
        self.model.curve = GradientCostCurve::static_curve();
        self.reset_polygon();
        log::info!("live-wire image loaded ({width}x{height})");
    }

    pub fn has_image(&self) -> bool {
        self.features.is_some()
    }

    pub fn width(&self) -> usize {
        self.features.as_ref().map_or(0, ImageFeatures::width)
    }

    pub fn height(&self) -> usize {
        self.features.as_ref().map_or(0, ImageFeatures::height)
    }

    pub fn config(&self) -> &LiveWireConfig {
        &self.config
    }

    /// Swap the configuration.
    ///
    /// Smoothing or operator changes recompute the fields from the retained
    /// image and clear the polygon. Weight changes keep the polygon.
    pub fn set_config(&mut self, config: LiveWireConfig) {
        let config = config.sanitized();
        let reprocess = self.config.needs_preprocessing(&config);
        self.config = config;
        self.model.apply_config(&self.config);

        if reprocess {
            if let Some(image) = &self.image {
                self.features = Some(ImageFeatures::compute(image, &self.config));
                log::info!(
                    "fields recomputed (smoothing {}, {:?})",
                    self.config.smoothing_radius,
                    self.config.gradient_operator
                );
                self.reset_polygon();
            }
        } else if self.state == InteractionState::Tracing {
            self.restart_search();
        }
    }

    pub fn set_smoothing_radius(&mut self, radius: usize) {
        let config = LiveWireConfig {
            smoothing_radius: radius,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_gradient_operator(&mut self, operator: GradientOperator) {
        let config = LiveWireConfig {
            gradient_operator: operator,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_weight_log(&mut self, weight: f32) {
        let config = LiveWireConfig {
            weight_log: weight,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_weight_gradient(&mut self, weight: f32) {
        let config = LiveWireConfig {
            weight_gradient: weight,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_weight_normal(&mut self, weight: f32) {
        let config = LiveWireConfig {
            weight_normal: weight,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_dynamic_training(&mut self, enabled: bool) {
        let config = LiveWireConfig {
            dynamic_training: enabled,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Pointer press at `p`.
    ///
    /// # Returns
    /// `true` if the press changed the polygon or the seed selection
    pub fn press(&mut self, p: Point, button: MouseButton, modifiers: Modifiers) -> bool {
        if !self.accepts(p) {
            return false;
        }

        match (self.state, button) {
            (InteractionState::Idle, MouseButton::Left) => {
                self.polygon.start(p);
                self.preview.clear();
                self.state = InteractionState::Tracing;
                self.restart_search();
                log::debug!("first seed at ({}, {})", p.x, p.y);
                true
            }
            (InteractionState::Tracing, MouseButton::Left) => self.commit_seed(p),
            (InteractionState::Tracing, MouseButton::Right) => self.trim_to(p),
            (InteractionState::SeedEditing, MouseButton::Left) => {
                if modifiers.shift {
                    self.insert_seed(p).is_some()
                } else {
                    self.select_seed(p)
                }
            }
            _ => false,
        }
    }

    /// Pointer move to `p` with `buttons` held.
    ///
    /// Runs on every pointer event; only `trace!` logging here.
    pub fn move_to(&mut self, p: Point, buttons: Buttons) -> bool {
        if !self.accepts(p) {
            return false;
        }

        match self.state {
            InteractionState::Tracing => match self.search.trace(p) {
                Some(path) => {
                    self.preview = path[1..].to_vec();
                    true
                }
                None => {
                    log::trace!("({}, {}) outside the search window", p.x, p.y);
                    self.preview.clear();
                    false
                }
            },
            InteractionState::SeedEditing if buttons.primary_only() => match self.active_seed {
                Some(i) => self.drag_seed(i, p),
                None => false,
            },
            _ => false,
        }
    }

    /// Pointer release: drop the seed selection.
    pub fn release(&mut self) {
        self.active_seed = None;
        self.halves = None;
    }

    pub fn key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                self.reset_polygon();
                log::debug!("polygon cleared");
                true
            }
            Key::Other => false,
        }
    }

    /// Clear polygon, preview and selection and return to `Idle`.
    pub fn reset_polygon(&mut self) {
        self.polygon.clear();
        self.preview.clear();
        self.active_seed = None;
        self.halves = None;
        self.search.invalidate();
        self.state = InteractionState::Idle;
    }

    /// Close the polygon with a path from the last seed to the first.
    ///
    /// The pending preview is discarded. Needs at least two seeds.
    pub fn freeze(&mut self) -> bool {
        if self.state != InteractionState::Tracing || self.polygon.seed_count() < 2 {
            log::debug!("freeze ignored: need two seeds while tracing");
            return false;
        }
        let (Some(&first), Some(&last)) = (self.polygon.points().first(), self.polygon.points().last())
        else {
            return false;
        };
        let Some(features) = self.features.as_ref() else {
            return false;
        };

        let window = self
            .config
            .search_window
            .max((last.chebyshev(first) as usize * 3).div_ceil(2));
        self.search.run(features, &self.model, last, window);
        let Some(path) = self.search.trace(first) else {
            log::warn!("freeze: first seed unreachable from ({}, {})", last.x, last.y);
            return false;
        };

        self.polygon.close_with(&path[1..]);
        self.preview.clear();
        self.state = InteractionState::SeedEditing;
        log::info!(
            "polygon frozen: {} points, {} seeds",
            self.polygon.len(),
            self.polygon.seed_count()
        );
        true
    }

    /// Build a closed polygon through externally supplied seeds.
    ///
    /// Seeds are ordered along the guess curve (if any), snapped to the
    /// strongest gradient in their 3x3 neighbourhood and linked with
    /// searches bounded by their spacing.
    pub fn livewire_from_seeds(&mut self, seeds: &[Point]) -> bool {
        let Some(features) = self.features.as_ref() else {
            return false;
        };
        let (width, height) = (features.width(), features.height());

        let inside: Vec<Point> = seeds.iter().copied().filter(|s| s.in_bounds(width, height)).collect();
        let mut snapped: Vec<Point> = Vec::with_capacity(inside.len());
        for seed in self.order_by_guess_curve(&inside) {
            let seed = snap_to_edge(features, seed);
            if snapped.last() != Some(&seed) {
                snapped.push(seed);
            }
        }
        if snapped.len() > 1 && snapped.first() == snapped.last() {
            snapped.pop();
        }

        self.reset_polygon();
        let Some(&first) = snapped.first() else {
            log::debug!("no usable seeds to link");
            return false;
        };

        self.polygon.start(first);
        for pair in snapped.windows(2) {
            let path = self.link(pair[0], pair[1]);
            let segment = path.as_deref().map_or(&[][..], |p| &p[1..]);
            self.polygon.commit_segment(segment, pair[1]);
        }
        if snapped.len() >= 2 {
            let last = snapped[snapped.len() - 1];
            let path = self.link(last, first);
            let segment = path.as_deref().map_or(&[][..], |p| &p[1..]);
            self.polygon.close_with(segment);
        }

        self.state = InteractionState::SeedEditing;
        log::info!(
            "linked {} seeds into {} points",
            self.polygon.seed_count(),
            self.polygon.len()
        );
        true
    }

    /// Select seed `i` and freeze the polygon stretches it does not affect.
    pub fn split_polygon(&mut self, i: usize) -> bool {
        if i >= self.polygon.seed_count() {
            return false;
        }
        self.halves = Some(self.polygon.split(i));
        self.active_seed = Some(i);
        true
    }

    /// Insert a seed at the polygon point nearest to `p` and select it.
    ///
    /// An existing seed within tolerance is selected instead and its index
    /// returned.
    ///
    /// # Returns
    /// Index of the selected seed, `None` if nothing lies within tolerance
    pub fn insert_seed(&mut self, p: Point) -> Option<usize> {
        if self.state != InteractionState::SeedEditing {
            return None;
        }
        let tolerance = self.config.pick_tolerance;

        if let Some(i) = self.polygon.nearest_seed(p, tolerance) {
            self.split_polygon(i);
            return Some(i);
        }

        match self.polygon.insert_seed(p, tolerance) {
            Some(i) => {
                self.split_polygon(i);
                log::debug!("seed {i} inserted at ({}, {})", p.x, p.y);
                Some(i)
            }
            None => {
                log::debug!("no polygon point near ({}, {})", p.x, p.y);
                None
            }
        }
    }

    /// Retrain the gradient cost curve from the polygon tail.
    pub fn update_gradient_cost(&mut self) -> bool {
        let Some(features) = self.features.as_ref() else {
            return false;
        };
        match GradientCostCurve::trained(self.polygon.points(), features.gradient.magnitude.view()) {
            Ok(curve) => {
                self.model.curve = curve;
                log::info!("gradient cost curve retrained");
                if self.state == InteractionState::Tracing {
                    self.restart_search();
                }
                true
            }
            Err(err) => {
                log::debug!("cost curve kept: {err}");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Propagation and restore
    // ------------------------------------------------------------------

    pub fn set_guess_curve(&mut self, curve: Vec<Point>) {
        self.guess_curve = curve;
    }

    /// Use the current polygon as the guess curve.
    pub fn renew_guess_curve(&mut self) {
        self.guess_curve = self.polygon.points().to_vec();
    }

    pub fn guess_curve(&self) -> &[Point] {
        &self.guess_curve
    }

    pub fn set_propagate_livewire(&mut self, propagate: bool) {
        self.propagate = propagate;
        self.guess_curve.clear();
    }

    pub fn propagate_livewire(&self) -> bool {
        self.propagate
    }

    /// Install a persisted polygon for seed editing.
    pub fn set_polygon_to_update(
        &mut self,
        points: Vec<Point>,
        seeds: Vec<Point>,
        seed_positions: Vec<usize>,
        closed: bool,
    ) -> bool {
        let (width, height) = (self.width(), self.height());
        if !self.has_image() || points.iter().any(|p| !p.in_bounds(width, height)) {
            log::warn!("polygon rejected: points outside the image");
            return false;
        }

        match SeedPolygon::from_parts(points, seeds, seed_positions, closed) {
            Ok(polygon) => {
                self.reset_polygon();
                self.polygon = polygon;
                self.state = InteractionState::SeedEditing;
                log::info!(
                    "polygon restored: {} points, {} seeds",
                    self.polygon.len(),
                    self.polygon.seed_count()
                );
                true
            }
            Err(err) => {
                log::warn!("polygon rejected: {err}");
                false
            }
        }
    }

    /// Switch between seed editing and tracing.
    ///
    /// A closed polygon stays in seed editing.
    pub fn set_seed_move_mode(&mut self, enabled: bool) {
        self.seed_move_mode = enabled;
        if self.polygon.is_empty() {
            return;
        }
        if enabled {
            self.preview.clear();
            self.state = InteractionState::SeedEditing;
        } else if self.state == InteractionState::SeedEditing && !self.polygon.closed() {
            self.release();
            self.state = InteractionState::Tracing;
            self.restart_search();
        }
    }

    pub fn seed_move_mode(&self) -> bool {
        self.seed_move_mode
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Committed polygon points.
    pub fn polygon(&self) -> &[Point] {
        self.polygon.points()
    }

    /// Live preview from the last seed (exclusive) to the cursor.
    pub fn livewire(&self) -> &[Point] {
        &self.preview
    }

    pub fn seeds(&self) -> &[Point] {
        self.polygon.seeds()
    }

    pub fn seed_positions(&self) -> &[usize] {
        self.polygon.seed_positions()
    }

    pub fn closed(&self) -> bool {
        self.polygon.closed()
    }

    pub fn seed_polygon(&self) -> &SeedPolygon {
        &self.polygon
    }

    pub fn active_seed(&self) -> Option<usize> {
        self.active_seed
    }

    pub fn features(&self) -> Option<&ImageFeatures> {
        self.features.as_ref()
    }

    pub fn gradient(&self) -> Option<&Array2<f32>> {
        self.features.as_ref().map(|f| &f.gradient.magnitude)
    }

    pub fn normals(&self) -> Option<&Array3<f32>> {
        self.features.as_ref().map(|f| &f.gradient.normal)
    }

    pub fn cost_curve(&self) -> &GradientCostCurve {
        &self.model.curve
    }

    /// Cost field of the latest search.
    pub fn cost_field(&self) -> Array2<f32> {
        self.search.cost_field()
    }

    /// Predecessor field of the latest search.
    pub fn predecessor_field(&self) -> Array2<Option<Point>> {
        self.search.predecessor_field()
    }

    /// RGBA raster of the gradient cost, (0, 0, 4) without an image.
    pub fn cost_overlay_rgba(&self) -> Array3<u8> {
        match &self.features {
            Some(features) => self.model.cost_overlay_rgba(features.gradient.magnitude.view()),
            None => Array3::zeros((0, 0, 4)),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn accepts(&self, p: Point) -> bool {
        let inside = p.in_bounds(self.width(), self.height());
        if !inside && self.has_image() {
            log::trace!("({}, {}) outside the image", p.x, p.y);
        }
        inside
    }

    /// Search again from the polygon's last point with the configured window.
    fn restart_search(&mut self) {
        let Some(features) = self.features.as_ref() else {
            return;
        };
        if let Some(&last) = self.polygon.points().last() {
            self.search.run(features, &self.model, last, self.config.search_window);
            log::debug!(
                "search from ({}, {}) expanded {} pixels",
                last.x,
                last.y,
                self.search.expanded()
            );
        }
        self.preview.clear();
    }

    fn commit_seed(&mut self, p: Point) -> bool {
        if self.polygon.points().last() == Some(&p) {
            return false;
        }
        match self.search.trace(p) {
            Some(path) => self.polygon.commit_segment(&path[1..], p),
            None => {
                log::debug!("({}, {}) unreachable, seed placed without a path", p.x, p.y);
                self.polygon.commit_segment(&[], p);
            }
        }
        log::debug!(
            "seed {} at ({}, {}), polygon {} points",
            self.polygon.seed_count() - 1,
            p.x,
            p.y,
            self.polygon.len()
        );
        self.restart_search();
        true
    }

    fn trim_to(&mut self, p: Point) -> bool {
        match self.polygon.trim_to(p, self.config.pick_tolerance) {
            Some(keep) => {
                log::debug!(
                    "polygon trimmed to {} points, {} seeds",
                    keep + 1,
                    self.polygon.seed_count()
                );
                self.restart_search();
                true
            }
            None => false,
        }
    }

    fn select_seed(&mut self, p: Point) -> bool {
        match self.polygon.nearest_seed(p, self.config.pick_tolerance) {
            Some(i) => {
                log::debug!("seed {i} selected");
                self.split_polygon(i)
            }
            None => {
                self.release();
                false
            }
        }
    }

    /// Least-cost path `a` -> `b` with a window sized to their spacing.
    fn link(&mut self, a: Point, b: Point) -> Option<Vec<Point>> {
        let features = self.features.as_ref()?;
        self.search.run(features, &self.model, a, seed_link_window(a, b));
        self.search.trace(b)
    }

    fn drag_seed(&mut self, i: usize, p: Point) -> bool {
        if !self.polygon.can_move_seed(i, p) {
            log::trace!("seed {i} cannot move onto a neighbouring seed");
            return false;
        }
        let halves = match self.halves.take() {
            Some(halves) if halves.active == i => halves,
            _ => self.polygon.split(i),
        };

        let (prev, next) = self.polygon.neighbours(i);
        let seeds = self.polygon.seeds();
        let (prev_seed, next_seed) = (prev.map(|j| seeds[j]), next.map(|j| seeds[j]));

        let incoming = prev_seed.and_then(|s| self.link(s, p));
        let outgoing = next_seed.and_then(|s| self.link(p, s));
        let moved = self.polygon.rebuild(&halves, p, incoming, outgoing);
        self.halves = Some(halves);
        moved
    }

    /// Reorder seeds along the guess curve; seeds it never passes keep
    /// their relative order at the end.
    fn order_by_guess_curve(&self, seeds: &[Point]) -> Vec<Point> {
        if self.guess_curve.is_empty() {
            return seeds.to_vec();
        }

        let mut used = vec![false; seeds.len()];
        let mut ordered = Vec::with_capacity(seeds.len());
        for c in &self.guess_curve {
            for (j, s) in seeds.iter().enumerate() {
                if !used[j] && s.manhattan(*c) < GUESS_CURVE_TOLERANCE {
                    used[j] = true;
                    ordered.push(*s);
                }
            }
        }
        ordered.extend(seeds.iter().zip(&used).filter(|(_, &u)| !u).map(|(s, _)| *s));
        ordered
    }
}

/// Move `seed` to the strongest gradient in its 3x3 neighbourhood (clamped
/// to the image). Ties keep the seed where it is.
fn snap_to_edge(features: &ImageFeatures, seed: Point) -> Point {
    let (width, height) = (features.width() as i32, features.height() as i32);
    let mut best = seed;
    let mut best_g = features.magnitude(seed.x as usize, seed.y as usize);

    for y in (seed.y - 1).max(0)..=(seed.y + 1).min(height - 1) {
        for x in (seed.x - 1).max(0)..=(seed.x + 1).min(width - 1) {
            let g = features.magnitude(x as usize, y as usize);
            if g > best_g {
                best_g = g;
                best = Point::new(x, y);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::SQRT_2;

    fn engine_for(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> LiveWireEngine {
        let data: Vec<u8> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        let mut engine = LiveWireEngine::new();
        assert!(engine.set_image_data(width, height, &data));
        engine
    }

    fn disk(width: usize, height: usize) -> LiveWireEngine {
        engine_for(width, height, |x, y| {
            let (dx, dy) = (x as f32 - 15.0, y as f32 - 15.0);
            if dx * dx + dy * dy <= 81.0 {
                200
            } else {
                30
            }
        })
    }

    fn left(engine: &mut LiveWireEngine, x: i32, y: i32) -> bool {
        engine.press(Point::new(x, y), MouseButton::Left, Modifiers::NONE)
    }

    fn open_corner_polygon() -> LiveWireEngine {
        let mut engine = engine_for(10, 10, |_, _| 90);
        left(&mut engine, 1, 1);
        left(&mut engine, 8, 1);
        left(&mut engine, 8, 8);
        engine
    }

    #[test]
    fn test_flat_image_pure_distance() {
        let mut engine = engine_for(10, 10, |_, _| 128);
        assert!(engine.gradient().unwrap().iter().all(|&g| g == 0.0));

        left(&mut engine, 5, 5);
        assert_eq!(engine.state(), InteractionState::Tracing);
        assert!(engine.move_to(Point::new(0, 0), Buttons::NONE));

        let preview = engine.livewire();
        assert_eq!(preview.len(), 5);
        assert_eq!(preview.last(), Some(&Point::new(0, 0)));

        let unit = 0.7 + 0.3 * 4.0 / 9.0;
        let cost = engine.cost_field()[[0, 0]];
        assert!((cost - 5.0 * SQRT_2 * unit).abs() < 1e-4);
    }

    #[test]
    fn test_path_follows_vertical_edge() {
        let mut engine = engine_for(10, 10, |x, _| if x == 5 { 255 } else { 0 });
        left(&mut engine, 2, 2);
        left(&mut engine, 8, 8);

        let polygon = engine.polygon();
        assert_eq!(polygon.first(), Some(&Point::new(2, 2)));
        assert_eq!(polygon.last(), Some(&Point::new(8, 8)));
        let near_edge = polygon.iter().filter(|p| (4..=6).contains(&p.x)).count();
        assert!(near_edge > 3, "straight diagonal would cross in 3 points");
    }

    #[test]
    fn test_commit_appends_seed_and_clears_preview() {
        let mut engine = engine_for(10, 10, |_, _| 90);
        left(&mut engine, 1, 1);
        engine.move_to(Point::new(6, 1), Buttons::NONE);
        assert_eq!(engine.livewire().len(), 5);

        left(&mut engine, 6, 1);
        assert!(engine.livewire().is_empty());
        assert_eq!(engine.seeds(), &[Point::new(1, 1), Point::new(6, 1)]);
        assert_eq!(engine.seed_positions(), &[0, 5]);
        assert!(engine.seed_polygon().check().is_ok());

        // Same point again is ignored
        assert!(!left(&mut engine, 6, 1));
        assert_eq!(engine.seeds().len(), 2);
    }

    #[test]
    fn test_right_click_trims_seeds() {
        let mut engine = open_corner_polygon();
        assert_eq!(engine.seeds().len(), 3);

        // Matches (2..=6, 1); the last one from the end is (6, 1)
        assert!(engine.press(Point::new(4, 1), MouseButton::Right, Modifiers::NONE));
        assert_eq!(engine.polygon().len(), 6);
        assert_eq!(engine.polygon().last(), Some(&Point::new(6, 1)));
        assert_eq!(engine.seeds(), &[Point::new(1, 1), Point::new(6, 1)]);
        assert_eq!(engine.seed_positions(), &[0, 5]);
        assert!(engine.seed_polygon().check().is_ok());

        // Tracing continues from the trimmed end
        assert!(engine.move_to(Point::new(6, 4), Buttons::NONE));
        assert_eq!(engine.livewire().first(), Some(&Point::new(6, 2)));
    }

    #[test]
    fn test_right_click_near_seed() {
        let mut engine = open_corner_polygon();
        assert!(engine.press(Point::new(8, 1), MouseButton::Right, Modifiers::NONE));
        assert_eq!(engine.polygon().last(), Some(&Point::new(8, 3)));
        assert_eq!(engine.seeds().len(), 3);
        assert!(engine.seed_polygon().check().is_ok());

        assert!(!engine.press(Point::new(1, 8), MouseButton::Right, Modifiers::NONE));
    }

    #[test]
    fn test_freeze_closes_polygon() {
        let mut engine = open_corner_polygon();
        engine.move_to(Point::new(3, 8), Buttons::NONE);
        assert!(engine.freeze());

        assert!(engine.closed());
        assert_eq!(engine.state(), InteractionState::SeedEditing);
        assert!(engine.livewire().is_empty());
        let polygon = engine.polygon();
        assert_eq!(polygon.first(), polygon.last());
        assert_eq!(engine.seeds().len(), 3);
        assert!(engine.seed_polygon().check().is_ok());
    }

    #[test]
    fn test_freeze_needs_two_seeds() {
        let mut engine = engine_for(10, 10, |_, _| 90);
        assert!(!engine.freeze());
        left(&mut engine, 1, 1);
        assert!(!engine.freeze());
        assert!(!engine.closed());
    }

    #[test]
    fn test_escape_resets() {
        let mut engine = open_corner_polygon();
        assert!(engine.key(Key::Escape));
        assert_eq!(engine.state(), InteractionState::Idle);
        assert!(engine.polygon().is_empty());
        assert!(engine.seeds().is_empty());
        assert!(!engine.key(Key::Other));
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut engine = engine_for(10, 10, |_, _| 90);
        assert!(!left(&mut engine, 10, 3));
        assert!(!left(&mut engine, -1, 3));
        assert_eq!(engine.state(), InteractionState::Idle);

        let mut empty = LiveWireEngine::new();
        assert!(!left(&mut empty, 0, 0));
        assert!(!empty.move_to(Point::new(0, 0), Buttons::LEFT));
        assert!(!empty.livewire_from_seeds(&[Point::new(1, 1)]));
    }

    #[test]
    fn test_rejects_bad_image() {
        let mut engine = LiveWireEngine::new();
        assert!(!engine.set_image_data(0, 5, &[]));
        assert!(!engine.set_image_data(3, 3, &[0; 8]));
        assert!(!engine.has_image());
        assert_eq!(engine.cost_overlay_rgba().dim(), (0, 0, 4));
    }

    #[test]
    fn test_deterministic_interaction() {
        let run = || {
            let mut engine = disk(30, 30);
            left(&mut engine, 15, 6);
            engine.move_to(Point::new(22, 9), Buttons::NONE);
            left(&mut engine, 24, 15);
            left(&mut engine, 15, 24);
            engine.move_to(Point::new(8, 20), Buttons::NONE);
            (engine.polygon().to_vec(), engine.livewire().to_vec())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_livewire_from_seeds_closes_loop() {
        let mut engine = disk(30, 30);
        let seeds = [
            Point::new(15, 6),
            Point::new(24, 15),
            Point::new(15, 24),
            Point::new(6, 15),
        ];
        assert!(engine.livewire_from_seeds(&seeds));
        assert!(engine.closed());
        assert_eq!(engine.state(), InteractionState::SeedEditing);
        assert_eq!(engine.seeds().len(), 4);
        assert_eq!(engine.polygon().first(), engine.polygon().last());
        assert!(engine.seed_polygon().check().is_ok());

        // Snapped seeds sit on the disk border gradient
        let gradient = engine.gradient().unwrap();
        for s in engine.seeds() {
            assert!(gradient[[s.y as usize, s.x as usize]] > 0.0);
        }
    }

    #[test]
    fn test_drag_back_reproduces_polygon() {
        let mut engine = disk(30, 30);
        engine.livewire_from_seeds(&[
            Point::new(15, 6),
            Point::new(24, 15),
            Point::new(15, 24),
            Point::new(6, 15),
        ]);
        let original = engine.seed_polygon().clone();

        for i in [0, 1, 3] {
            let seed = engine.seeds()[i];
            assert!(engine.press(seed, MouseButton::Left, Modifiers::NONE));
            assert_eq!(engine.active_seed(), Some(i));

            let away = Point::new(seed.x + 2, seed.y + 1);
            assert!(engine.move_to(away, Buttons::LEFT));
            assert_eq!(engine.seeds()[i], away);
            assert!(engine.seed_polygon().check().is_ok());
            assert_eq!(engine.polygon().first(), engine.polygon().last());

            assert!(engine.move_to(seed, Buttons::LEFT));
            engine.release();
            assert_eq!(engine.seed_polygon(), &original, "seed {i}");
        }
    }

    #[test]
    fn test_drag_onto_neighbour_seed_is_ignored() {
        let mut engine = disk(30, 30);
        engine.livewire_from_seeds(&[
            Point::new(15, 6),
            Point::new(24, 15),
            Point::new(15, 24),
            Point::new(6, 15),
        ]);
        let original = engine.seed_polygon().clone();
        let seeds = engine.seeds().to_vec();

        assert!(engine.press(seeds[1], MouseButton::Left, Modifiers::NONE));
        assert!(!engine.move_to(seeds[0], Buttons::LEFT));
        assert!(!engine.move_to(seeds[2], Buttons::LEFT));
        assert!(engine.seed_polygon().check().is_ok());
        assert_eq!(engine.seed_polygon(), &original);

        // Dragging continues normally afterwards
        let away = Point::new(seeds[1].x + 1, seeds[1].y + 2);
        assert!(engine.move_to(away, Buttons::LEFT));
        assert!(engine.seed_polygon().check().is_ok());
        engine.release();

        // Seed 0 of the closed loop is linked to the last seed
        assert!(engine.press(seeds[0], MouseButton::Left, Modifiers::NONE));
        assert!(!engine.move_to(seeds[3], Buttons::LEFT));
        assert!(engine.seed_polygon().check().is_ok());

        engine.release();

        // Later edits start from a consistent polygon
        let inserted = engine.insert_seed(engine.polygon()[3]);
        assert!(inserted.is_some());
        assert!(engine.seed_polygon().check().is_ok());
    }

    #[test]
    fn test_move_without_selection_or_button() {
        let mut engine = open_corner_polygon();
        assert!(engine.freeze());
        let before = engine.polygon().to_vec();

        assert!(!engine.move_to(Point::new(5, 5), Buttons::LEFT));
        left(&mut engine, 8, 1);
        assert!(!engine.move_to(Point::new(7, 2), Buttons::NONE));
        assert_eq!(engine.polygon(), &before[..]);
    }

    #[test]
    fn test_insert_seed() {
        let mut engine = open_corner_polygon();
        assert!(engine.freeze());

        // Far from every edge point
        assert_eq!(engine.insert_seed(Point::new(2, 7)), None);
        assert!(!engine.press(Point::new(2, 7), MouseButton::Left, Modifiers::SHIFT));
        assert_eq!(engine.seeds().len(), 3);

        let inserted = engine.insert_seed(Point::new(8, 5));
        assert_eq!(inserted, Some(2));
        assert_eq!(engine.active_seed(), Some(2));
        assert_eq!(engine.seeds()[2], Point::new(8, 5));
        assert_eq!(engine.seeds().len(), 4);
        assert!(engine.seed_polygon().check().is_ok());

        // Existing seed within tolerance is selected instead
        assert_eq!(engine.insert_seed(Point::new(8, 2)), Some(1));
        assert_eq!(engine.seeds().len(), 4);
    }

    #[test]
    fn test_retrain_needs_long_polygon() {
        let mut engine = engine_for(50, 50, |_, _| 60);
        left(&mut engine, 2, 2);
        left(&mut engine, 2, 20);
        let before = engine.cost_curve().clone();
        assert!(!engine.update_gradient_cost());
        assert_eq!(engine.cost_curve(), &before);

        left(&mut engine, 2, 45);
        assert!(engine.polygon().len() >= 32);
        assert!(engine.update_gradient_cost());
        assert!(engine.cost_curve().values()[0] < 1.0);
    }

    #[test]
    fn test_config_changes() {
        let mut engine = open_corner_polygon();
        engine.set_weight_normal(0.5);
        assert_eq!(engine.seeds().len(), 3);
        assert_eq!(engine.state(), InteractionState::Tracing);

        engine.set_gradient_operator(GradientOperator::Sobel);
        assert_eq!(engine.state(), InteractionState::Idle);
        assert!(engine.polygon().is_empty());
        assert_eq!(engine.config().gradient_operator, GradientOperator::Sobel);
    }

    #[test]
    fn test_polygon_restore() {
        let mut engine = engine_for(10, 10, |_, _| 90);
        let points: Vec<Point> = (1..=5).map(|x| Point::new(x, 2)).collect();

        assert!(!engine.set_polygon_to_update(
            points.clone(),
            vec![Point::new(1, 2), Point::new(5, 2)],
            vec![0, 2],
            false
        ));
        assert_eq!(engine.state(), InteractionState::Idle);

        assert!(engine.set_polygon_to_update(
            points,
            vec![Point::new(1, 2), Point::new(5, 2)],
            vec![0, 4],
            false
        ));
        assert_eq!(engine.state(), InteractionState::SeedEditing);
        assert_eq!(engine.polygon().len(), 5);
    }

    #[test]
    fn test_seed_move_mode_toggle() {
        let mut engine = open_corner_polygon();
        engine.set_seed_move_mode(true);
        assert!(engine.seed_move_mode());
        assert_eq!(engine.state(), InteractionState::SeedEditing);

        engine.set_seed_move_mode(false);
        assert_eq!(engine.state(), InteractionState::Tracing);
        assert!(engine.move_to(Point::new(5, 8), Buttons::NONE));

        assert!(engine.freeze());
        engine.set_seed_move_mode(false);
        assert_eq!(engine.state(), InteractionState::SeedEditing);
    }

    #[test]
    fn test_guess_curve_orders_seeds() {
        let mut engine = disk(30, 30);
        engine.set_guess_curve(vec![
            Point::new(15, 6),
            Point::new(24, 15),
            Point::new(15, 24),
            Point::new(6, 15),
        ]);
        let shuffled = [Point::new(6, 15), Point::new(24, 15), Point::new(15, 6), Point::new(15, 24)];
        let ordered = engine.order_by_guess_curve(&shuffled);
        assert_eq!(
            ordered,
            vec![Point::new(15, 6), Point::new(24, 15), Point::new(15, 24), Point::new(6, 15)]
        );

        engine.set_propagate_livewire(true);
        assert!(engine.propagate_livewire());
        assert!(engine.guess_curve().is_empty());
    }

    #[test]
    fn test_overlay_shape() {
        let engine = engine_for(6, 4, |x, _| (x * 40) as u8);
        let overlay = engine.cost_overlay_rgba();
        assert_eq!(overlay.dim(), (4, 6, 4));
        assert_eq!(overlay[[0, 0, 2]], 0);
    }
}
