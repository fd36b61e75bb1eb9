//! Cost model: gradient cost curve, static edge weights and the per-link cost.
//!
//! The cost of stepping from pixel `p` to its 8-neighbour `q` is
//!
//! ```text
//! normal = (2 / 3π) * (acos(d·n_p) + acos(d·n_q))
//! cost   = w_edge(p, q) * (w_G * curve[g_q] + w_N * normal² + w_LoG * z_q)
//! ```
//!
//! where `d` is the unit step direction, `n` the edge normal field, `g` the
//! normalized gradient magnitude and `z` the zero-crossing field. Every term
//! is non-negative, which the search relies on.

use std::f32::consts::{FRAC_1_SQRT_2, PI, SQRT_2};

use ndarray::{Array3, ArrayView2};

use super::config::LiveWireConfig;
use super::features::ImageFeatures;
use super::types::Point;
use crate::error::LiveWireError;

/// Neighbour offsets (dx, dy) in row-major order, centre excluded.
///
/// ```text
/// 0 1 2
/// 3 . 4
/// 5 6 7
/// ```
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Unit step directions matching [`NEIGHBOR_OFFSETS`].
const NEIGHBOR_DIRECTIONS: [(f32, f32); 8] = [
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (0.0, 1.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
];

/// Weight of a link that leaves the image.
pub const NO_LINK: f32 = f32::INFINITY;

/// Number of trailing polygon points sampled when retraining.
pub const TRAINING_TAIL: usize = 64;
/// Minimum polygon length before retraining has any effect.
pub const TRAINING_MIN_POINTS: usize = 32;

const TRAINING_KERNEL: [f32; 5] = [0.1, 0.2, 0.4, 0.2, 0.1];

/// Map a normalized gradient magnitude to a curve bin (0-255).
#[inline]
pub fn quantize(g: f32) -> usize {
    ((g.clamp(0.0, 1.0) * 255.0) as usize).min(255)
}

// ============================================================================
// Gradient cost curve
// ============================================================================

/// 256-entry lookup from quantized gradient magnitude to cost in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCostCurve {
    table: [f32; 256],
}

impl Default for GradientCostCurve {
    fn default() -> Self {
        Self::static_curve()
    }
}

impl GradientCostCurve {
    /// Smoothstep curve `3g² - 2g³` at `g = 1 - i/255`: expensive at weak
    /// gradients, free at the strongest.
    pub fn static_curve() -> Self {
        let mut table = [0.0f32; 256];
        for (i, v) in table.iter_mut().enumerate() {
            let g = 1.0 - i as f32 / 255.0;
            *v = 3.0 * g * g - 2.0 * g * g * g;
        }
        Self { table }
    }

    /// Cost for a normalized gradient magnitude.
    #[inline]
    pub fn cost(&self, g: f32) -> f32 {
        self.table[quantize(g)]
    }

    pub fn values(&self) -> &[f32; 256] {
        &self.table
    }

    /// Re-estimate the curve from the gradient values under a polygon tail.
    ///
    /// Takes the last (up to) 64 points of `polygon`, never its first point,
    /// builds a histogram of their quantized magnitudes, normalizes it by its
    /// mode, inverts it and smooths it with a 5-tap kernel (clamped ends).
    ///
    /// # Errors
    /// `InsufficientData` if the polygon has fewer than 32 points or no tail
    /// point lies inside the field.
    pub fn trained(polygon: &[Point], magnitude: ArrayView2<f32>) -> Result<Self, LiveWireError> {
        if polygon.len() < TRAINING_MIN_POINTS {
            return Err(LiveWireError::InsufficientData(format!(
                "{} polygon points, need {}",
                polygon.len(),
                TRAINING_MIN_POINTS
            )));
        }

        let (height, width) = magnitude.dim();
        let start = polygon.len().saturating_sub(TRAINING_TAIL).max(1);

        let mut histogram = [0.0f32; 256];
        for p in &polygon[start..] {
            if p.in_bounds(width, height) {
                let g = magnitude[[p.y as usize, p.x as usize]];
                histogram[quantize(g)] += 1.0;
            }
        }

        let mode = histogram.iter().cloned().fold(0.0f32, f32::max);
        if mode <= 0.0 {
            return Err(LiveWireError::InsufficientData(
                "no polygon point inside the image".to_string(),
            ));
        }

        let inverted: Vec<f32> = histogram.iter().map(|&h| 1.0 - h / mode).collect();

        let mut table = [0.0f32; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = TRAINING_KERNEL
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let j = (i as isize + k as isize - 2).clamp(0, 255) as usize;
                    w * inverted[j]
                })
                .sum();
        }

        Ok(Self { table })
    }
}

// ============================================================================
// Static edge weights
// ============================================================================

/// Per-pixel weights of the 8 outgoing links.
///
/// Axis-aligned links weigh 1, diagonals √2. Links that would leave the
/// image are [`NO_LINK`]. Depends only on the image size.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeWeightTable {
    weights: Array3<f32>,
}

impl EdgeWeightTable {
    pub fn new(width: usize, height: usize) -> Self {
        let mut weights = Array3::<f32>::from_elem((height, width, 8), NO_LINK);

        for y in 0..height {
            for x in 0..width {
                for (k, &(dx, dy)) in NEIGHBOR_OFFSETS.iter().enumerate() {
                    let q = Point::new(x as i32 + dx, y as i32 + dy);
                    if q.in_bounds(width, height) {
                        weights[[y, x, k]] = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                    }
                }
            }
        }

        Self { weights }
    }

    /// Weight of link `k` leaving (x, y).
    #[inline]
    pub fn weight(&self, x: usize, y: usize, k: usize) -> f32 {
        self.weights[[y, x, k]]
    }

    /// Number of usable links at (x, y).
    pub fn link_count(&self, x: usize, y: usize) -> usize {
        (0..8).filter(|&k| self.weight(x, y, k).is_finite()).count()
    }
}

// ============================================================================
// Cost model
// ============================================================================

/// Blend weights plus the (possibly trained) gradient cost curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub curve: GradientCostCurve,
    pub weight_log: f32,
    pub weight_gradient: f32,
    pub weight_normal: f32,
    pub dynamic_training: bool,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from_config(&LiveWireConfig::default())
    }
}

impl CostModel {
    /// Model with the static curve and the weights of `config`.
    pub fn from_config(config: &LiveWireConfig) -> Self {
        let mut model = Self {
            curve: GradientCostCurve::static_curve(),
            weight_log: 0.0,
            weight_gradient: 0.0,
            weight_normal: 0.0,
            dynamic_training: true,
        };
        model.apply_config(config);
        model
    }

    /// Take over the weights of `config`, keeping the current curve.
    pub fn apply_config(&mut self, config: &LiveWireConfig) {
        self.weight_log = config.weight_log.max(0.0);
        self.weight_gradient = config.weight_gradient.max(0.0);
        self.weight_normal = config.weight_normal.max(0.0);
        self.dynamic_training = config.dynamic_training;
    }

    /// Cost of the link `k` leaving (x, y).
    ///
    /// The caller guarantees the link stays inside the image.
    #[inline]
    pub fn link_cost(&self, features: &ImageFeatures, x: usize, y: usize, k: usize) -> f32 {
        let (dx, dy) = NEIGHBOR_OFFSETS[k];
        let qx = (x as i32 + dx) as usize;
        let qy = (y as i32 + dy) as usize;
        let (lx, ly) = NEIGHBOR_DIRECTIONS[k];

        let (npx, npy) = features.normal(x, y);
        let (nqx, nqy) = features.normal(qx, qy);
        let dp = (lx * npx + ly * npy).clamp(-1.0, 1.0);
        let dq = (lx * nqx + ly * nqy).clamp(-1.0, 1.0);

        let normal = (2.0 / (3.0 * PI)) * (dp.acos() + dq.acos());
        let normal_cost = self.weight_normal * normal * normal;

        let g = features.magnitude(qx, qy);
        let grad_cost = if self.dynamic_training {
            self.weight_gradient * self.curve.cost(g)
        } else {
            self.weight_gradient * (1.0 - g)
        };

        let log_cost = self.weight_log * features.zero_crossings[[qy, qx]];

        features.edge_weights.weight(x, y, k) * (grad_cost + normal_cost + log_cost)
    }

    /// RGBA visualization of the gradient cost at every pixel.
    ///
    /// `c = 200 * curve[g]`, pixel `[c, c/2, 0, c]`: an orange tint whose
    /// opacity grows with the cost.
    pub fn cost_overlay_rgba(&self, magnitude: ArrayView2<f32>) -> Array3<u8> {
        let (height, width) = magnitude.dim();
        let mut output = Array3::<u8>::zeros((height, width, 4));

        for y in 0..height {
            for x in 0..width {
                let c = (200.0 * self.curve.cost(magnitude[[y, x]])) as u8;
                output[[y, x, 0]] = c;
                output[[y, x, 1]] = c / 2;
                output[[y, x, 3]] = c;
            }
        }

        output
    }
}
