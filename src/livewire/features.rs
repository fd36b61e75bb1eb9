//! Per-image feature set consumed by the path search.
//!
//! Runs the preprocessing pipeline (smoothing, gradients, zero crossings)
//! once per image and keeps every derived buffer together, so replacing the
//! image replaces all of them in a single assignment.

use ndarray::Array2;

use super::config::LiveWireConfig;
use super::cost::EdgeWeightTable;
use super::types::GrayImage;
use crate::filters::blur::gaussian_box_blur_u8;
use crate::filters::edge::{gradient_fields, laplacian_zero_crossings, GradientFields};

/// Derived fields of one image.
#[derive(Debug, Clone)]
pub struct ImageFeatures {
    /// Smoothed intensities the fields were computed from
    pub smoothed: Array2<u8>,
    pub gradient: GradientFields,
    pub zero_crossings: Array2<f32>,
    pub edge_weights: EdgeWeightTable,
}

impl ImageFeatures {
    pub fn compute(image: &GrayImage, config: &LiveWireConfig) -> Self {
        let smoothed = gaussian_box_blur_u8(image.pixels().view(), config.smoothing_radius);
        let gradient = gradient_fields(smoothed.view(), config.gradient_operator);
        let zero_crossings = laplacian_zero_crossings(smoothed.view());
        let edge_weights = EdgeWeightTable::new(image.width(), image.height());

        Self {
            smoothed,
            gradient,
            zero_crossings,
            edge_weights,
        }
    }

    pub fn width(&self) -> usize {
        self.smoothed.dim().1
    }

    pub fn height(&self) -> usize {
        self.smoothed.dim().0
    }

    /// Normalized gradient magnitude at (x, y).
    #[inline]
    pub fn magnitude(&self, x: usize, y: usize) -> f32 {
        self.gradient.magnitude[[y, x]]
    }

    /// Normal vector at (x, y).
    #[inline]
    pub fn normal(&self, x: usize, y: usize) -> (f32, f32) {
        (
            self.gradient.normal[[y, x, 0]],
            self.gradient.normal[[y, x, 1]],
        )
    }
}
