//! Tracing configuration record.

pub use crate::filters::edge::GradientOperator;

/// All tunables of the live-wire engine in one place.
///
/// Designed to be swapped as a whole so tests can vary one parameter at a
/// time against an otherwise default configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveWireConfig {
    // -- Preprocessing --
    /// Gaussian smoothing radius applied to the raw image. 0 = off.
    pub smoothing_radius: usize,
    /// Gradient operator used for magnitudes and normals.
    pub gradient_operator: GradientOperator,

    // -- Cost blend --
    /// Weight of the Laplacian zero-crossing term.
    pub weight_log: f32,
    /// Weight of the gradient-magnitude term.
    pub weight_gradient: f32,
    /// Weight of the normal (curvature) term.
    pub weight_normal: f32,
    /// Look gradient costs up in the trainable curve instead of `1 - g`.
    pub dynamic_training: bool,

    // -- Interaction --
    /// Half-width of the search window around a freshly placed seed.
    pub search_window: usize,
    /// Manhattan distance (exclusive) within which a click picks a point.
    pub pick_tolerance: i32,
}

impl Default for LiveWireConfig {
    fn default() -> Self {
        Self {
            smoothing_radius: 0,
            gradient_operator: GradientOperator::CentralDifference,
            weight_log: 0.0,
            weight_gradient: 0.7,
            weight_normal: 0.3,
            dynamic_training: true,
            search_window: 500,
            pick_tolerance: 3,
        }
    }
}

impl LiveWireConfig {
    /// True if switching from `self` to `other` invalidates derived fields.
    pub fn needs_preprocessing(&self, other: &LiveWireConfig) -> bool {
        self.smoothing_radius != other.smoothing_radius
            || self.gradient_operator != other.gradient_operator
    }

    /// Negative weights would break the search; clamp them to zero.
    pub fn sanitized(mut self) -> Self {
        self.weight_log = self.weight_log.max(0.0);
        self.weight_gradient = self.weight_gradient.max(0.0);
        self.weight_normal = self.weight_normal.max(0.0);
        self.pick_tolerance = self.pick_tolerance.max(1);
        self
    }
}
