//! Live-wire (intelligent scissors) contour tracing.
//!
//! Seeds placed by the user are joined by least-cost paths over the
//! 8-connected pixel grid, where stepping along strong, consistently
//! oriented edges is cheap.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Preprocessing | [`features`] | smoothed image, gradient/normal fields, zero crossings |
//! | Cost | [`cost`] | per-link cost, trainable gradient cost curve |
//! | Search | [`search`] | bounded Dijkstra cost and predecessor fields |
//! | Editing | [`polygon`], [`engine`] | committed polygon, seeds, live preview |
//!
//! ## Coordinates
//!
//! [`Point`] is `(x, y)` = (column, row). Arrays are indexed `[[y, x]]`.

pub mod config;
pub mod cost;
pub mod engine;
pub mod features;
pub mod polygon;
pub mod search;
pub mod types;

pub use config::{GradientOperator, LiveWireConfig};
pub use cost::{CostModel, EdgeWeightTable, GradientCostCurve};
pub use engine::{InteractionState, LiveWireEngine};
pub use features::ImageFeatures;
pub use polygon::{SeedPolygon, SplitHalves};
pub use search::PathSearch;
pub use types::{Buttons, GrayImage, Key, Modifiers, MouseButton, Point};
