//! Image preprocessing filters for live-wire tracing.
//!
//! ## Supported Formats
//!
//! All filters work on single-channel images:
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | Grayscale8 | (H, W) | u8 | Raw slice intensity, 0-255 |
//! | Field | (H, W) | f32 | Derived per-pixel scalar, 0.0-1.0 |
//! | Vector field | (H, W, 2) | f32 | Derived per-pixel (x, y) vector |
//!
//! ## Filter Categories
//!
//! - **Smoothing**: box blur, three-pass Gaussian approximation
//! - **Edge fields**: central-difference/Sobel gradients, normals, Laplacian zero crossings

pub mod blur;
pub mod edge;

pub use blur::gaussian_box_blur_u8;
pub use edge::{gradient_fields, laplacian_zero_crossings, GradientFields, GradientOperator};
