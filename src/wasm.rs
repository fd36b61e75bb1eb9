//! WebAssembly exports for live-wire tracing.
//!
//! These are exposed to JavaScript via wasm-bindgen.
//!
//! ## Buffers
//!
//! - Images are flat row-major `u8` arrays (length = width * height)
//! - Point lists are flat `[x0, y0, x1, y1, ...]` `i32` arrays
//! - Rasters come back flat in (height, width, channels) order

use wasm_bindgen::prelude::*;

use crate::filters::edge::{gradient_fields, GradientOperator};
use crate::livewire::{Buttons, GrayImage, Key, LiveWireEngine, Modifiers, MouseButton, Point};

fn flatten(points: &[Point]) -> Vec<i32> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

fn unflatten(coords: &[i32]) -> Vec<Point> {
    coords.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
}

fn operator(sobel: bool) -> GradientOperator {
    if sobel {
        GradientOperator::Sobel
    } else {
        GradientOperator::CentralDifference
    }
}

// ============================================================================
// Preprocessing
// ============================================================================

/// Normalized gradient magnitude of a grayscale image.
///
/// # Arguments
/// * `data` - Flat array of gray bytes (length = width * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `sobel` - Use the Sobel operator instead of central differences
///
/// # Returns
/// Flat array of f32 magnitudes (0.0-1.0)
#[wasm_bindgen]
pub fn gradient_magnitude_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    sobel: bool,
) -> Result<Vec<f32>, JsValue> {
    let image = GrayImage::from_raw(width, height, data)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let fields = gradient_fields(image.pixels().view(), operator(sobel));
    Ok(fields.magnitude.into_raw_vec_and_offset().0)
}

// ============================================================================
// Engine
// ============================================================================

/// Live-wire session handle.
#[wasm_bindgen]
pub struct LiveWireHandle {
    engine: LiveWireEngine,
}

#[wasm_bindgen]
impl LiveWireHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> LiveWireHandle {
        LiveWireHandle {
            engine: LiveWireEngine::new(),
        }
    }

    /// Load a grayscale image; clears the polygon.
    pub fn set_image(&mut self, data: &[u8], width: usize, height: usize) -> Result<(), JsValue> {
        let image = GrayImage::from_raw(width, height, data)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.engine.set_image(image);
        Ok(())
    }

    /// `button`: 0 = left, 1 = middle, 2 = right (DOM `MouseEvent.button`).
    pub fn press(&mut self, x: i32, y: i32, button: u8, shift: bool) -> bool {
        let button = match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => return false,
        };
        let modifiers = Modifiers {
            shift,
            ..Modifiers::NONE
        };
        self.engine.press(Point::new(x, y), button, modifiers)
    }

    pub fn move_to(&mut self, x: i32, y: i32, left_down: bool) -> bool {
        let buttons = if left_down { Buttons::LEFT } else { Buttons::NONE };
        self.engine.move_to(Point::new(x, y), buttons)
    }

    pub fn release(&mut self) {
        self.engine.release();
    }

    pub fn escape(&mut self) -> bool {
        self.engine.key(Key::Escape)
    }

    pub fn freeze(&mut self) -> bool {
        self.engine.freeze()
    }

    pub fn livewire_from_seeds(&mut self, seeds: &[i32]) -> bool {
        self.engine.livewire_from_seeds(&unflatten(seeds))
    }

    /// Index of the inserted (or selected) seed, `undefined` on failure.
    pub fn insert_seed(&mut self, x: i32, y: i32) -> Option<u32> {
        self.engine.insert_seed(Point::new(x, y)).map(|i| i as u32)
    }

    pub fn update_gradient_cost(&mut self) -> bool {
        self.engine.update_gradient_cost()
    }

    pub fn set_seed_move_mode(&mut self, enabled: bool) {
        self.engine.set_seed_move_mode(enabled);
    }

    pub fn set_smoothing_radius(&mut self, radius: usize) {
        self.engine.set_smoothing_radius(radius);
    }

    pub fn set_sobel(&mut self, sobel: bool) {
        self.engine.set_gradient_operator(operator(sobel));
    }

    pub fn set_weights(&mut self, weight_log: f32, weight_gradient: f32, weight_normal: f32) {
        self.engine.set_weight_log(weight_log);
        self.engine.set_weight_gradient(weight_gradient);
        self.engine.set_weight_normal(weight_normal);
    }

    pub fn set_dynamic_training(&mut self, enabled: bool) {
        self.engine.set_dynamic_training(enabled);
    }

    pub fn polygon(&self) -> Vec<i32> {
        flatten(self.engine.polygon())
    }

    pub fn livewire(&self) -> Vec<i32> {
        flatten(self.engine.livewire())
    }

    pub fn seeds(&self) -> Vec<i32> {
        flatten(self.engine.seeds())
    }

    pub fn seed_positions(&self) -> Vec<u32> {
        self.engine.seed_positions().iter().map(|&i| i as u32).collect()
    }

    pub fn closed(&self) -> bool {
        self.engine.closed()
    }

    /// Flat (height, width, 4) RGBA gradient cost overlay.
    pub fn cost_overlay_rgba(&self) -> Vec<u8> {
        self.engine.cost_overlay_rgba().into_raw_vec_and_offset().0
    }
}

impl Default for LiveWireHandle {
    fn default() -> Self {
        Self::new()
    }
}
