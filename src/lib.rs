//! Live-wire Rust Extensions
//!
//! Interactive live-wire (intelligent scissors) contour tracing on 8-bit
//! grayscale slices, with Python bindings via PyO3 and WASM bindings for
//! JavaScript.
//!
//! ## Image Format
//! All inputs are single-channel `u8` images of shape (height, width).
//! Derived fields are `f32`:
//! - **Gradient**: (height, width), normalized to 0.0-1.0
//! - **Normals**: (height, width, 2), unit (x, y) vectors or zero
//!
//! ## Architecture
//! [`filters`] holds the stateless preprocessing (smoothing, gradients).
//! [`livewire`] holds the stateful engine: cost model, bounded path search
//! and seed polygon editing driven by pointer events.
//!
//! ```
//! use livewire_rust::livewire::{Buttons, LiveWireEngine, Modifiers, MouseButton, Point};
//!
//! let mut engine = LiveWireEngine::new();
//! engine.set_image_data(4, 4, &[0; 16]);
//! engine.press(Point::new(0, 0), MouseButton::Left, Modifiers::NONE);
//! engine.move_to(Point::new(3, 3), Buttons::NONE);
//! assert_eq!(engine.livewire().len(), 3);
//! ```

pub mod error;
pub mod filters;
pub mod livewire;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::LiveWireError;

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray2};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::filters::blur::gaussian_box_blur_u8;
    use crate::filters::edge::{gradient_fields, GradientOperator};
    use crate::livewire::{
        Buttons, GrayImage, InteractionState, Key, LiveWireConfig, LiveWireEngine, Modifiers,
        MouseButton, Point,
    };

    fn operator(sobel: bool) -> GradientOperator {
        if sobel {
            GradientOperator::Sobel
        } else {
            GradientOperator::CentralDifference
        }
    }

    fn to_points(points: Vec<(i32, i32)>) -> Vec<Point> {
        points.into_iter().map(Point::from).collect()
    }

    fn to_tuples(points: &[Point]) -> Vec<(i32, i32)> {
        points.iter().map(|p| (p.x, p.y)).collect()
    }

    // ========================================================================
    // Preprocessing
    // ========================================================================

    /// Three-pass box approximation of a Gaussian blur (u8 grayscale).
    ///
    /// Radius 0 returns an unchanged copy.
    #[pyfunction]
    #[pyo3(signature = (image, radius=1))]
    pub fn smooth<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, u8>,
        radius: usize,
    ) -> Bound<'py, PyArray2<u8>> {
        let result = gaussian_box_blur_u8(image.as_array(), radius);
        result.into_pyarray(py)
    }

    /// Normalized gradient magnitude and unit edge normals.
    ///
    /// # Returns
    /// `(magnitude (H, W), normals (H, W, 2))`
    #[pyfunction]
    #[pyo3(signature = (image, sobel=false))]
    pub fn gradient<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, u8>,
        sobel: bool,
    ) -> (Bound<'py, PyArray2<f32>>, Bound<'py, PyArray3<f32>>) {
        let fields = gradient_fields(image.as_array(), operator(sobel));
        (fields.magnitude.into_pyarray(py), fields.normal.into_pyarray(py))
    }

    // ========================================================================
    // Engine
    // ========================================================================

    /// Interactive live-wire session over one grayscale slice.
    #[pyclass(name = "LiveWire", unsendable)]
    pub struct PyLiveWire {
        engine: LiveWireEngine,
    }

    #[pymethods]
    impl PyLiveWire {
        #[new]
        #[pyo3(signature = (
            smoothing_radius=0,
            sobel=false,
            weight_log=0.0,
            weight_gradient=0.7,
            weight_normal=0.3,
            dynamic_training=true,
            search_window=500
        ))]
        fn new(
            smoothing_radius: usize,
            sobel: bool,
            weight_log: f32,
            weight_gradient: f32,
            weight_normal: f32,
            dynamic_training: bool,
            search_window: usize,
        ) -> Self {
            let config = LiveWireConfig {
                smoothing_radius,
                gradient_operator: operator(sobel),
                weight_log,
                weight_gradient,
                weight_normal,
                dynamic_training,
                search_window,
                ..LiveWireConfig::default()
            };
            Self {
                engine: LiveWireEngine::with_config(config),
            }
        }

        /// Load a (H, W) u8 image; clears the polygon.
        fn set_image(&mut self, image: PyReadonlyArray2<'_, u8>) -> PyResult<()> {
            let image = GrayImage::from_array(image.as_array().to_owned())
                .map_err(|e| PyValueError::new_err(e.to_string()))?;
            self.engine.set_image(image);
            Ok(())
        }

        #[pyo3(signature = (x, y, button="left", shift=false))]
        fn press(&mut self, x: i32, y: i32, button: &str, shift: bool) -> PyResult<bool> {
            let button = match button {
                "left" => MouseButton::Left,
                "right" => MouseButton::Right,
                "middle" => MouseButton::Middle,
                other => {
                    return Err(PyValueError::new_err(format!("unknown button '{other}'")));
                }
            };
            let modifiers = Modifiers {
                shift,
                ..Modifiers::NONE
            };
            Ok(self.engine.press(Point::new(x, y), button, modifiers))
        }

        #[pyo3(name = "move", signature = (x, y, left=false))]
        fn move_to(&mut self, x: i32, y: i32, left: bool) -> bool {
            let buttons = if left { Buttons::LEFT } else { Buttons::NONE };
            self.engine.move_to(Point::new(x, y), buttons)
        }

        fn release(&mut self) {
            self.engine.release();
        }

        fn escape(&mut self) -> bool {
            self.engine.key(Key::Escape)
        }

        fn freeze(&mut self) -> bool {
            self.engine.freeze()
        }

        fn livewire_from_seeds(&mut self, seeds: Vec<(i32, i32)>) -> bool {
            self.engine.livewire_from_seeds(&to_points(seeds))
        }

        fn insert_seed(&mut self, x: i32, y: i32) -> Option<usize> {
            self.engine.insert_seed(Point::new(x, y))
        }

        fn update_gradient_cost(&mut self) -> bool {
            self.engine.update_gradient_cost()
        }

        fn set_polygon_to_update(
            &mut self,
            points: Vec<(i32, i32)>,
            seeds: Vec<(i32, i32)>,
            seed_positions: Vec<usize>,
            closed: bool,
        ) -> bool {
            self.engine
                .set_polygon_to_update(to_points(points), to_points(seeds), seed_positions, closed)
        }

        fn set_guess_curve(&mut self, curve: Vec<(i32, i32)>) {
            self.engine.set_guess_curve(to_points(curve));
        }

        fn renew_guess_curve(&mut self) {
            self.engine.renew_guess_curve();
        }

        #[setter]
        fn set_propagate_livewire(&mut self, propagate: bool) {
            self.engine.set_propagate_livewire(propagate);
        }

        #[getter]
        fn propagate_livewire(&self) -> bool {
            self.engine.propagate_livewire()
        }

        #[setter]
        fn set_seed_move_mode(&mut self, enabled: bool) {
            self.engine.set_seed_move_mode(enabled);
        }

        #[getter]
        fn seed_move_mode(&self) -> bool {
            self.engine.seed_move_mode()
        }

        fn set_smoothing_radius(&mut self, radius: usize) {
            self.engine.set_smoothing_radius(radius);
        }

        fn set_sobel(&mut self, sobel: bool) {
            self.engine.set_gradient_operator(operator(sobel));
        }

        fn set_weights(&mut self, weight_log: f32, weight_gradient: f32, weight_normal: f32) {
            let config = LiveWireConfig {
                weight_log,
                weight_gradient,
                weight_normal,
                ..self.engine.config().clone()
            };
            self.engine.set_config(config);
        }

        fn set_dynamic_training(&mut self, enabled: bool) {
            self.engine.set_dynamic_training(enabled);
        }

        #[getter]
        fn polygon(&self) -> Vec<(i32, i32)> {
            to_tuples(self.engine.polygon())
        }

        #[getter]
        fn livewire(&self) -> Vec<(i32, i32)> {
            to_tuples(self.engine.livewire())
        }

        #[getter]
        fn seeds(&self) -> Vec<(i32, i32)> {
            to_tuples(self.engine.seeds())
        }

        #[getter]
        fn seed_positions(&self) -> Vec<usize> {
            self.engine.seed_positions().to_vec()
        }

        #[getter]
        fn closed(&self) -> bool {
            self.engine.closed()
        }

        #[getter]
        fn state(&self) -> &'static str {
            match self.engine.state() {
                InteractionState::Idle => "idle",
                InteractionState::Tracing => "tracing",
                InteractionState::SeedEditing => "seed_editing",
            }
        }

        fn gradient<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray2<f32>>> {
            self.engine.gradient().map(|g| g.clone().into_pyarray(py))
        }

        fn normals<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray3<f32>>> {
            self.engine.normals().map(|n| n.clone().into_pyarray(py))
        }

        /// Accumulated cost of the latest search (inf where unreached).
        fn cost_field<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f32>> {
            self.engine.cost_field().into_pyarray(py)
        }

        /// (H, W, 4) RGBA visualization of the gradient cost.
        fn cost_overlay<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray3<u8>> {
            self.engine.cost_overlay_rgba().into_pyarray(py)
        }
    }

    /// Live-wire Rust extension module
    #[pymodule]
    pub fn livewire_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Preprocessing
        m.add_function(wrap_pyfunction!(smooth, m)?)?;
        m.add_function(wrap_pyfunction!(gradient, m)?)?;

        // Engine
        m.add_class::<PyLiveWire>()?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::livewire_rust;
