//! Edge fields: gradient magnitude, edge normals and Laplacian zero crossings.
//!
//! These are the per-pixel features the live-wire cost function reads.
//! All operators work on a single-channel `u8` image and leave the one-pixel
//! border at zero: no sample outside the image is ever read.
//!
//! ## Output layout
//!
//! | Field | Shape | Range |
//! |-------|-------|-------|
//! | magnitude | (H, W) | 0.0-1.0 after min/max rescale |
//! | normal | (H, W, 2) | unit (x, y) vector, or zero where the gradient vanishes |
//! | zero crossings | (H, W) | 0.0 on a crossing, 1.0 elsewhere |

use ndarray::{Array2, Array3, ArrayView2};
use rayon::prelude::*;

/// Derivative operator used to estimate the image gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GradientOperator {
    /// `I(x+1) - I(x-1)` along each axis.
    #[default]
    CentralDifference,
    /// 3x3 Sobel kernels.
    Sobel,
}

/// Gradient magnitude and normal field of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFields {
    /// Normalized gradient magnitude (height, width)
    pub magnitude: Array2<f32>,
    /// Unit vector perpendicular to the gradient (height, width, 2)
    pub normal: Array3<f32>,
}

impl GradientFields {
    /// All-zero fields ("no signal") for an image of the given size.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            magnitude: Array2::zeros((height, width)),
            normal: Array3::zeros((height, width, 2)),
        }
    }

    /// Image dimensions as (height, width).
    pub fn dim(&self) -> (usize, usize) {
        self.magnitude.dim()
    }
}

// Sobel kernels (x = column derivative, y = row derivative)
const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Raw (dx, dy) at an interior pixel.
#[inline]
fn derivatives(input: &ArrayView2<u8>, y: usize, x: usize, operator: GradientOperator) -> (f32, f32) {
    match operator {
        GradientOperator::CentralDifference => {
            let dx = input[[y, x + 1]] as i32 - input[[y, x - 1]] as i32;
            let dy = input[[y + 1, x]] as i32 - input[[y - 1, x]] as i32;
            (dx as f32, dy as f32)
        }
        GradientOperator::Sobel => {
            let mut gx = 0i32;
            let mut gy = 0i32;
            for ky in 0..3 {
                for kx in 0..3 {
                    let v = input[[y + ky - 1, x + kx - 1]] as i32;
                    gx += v * SOBEL_X[ky][kx];
                    gy += v * SOBEL_Y[ky][kx];
                }
            }
            (gx as f32, gy as f32)
        }
    }
}

/// Compute gradient magnitude and normal field.
///
/// Interior rows are processed in parallel; every pixel is computed
/// independently so the result does not depend on scheduling.
///
/// The magnitude is rescaled so the interior minimum maps to 0 and the
/// interior maximum to 1. A flat image (min == max) yields an all-zero
/// magnitude field.
///
/// # Arguments
/// * `input` - Grayscale image (height, width)
/// * `operator` - Central difference or Sobel
///
/// # Returns
/// Gradient fields with the one-pixel border left at zero
pub fn gradient_fields(input: ArrayView2<u8>, operator: GradientOperator) -> GradientFields {
    let (height, width) = input.dim();
    let mut fields = GradientFields::zeros(height, width);

    if height < 3 || width < 3 {
        return fields;
    }

    let rows: Vec<Vec<(f32, f32, f32)>> = (1..height - 1)
        .into_par_iter()
        .map(|y| {
            (1..width - 1)
                .map(|x| {
                    let (dx, dy) = derivatives(&input, y, x, operator);
                    let grd = (dx * dx + dy * dy).sqrt();
                    if grd > 0.0 {
                        (grd, dy / grd, -dx / grd)
                    } else {
                        (0.0, 0.0, 0.0)
                    }
                })
                .collect()
        })
        .collect();

    let mut min_grad = f32::MAX;
    let mut max_grad = 0.0f32;
    for (row_idx, row) in rows.iter().enumerate() {
        let y = row_idx + 1;
        for (col_idx, &(grd, nx, ny)) in row.iter().enumerate() {
            let x = col_idx + 1;
            fields.magnitude[[y, x]] = grd;
            fields.normal[[y, x, 0]] = nx;
            fields.normal[[y, x, 1]] = ny;
            min_grad = min_grad.min(grd);
            max_grad = max_grad.max(grd);
        }
    }

    if max_grad > min_grad {
        let range = max_grad - min_grad;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let g = fields.magnitude[[y, x]];
                fields.magnitude[[y, x]] = ((g - min_grad) / range).clamp(0.0, 1.0);
            }
        }
    } else {
        fields.magnitude.fill(0.0);
    }

    fields
}

/// Compute the Laplacian zero-crossing cost field.
///
/// Uses the 3x3 Laplacian `[[0,-1,0],[-1,4,-1],[0,-1,0]]`. A pixel is a zero
/// crossing when a 4-neighbour has the opposite sign and a magnitude at
/// least as large; such pixels cost 0.0, all others (and the border) 1.0.
///
/// # Arguments
/// * `input` - Grayscale image (height, width)
///
/// # Returns
/// Cost field (height, width) with values 0.0 or 1.0
pub fn laplacian_zero_crossings(input: ArrayView2<u8>) -> Array2<f32> {
    let (height, width) = input.dim();
    let mut output = Array2::<f32>::from_elem((height, width), 1.0);

    if height < 3 || width < 3 {
        return output;
    }

    let mut lap = Array2::<i32>::zeros((height, width));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let c = input[[y, x]] as i32;
            lap[[y, x]] = 4 * c
                - input[[y - 1, x]] as i32
                - input[[y + 1, x]] as i32
                - input[[y, x - 1]] as i32
                - input[[y, x + 1]] as i32;
        }
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let v = lap[[y, x]];
            if v == 0 {
                continue;
            }
            let crossing = [(y - 1, x), (y + 1, x), (y, x - 1), (y, x + 1)]
                .iter()
                .any(|&(ny, nx)| {
                    let n = lap[[ny, nx]];
                    (v > 0) != (n > 0) && n != 0 && v.abs() <= n.abs()
                });
            if crossing {
                output[[y, x]] = 0.0;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_step(height: usize, width: usize, at: usize) -> Array2<u8> {
        let mut img = Array2::<u8>::zeros((height, width));
        for y in 0..height {
            for x in at..width {
                img[[y, x]] = 200;
            }
        }
        img
    }

    #[test]
    fn test_flat_image_has_no_gradient() {
        let img = Array2::<u8>::from_elem((10, 10), 77);
        for op in [GradientOperator::CentralDifference, GradientOperator::Sobel] {
            let fields = gradient_fields(img.view(), op);
            assert!(fields.magnitude.iter().all(|&v| v == 0.0));
            assert!(fields.normal.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_border_left_at_zero() {
        let mut img = Array2::<u8>::zeros((6, 6));
        for y in 0..6 {
            for x in 0..6 {
                img[[y, x]] = ((x * 40 + y * 7) % 256) as u8;
            }
        }

        let fields = gradient_fields(img.view(), GradientOperator::Sobel);
        for i in 0..6 {
            assert_eq!(fields.magnitude[[0, i]], 0.0);
            assert_eq!(fields.magnitude[[5, i]], 0.0);
            assert_eq!(fields.magnitude[[i, 0]], 0.0);
            assert_eq!(fields.magnitude[[i, 5]], 0.0);
        }
    }

    #[test]
    fn test_vertical_edge_normal_points_along_edge() {
        let img = vertical_step(7, 7, 3);
        let fields = gradient_fields(img.view(), GradientOperator::CentralDifference);

        // Columns 2 and 3 straddle the step
        assert_eq!(fields.magnitude[[3, 2]], 1.0);
        assert_eq!(fields.magnitude[[3, 3]], 1.0);
        assert_eq!(fields.magnitude[[3, 5]], 0.0);

        // dx > 0, dy = 0  =>  normal = (0, -1)
        assert_eq!(fields.normal[[3, 2, 0]], 0.0);
        assert_eq!(fields.normal[[3, 2, 1]], -1.0);
    }

    #[test]
    fn test_normals_are_unit_or_zero() {
        let mut img = Array2::<u8>::zeros((9, 9));
        for y in 0..9 {
            for x in 0..9 {
                let d = (x as i32 - 4).pow(2) + (y as i32 - 4).pow(2);
                img[[y, x]] = if d < 9 { 255 } else { 0 };
            }
        }

        let fields = gradient_fields(img.view(), GradientOperator::Sobel);
        for y in 0..9 {
            for x in 0..9 {
                let nx = fields.normal[[y, x, 0]];
                let ny = fields.normal[[y, x, 1]];
                let len = (nx * nx + ny * ny).sqrt();
                assert!(len == 0.0 || (len - 1.0).abs() < 1e-5);
            }
        }
        assert!(fields.magnitude.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_tiny_image_is_all_zero() {
        let img = Array2::<u8>::from_elem((2, 5), 9);
        let fields = gradient_fields(img.view(), GradientOperator::CentralDifference);
        assert_eq!(fields.dim(), (2, 5));
        assert!(fields.magnitude.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_crossings_on_step() {
        let img = vertical_step(7, 8, 4);
        let zc = laplacian_zero_crossings(img.view());

        // Laplacian is -200 at column 3 and +200 at column 4
        assert_eq!(zc[[3, 3]], 0.0);
        assert_eq!(zc[[3, 4]], 0.0);
        assert_eq!(zc[[3, 1]], 1.0);
        assert_eq!(zc[[0, 3]], 1.0);
    }
}
