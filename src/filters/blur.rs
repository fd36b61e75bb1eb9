//! Blur filters for single-channel intensity images.
//!
//! Provides a box blur and a three-pass box approximation of a Gaussian,
//! used to smooth the raw slice before gradients are taken. Both work on
//! `u8` samples and truncate the running average back to `u8` after every
//! pass, so the output is fully deterministic.

use ndarray::{Array2, ArrayView2};

/// Compute the box widths whose repeated application approximates a
/// Gaussian with standard deviation `sigma`.
///
/// # Arguments
/// * `sigma` - Standard deviation of the target Gaussian
/// * `n` - Number of boxes
///
/// # Returns
/// `n` odd box widths (smaller boxes first)
pub fn boxes_for_gauss(sigma: f32, n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let nf = n as f32;

    // Ideal averaging filter width
    let w_ideal = ((12.0 * sigma * sigma / nf) + 1.0).sqrt();
    let mut wl = w_ideal as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;

    let wlf = wl as f32;
    let m_ideal = (12.0 * sigma * sigma - nf * wlf * wlf - 4.0 * nf * wlf - 3.0 * nf)
        / (-4.0 * wlf - 4.0);
    let m = m_ideal as i32;

    (0..n)
        .map(|i| if (i as i32) < m { wl as usize } else { wu as usize })
        .collect()
}

/// Apply a separable box blur with clamped borders - u8 version.
///
/// Horizontal pass followed by a vertical pass, each a running sum over a
/// window of `2 * radius + 1` samples. Samples outside the image repeat the
/// nearest edge sample.
///
/// # Arguments
/// * `input` - Grayscale image (height, width)
/// * `radius` - Box radius in pixels
///
/// # Returns
/// Blurred image with same dimensions
pub fn box_blur_u8(input: ArrayView2<u8>, radius: usize) -> Array2<u8> {
    let (height, width) = input.dim();
    if radius == 0 || width == 0 || height == 0 {
        return input.to_owned();
    }

    let mut temp = Array2::<u8>::zeros((height, width));
    let mut output = Array2::<u8>::zeros((height, width));
    let r = radius as isize;
    let iarr = 1.0f32 / (2 * radius + 1) as f32;

    // Horizontal pass
    for y in 0..height {
        let at = |x: isize| input[[y, x.clamp(0, width as isize - 1) as usize]] as i32;

        let mut val: i32 = (-r..=r).map(at).sum();
        for x in 0..width {
            temp[[y, x]] = (val as f32 * iarr) as u8;
            let xi = x as isize;
            val += at(xi + r + 1) - at(xi - r);
        }
    }

    // Vertical pass
    for x in 0..width {
        let at = |y: isize| temp[[y.clamp(0, height as isize - 1) as usize, x]] as i32;

        let mut val: i32 = (-r..=r).map(at).sum();
        for y in 0..height {
            output[[y, x]] = (val as f32 * iarr) as u8;
            let yi = y as isize;
            val += at(yi + r + 1) - at(yi - r);
        }
    }

    output
}

/// Approximate a Gaussian blur with three successive box blurs.
///
/// A radius of 0 returns an identical copy of the input.
///
/// # Arguments
/// * `input` - Grayscale image (height, width)
/// * `radius` - Gaussian radius (used as the standard deviation)
///
/// # Returns
/// Smoothed image with same dimensions
pub fn gaussian_box_blur_u8(input: ArrayView2<u8>, radius: usize) -> Array2<u8> {
    if radius == 0 {
        return input.to_owned();
    }

    let boxes = boxes_for_gauss(radius as f32, 3);
    let mut result = input.to_owned();
    for size in boxes {
        result = box_blur_u8(result.view(), (size - 1) / 2);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxes_for_gauss_are_odd() {
        for sigma in [1.0f32, 2.0, 3.5, 8.0] {
            let boxes = boxes_for_gauss(sigma, 3);
            assert_eq!(boxes.len(), 3);
            assert!(boxes.iter().all(|&b| b % 2 == 1));
            // Sizes are non-decreasing
            assert!(boxes.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let mut img = Array2::<u8>::zeros((6, 7));
        for y in 0..6 {
            for x in 0..7 {
                img[[y, x]] = ((x * 37 + y * 11) % 256) as u8;
            }
        }

        let result = gaussian_box_blur_u8(img.view(), 0);
        assert_eq!(result, img);
    }

    #[test]
    fn test_flat_image_unchanged() {
        let img = Array2::<u8>::from_elem((8, 8), 120);
        let result = gaussian_box_blur_u8(img.view(), 2);
        let first = result[[0, 0]];
        assert!(result.iter().all(|&v| v == first));
        // Truncation can only lose a level per pass
        assert!(first >= 114 && first <= 120);
    }

    #[test]
    fn test_box_blur_spreads_point() {
        let mut img = Array2::<u8>::zeros((9, 9));
        img[[4, 4]] = 255;

        let result = box_blur_u8(img.view(), 1);

        // 255 / 9 per pass in each direction
        assert!(result[[4, 4]] > 0);
        assert!(result[[3, 3]] > 0);
        assert_eq!(result[[0, 0]], 0);
    }

    #[test]
    fn test_gaussian_box_blur_deterministic() {
        let mut img = Array2::<u8>::zeros((12, 10));
        for y in 0..12 {
            for x in 0..10 {
                img[[y, x]] = if x > 4 { 200 } else { 10 };
            }
        }

        let a = gaussian_box_blur_u8(img.view(), 3);
        let b = gaussian_box_blur_u8(img.view(), 3);
        assert_eq!(a, b);
        // Edge is softened
        assert!(a[[6, 4]] > 10 && a[[6, 4]] < 200);
    }

    #[test]
    fn test_radius_larger_than_image() {
        let mut img = Array2::<u8>::zeros((3, 3));
        img[[1, 1]] = 90;
        let result = box_blur_u8(img.view(), 10);
        assert_eq!(result.dim(), (3, 3));
    }
}
