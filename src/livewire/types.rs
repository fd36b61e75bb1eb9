//! Plain value types shared by the live-wire modules.

use ndarray::Array2;

use crate::error::LiveWireError;

/// Pixel coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// |dx| + |dy|
    #[inline]
    pub fn manhattan(self, other: Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// max(|dx|, |dy|)
    #[inline]
    pub fn chebyshev(self, other: Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// True if the point lies inside a `width` x `height` image.
    #[inline]
    pub fn in_bounds(self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < width && (self.y as usize) < height
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Owned single-channel 8-bit image.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    data: Array2<u8>,
}

impl GrayImage {
    /// Build from a row-major buffer of `width * height` samples.
    pub fn from_raw(width: usize, height: usize, data: &[u8]) -> Result<Self, LiveWireError> {
        if width == 0 || height == 0 {
            return Err(LiveWireError::InvalidGeometry(format!(
                "zero-size image {width}x{height}"
            )));
        }
        if data.len() != width * height {
            return Err(LiveWireError::InvalidGeometry(format!(
                "buffer has {} samples, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        let data = Array2::from_shape_vec((height, width), data.to_vec())
            .map_err(|e| LiveWireError::InvalidGeometry(e.to_string()))?;
        Ok(Self { data })
    }

    /// Wrap an existing (height, width) array.
    pub fn from_array(data: Array2<u8>) -> Result<Self, LiveWireError> {
        let (height, width) = data.dim();
        if width == 0 || height == 0 {
            return Err(LiveWireError::InvalidGeometry(format!(
                "zero-size image {width}x{height}"
            )));
        }
        Ok(Self { data })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn pixels(&self) -> &Array2<u8> {
        &self.data
    }
}

/// Pointer button of an interaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Buttons held during a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

impl Buttons {
    pub const NONE: Buttons = Buttons { left: false, right: false, middle: false };
    pub const LEFT: Buttons = Buttons { left: true, right: false, middle: false };

    /// Only the primary button is held.
    pub fn primary_only(self) -> bool {
        self.left && !self.right && !self.middle
    }
}

/// Keyboard modifiers of an interaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false };
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distances() {
        let a = Point::new(2, 3);
        let b = Point::new(5, -1);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.chebyshev(b), 4);
        assert_eq!(a.manhattan(a), 0);
    }

    #[test]
    fn test_point_bounds() {
        assert!(Point::new(0, 0).in_bounds(1, 1));
        assert!(!Point::new(1, 0).in_bounds(1, 1));
        assert!(!Point::new(-1, 0).in_bounds(4, 4));
    }

    #[test]
    fn test_gray_image_from_raw() {
        let img = GrayImage::from_raw(3, 2, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(img.width(), 3);
        assert_eq!(img.height(), 2);
        assert_eq!(img.pixels()[[1, 0]], 4);

        assert!(matches!(
            GrayImage::from_raw(0, 2, &[]),
            Err(LiveWireError::InvalidGeometry(_))
        ));
        assert!(GrayImage::from_raw(3, 3, &[0; 8]).is_err());
    }
}
