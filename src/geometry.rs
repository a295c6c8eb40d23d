//! Distance and angle helpers for touch contact points.

/// A contact point in the coordinate space of the overlay's parent container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels (grows downwards).
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise offset `self - origin`.
    #[must_use]
    pub fn offset_from(self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    let (dx, dy) = b.offset_from(a);
    dx.hypot(dy)
}

/// Angle of the vector `a -> b` in degrees, in `(-180, 180]`.
///
/// Screen coordinates grow downwards, so a positive angle is a clockwise
/// turn on screen, which is also how CSS `rotate()` reads it.
#[must_use]
pub fn angle_degrees(a: Point, b: Point) -> f64 {
    let (dx, dy) = b.offset_from(a);
    dy.atan2(dx).to_degrees()
}
