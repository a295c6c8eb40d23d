//! The overlay transform published by the gesture tracker.
//!
//! A [`Transform`] is applied as `translate(x, y)`, then `scale(s)`, then
//! `rotate(deg)`, with scale and rotation pivoting on the overlay's own center.
//! It is `Copy` so readers always hold a whole snapshot, never a mix of two
//! updates.

use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::Point;

/// Translation, uniform scale and rotation for an overlay layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal translation in screen pixels.
    pub translate_x: f64,
    /// Vertical translation in screen pixels.
    pub translate_y: f64,
    /// Uniform scale factor, strictly positive.
    pub scale: f64,
    /// Rotation in degrees. Not normalized; values past +/-360 are valid.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, unit scale, no rotation.
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotation: 0.0,
    };

    /// Check that every component is finite and the scale is positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransform`] describing the offending component.
    pub fn validate(&self) -> Result<()> {
        let parts = [
            ("translate_x", self.translate_x),
            ("translate_y", self.translate_y),
            ("scale", self.scale),
            ("rotation", self.rotation),
        ];
        if let Some((name, value)) = parts.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidTransform(format!("{name} is not finite ({value})")));
        }
        if self.scale <= 0.0 {
            return Err(Error::InvalidTransform(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// CSS transform string, e.g. `translate(3px, 8px) scale(1.5) rotate(340deg)`.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.to_string()
    }

    /// The equivalent 2x3 affine matrix `[a, b, c, d, e, f]`, laid out like
    /// CSS `matrix(a, b, c, d, e, f)`, relative to the overlay's center.
    #[must_use]
    pub fn to_affine(&self) -> [f64; 6] {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let s = self.scale;
        [
            s * cos,
            s * sin,
            -s * sin,
            s * cos,
            self.translate_x,
            self.translate_y,
        ]
    }

    /// Map a point given relative to the overlay's center to its on-screen
    /// position, also relative to the untransformed center.
    #[must_use]
    pub fn apply(&self, local: Point) -> Point {
        let [a, b, c, d, e, f] = self.to_affine();
        Point::new(a * local.x + c * local.y + e, b * local.x + d * local.y + f)
    }

    /// Inverse of [`Transform::apply`]. `None` when the scale is not positive.
    #[must_use]
    pub fn invert(&self, screen: Point) -> Option<Point> {
        if self.scale <= 0.0 || !self.scale.is_finite() {
            return None;
        }
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let dx = (screen.x - self.translate_x) / self.scale;
        let dy = (screen.y - self.translate_y) / self.scale;
        // Rotate by -rotation.
        Some(Point::new(cos * dx + sin * dy, -sin * dx + cos * dy))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}px, {}px) scale({}) rotate({}deg)",
            self.translate_x, self.translate_y, self.scale, self.rotation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn css_string_orders_translate_scale_rotate() {
        let t = Transform {
            translate_x: 3.0,
            translate_y: 8.0,
            scale: 1.5,
            rotation: 340.0,
        };
        assert_eq!(t.to_css(), "translate(3px, 8px) scale(1.5) rotate(340deg)");
        assert_eq!(
            Transform::IDENTITY.to_css(),
            "translate(0px, 0px) scale(1) rotate(0deg)"
        );
    }

    #[test]
    fn apply_scales_and_rotates_before_translating() {
        let t = Transform {
            translate_x: 10.0,
            translate_y: 0.0,
            scale: 2.0,
            rotation: 90.0,
        };
        // (1, 0) rotated 90deg clockwise on screen is (0, 1), scaled to (0, 2),
        // then translated.
        let p = t.apply(Point::new(1.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn translation_is_independent_of_pivot() {
        let t = Transform {
            translate_x: -4.0,
            translate_y: 6.0,
            scale: 3.0,
            rotation: 33.0,
        };
        let center = t.apply(Point::new(0.0, 0.0));
        assert_relative_eq!(center.x, -4.0);
        assert_relative_eq!(center.y, 6.0);
    }

    #[test]
    fn invert_undoes_apply() {
        let t = Transform {
            translate_x: 12.5,
            translate_y: -7.0,
            scale: 0.4,
            rotation: 725.0,
        };
        let local = Point::new(31.0, -18.0);
        let back = t.invert(t.apply(local)).unwrap();
        assert_relative_eq!(back.x, local.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, local.y, epsilon = 1e-9);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        assert!(Transform::IDENTITY.validate().is_ok());

        let zero = Transform {
            scale: 0.0,
            ..Transform::IDENTITY
        };
        assert!(matches!(zero.validate(), Err(Error::InvalidTransform(_))));
        assert!(zero.invert(Point::default()).is_none());

        let nan = Transform {
            rotation: f64::NAN,
            ..Transform::IDENTITY
        };
        let err = nan.validate().unwrap_err();
        assert!(err.to_string().contains("rotation"));
    }
}
