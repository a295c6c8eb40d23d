//! Render a tattoo overlay onto a camera frame.
//!
//! The overlay starts centered on the frame and is then moved by a gesture
//! [`Transform`]. Every frame pixel inside the transformed overlay's bounding
//! box is mapped back into overlay space and sampled nearest-neighbor.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use log::debug;

use crate::error::Result;
use crate::geometry::Point;
use crate::keying::to_channel;
use crate::transform::Transform;

/// How overlay colors combine with the frame underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Plain source-over.
    Normal,
    /// Multiply, so white ink areas vanish and dark lines darken the skin.
    #[default]
    Multiply,
}

/// Overlay appearance on the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Global opacity in `[0, 1]`, multiplied with each pixel's alpha.
    pub opacity: f64,
    /// Color blend mode.
    pub blend: BlendMode,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            opacity: 0.85,
            blend: BlendMode::Multiply,
        }
    }
}

/// Composite `overlay` onto `frame` in place.
///
/// Returns the number of frame pixels that were written.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidTransform`] if the transform has a
/// non-finite component or a non-positive scale.
pub fn composite(
    frame: &mut RgbImage,
    overlay: &RgbaImage,
    transform: &Transform,
    style: &OverlayStyle,
) -> Result<usize> {
    transform.validate()?;

    let (ow, oh) = (f64::from(overlay.width()), f64::from(overlay.height()));
    let (fw, fh) = (f64::from(frame.width()), f64::from(frame.height()));
    if overlay.width() == 0 || overlay.height() == 0 || frame.width() == 0 || frame.height() == 0 {
        return Ok(0);
    }

    let opacity = style.opacity.clamp(0.0, 1.0);
    let frame_center = Point::new(fw / 2.0, fh / 2.0);
    let half = Point::new(ow / 2.0, oh / 2.0);

    let Some((x0, y0, x1, y1)) = screen_bounds(transform, half, frame_center, fw, fh) else {
        return Ok(0);
    };

    let mut written = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            let screen = Point::new(
                f64::from(x) + 0.5 - frame_center.x,
                f64::from(y) + 0.5 - frame_center.y,
            );
            // validate() guarantees a positive scale.
            let Some(local) = transform.invert(screen) else {
                continue;
            };
            let (ox, oy) = (local.x + half.x, local.y + half.y);
            if !(0.0..ow).contains(&ox) || !(0.0..oh).contains(&oy) {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let src = overlay.get_pixel(ox as u32, oy as u32);
            let dst = frame.get_pixel_mut(x, y);
            if blend_pixel(dst, src, opacity, style.blend) {
                written += 1;
            }
        }
    }

    debug!(
        "composited {}x{} overlay with {transform}: {written} pixels",
        overlay.width(),
        overlay.height()
    );
    Ok(written)
}

/// Pixel bounds `[x0, x1) x [y0, y1)` covered by the transformed overlay,
/// clipped to the frame. `None` when nothing is visible.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn screen_bounds(
    transform: &Transform,
    half: Point,
    center: Point,
    fw: f64,
    fh: f64,
) -> Option<(u32, u32, u32, u32)> {
    let corners = [
        Point::new(-half.x, -half.y),
        Point::new(half.x, -half.y),
        Point::new(half.x, half.y),
        Point::new(-half.x, half.y),
    ]
    .map(|c| transform.apply(c));

    // A huge finite scale can overflow the corners to inf or NaN; scan the
    // whole frame and let the per-pixel inverse mapping decide.
    if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Some((0, 0, fw as u32, fh as u32));
    }

    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min) + center.x;
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max) + center.x;
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min) + center.y;
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max) + center.y;

    let x0 = min_x.floor().clamp(0.0, fw);
    let x1 = max_x.ceil().clamp(0.0, fw);
    let y0 = min_y.floor().clamp(0.0, fh);
    let y1 = max_y.ceil().clamp(0.0, fh);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

/// Blend one overlay pixel onto an opaque frame pixel. Returns `false` when
/// the overlay pixel is fully transparent.
fn blend_pixel(dst: &mut Rgb<u8>, src: &Rgba<u8>, opacity: f64, mode: BlendMode) -> bool {
    let alpha = f64::from(src[3]) / 255.0 * opacity;
    if alpha <= 0.0 {
        return false;
    }
    for ch in 0..3 {
        let bg = f64::from(dst[ch]);
        let fg = f64::from(src[ch]);
        let mixed = match mode {
            BlendMode::Normal => fg,
            BlendMode::Multiply => fg * bg / 255.0,
        };
        dst[ch] = to_channel(mixed * alpha + bg * (1.0 - alpha));
    }
    true
}
