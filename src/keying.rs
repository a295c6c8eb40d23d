//! Pixel operations applied to generated tattoo and stencil images.
//!
//! Generated images arrive on a solid white background. For the try-on
//! overlay the white is keyed out to transparency; for stencils a contrast
//! filter thickens or thins the lines before the result is flattened back
//! onto white.

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Default keying tolerance: channels above `255 - 20` count as white.
pub const DEFAULT_TOLERANCE: u8 = 20;

/// Accepted contrast range, in percent.
pub const CONTRAST_RANGE: std::ops::RangeInclusive<u32> = 50..=250;

/// Neutral contrast, in percent.
pub const DEFAULT_CONTRAST: u32 = 100;

/// Opaque white, the background generated images are normalized onto.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Whether a pixel is close enough to white to be keyed out.
///
/// Each of R, G and B must be strictly greater than `255 - tolerance`.
#[must_use]
pub fn is_near_white(px: &Rgba<u8>, tolerance: u8) -> bool {
    let threshold = 255 - tolerance;
    px[0] > threshold && px[1] > threshold && px[2] > threshold
}

/// Make near-white pixels fully transparent, in place.
///
/// Only the alpha channel of matching pixels changes; color values are kept.
/// Returns the number of pixels that were keyed out.
pub fn remove_background(image: &mut RgbaImage, tolerance: u8) -> usize {
    let mut keyed = 0;
    for px in image.pixels_mut() {
        if is_near_white(px, tolerance) {
            px[3] = 0;
            keyed += 1;
        }
    }
    keyed
}

/// Apply a contrast filter and flatten the result onto white.
///
/// Each color channel is mapped as `(c - 0.5) * k + 0.5` in `[0, 1]` space,
/// with `k = percent / 100`, then composited over an opaque white background
/// using the pixel's alpha.
///
/// # Errors
///
/// Returns [`Error::ContrastOutOfRange`] if `percent` is outside 50-250.
pub fn adjust_contrast(image: &RgbaImage, percent: u32) -> Result<RgbImage> {
    if !CONTRAST_RANGE.contains(&percent) {
        return Err(Error::ContrastOutOfRange(percent));
    }

    let lut = contrast_lut(percent);
    let mut out = RgbImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let filtered = Rgba([
            lut[usize::from(r)],
            lut[usize::from(g)],
            lut[usize::from(b)],
            a,
        ]);
        *dst = blend_over(&filtered, WHITE);
    }
    Ok(out)
}

/// Composite an RGBA image over a solid background color.
#[must_use]
pub fn flatten_onto(image: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        *dst = blend_over(src, background);
    }
    out
}

/// Lookup table for the contrast transfer function.
fn contrast_lut(percent: u32) -> [u8; 256] {
    let k = f64::from(percent) / 100.0;
    let mut lut = [0u8; 256];
    for (value, slot) in (0u8..=255).zip(lut.iter_mut()) {
        let c = f64::from(value) / 255.0;
        let mapped = ((c - 0.5) * k + 0.5).clamp(0.0, 1.0);
        *slot = to_channel(mapped * 255.0);
    }
    lut
}

/// Source-over blend of a straight-alpha pixel onto an opaque color.
fn blend_over(src: &Rgba<u8>, background: Rgb<u8>) -> Rgb<u8> {
    let alpha = f64::from(src[3]) / 255.0;
    let mut out = background;
    for ch in 0..3 {
        let fg = f64::from(src[ch]);
        let bg = f64::from(background[ch]);
        out[ch] = to_channel(fg * alpha + bg * (1.0 - alpha));
    }
    out
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
