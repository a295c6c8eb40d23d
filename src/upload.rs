//! Upload checks and output file naming.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Largest accepted upload: 4 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 4 * 1024 * 1024;

/// Image types accepted as uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `image/png`
    Png,
    /// `image/jpeg`
    Jpeg,
    /// `image/webp`
    WebP,
}

impl ImageKind {
    /// Look up an accepted MIME type. Parameters such as `; charset=` are ignored.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Look up an accepted file extension, case-insensitively.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Canonical MIME type.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    ImageKind::from_path(path).is_some()
}

/// Check an upload's declared type and size.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for other MIME types and
/// [`Error::FileTooLarge`] above [`MAX_UPLOAD_BYTES`].
pub fn check_upload(mime: &str, size: u64) -> Result<ImageKind> {
    let kind =
        ImageKind::from_mime(mime).ok_or_else(|| Error::UnsupportedFormat(mime.to_string()))?;
    if size > MAX_UPLOAD_BYTES {
        return Err(Error::FileTooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(kind)
}

/// Check a file on disk: extension must be accepted and size within limit.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`], [`Error::FileTooLarge`], or
/// [`Error::Io`] if the file's metadata cannot be read.
pub fn validate_upload(path: &Path) -> Result<ImageKind> {
    let kind = ImageKind::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    let size = std::fs::metadata(path)?.len();
    check_upload(kind.mime(), size)
}

/// File stem, or `fallback` when the path has none.
fn stem_or<'a>(path: &'a Path, fallback: &'a str) -> Cow<'a, str> {
    path.file_stem()
        .map_or(Cow::Borrowed(fallback), |s| s.to_string_lossy())
}

/// Stencil download name next to the input.
///
/// Example: `"arm.jpg"` becomes `"stencil-arm.png"`.
#[must_use]
pub fn stencil_output_path(input: &Path) -> PathBuf {
    let stem = stem_or(input, "converted");
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("stencil-{stem}.png"))
}

/// Generate a PNG output path from an input path and a suffix.
///
/// Example: `("photo.jpg", "keyed")` becomes `"photo_keyed.png"`.
#[must_use]
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = stem_or(input, "image");
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_{suffix}.png"))
}
