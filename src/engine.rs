//! File-level processing: load, validate, transform, save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use log::{debug, warn};

use crate::compose::{self, OverlayStyle};
use crate::error::{Error, Result};
use crate::keying::{self, DEFAULT_CONTRAST, DEFAULT_TOLERANCE};
use crate::transform::Transform;
use crate::upload::{self, is_supported_image};

/// The pixel operation applied to each input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Key near-white pixels out to transparency.
    RemoveBackground {
        /// Per-channel distance from 255 still counted as white.
        tolerance: u8,
    },
    /// Stencil contrast adjustment, flattened onto white.
    Contrast {
        /// Contrast in percent, 50-250.
        percent: u32,
    },
}

impl Default for Operation {
    fn default() -> Self {
        Operation::RemoveBackground {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Operation {
    /// Neutral stencil contrast.
    #[must_use]
    pub fn default_contrast() -> Self {
        Operation::Contrast {
            percent: DEFAULT_CONTRAST,
        }
    }

    /// Where a single-file run writes when no output is given.
    #[must_use]
    pub fn default_output(&self, input: &Path) -> PathBuf {
        match self {
            Operation::RemoveBackground { .. } => upload::default_output_path(input, "keyed"),
            Operation::Contrast { .. } => upload::stencil_output_path(input),
        }
    }
}

/// Options controlling file processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Write output even when the operation found nothing to change.
    pub force: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (nothing to change).
    pub skipped: bool,
    /// Pixels keyed out by background removal.
    pub keyed_pixels: usize,
    /// Human-readable status message. For failures this is the fixed
    /// category message from [`crate::FailureKind::user_message`].
    pub message: String,
    /// Underlying error text of a failure, for logs and verbose output.
    pub detail: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            keyed_pixels: 0,
            message: String::new(),
            detail: String::new(),
        }
    }

    fn failed(path: &Path, err: &Error) -> Self {
        let mut result = Self::new(path);
        result.message = err.failure_kind().user_message().to_string();
        result.detail = err.to_string();
        result
    }
}

/// Applies one [`Operation`] to images in memory or on disk.
#[derive(Debug, Clone)]
pub struct StencilEngine {
    operation: Operation,
}

impl StencilEngine {
    /// Create an engine for `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContrastOutOfRange`] for a contrast outside 50-250%.
    pub fn new(operation: Operation) -> Result<Self> {
        if let Operation::Contrast { percent } = operation {
            if !keying::CONTRAST_RANGE.contains(&percent) {
                return Err(Error::ContrastOutOfRange(percent));
            }
        }
        Ok(Self { operation })
    }

    /// The configured operation.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Apply the operation to an in-memory image.
    ///
    /// Returns the processed image and the number of keyed pixels (always 0
    /// for contrast).
    ///
    /// # Errors
    ///
    /// Propagates [`keying::adjust_contrast`] errors.
    pub fn apply(&self, mut image: RgbaImage) -> Result<(DynamicImage, usize)> {
        match self.operation {
            Operation::RemoveBackground { tolerance } => {
                let keyed = keying::remove_background(&mut image, tolerance);
                Ok((DynamicImage::ImageRgba8(image), keyed))
            }
            Operation::Contrast { percent } => {
                let adjusted = keying::adjust_contrast(&image, percent)?;
                Ok((DynamicImage::ImageRgb8(adjusted), 0))
            }
        }
    }

    /// Process a single image file: validate, load, apply, save as PNG.
    ///
    /// Never panics; failures are reported in the returned [`ProcessResult`].
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        match self.try_process_file(input, output, opts) {
            Ok(result) => result,
            Err(err) => {
                warn!("{}: {err}", input.display());
                ProcessResult::failed(input, &err)
            }
        }
    }

    fn try_process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> Result<ProcessResult> {
        let mut result = ProcessResult::new(input);

        let kind = upload::validate_upload(input)?;
        debug!("{}: {} upload accepted", input.display(), kind.mime());

        let rgba = image::open(input)?.to_rgba8();
        let (w, h) = rgba.dimensions();
        let (processed, keyed) = self.apply(rgba)?;
        result.keyed_pixels = keyed;

        let removing = matches!(self.operation, Operation::RemoveBackground { .. });
        if removing && keyed == 0 && !opts.force {
            result.success = true;
            result.skipped = true;
            result.message = format!("No near-white background found ({w}x{h})");
            return Ok(result);
        }

        save_png(&processed, output)?;
        debug!("{} -> {}", input.display(), output.display());

        result.success = true;
        result.message = match self.operation {
            Operation::RemoveBackground { .. } => {
                #[allow(clippy::cast_precision_loss)]
                let share = keyed as f64 / (f64::from(w) * f64::from(h)) * 100.0;
                format!("Background removed ({keyed} pixels, {share:.0}%)")
            }
            Operation::Contrast { percent } => format!("Stencil saved at {percent}% contrast"),
        };
        Ok(result)
    }

    /// Process all supported images in a directory.
    ///
    /// Outputs are written as `{stem}.png` inside `output_dir`. Inputs that
    /// share a stem (`a.png`, `a.jpg`) keep their extension instead:
    /// `a_png.png`, `a_jpg.png`. An input whose output name is still taken
    /// fails with [`Error::OutputConflict`] rather than overwriting.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_ok_and(|ft| ft.is_file()))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => return vec![ProcessResult::failed(input_dir, &Error::Io(e))],
        };
        inputs.sort();

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return vec![ProcessResult::failed(output_dir, &Error::Io(e))];
        }

        debug!("{} image(s) in {}", inputs.len(), input_dir.display());

        let jobs = plan_outputs(inputs, output_dir);
        let run = |job: &BatchJob| match &job.taken_by {
            Some(first) => {
                let err = Error::OutputConflict {
                    input: job.input.clone(),
                    first: first.clone(),
                    output: job.output.clone(),
                };
                warn!("{err}");
                ProcessResult::failed(&job.input, &err)
            }
            None => self.process_file(&job.input, &job.output, opts),
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(run).collect()
        }
    }
}

/// One input of a directory batch and where its result goes.
#[derive(Debug)]
struct BatchJob {
    input: PathBuf,
    output: PathBuf,
    /// Earlier input already writing to `output`.
    taken_by: Option<PathBuf>,
}

/// Assign every input a distinct output path inside `output_dir`.
fn plan_outputs(inputs: Vec<PathBuf>, output_dir: &Path) -> Vec<BatchJob> {
    let stem = |p: &Path| p.file_stem().unwrap_or_default().to_string_lossy().into_owned();

    let mut stem_count: HashMap<String, usize> = HashMap::new();
    for input in &inputs {
        *stem_count.entry(stem(input)).or_default() += 1;
    }

    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    inputs
        .into_iter()
        .map(|input| {
            let name = stem(&input);
            let file_name = if stem_count[&name] > 1 {
                let ext = input.extension().unwrap_or_default().to_string_lossy();
                format!("{name}_{}.png", ext.to_ascii_lowercase())
            } else {
                format!("{name}.png")
            };
            let output = output_dir.join(file_name);
            let taken_by = claimed.get(&output).cloned();
            if taken_by.is_none() {
                claimed.insert(output.clone(), input.clone());
            }
            BatchJob {
                input,
                output,
                taken_by,
            }
        })
        .collect()
}

/// Save an image as PNG, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if `path` names a non-PNG format, or
/// an I/O or encoding error.
pub fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    if path.extension().is_some() {
        let format =
            ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
        if format != ImageFormat::Png {
            return Err(Error::UnsupportedFormat(format!(
                "{format:?} (outputs are always PNG)"
            )));
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Render a try-on preview: place `overlay` on `frame` with `transform`.
///
/// When `key_tolerance` is set, the overlay's white background is keyed out
/// first.
///
/// # Errors
///
/// Returns [`Error::InvalidTransform`] for a degenerate transform.
pub fn render_preview(
    frame: &RgbImage,
    overlay: &RgbaImage,
    transform: &Transform,
    style: &OverlayStyle,
    key_tolerance: Option<u8>,
) -> Result<RgbImage> {
    let mut out = frame.clone();
    let written = if let Some(tolerance) = key_tolerance {
        let mut keyed = overlay.clone();
        keying::remove_background(&mut keyed, tolerance);
        compose::composite(&mut out, &keyed, transform, style)?
    } else {
        compose::composite(&mut out, overlay, transform, style)?
    };
    debug!("preview rendered, {written} overlay pixels visible");
    Ok(out)
}
