//! Error types for the tattoo-tryon crate.

/// Errors that can occur while validating, processing or compositing images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file type is not one of the accepted upload formats.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The upload exceeds the size limit.
    #[error("file too large ({size} bytes, limit is {limit} bytes)")]
    FileTooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// Contrast percentage outside the accepted range.
    #[error("contrast {0}% is out of range (50-250%)")]
    ContrastOutOfRange(u32),

    /// A transform component is unusable for rendering.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// A gesture trace line could not be parsed.
    #[error("gesture trace line {line}: {message}")]
    InvalidTrace {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Two batch inputs map to the same output file.
    #[error("output {} for {} is already taken by {}", output.display(), input.display(), first.display())]
    OutputConflict {
        /// The input that lost the output name.
        input: std::path::PathBuf,
        /// The input that claimed it first.
        first: std::path::PathBuf,
        /// The contested output path.
        output: std::path::PathBuf,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image could not be decoded or encoded.
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
