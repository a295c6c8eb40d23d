//! Categorize image-generation failures into user-facing messages.
//!
//! Failures from the generation backend only carry free text. The text is
//! matched against known keywords, first match wins, and each category has
//! one fixed message that is safe to show inline.

use std::fmt;

use crate::error::Error;

/// Category of a failed generation, adjustment or conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The API key is missing or rejected.
    InvalidCredentials,
    /// Usage quota or billing limit reached.
    QuotaExceeded,
    /// The prompt or image was refused by content filters.
    SafetyBlocked,
    /// The request never reached the service.
    Network,
    /// The service failed internally.
    ServerUnavailable,
    /// The service rejected the request as malformed.
    BadRequest,
    /// An uploaded or returned image could not be decoded.
    CorruptImage,
    /// Inline image data (a data URL) was malformed.
    InvalidImageData,
    /// Anything else.
    Unknown,
}

/// Keyword table in priority order. Keywords are lowercase.
const RULES: &[(FailureKind, &[&str])] = &[
    (FailureKind::InvalidCredentials, &["api_key"]),
    (FailureKind::QuotaExceeded, &["quota"]),
    (FailureKind::SafetyBlocked, &["safety", "blocked", "moderated"]),
    (FailureKind::Network, &["network", "fetch failed"]),
    (FailureKind::ServerUnavailable, &["internal server error", "500"]),
    (FailureKind::BadRequest, &["bad request", "400"]),
    (FailureKind::CorruptImage, &["failed to load image"]),
    (FailureKind::InvalidImageData, &["invalid data url"]),
];

impl FailureKind {
    /// Every category, in matching priority order, `Unknown` last.
    pub const ALL: [FailureKind; 9] = [
        FailureKind::InvalidCredentials,
        FailureKind::QuotaExceeded,
        FailureKind::SafetyBlocked,
        FailureKind::Network,
        FailureKind::ServerUnavailable,
        FailureKind::BadRequest,
        FailureKind::CorruptImage,
        FailureKind::InvalidImageData,
        FailureKind::Unknown,
    ];

    /// Classify raw failure text. Matching is case-insensitive.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map_or(FailureKind::Unknown, |(kind, _)| *kind)
    }

    /// The message shown to the user for this category.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::InvalidCredentials => {
                "Invalid API Key. Please ensure your key is correctly configured."
            }
            FailureKind::QuotaExceeded => {
                "API quota exceeded. Please check your usage and billing, or try again later."
            }
            FailureKind::SafetyBlocked => {
                "Your request was blocked due to safety filters. Please adjust your prompt or image and try again."
            }
            FailureKind::Network => {
                "A network error occurred. Please check your internet connection and try again."
            }
            FailureKind::ServerUnavailable => {
                "The AI service is currently unavailable. Please try again in a few moments."
            }
            FailureKind::BadRequest => {
                "The request was invalid. This can happen with unsupported image formats or prompts. Please try a different input."
            }
            FailureKind::CorruptImage => {
                "The uploaded image could not be processed. It might be corrupted or in an unsupported format."
            }
            FailureKind::InvalidImageData => {
                "There was an issue processing the image data. Please try uploading the image again."
            }
            FailureKind::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    /// Short machine-readable label, e.g. `quota-exceeded`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::InvalidCredentials => "invalid-credentials",
            FailureKind::QuotaExceeded => "quota-exceeded",
            FailureKind::SafetyBlocked => "safety-blocked",
            FailureKind::Network => "network-error",
            FailureKind::ServerUnavailable => "server-error",
            FailureKind::BadRequest => "bad-request",
            FailureKind::CorruptImage => "corrupt-image",
            FailureKind::InvalidImageData => "invalid-image-data",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify any error and return its user-facing message.
#[must_use]
pub fn friendly_message(err: &dyn fmt::Display) -> &'static str {
    FailureKind::classify(&err.to_string()).user_message()
}

impl Error {
    /// Failure category of a local processing error.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Image(_) => FailureKind::CorruptImage,
            Error::UnsupportedFormat(_)
            | Error::FileTooLarge { .. }
            | Error::ContrastOutOfRange(_)
            | Error::InvalidTransform(_)
            | Error::InvalidTrace { .. }
            | Error::OutputConflict { .. } => FailureKind::BadRequest,
            Error::Io(err) => FailureKind::classify(&err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_category() {
        let cases = [
            ("API_KEY_INVALID: key not valid", FailureKind::InvalidCredentials),
            ("Resource exhausted: Quota exceeded", FailureKind::QuotaExceeded),
            ("Candidate was blocked due to SAFETY", FailureKind::SafetyBlocked),
            ("prompt moderated", FailureKind::SafetyBlocked),
            ("TypeError: fetch failed", FailureKind::Network),
            ("Network request timed out", FailureKind::Network),
            ("Internal Server Error", FailureKind::ServerUnavailable),
            ("got status 500", FailureKind::ServerUnavailable),
            ("400 Bad Request", FailureKind::BadRequest),
            ("Failed to load image for processing.", FailureKind::CorruptImage),
            ("Invalid data URL format", FailureKind::InvalidImageData),
            ("something odd happened", FailureKind::Unknown),
            ("", FailureKind::Unknown),
        ];
        for (text, expected) in cases {
            assert_eq!(FailureKind::classify(text), expected, "text: {text:?}");
        }
    }

    #[test]
    fn earlier_rules_win() {
        // Mentions both the key and a 400 status.
        assert_eq!(
            FailureKind::classify("400: api_key missing"),
            FailureKind::InvalidCredentials
        );
        assert_eq!(
            FailureKind::classify("quota check blocked"),
            FailureKind::QuotaExceeded
        );
    }

    #[test]
    fn every_kind_has_distinct_message_and_label() {
        let mut messages: Vec<_> = FailureKind::ALL.iter().map(|k| k.user_message()).collect();
        let mut labels: Vec<_> = FailureKind::ALL.iter().map(|k| k.label()).collect();
        messages.sort_unstable();
        messages.dedup();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(messages.len(), FailureKind::ALL.len());
        assert_eq!(labels.len(), FailureKind::ALL.len());
    }

    #[test]
    fn friendly_message_never_leaks_raw_text() {
        let msg = friendly_message(&"segfault at 0xdeadbeef");
        assert_eq!(msg, FailureKind::Unknown.user_message());
    }

    #[test]
    fn crate_errors_map_to_categories() {
        let decode = Error::Image(image::ImageError::IoError(std::io::Error::other("bad")));
        assert_eq!(decode.failure_kind(), FailureKind::CorruptImage);
        assert_eq!(
            Error::UnsupportedFormat("gif".into()).failure_kind(),
            FailureKind::BadRequest
        );
        assert_eq!(
            Error::ContrastOutOfRange(400).failure_kind(),
            FailureKind::BadRequest
        );
        let io = Error::Io(std::io::Error::other("disk full"));
        assert_eq!(io.failure_kind(), FailureKind::Unknown);
    }
}
