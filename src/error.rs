//! Error types for the redaction core.
//!
//! This module defines all error kinds that can occur while parsing, editing
//! and rebuilding content streams. Errors carry enough context (byte offsets,
//! resource names) for a caller to decide whether a page was left untouched.

/// Result type alias for redaction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds that can occur during content-stream surgery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The content stream could not be tokenized. The page is left unchanged.
    #[error("Malformed content stream at byte {offset}: {reason}")]
    MalformedContentStream {
        /// Byte offset where tokenization failed
        offset: usize,
        /// Reason for the failure
        reason: String,
    },

    /// The rebuilt content stream failed structural validation. The page is
    /// reverted to its pre-edit bytes.
    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// The extractor's letter stream does not align with an operation's
    /// decoded text. Recovered internally; surfaced only in logs.
    #[error("Letter mismatch for operation text: {0:?}")]
    LetterMismatch(String),

    /// A `Do` operator names an image resource the store does not have.
    #[error("Image resource missing: /{0}")]
    ImageResourceMissing(String),

    /// The annotation collaborator failed to delete an annotation.
    #[error("Annotation edit failed: {0}")]
    AnnotationEdit(String),

    /// Cancellation was requested; no partial mutation reached the document.
    #[error("Cancellation requested")]
    Cancelled,

    /// The object store collaborator reported a failure.
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error
    #[error("UTF-8 decoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

impl Error {
    /// Whether this error short-circuits a page pass.
    ///
    /// Everything except `ValidationFailure` and `Cancelled` is local: the
    /// affected operation or page is kept or reverted and the pipeline
    /// continues.
    pub fn is_fatal_for_page(&self) -> bool {
        matches!(self, Error::ValidationFailure(_) | Error::Cancelled)
    }
}
