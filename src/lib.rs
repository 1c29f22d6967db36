#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::match_like_matches_macro)]

//! # Redact Oxide
//!
//! True redaction of PDF pages: given rendered content and a set of
//! axis-aligned redaction areas in page user-space, produce a content stream
//! in which every glyph, image sample, vector path region and annotation
//! inside those areas has been *structurally removed*, not merely covered
//! by an opaque overlay. Text extracted from the output no longer contains
//! the redacted characters; images have their sample data overwritten;
//! vector paths are geometrically clipped; layout outside the redacted zones
//! stays pixel-stable.
//!
//! ## Architecture
//!
//! The core is a content-stream surgeon:
//!
//! - **Parser** ([`content::parser`]): tokenizes the stream, maintains the
//!   graphics/text state, and emits typed operations with page-space
//!   bounding boxes.
//! - **Editors** ([`redact::glyphs`], [`redact::paths`], [`redact::images`]):
//!   rewrite text blocks at glyph granularity, clip paths against the
//!   redaction union, and drop or black out images.
//! - **Builder/validator** ([`content::serializer`], [`content::validator`]):
//!   serialize back to bytes under strict formatting rules and refuse to
//!   emit a structurally invalid page.
//! - **Orchestrator** ([`redact::page`]): runs the pipeline per page,
//!   appends the optional opaque marker overlay, and gates annotations.
//!
//! The PDF object graph, font programs, rasterization and CLI glue are
//! external collaborators behind the traits in [`interfaces`].
//!
//! ## Quick start
//!
//! ```ignore
//! use redact_oxide::{redact_by_text, NoopPreserver, PdfALevel, RedactOptions, CancelToken};
//!
//! let report = redact_by_text(
//!     &mut store,            // your PdfStore implementation
//!     &decoder,              // your character-map decoder
//!     &extractor,            // your text extractor
//!     "123-45-6789",
//!     &RedactOptions::new(),
//!     &NoopPreserver,
//!     PdfALevel::None,
//!     &CancelToken::new(),
//! )?;
//! println!("{}", report.to_json());
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Operand model and geometry
pub mod geometry;
pub mod object;

// Content-stream parsing, serialization, validation
pub mod content;

// Redaction editors and per-page orchestration
pub mod redact;

// Collaborator seams
pub mod compliance;
pub mod interfaces;

// Cancellation
pub mod cancel;

// High-level API
pub mod api;

// Re-exports
pub use api::{PageError, RedactionReport, redact_by_text, redact_document};
pub use cancel::CancelToken;
pub use compliance::{NoopPreserver, PdfALevel, PdfAPreserver};
pub use error::{Error, Result};
pub use geometry::{Overlap, Point, Rect};
pub use interfaces::{CharacterMapDecoder, ImageResource, PdfStore, TextExtractor};
pub use redact::{
    GlyphRemovalPolicy, MarkerColor, PageOutcome, PartialImageMode, RedactOptions, RedactionArea,
    RedactionRequest, redact_page,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
