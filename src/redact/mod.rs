//! The content-stream surgeons: glyph, path, image and annotation editors,
//! plus the per-page orchestrator that runs them in sequence.

pub mod annotations;
pub mod glyphs;
pub mod images;
pub mod letters;
pub mod options;
pub mod page;
pub mod paths;
pub mod reconstruct;
pub mod rotation;
pub mod segment;

pub use options::{
    GlyphRemovalPolicy, MarkerColor, PartialImageMode, RedactOptions, RedactionArea,
    RedactionRequest,
};
pub use page::{PageOutcome, redact_page};
pub use rotation::RotationBridge;
