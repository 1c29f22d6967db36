//! PDF/A preservation interface.
//!
//! Redacting a PDF/A document must not silently break its conformance
//! metadata. The preserver collaborator reads the document's existing XMP
//! `pdfaid:part`/`pdfaid:conformance` and synchronizes modification dates
//! between the info dictionary and XMP. It runs after the content edits,
//! immediately before the document is saved, and is permitted to fail
//! silently when the XMP payload lacks the whitespace padding needed to
//! accept the injection.

use crate::error::Result;
use crate::interfaces::PdfStore;
use serde::{Deserialize, Serialize};

/// PDF/A conformance levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdfALevel {
    /// Not a PDF/A document
    #[default]
    None,
    /// PDF/A-1a
    A1a,
    /// PDF/A-1b
    A1b,
    /// PDF/A-2a
    A2a,
    /// PDF/A-2b
    A2b,
    /// PDF/A-2u
    A2u,
    /// PDF/A-3a
    A3a,
    /// PDF/A-3b
    A3b,
    /// PDF/A-3u
    A3u,
    /// PDF/A-4
    A4,
    /// PDF/A-4e
    A4e,
    /// PDF/A-4f
    A4f,
}

impl PdfALevel {
    /// The XMP `pdfaid:part` and `pdfaid:conformance` pair for this level.
    pub fn part_and_conformance(&self) -> Option<(u8, Option<char>)> {
        match self {
            PdfALevel::None => None,
            PdfALevel::A1a => Some((1, Some('A'))),
            PdfALevel::A1b => Some((1, Some('B'))),
            PdfALevel::A2a => Some((2, Some('A'))),
            PdfALevel::A2b => Some((2, Some('B'))),
            PdfALevel::A2u => Some((2, Some('U'))),
            PdfALevel::A3a => Some((3, Some('A'))),
            PdfALevel::A3b => Some((3, Some('B'))),
            PdfALevel::A3u => Some((3, Some('U'))),
            PdfALevel::A4 => Some((4, None)),
            PdfALevel::A4e => Some((4, Some('E'))),
            PdfALevel::A4f => Some((4, Some('F'))),
        }
    }
}

/// Collaborator that keeps PDF/A metadata coherent across a save.
pub trait PdfAPreserver {
    /// Synchronize PDF/A metadata for the document behind `store`.
    fn preserve(&self, store: &mut dyn PdfStore, level: PdfALevel) -> Result<()>;
}

/// Preserver for callers without PDF/A requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPreserver;

impl PdfAPreserver for NoopPreserver {
    fn preserve(&self, _store: &mut dyn PdfStore, _level: PdfALevel) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_and_conformance() {
        assert_eq!(PdfALevel::None.part_and_conformance(), None);
        assert_eq!(PdfALevel::A2b.part_and_conformance(), Some((2, Some('B'))));
        assert_eq!(PdfALevel::A4.part_and_conformance(), Some((4, None)));
    }
}
