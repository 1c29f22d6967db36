//! Collaborator interfaces.
//!
//! The redaction core never touches the PDF object graph directly: it
//! exchanges byte buffers and typed records with an opaque store, asks a
//! character-map decoder for glyph decoding, and consults a text extractor
//! for visual glyph rectangles. Implementations live outside this crate; the
//! integration tests ship in-memory mocks.

use crate::error::Result;
use crate::geometry::Rect;
use bytes::Bytes;

/// An image resource as stored in a page's resource dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    /// Decoded sample bytes, row-major, rows top-down
    pub samples: Bytes,
    /// Samples per row
    pub width: u32,
    /// Number of rows
    pub height: u32,
    /// Bits per component (1, 2, 4, 8 or 16)
    pub bits_per_component: u8,
    /// Color space name (`DeviceRGB`, `DeviceGray`, `DeviceCMYK`, …)
    pub color_space: String,
    /// Filter chain the store re-applies on write
    pub filters: Vec<String>,
}

impl ImageResource {
    /// Number of color components implied by the color space.
    pub fn components(&self) -> usize {
        match self.color_space.as_str() {
            "DeviceRGB" | "RGB" | "CalRGB" => 3,
            "DeviceCMYK" | "CMYK" => 4,
            _ => 1,
        }
    }

    /// Bytes per sample row, rounded up to a whole byte.
    pub fn row_bytes(&self) -> usize {
        let bits = self.width as usize * self.components() * self.bits_per_component as usize;
        bits.div_ceil(8)
    }
}

/// The PDF object store the orchestrator edits through.
pub trait PdfStore {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Decoded content bytes of a page.
    fn get_page_content_bytes(&self, page_index: usize) -> Result<Vec<u8>>;

    /// Replace a page's content stream.
    fn set_page_content_bytes(&mut self, page_index: usize, bytes: Vec<u8>) -> Result<()>;

    /// Page user-space size `(width, height)` in points, before `/Rotate`.
    fn get_page_user_space_size(&self, page_index: usize) -> Result<(f64, f64)>;

    /// Page `/Rotate` value, one of 0, 90, 180, 270.
    fn get_page_rotation(&self, page_index: usize) -> Result<u16>;

    /// Fetch a named image resource of a page.
    fn get_page_image_resource(&self, page_index: usize, name: &str) -> Result<ImageResource>;

    /// Replace a named image resource.
    ///
    /// Stores backing resources shared across pages must clone the underlying
    /// object so other pages keep the original samples.
    fn replace_page_image_resource(
        &mut self,
        page_index: usize,
        name: &str,
        resource: ImageResource,
    ) -> Result<()>;

    /// Annotation rectangles (`/Rect`) of a page, in index order.
    fn get_page_annotations(&self, page_index: usize) -> Result<Vec<Rect>>;

    /// Delete one annotation by index.
    fn delete_annotation(&mut self, page_index: usize, index: usize) -> Result<()>;

    /// Persist all accumulated changes.
    fn save(&mut self) -> Result<()>;
}

/// Character-map decoder: font bytes to Unicode plus advance widths.
pub trait CharacterMapDecoder {
    /// Decode the operand bytes of a text-showing operator under the named
    /// font resource. Returns one `(codepoint, advance_width)` pair per
    /// produced character, with the advance in thousandths of the em.
    fn decode(&self, font_resource_name: &str, operand_bytes: &[u8]) -> Vec<(char, f64)>;
}

/// Text extractor consulted for glyph positions.
pub trait TextExtractor {
    /// Letters of a page in reading order, each with its visual-frame glyph
    /// rectangle (the frame after `/Rotate` has been applied).
    fn get_page_letters(&self, page_index: usize) -> Result<Vec<(char, Rect)>>;
}
