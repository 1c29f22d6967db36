//! Annotation gate.
//!
//! Annotations (notes, links, popups) carry their own payloads outside the
//! content stream, so a structurally redacted page can still leak text
//! through them. The gate deletes every annotation whose `/Rect` intersects
//! a redaction area; sanitizing passes delete all annotations regardless of
//! position.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::interfaces::PdfStore;

/// Delete the annotations a redaction pass must not keep.
///
/// Returns the number of annotations deleted. Collaborator failures surface
/// as [`Error::AnnotationEdit`].
pub fn gate_annotations(
    store: &mut dyn PdfStore,
    page_index: usize,
    areas: &[Rect],
    remove_all: bool,
) -> Result<usize> {
    let rects = store
        .get_page_annotations(page_index)
        .map_err(|e| Error::AnnotationEdit(e.to_string()))?;
    let doomed: Vec<usize> = rects
        .iter()
        .enumerate()
        .filter(|(_, rect)| remove_all || areas.iter().any(|area| area.intersects(rect)))
        .map(|(index, _)| index)
        .collect();
    // Delete back-to-front so earlier indices stay valid
    for &index in doomed.iter().rev() {
        store
            .delete_annotation(page_index, index)
            .map_err(|e| Error::AnnotationEdit(e.to_string()))?;
    }
    Ok(doomed.len())
}
