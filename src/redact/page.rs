//! Page orchestrator.
//!
//! Runs the whole pipeline for one page: parse the content stream, apply the
//! glyph remover, path clipper and image editor over the same redaction
//! rectangles, serialize, validate, and only then touch the store. A page
//! either comes out fully redacted and structurally valid or stays exactly
//! as it was.

use crate::cancel::CancelToken;
use crate::content::parser::ContentParser;
use crate::content::operators::{OperationKind, PdfOperation};
use crate::content::serializer::serialize_operations;
use crate::content::validator::{count_unknown, validate};
use crate::error::Result;
use crate::geometry::Rect;
use crate::interfaces::{CharacterMapDecoder, PdfStore, TextExtractor};
use crate::object::Object;
use crate::redact::annotations::gate_annotations;
use crate::redact::glyphs::remove_glyphs;
use crate::redact::images::{ResourceEdit, edit_images, zero_samples};
use crate::redact::letters::{Letter, LetterIndex};
use crate::redact::options::{MarkerColor, RedactOptions, RedactionArea};
use crate::redact::paths::clip_paths;
use crate::redact::rotation::RotationBridge;
use bytes::Bytes;
use log::{debug, warn};

/// Counts of what one page pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageOutcome {
    /// Text operations that lost characters
    pub removed_text: usize,
    /// Images dropped or blacked out
    pub removed_images: usize,
    /// Paths deleted or cut
    pub removed_paths: usize,
    /// Annotations deleted
    pub removed_annotations: usize,
}

/// Redact one page.
///
/// The content stream is re-read from the store on every call, so sequential
/// requests against the same page see each other's edits; letter indices are
/// never cached across passes because positions move.
pub fn redact_page(
    store: &mut dyn PdfStore,
    decoder: &dyn CharacterMapDecoder,
    extractor: &dyn TextExtractor,
    page_index: usize,
    areas: &[RedactionArea],
    options: &RedactOptions,
    cancel: &CancelToken,
) -> Result<PageOutcome> {
    if areas.is_empty() && !options.sanitize_metadata {
        return Ok(PageOutcome::default());
    }

    let content = store.get_page_content_bytes(page_index)?;
    let (width, height) = store.get_page_user_space_size(page_index)?;
    let rotation = store.get_page_rotation(page_index)?;
    let bridge = RotationBridge::new(rotation, width, height);
    let rects: Vec<Rect> = areas.iter().map(|a| a.rect).collect();

    let mut outcome = PageOutcome::default();
    let mut edits: Vec<ResourceEdit> = Vec::new();

    if !rects.is_empty() {
        let parser = ContentParser::new(decoder, height);
        let ops = parser.parse(&content, cancel)?;

        // Extractor letters arrive in the visual frame; bring them into the
        // content stream's user space before any overlap decision.
        let letters: Vec<Letter> = extractor
            .get_page_letters(page_index)?
            .into_iter()
            .map(|(code, rect)| Letter {
                code,
                rect: bridge.visual_rect_to_user(rect),
            })
            .collect();
        let mut index = LetterIndex::new(letters, options.case_sensitive);

        let (ops, removed_text) = remove_glyphs(
            &ops,
            &rects,
            options.glyph_removal_policy,
            &mut index,
            cancel,
        )?;
        let (ops, removed_paths) = clip_paths(&ops, &rects, cancel)?;
        let (mut ops, removed_images, image_edits) =
            edit_images(&ops, &rects, options.partial_image_mode, cancel)?;
        outcome.removed_text = removed_text;
        outcome.removed_paths = removed_paths;
        outcome.removed_images = removed_images;
        edits = image_edits;

        if options.draw_visual_marker {
            ops.extend(marker_overlay(areas, options.marker_color, &content));
        }

        let serialized = serialize_operations(&ops);
        validate(&serialized, count_unknown(&ops))?;

        // Nothing has touched the store up to here; a cancellation or
        // validation failure leaves the page as it was.
        cancel.check()?;
        apply_resource_edits(store, page_index, &edits)?;
        store.set_page_content_bytes(page_index, serialized)?;
        debug!(
            "page {}: {} text, {} path, {} image removals",
            page_index, outcome.removed_text, outcome.removed_paths, outcome.removed_images
        );
    }

    outcome.removed_annotations =
        gate_annotations(store, page_index, &rects, options.sanitize_metadata)?;
    Ok(outcome)
}

/// Opaque marker sub-stream appended after the structural removal:
/// `q`, fill color, one `re`+`f` per area, `Q`.
fn marker_overlay(
    areas: &[RedactionArea],
    default_color: MarkerColor,
    content: &[u8],
) -> Vec<PdfOperation> {
    let offset = content.len();
    let gfx = |name: &str, operands: Vec<Object>| {
        PdfOperation::synthetic(name, operands, offset, false, OperationKind::GraphicsState)
    };
    let mut ops = Vec::with_capacity(areas.len() * 3 + 2);
    ops.push(gfx("q", vec![]));
    let mut current: Option<MarkerColor> = None;
    for area in areas {
        let color = area.color.unwrap_or(default_color);
        if current != Some(color) {
            ops.push(gfx(
                "rg",
                vec![
                    Object::Real(color.r),
                    Object::Real(color.g),
                    Object::Real(color.b),
                ],
            ));
            current = Some(color);
        }
        ops.push(PdfOperation::synthetic(
            "re",
            vec![
                Object::Real(area.rect.left),
                Object::Real(area.rect.bottom),
                Object::Real(area.rect.width()),
                Object::Real(area.rect.height()),
            ],
            offset,
            false,
            OperationKind::PathConstruction,
        ));
        ops.push(PdfOperation::synthetic(
            "f",
            vec![],
            offset,
            false,
            OperationKind::PathPainting,
        ));
    }
    ops.push(gfx("Q", vec![]));
    ops
}

/// Apply XObject sample blackouts through the store.
///
/// A missing resource is a warning, not a failure; the invocation was kept
/// verbatim and the marker overlay still covers the area.
fn apply_resource_edits(
    store: &mut dyn PdfStore,
    page_index: usize,
    edits: &[ResourceEdit],
) -> Result<()> {
    for edit in edits {
        let mut resource = match store.get_page_image_resource(page_index, &edit.name) {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    "image resource /{} missing on page {}: {}",
                    edit.name, page_index, e
                );
                continue;
            },
        };
        let mut samples = resource.samples.to_vec();
        let components = resource.components();
        for area in &edit.areas {
            zero_samples(
                &mut samples,
                resource.width,
                resource.height,
                resource.bits_per_component,
                components,
                area,
            );
        }
        resource.samples = Bytes::from(samples);
        store.replace_page_image_resource(page_index, &edit.name, resource)?;
    }
    Ok(())
}
