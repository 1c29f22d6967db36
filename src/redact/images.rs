//! Image editor: removal and sample blackout.
//!
//! Two image forms appear in content streams: XObject invocations (`Do`
//! positioned by the surrounding `cm`) and inline images (`BI … ID … EI`).
//! An image fully inside the redaction union is dropped from the stream,
//! including its private `q cm … Q` bracket when that bracket protects
//! nothing else. A partially covered image is either dropped too
//! (`Remove` mode) or kept with the affected samples overwritten by zeros
//! (`PreserveWithBlackout`).
//!
//! Inline images are rewritten in place. XObject sample data lives in the
//! page's resource dictionary, so blackouts of XObjects are returned as
//! [`ResourceEdit`]s for the orchestrator to apply through the store, which
//! clones resources shared across pages before mutating them.

use crate::cancel::CancelToken;
use crate::content::operators::{ImageData, ImageInvocation, OperationKind, PdfOperation};
use crate::error::Result;
use crate::geometry::Rect;
use crate::object::Object;
use crate::redact::options::PartialImageMode;
use bytes::Bytes;
use indexmap::IndexMap;
use log::debug;

/// A pending sample blackout on a named image resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEdit {
    /// The image resource name
    pub name: String,
    /// Areas to zero, in image space (unit square, y up)
    pub areas: Vec<Rect>,
}

/// Edit the images of an operation list against the redaction areas.
///
/// Returns the rewritten list, the number of affected images, and the
/// resource blackouts the orchestrator must apply.
pub fn edit_images(
    ops: &[PdfOperation],
    areas: &[Rect],
    mode: PartialImageMode,
    cancel: &CancelToken,
) -> Result<(Vec<PdfOperation>, usize, Vec<ResourceEdit>)> {
    let mut out: Vec<PdfOperation> = Vec::new();
    let mut removed = 0usize;
    let mut edits: Vec<ResourceEdit> = Vec::new();

    let mut skip_next_restore = false;
    for (i, op) in ops.iter().enumerate() {
        if skip_next_restore && op.name == "Q" {
            skip_next_restore = false;
            continue;
        }
        let Some(image) = op.as_image() else {
            out.push(op.clone());
            continue;
        };
        cancel.check()?;

        let hit: Vec<&Rect> = areas.iter().filter(|a| a.intersects(&image.bbox)).collect();
        if hit.is_empty() {
            out.push(op.clone());
            continue;
        }
        let contained = hit.iter().any(|a| a.contains(&image.bbox));

        if contained || mode == PartialImageMode::Remove {
            removed += 1;
            skip_next_restore = drop_private_bracket(&mut out, ops, i);
            continue;
        }

        // Partial overlap, preserve with blackout
        let image_areas = map_areas_to_image_space(image, &hit);
        match &image.data {
            ImageData::Inline { dict, data } => {
                removed += 1;
                out.push(blackout_inline(op, image, dict, data, &image_areas));
            },
            ImageData::XObject { name } => {
                removed += 1;
                edits.push(ResourceEdit {
                    name: name.clone(),
                    areas: image_areas,
                });
                out.push(op.clone());
            },
        }
    }
    Ok((out, removed, edits))
}

/// When a dropped invocation sits in a `q cm Do Q` bracket that protects
/// nothing else, drop the bracket too. Returns whether the following `Q`
/// must be skipped.
fn drop_private_bracket(
    out: &mut Vec<PdfOperation>,
    ops: &[PdfOperation],
    image_index: usize,
) -> bool {
    let followed_by_restore = ops.get(image_index + 1).is_some_and(|op| op.name == "Q");
    let preceded = out.len() >= 2
        && out[out.len() - 1].name == "cm"
        && out[out.len() - 2].name == "q";
    if followed_by_restore && preceded {
        out.pop(); // cm
        out.pop(); // q
        return true;
    }
    // Keep the bracket, drop only the invocation; the positioning cm is
    // harmless without its Do when the bracket shields it.
    if !followed_by_restore && preceded {
        out.pop();
    }
    false
}

/// Map page-space redaction areas into image space (unit square, y up).
fn map_areas_to_image_space(image: &ImageInvocation, hit: &[&Rect]) -> Vec<Rect> {
    let Some(inverse) = image.ctm.invert() else {
        debug!("degenerate image CTM; blacking out the whole image");
        return vec![Rect::new(0.0, 0.0, 1.0, 1.0)];
    };
    hit.iter()
        .filter_map(|area| {
            let a = inverse.transform_point(area.left, area.bottom);
            let b = inverse.transform_point(area.right, area.top);
            let rect = Rect::new(a.x, a.y, b.x, b.y);
            let clamped = Rect::new(
                rect.left.clamp(0.0, 1.0),
                rect.bottom.clamp(0.0, 1.0),
                rect.right.clamp(0.0, 1.0),
                rect.top.clamp(0.0, 1.0),
            );
            if clamped.is_empty() { None } else { Some(clamped) }
        })
        .collect()
}

/// Rewrite an inline image with the covered samples zeroed.
fn blackout_inline(
    op: &PdfOperation,
    image: &ImageInvocation,
    dict: &IndexMap<String, Object>,
    data: &Bytes,
    image_areas: &[Rect],
) -> PdfOperation {
    let width = dict_u32(dict, &["W", "Width"]).unwrap_or(0);
    let height = dict_u32(dict, &["H", "Height"]).unwrap_or(0);
    let bpc = dict_u32(dict, &["BPC", "BitsPerComponent"]).unwrap_or(8) as u8;
    let components = dict
        .get("CS")
        .or_else(|| dict.get("ColorSpace"))
        .and_then(|o| o.as_name())
        .map(components_for_color_space)
        .unwrap_or(1);

    let mut samples = data.to_vec();
    for area in image_areas {
        zero_samples(&mut samples, width, height, bpc, components, area);
    }

    let mut new_op = op.clone();
    new_op.kind = OperationKind::Image(ImageInvocation {
        data: ImageData::Inline {
            dict: dict.clone(),
            data: Bytes::from(samples),
        },
        bbox: image.bbox,
        ctm: image.ctm,
    });
    new_op
}

fn dict_u32(dict: &IndexMap<String, Object>, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|k| dict.get(*k))
        .and_then(|o| o.as_integer())
        .map(|i| i.max(0) as u32)
}

/// Components per sample for the inline-image color space names.
pub fn components_for_color_space(name: &str) -> usize {
    match name {
        "RGB" | "DeviceRGB" | "CalRGB" => 3,
        "CMYK" | "DeviceCMYK" => 4,
        _ => 1, // G, DeviceGray, Indexed
    }
}

/// Zero every sample whose center falls inside `area`.
///
/// `area` is in image space: the unit square with y pointing up, while
/// sample rows run top-down. For bit depths below 8 the byte covering the
/// sample is zeroed whole; that may blacken a few neighboring samples at the
/// row edge, never fewer.
pub fn zero_samples(
    samples: &mut [u8],
    width: u32,
    height: u32,
    bpc: u8,
    components: usize,
    area: &Rect,
) {
    if width == 0 || height == 0 || bpc == 0 {
        return;
    }
    let row_bits = width as usize * components * bpc as usize;
    let row_bytes = row_bits.div_ceil(8);
    for row in 0..height as usize {
        let y_center = 1.0 - (row as f64 + 0.5) / height as f64;
        if y_center < area.bottom || y_center > area.top {
            continue;
        }
        let row_offset = row * row_bytes;
        for col in 0..width as usize {
            let x_center = (col as f64 + 0.5) / width as f64;
            if x_center < area.left || x_center > area.right {
                continue;
            }
            let first_bit = col * components * bpc as usize;
            let last_bit = first_bit + components * bpc as usize - 1;
            for byte in first_bit / 8..=last_bit / 8 {
                if let Some(b) = samples.get_mut(row_offset + byte) {
                    *b = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentParser;
    use crate::interfaces::CharacterMapDecoder;

    struct NoDecoder;

    impl CharacterMapDecoder for NoDecoder {
        fn decode(&self, _font: &str, bytes: &[u8]) -> Vec<(char, f64)> {
            bytes.iter().map(|&b| (b as char, 500.0)).collect()
        }
    }

    fn parse(stream: &[u8]) -> Vec<PdfOperation> {
        ContentParser::new(&NoDecoder, 792.0)
            .parse(stream, &CancelToken::new())
            .unwrap()
    }

    fn run(
        stream: &[u8],
        areas: &[Rect],
        mode: PartialImageMode,
    ) -> (Vec<PdfOperation>, usize, Vec<ResourceEdit>) {
        edit_images(&parse(stream), areas, mode, &CancelToken::new()).unwrap()
    }

    #[test]
    fn test_disjoint_image_kept() {
        let stream = b"q 200 0 0 200 100 100 cm /Im1 Do Q";
        let (out, removed, edits) = run(
            stream,
            &[Rect::new(500.0, 500.0, 600.0, 600.0)],
            PartialImageMode::Remove,
        );
        assert_eq!(removed, 0);
        assert!(edits.is_empty());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_contained_image_dropped_with_bracket() {
        let stream = b"q 200 0 0 200 100 100 cm /Im1 Do Q";
        let (out, removed, _) = run(
            stream,
            &[Rect::new(50.0, 50.0, 350.0, 350.0)],
            PartialImageMode::Remove,
        );
        assert_eq!(removed, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_bracket_kept_when_it_protects_more() {
        let stream = b"q 200 0 0 200 100 100 cm /Im1 Do 0 0 5 5 re f Q";
        let (out, removed, _) = run(
            stream,
            &[Rect::new(50.0, 50.0, 350.0, 350.0)],
            PartialImageMode::Remove,
        );
        assert_eq!(removed, 1);
        let names: Vec<&str> = out.iter().map(|op| op.name.as_str()).collect();
        assert!(names.contains(&"q"));
        assert!(names.contains(&"Q"));
        assert!(!names.contains(&"Do"));
    }

    #[test]
    fn test_partial_remove_mode_drops() {
        let stream = b"q 200 0 0 200 100 100 cm /Im1 Do Q";
        let (out, removed, _) = run(
            stream,
            &[Rect::new(100.0, 250.0, 200.0, 300.0)],
            PartialImageMode::Remove,
        );
        assert_eq!(removed, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_partial_xobject_blackout_records_edit() {
        // Scenario S6: 200x200 image at (100,100), redaction (100,250)-(200,300)
        let stream = b"q 200 0 0 200 100 100 cm /Im1 Do Q";
        let (out, removed, edits) = run(
            stream,
            &[Rect::new(100.0, 250.0, 200.0, 300.0)],
            PartialImageMode::PreserveWithBlackout,
        );
        assert_eq!(removed, 1);
        assert_eq!(out.len(), 4); // invocation retained
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].name, "Im1");
        let area = edits[0].areas[0];
        assert!((area.left - 0.0).abs() < 1e-9);
        assert!((area.right - 0.5).abs() < 1e-9);
        assert!((area.bottom - 0.75).abs() < 1e-9);
        assert!((area.top - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_inline_blackout_zeroes_samples() {
        // 4x2 gray image over a 40x20 area at the origin; redact the left half
        let stream =
            b"q 40 0 0 20 0 0 cm BI /W 4 /H 2 /BPC 8 /CS /G ID \xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF EI Q";
        let (out, removed, edits) = run(
            stream,
            &[Rect::new(-10.0, -10.0, 20.0, 30.0)],
            PartialImageMode::PreserveWithBlackout,
        );
        assert_eq!(removed, 1);
        assert!(edits.is_empty());
        let image = out.iter().find_map(|op| op.as_image()).unwrap();
        match &image.data {
            ImageData::Inline { data, .. } => {
                assert_eq!(data.as_ref(), &[0, 0, 0xFF, 0xFF, 0, 0, 0xFF, 0xFF]);
            },
            _ => panic!("expected inline image"),
        }
    }

    #[test]
    fn test_zero_samples_rgb8() {
        // 2x2 RGB, redact the top row
        let mut samples = vec![0xAA; 12];
        zero_samples(
            &mut samples,
            2,
            2,
            8,
            3,
            &Rect::new(0.0, 0.5, 1.0, 1.0),
        );
        assert_eq!(&samples[..6], &[0; 6]);
        assert_eq!(&samples[6..], &[0xAA; 6]);
    }

    #[test]
    fn test_zero_samples_subbyte_is_byte_aligned() {
        // 16x1 at 1 bpc: two bytes per row; clearing the left half clears
        // exactly the first byte
        let mut samples = vec![0xFF, 0xFF];
        zero_samples(
            &mut samples,
            16,
            1,
            1,
            1,
            &Rect::new(0.0, 0.0, 0.5, 1.0),
        );
        assert_eq!(samples, vec![0x00, 0xFF]);
    }
}
