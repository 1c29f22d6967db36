//! Text block reconstruction.
//!
//! When any character of a `BT … ET` block is removed, the whole block is
//! replaced by a synthetic one. The emission template is fixed:
//!
//! ```text
//! BT
//! /F1 1 Tf                       (size folded into the matrix)
//! 12 0 0 12 72 700 Tm            (per kept segment)
//! (kept text) Tj
//! 12 0 0 12 120 700 Tm
//! (more kept text) Tj
//! ET
//! ```
//!
//! The nominal `Tf` size is always 1.0 and the effective font size goes into
//! the `Tm` scale entries; losing that fold collapses visible text to
//! hairline height. Non-default `Tc`/`Tw`/`Tz`/`Tr` state that governed the
//! original block is re-emitted right after `BT`.

use crate::content::graphics_state::Matrix;
use crate::content::operators::{OperationKind, PdfOperation, TextShow};
use crate::geometry::{Point, Rect};
use crate::object::Object;
use crate::redact::segment::TextSegment;

/// One constituent of a block being rebuilt, in original order.
pub enum BlockPart<'a> {
    /// A text-showing operation reduced to its kept segments
    Text {
        /// The original operation's decoded payload
        show: &'a TextShow,
        /// Segments that survive, in character order
        kept: Vec<TextSegment>,
    },
    /// A non-text-state operation that sat inside the block (pathological
    /// but legal); preserved verbatim in its original position
    Passthrough(&'a PdfOperation),
}

/// Emit the replacement block.
///
/// `inverse_ctm` maps page user-space back into the coordinates the content
/// stream uses at the block's position (identity unless the block sits under
/// a `cm`). All synthetic operations inherit `offset` so the operation list
/// stays ordered.
pub fn rebuild_block(
    offset: usize,
    parts: &[BlockPart<'_>],
    inverse_ctm: &Matrix,
) -> Vec<PdfOperation> {
    let mut ops = Vec::new();
    let text_op = |name: &str, operands: Vec<Object>| {
        PdfOperation::synthetic(name, operands, offset, true, OperationKind::TextState)
    };
    ops.push(text_op("BT", vec![]));

    let mut emitted_font: Option<(String, f64)> = None;
    let mut emitted_state: Option<(f64, f64, f64, u8)> = None;

    for part in parts {
        match part {
            BlockPart::Passthrough(op) => ops.push((*op).clone()),
            BlockPart::Text { show, kept } => {
                let state = (
                    show.char_space,
                    show.word_space,
                    show.horizontal_scaling,
                    show.render_mode,
                );
                if emitted_state != Some(state) {
                    if show.char_space != 0.0 {
                        ops.push(text_op("Tc", vec![Object::Real(show.char_space)]));
                    }
                    if show.word_space != 0.0 {
                        ops.push(text_op("Tw", vec![Object::Real(show.word_space)]));
                    }
                    if show.horizontal_scaling != 100.0 {
                        ops.push(text_op("Tz", vec![Object::Real(show.horizontal_scaling)]));
                    }
                    if show.render_mode != 0 {
                        ops.push(text_op(
                            "Tr",
                            vec![Object::Integer(show.render_mode as i64)],
                        ));
                    }
                    emitted_state = Some(state);
                }
                let size = show.font_size * inverse_ctm.x_scale();
                if emitted_font.as_ref() != Some(&(show.font.clone(), size)) {
                    ops.push(text_op(
                        "Tf",
                        vec![Object::Name(show.font.clone()), Object::Real(1.0)],
                    ));
                    emitted_font = Some((show.font.clone(), size));
                }
                for segment in kept.iter().filter(|s| s.keep) {
                    let pos = inverse_ctm.transform_point(segment.start.x, segment.start.y);
                    ops.push(text_op(
                        "Tm",
                        vec![
                            Object::Real(size),
                            Object::Real(0.0),
                            Object::Real(0.0),
                            Object::Real(size),
                            Object::Real(pos.x),
                            Object::Real(pos.y),
                        ],
                    ));
                    let mut tj = PdfOperation::synthetic(
                        "Tj",
                        vec![Object::String(encode_simple(&segment.text))],
                        offset,
                        true,
                        OperationKind::TextState,
                    );
                    tj.kind = OperationKind::Text(segment_show(show, segment, pos));
                    ops.push(tj);
                }
            },
        }
    }

    ops.push(text_op("ET", vec![]));
    ops
}

/// Encode reconstructed text back to string bytes.
///
/// Reconstruction targets simple single-byte fonts; codepoints above 0xFF
/// have no byte under such an encoding and degrade to `?`.
fn encode_simple(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF { cp as u8 } else { b'?' }
        })
        .collect()
}

/// Typed payload for a reconstructed `Tj`, so re-parsing and later editor
/// passes see the kept text with its geometry.
fn segment_show(original: &TextShow, segment: &TextSegment, pos: Point) -> TextShow {
    let count = segment.text.chars().count().max(1);
    TextShow {
        text: segment.text.clone(),
        font: original.font.clone(),
        font_size: original.font_size,
        advances: vec![segment.width / count as f64; segment.text.chars().count()],
        bbox: Rect::new(
            pos.x,
            pos.y,
            pos.x + segment.width,
            pos.y + segment.height,
        ),
        start: pos,
        char_space: original.char_space,
        word_space: original.word_space,
        horizontal_scaling: original.horizontal_scaling,
        rise: original.rise,
        render_mode: original.render_mode,
    }
}
