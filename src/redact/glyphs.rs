//! Glyph remover: block-granularity text redaction.
//!
//! Walks the operation list, finds `BT … ET` blocks, and decides per block
//! whether any of its text-showing operations loses characters. Untouched
//! blocks pass through verbatim, byte-faithfully. Touched blocks are replaced
//! wholesale by a reconstructed block covering all kept text.
//!
//! The all-or-nothing block rule is the load-bearing invariant: mixing
//! original and reconstructed operations inside one block either duplicates
//! glyphs (original and reconstruction both painting) or scrambles advances
//! (original state operators feeding reconstructed ones). Reconstruction is
//! bounded by the block; operations in other blocks are never affected.

use crate::cancel::CancelToken;
use crate::content::graphics_state::Matrix;
use crate::content::operators::{OperationKind, PdfOperation, TextShow};
use crate::content::registry::matrix_from_operands;
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::redact::letters::LetterIndex;
use crate::redact::options::GlyphRemovalPolicy;
use crate::redact::reconstruct::{BlockPart, rebuild_block};
use crate::redact::segment::{TextSegment, segment_text};
use log::warn;

/// What the segmenter decided about one text-showing operation.
enum TextFate {
    /// No character removed; the operation survives as-is
    Untouched,
    /// No letter match and the whole operation sits inside a redaction area
    AtomRemoved,
    /// Character-level segmentation applies
    Segmented(Vec<TextSegment>),
}

/// Remove redacted glyphs from the operation list.
///
/// Returns the rewritten list and the number of text operations that lost
/// characters.
pub fn remove_glyphs(
    ops: &[PdfOperation],
    areas: &[Rect],
    policy: GlyphRemovalPolicy,
    letters: &mut LetterIndex,
    cancel: &CancelToken,
) -> Result<(Vec<PdfOperation>, usize)> {
    let mut out = Vec::with_capacity(ops.len());
    let mut removed_total = 0usize;
    let mut ctm = Matrix::identity();
    let mut saved: Vec<Matrix> = Vec::new();

    let mut i = 0;
    while i < ops.len() {
        let op = &ops[i];
        match op.name.as_str() {
            "q" => saved.push(ctm),
            "Q" => {
                if let Some(m) = saved.pop() {
                    ctm = m;
                }
            },
            "cm" => ctm = matrix_from_operands(&op.operands).multiply(&ctm),
            "BT" => {
                cancel.check()?;
                let end = ops[i..]
                    .iter()
                    .position(|o| o.name == "ET")
                    .map(|p| i + p)
                    .unwrap_or(ops.len() - 1);
                let block = &ops[i..=end];
                let (block_ops, removed) = process_block(block, ctm, areas, policy, letters)?;
                out.extend(block_ops);
                removed_total += removed;
                i = end + 1;
                continue;
            },
            _ => {},
        }
        out.push(op.clone());
        i += 1;
    }
    Ok((out, removed_total))
}

fn process_block(
    block: &[PdfOperation],
    ctm: Matrix,
    areas: &[Rect],
    policy: GlyphRemovalPolicy,
    letters: &mut LetterIndex,
) -> Result<(Vec<PdfOperation>, usize)> {
    // Classify every text op first; this also advances the letter cursor in
    // stream order even when the block ends up untouched.
    let mut fates: Vec<TextFate> = Vec::new();
    for op in block {
        if let Some(show) = op.as_text() {
            let matches = letters.match_operation(&show.text);
            let fate = match segment_text(show, &matches, areas, policy) {
                None => {
                    if areas.iter().any(|area| area.contains(&show.bbox)) {
                        TextFate::AtomRemoved
                    } else {
                        TextFate::Untouched
                    }
                },
                Some(segments) => {
                    if segments.iter().any(|s| !s.keep) {
                        TextFate::Segmented(segments)
                    } else {
                        TextFate::Untouched
                    }
                },
            };
            fates.push(fate);
        }
    }

    let touched = fates.iter().any(|f| !matches!(f, TextFate::Untouched));
    if !touched {
        return Ok((block.to_vec(), 0));
    }

    let inverse = ctm.invert().unwrap_or_else(|| {
        warn!("degenerate CTM at text block; reconstructing in page coordinates");
        Matrix::identity()
    });

    let mut parts: Vec<BlockPart<'_>> = Vec::new();
    let mut removed = 0usize;
    let mut fate_iter = fates.into_iter();
    for op in block {
        match &op.kind {
            OperationKind::Text(show) => {
                let fate = fate_iter.next().unwrap_or(TextFate::Untouched);
                let kept = match fate {
                    TextFate::Untouched => vec![whole_op_segment(show)],
                    TextFate::AtomRemoved => {
                        removed += 1;
                        Vec::new()
                    },
                    TextFate::Segmented(segments) => {
                        removed += 1;
                        segments
                    },
                };
                parts.push(BlockPart::Text { show, kept });
            },
            OperationKind::TextState => {}, // folded into the reconstruction
            _ => parts.push(BlockPart::Passthrough(op)),
        }
    }

    Ok((rebuild_block(block[0].offset, &parts, &inverse), removed))
}

/// A single kept segment spanning an entire untouched operation, positioned
/// at the operation's own baseline origin so it does not drift.
fn whole_op_segment(show: &TextShow) -> TextSegment {
    let count = show.text.chars().count();
    TextSegment {
        start_index: 0,
        end_index: count,
        keep: true,
        start: Point::new(show.start.x, show.start.y),
        width: show.advances.iter().sum(),
        height: show.font_size,
        text: show.text.clone(),
    }
}
