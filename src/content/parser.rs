//! Content-stream parser.
//!
//! Parses raw content bytes into an ordered list of typed operations.
//! Content streams use a postfix notation where operands come before their
//! operator:
//!
//! ```text
//! BT
//!   /F1 12 Tf
//!   100 700 Td
//!   (Hello, World!) Tj
//! ET
//! ```
//!
//! The parser maintains the full graphics-state stack while walking the
//! stream so every text-showing operation can be stamped with its decoded
//! Unicode text, per-glyph advances and page user-space bounding box, and
//! every image invocation with its page-space footprint.
//!
//! Failure semantics: a byte sequence that cannot be tokenized aborts the
//! parse with the offending offset; the caller keeps the page unchanged.
//! Unbalanced `q`/`Q` or `BT`/`ET` are *not* errors here (many real-world
//! PDFs have them); the output validator decides what is acceptable.

use crate::cancel::CancelToken;
use crate::content::graphics_state::{GraphicsStateStack, Matrix};
use crate::content::lexer::{self, Token, skip_whitespace_and_comments, token};
use crate::content::object_parser::{object_from_token, parse_inline_dict_entries};
use crate::content::operators::{
    ImageData, ImageInvocation, OperationKind, PdfOperation, TextShow,
};
use crate::content::registry::{self, get_number};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::interfaces::CharacterMapDecoder;
use crate::object::Object;
use bytes::Bytes;
use log::{debug, trace};

/// Fraction of the effective font size above the baseline covered by a text
/// bounding box. The parser has no font metrics beyond advances, so boxes use
/// a fixed ascent/descent split; glyph-level decisions use the extractor's
/// own rectangles.
const TEXT_ASCENT: f64 = 0.8;
/// Fraction of the effective font size below the baseline.
const TEXT_DESCENT: f64 = 0.2;

/// Working state threaded through operator handlers.
pub struct ParserCtx<'a> {
    /// Graphics-state stack driven by `q`/`Q`
    pub states: GraphicsStateStack,
    /// Whether the parse position is inside a `BT … ET` block
    pub in_text: bool,
    /// Character-map decoder collaborator
    pub decoder: &'a dyn CharacterMapDecoder,
    /// Page user-space height, for coordinate-frame diagnostics
    pub page_height: f64,
}

impl ParserCtx<'_> {
    /// Build an operation stamped with the current text-block flag.
    pub(crate) fn op(
        &self,
        name: &str,
        operands: Vec<Object>,
        offset: usize,
        kind: OperationKind,
    ) -> PdfOperation {
        PdfOperation::new(name, operands, offset, self.in_text, kind)
    }

    /// Image invocation payload for a `Do` at the current CTM.
    pub(crate) fn image_invocation_for_xobject(&self, name: String) -> ImageInvocation {
        let ctm = self.states.current().ctm;
        ImageInvocation {
            data: ImageData::XObject { name },
            bbox: unit_square_bbox(&ctm),
            ctm,
        }
    }
}

/// Page-space footprint of the unit square under `ctm`.
fn unit_square_bbox(ctm: &Matrix) -> Rect {
    let corners = [
        ctm.transform_point(0.0, 0.0),
        ctm.transform_point(1.0, 0.0),
        ctm.transform_point(0.0, 1.0),
        ctm.transform_point(1.0, 1.0),
    ];
    Rect::bounding(&corners).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
}

/// Content-stream parser for one page.
pub struct ContentParser<'a> {
    decoder: &'a dyn CharacterMapDecoder,
    page_height: f64,
}

impl<'a> ContentParser<'a> {
    /// Create a parser for a page of the given user-space height.
    pub fn new(decoder: &'a dyn CharacterMapDecoder, page_height: f64) -> Self {
        Self {
            decoder,
            page_height,
        }
    }

    /// Parse a content stream into its operation list.
    ///
    /// The returned list is totally ordered by byte offset. Unknown operators
    /// are retained verbatim. Trailing operands without an operator are
    /// dropped with a debug log, matching viewer behavior.
    pub fn parse(&self, data: &[u8], cancel: &CancelToken) -> Result<Vec<PdfOperation>> {
        let mut ctx = ParserCtx {
            states: GraphicsStateStack::new(),
            in_text: false,
            decoder: self.decoder,
            page_height: self.page_height,
        };
        let mut ops: Vec<PdfOperation> = Vec::new();
        let mut operands: Vec<Object> = Vec::new();
        let mut op_offset: Option<usize> = None;
        let mut input = data;

        loop {
            cancel.check()?;
            let trimmed = skip_whitespace_and_comments(input);
            if trimmed.is_empty() {
                break;
            }
            let pos = data.len() - trimmed.len();
            let (rest, tok) = token(trimmed).map_err(|_| malformed(pos, "unrecognized token"))?;
            match tok {
                Token::Word(word) => {
                    match word {
                        // Keyword operands, not operators
                        "true" | "false" | "null" => {
                            if op_offset.is_none() {
                                op_offset = Some(pos);
                            }
                            operands.push(match word {
                                "true" => Object::Boolean(true),
                                "false" => Object::Boolean(false),
                                _ => Object::Null,
                            });
                            input = rest;
                        },
                        "BI" => {
                            let offset = op_offset.take().unwrap_or(pos);
                            if !operands.is_empty() {
                                debug!(
                                    "dropping {} stray operand(s) before BI at byte {}",
                                    operands.len(),
                                    offset
                                );
                                operands.clear();
                            }
                            let (next, op) = parse_inline_image(&mut ctx, rest, offset)?;
                            ops.push(op);
                            input = next;
                        },
                        _ => {
                            let offset = op_offset.take().unwrap_or(pos);
                            let taken = std::mem::take(&mut operands);
                            let op = match registry::lookup(word) {
                                Some(handler) => handler(&mut ctx, word, taken, offset),
                                None => {
                                    trace!("unknown operator {:?} at byte {}", word, offset);
                                    ctx.op(word, taken, offset, OperationKind::Unknown)
                                },
                            };
                            self.diagnose_bbox(&op);
                            ops.push(op);
                            input = rest;
                        },
                    }
                },
                other => {
                    if op_offset.is_none() {
                        op_offset = Some(pos);
                    }
                    let (rest, obj) = object_from_token(rest, other)
                        .map_err(|_| malformed(pos, "malformed operand"))?;
                    operands.push(obj);
                    input = rest;
                },
            }
        }

        if !operands.is_empty() {
            debug!(
                "content stream ends with {} operand(s) and no operator",
                operands.len()
            );
        }
        Ok(ops)
    }

    /// Log text operations whose box falls far outside the page's vertical
    /// range; that usually means the stream and the extractor disagree about
    /// the coordinate frame.
    fn diagnose_bbox(&self, op: &PdfOperation) {
        if let Some(show) = op.as_text() {
            let limit = self.page_height * 2.0;
            if self.page_height > 0.0 && (show.bbox.bottom > limit || show.bbox.top < -limit) {
                trace!(
                    "text bbox {:?} far outside page height {} at byte {}",
                    show.bbox, self.page_height, op.offset
                );
            }
        }
    }
}

fn malformed(offset: usize, reason: &str) -> Error {
    Error::MalformedContentStream {
        offset,
        reason: reason.to_string(),
    }
}

/// Handler for the text-showing family: `Tj`, `TJ`, `'`, `"`.
///
/// Consumes the operand, decodes its bytes to Unicode through the
/// character-map decoder, advances the text matrix by the shown width, and
/// emits a `Text` operation carrying decoded text, effective font size,
/// per-glyph advances and the page-space bounding box.
pub(crate) fn show_text_op(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    // ' moves to the next line before showing; " additionally sets word and
    // character spacing from its first two operands.
    match name {
        "'" => next_line(ctx),
        "\"" => {
            let state = ctx.states.current_mut();
            state.word_space = get_number(&operands, 0).unwrap_or(state.word_space);
            state.char_space = get_number(&operands, 1).unwrap_or(state.char_space);
            next_line(ctx);
        },
        _ => {},
    }

    let state = ctx.states.current();
    let font = state.font_name.clone().unwrap_or_default();
    let tf_size = state.font_size;
    let char_space = state.char_space;
    let word_space = state.word_space;
    let hs_pct = state.horizontal_scaling;
    let hs = hs_pct / 100.0;
    let rise = state.text_rise;
    let render_mode = state.render_mode;
    let ctm = state.ctm;
    let tm0 = state.text_matrix;

    // Effective font size: nominal Tf size scaled by the text matrix. A
    // nominal `/F 1 Tf` with a `12 0 0 12 … Tm` shows 12pt glyphs.
    let eff_size = tf_size * tm0.x_scale();
    let page_scale = tm0.multiply(&ctm).x_scale();

    let mut text = String::new();
    let mut advances: Vec<f64> = Vec::new();
    let mut tm = tm0;
    let mut first_glyph_tm: Option<Matrix> = None;

    let string_operand_index = if name == "\"" { 2 } else { 0 };
    let elements: Vec<Object> = if name == "TJ" {
        operands
            .first()
            .and_then(|o| o.as_array())
            .cloned()
            .unwrap_or_default()
    } else {
        operands
            .get(string_operand_index)
            .cloned()
            .map(|o| vec![o])
            .unwrap_or_default()
    };

    for element in &elements {
        match element {
            Object::String(bytes) => {
                for (codepoint, width) in ctx.decoder.decode(&font, bytes) {
                    if first_glyph_tm.is_none() {
                        first_glyph_tm = Some(tm);
                    }
                    let adv = (width / 1000.0 * tf_size
                        + char_space
                        + if codepoint == ' ' { word_space } else { 0.0 })
                        * hs;
                    text.push(codepoint);
                    advances.push(adv * page_scale);
                    tm = Matrix::translation(adv, 0.0).multiply(&tm);
                }
            },
            Object::Integer(_) | Object::Real(_) => {
                // TJ positioning adjustment, in thousandths of text space
                let n = element.as_number().unwrap_or(0.0);
                let tx = -n / 1000.0 * tf_size * hs;
                tm = Matrix::translation(tx, 0.0).multiply(&tm);
                if let Some(last) = advances.last_mut() {
                    *last += tx * page_scale;
                }
            },
            _ => {},
        }
    }

    let start_tm = first_glyph_tm.unwrap_or(tm0);
    let trm_start = start_tm.multiply(&ctm);
    let trm_end = tm.multiply(&ctm);
    let start = trm_start.transform_point(0.0, rise);
    let y_low = rise - TEXT_DESCENT * tf_size;
    let y_high = rise + TEXT_ASCENT * tf_size;
    let corners = [
        trm_start.transform_point(0.0, y_low),
        trm_start.transform_point(0.0, y_high),
        trm_end.transform_point(0.0, y_low),
        trm_end.transform_point(0.0, y_high),
    ];
    let bbox = Rect::bounding(&corners).unwrap_or(Rect::new(start.x, start.y, start.x, start.y));

    ctx.states.current_mut().text_matrix = tm;

    let show = TextShow {
        text,
        font,
        font_size: eff_size,
        advances,
        bbox,
        start,
        char_space,
        word_space,
        horizontal_scaling: hs_pct,
        rise,
        render_mode,
    };
    ctx.op(name, operands, offset, OperationKind::Text(show))
}

fn next_line(ctx: &mut ParserCtx<'_>) {
    let state = ctx.states.current_mut();
    let leading = state.leading;
    state.text_line_matrix = Matrix::translation(0.0, -leading).multiply(&state.text_line_matrix);
    state.text_matrix = state.text_line_matrix;
}

/// Parse an inline image sequence (`BI … ID … EI`) as one atomic operation.
///
/// The parameter dictionary between `BI` and `ID` is parsed normally; the
/// body from `ID` through `EI` is captured verbatim. Per ISO 32000-1 §8.9.7,
/// `EI` must be preceded by whitespace and followed by whitespace, a
/// delimiter, or end of stream, because the bytes `EI` may legitimately occur
/// inside the sample data.
fn parse_inline_image<'a>(
    ctx: &mut ParserCtx<'_>,
    input: &'a [u8],
    offset: usize,
) -> Result<(&'a [u8], PdfOperation)> {
    let (at_id, dict) = parse_inline_dict_entries(input)
        .map_err(|_| malformed(offset, "malformed inline image dictionary"))?;

    // Consume "ID" and the single whitespace byte that separates it from the
    // sample data.
    let mut body = &at_id[2..];
    if body.first().copied().is_some_and(lexer::is_whitespace) {
        body = &body[1..];
    }

    let end = find_ei(body).ok_or_else(|| malformed(offset, "inline image without EI"))?;
    let data = Bytes::copy_from_slice(&body[..end.data_len]);
    let rest = &body[end.after_ei..];

    let ctm = ctx.states.current().ctm;
    let invocation = ImageInvocation {
        data: ImageData::Inline { dict, data },
        bbox: unit_square_bbox(&ctm),
        ctm,
    };
    Ok((rest, ctx.op("BI", Vec::new(), offset, OperationKind::Image(invocation))))
}

struct EiPosition {
    /// Length of the sample data (excludes the whitespace before EI)
    data_len: usize,
    /// Offset just past the EI keyword
    after_ei: usize,
}

/// Locate the terminating `EI` of an inline image body.
fn find_ei(body: &[u8]) -> Option<EiPosition> {
    // Degenerate: zero-length sample data, EI immediately after ID
    if body.starts_with(b"EI")
        && (body.len() == 2 || lexer::is_whitespace(body[2]) || lexer::is_delimiter(body[2]))
    {
        return Some(EiPosition {
            data_len: 0,
            after_ei: 2,
        });
    }
    let mut i = 0;
    while i + 3 <= body.len() {
        if lexer::is_whitespace(body[i])
            && &body[i + 1..i + 3] == b"EI"
            && (body.len() == i + 3
                || lexer::is_whitespace(body[i + 3])
                || lexer::is_delimiter(body[i + 3]))
        {
            return Some(EiPosition {
                data_len: i,
                after_ei: i + 3,
            });
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::CharacterMapDecoder;

    /// One byte per character, 500/1000 em wide. Matches the mock the
    /// integration tests use.
    struct AsciiDecoder;

    impl CharacterMapDecoder for AsciiDecoder {
        fn decode(&self, _font: &str, bytes: &[u8]) -> Vec<(char, f64)> {
            bytes.iter().map(|&b| (b as char, 500.0)).collect()
        }
    }

    fn parse(stream: &[u8]) -> Vec<PdfOperation> {
        ContentParser::new(&AsciiDecoder, 792.0)
            .parse(stream, &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn test_parse_simple_text() {
        let ops = parse(b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET");
        assert_eq!(ops.len(), 5);
        assert_eq!(ops[0].name, "BT");
        assert_eq!(ops[1].name, "Tf");
        assert_eq!(ops[2].name, "Td");
        assert_eq!(ops[3].name, "Tj");
        assert_eq!(ops[4].name, "ET");
        assert!(ops.iter().all(|op| op.inside_text_block));

        let show = ops[3].as_text().unwrap();
        assert_eq!(show.text, "Hello");
        assert_eq!(show.advances.len(), 5);
        assert_eq!(show.font_size, 12.0);
        assert_eq!(show.start.x, 100.0);
        assert_eq!(show.start.y, 700.0);
        // 5 glyphs at 500/1000 em of 12pt
        assert!((show.advances.iter().sum::<f64>() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_effective_size_folded_in_tm() {
        let ops = parse(b"BT /F1 1 Tf 12 0 0 12 72 700 Tm (Hi) Tj ET");
        let show = ops[3].as_text().unwrap();
        assert_eq!(show.font_size, 12.0);
        assert!((show.advances[0] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_tj_array_adjustments() {
        let ops = parse(b"BT /F1 10 Tf [(AB) -200 (C)] TJ ET");
        let show = ops[2].as_text().unwrap();
        assert_eq!(show.text, "ABC");
        assert_eq!(show.advances.len(), 3);
        // B's advance carries the -200/1000 * 10 = +2pt adjustment
        assert!((show.advances[1] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_operator_moves_line() {
        let ops = parse(b"BT /F1 10 Tf 14 TL 0 100 Td (a) Tj (b) ' ET");
        let first = ops[4].as_text().unwrap();
        let second = ops[5].as_text().unwrap();
        assert_eq!(second.text, "b");
        assert!((second.start.y - (first.start.y - 14.0)).abs() < 1e-9);
        assert_eq!(second.start.x, 0.0);
    }

    #[test]
    fn test_double_quote_sets_spacing() {
        let ops = parse(b"BT /F1 10 Tf 2 1 (ab) \" ET");
        let show = ops[2].as_text().unwrap();
        assert_eq!(show.word_space, 2.0);
        assert_eq!(show.char_space, 1.0);
    }

    #[test]
    fn test_invisible_text_still_emits_characters() {
        let ops = parse(b"BT /F1 12 Tf 3 Tr (ghost) Tj ET");
        let show = ops[3].as_text().unwrap();
        assert_eq!(show.render_mode, 3);
        assert_eq!(show.text, "ghost");
    }

    #[test]
    fn test_cm_composes_with_text() {
        let ops = parse(b"q 2 0 0 2 0 0 cm BT /F1 12 Tf 10 10 Td (A) Tj ET Q");
        let show = ops[5].as_text().unwrap();
        // Td position doubled by the outer cm
        assert_eq!(show.start.x, 20.0);
        assert_eq!(show.start.y, 20.0);
        assert_eq!(show.font_size, 12.0); // effective size ignores CTM
        assert!((show.advances[0] - 12.0).abs() < 1e-9); // page advance doubled
    }

    #[test]
    fn test_graphics_state_ops_kinds() {
        let ops = parse(b"q 1 0 0 rg 100 200 m 150 250 l 10 10 50 50 re S Q");
        assert!(matches!(ops[0].kind, OperationKind::GraphicsState));
        assert!(matches!(ops[1].kind, OperationKind::GraphicsState));
        assert!(matches!(ops[2].kind, OperationKind::PathConstruction));
        assert!(matches!(ops[4].kind, OperationKind::PathConstruction));
        assert!(matches!(ops[5].kind, OperationKind::PathPainting));
    }

    #[test]
    fn test_do_records_footprint() {
        let ops = parse(b"q 200 0 0 100 50 60 cm /Im1 Do Q");
        let image = ops[2].as_image().unwrap();
        assert_eq!(image.bbox, Rect::new(50.0, 60.0, 250.0, 160.0));
        assert!(matches!(&image.data, ImageData::XObject { name } if name == "Im1"));
    }

    #[test]
    fn test_inline_image_atomic() {
        let stream = b"q 4 0 0 2 10 10 cm BI /W 4 /H 2 /BPC 8 /CS /G ID \x01\x02\x03\x04\x05\x06\x07\x08 EI Q";
        let ops = parse(stream);
        assert_eq!(ops.len(), 4);
        let image = ops[2].as_image().unwrap();
        match &image.data {
            ImageData::Inline { dict, data } => {
                assert_eq!(dict.get("W").and_then(|o| o.as_integer()), Some(4));
                assert_eq!(data.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8]);
            },
            _ => panic!("expected inline image"),
        }
        assert_eq!(image.bbox, Rect::new(10.0, 10.0, 14.0, 12.0));
    }

    #[test]
    fn test_unknown_operator_retained() {
        let ops = parse(b"1 2 xyzzy (x) Tj");
        assert_eq!(ops[0].name, "xyzzy");
        assert!(matches!(ops[0].kind, OperationKind::Unknown));
        assert_eq!(ops[0].operands.len(), 2);
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let ops = parse(b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET  q Q");
        let offsets: Vec<usize> = ops.iter().map(|op| op.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn test_malformed_stream_reports_offset() {
        let err = ContentParser::new(&AsciiDecoder, 792.0)
            .parse(b"BT (unterminated Tj ET", &CancelToken::new())
            .unwrap_err();
        match err {
            Error::MalformedContentStream { offset, .. } => assert_eq!(offset, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_aborts() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = ContentParser::new(&AsciiDecoder, 792.0)
            .parse(b"BT ET", &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_empty_stream() {
        assert!(parse(b"").is_empty());
        assert!(parse(b"   \n\t  ").is_empty());
    }
}
