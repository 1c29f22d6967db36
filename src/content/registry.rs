//! Operator registry.
//!
//! A table keyed by operator name. Each handler receives the parser context
//! and the decoded operand list, mutates the graphics/text state per the PDF
//! specification, and returns the typed operation for emission. Unknown
//! operators are not an error; the parser forwards them verbatim so the
//! serializer can reproduce them byte-faithfully.

use crate::content::graphics_state::Matrix;
use crate::content::operators::{OperationKind, PdfOperation};
use crate::content::parser::{ParserCtx, show_text_op};
use crate::object::Object;

/// An operator handler: mutates parser state and returns the emitted
/// operation.
pub type Handler = fn(&mut ParserCtx<'_>, &str, Vec<Object>, usize) -> PdfOperation;

/// Look up the handler for an operator name.
///
/// Returns `None` for operators the registry does not know; the parser emits
/// those as `Unknown` with their operands retained.
pub fn lookup(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        // Graphics state
        "q" => handle_save,
        "Q" => handle_restore,
        "cm" => handle_cm,
        // Pass-through graphics settings: colors, line style, ExtGState,
        // shading, marked content. The editors never move these, so tracking
        // their values is unnecessary; operands round-trip verbatim.
        "gs" | "cs" | "CS" | "sc" | "SC" | "scn" | "SCN" | "g" | "G" | "rg" | "RG" | "k"
        | "K" | "w" | "J" | "j" | "M" | "d" | "ri" | "i" | "sh" | "BMC" | "BDC" | "EMC"
        | "MP" | "DP" => handle_graphics_passthrough,

        // Text object and text state
        "BT" => handle_begin_text,
        "ET" => handle_end_text,
        "Tf" => handle_tf,
        "Td" => handle_td,
        "TD" => handle_td_with_leading,
        "Tm" => handle_tm,
        "T*" => handle_next_line,
        "Tc" => handle_tc,
        "Tw" => handle_tw,
        "Tz" => handle_tz,
        "TL" => handle_tl,
        "Ts" => handle_ts,
        "Tr" => handle_tr,

        // Text showing
        "Tj" | "TJ" | "'" | "\"" => show_text_op,

        // Path construction (W/W* mark the pending path as a clip path and
        // must stay grouped with it)
        "m" | "l" | "c" | "v" | "y" | "re" | "h" | "W" | "W*" => handle_path_construction,

        // Path painting
        "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => handle_path_painting,

        // XObject invocation
        "Do" => handle_do,

        _ => return None,
    };
    Some(handler)
}

/// Whether the serializer/validator should treat `name` as a known operator.
///
/// Covers everything `lookup` dispatches plus the inline-image framing
/// keywords the parser consumes itself.
pub fn is_known(name: &str) -> bool {
    lookup(name).is_some() || matches!(name, "BI" | "ID" | "EI" | "true" | "false" | "null")
}

// Operand access helpers

pub(crate) fn get_number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|obj| obj.as_number())
}

pub(crate) fn get_name(operands: &[Object], index: usize) -> Option<&str> {
    operands.get(index).and_then(|obj| obj.as_name())
}

fn handle_save(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.save();
    ctx.op(name, operands, offset, OperationKind::GraphicsState)
}

fn handle_restore(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.restore();
    ctx.op(name, operands, offset, OperationKind::GraphicsState)
}

fn handle_cm(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let m = matrix_from_operands(&operands);
    let state = ctx.states.current_mut();
    state.ctm = m.multiply(&state.ctm);
    ctx.op(name, operands, offset, OperationKind::GraphicsState)
}

fn handle_graphics_passthrough(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.op(name, operands, offset, OperationKind::GraphicsState)
}

fn handle_begin_text(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.in_text = true;
    let state = ctx.states.current_mut();
    state.text_matrix = Matrix::identity();
    state.text_line_matrix = Matrix::identity();
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_end_text(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    // ET itself still belongs to the block
    let op = ctx.op(name, operands, offset, OperationKind::TextState);
    ctx.in_text = false;
    op
}

fn handle_tf(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let state = ctx.states.current_mut();
    state.font_name = get_name(&operands, 0).map(|s| s.to_string());
    state.font_size = get_number(&operands, 1).unwrap_or(0.0);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_td(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let tx = get_number(&operands, 0).unwrap_or(0.0);
    let ty = get_number(&operands, 1).unwrap_or(0.0);
    let state = ctx.states.current_mut();
    state.text_line_matrix = Matrix::translation(tx, ty).multiply(&state.text_line_matrix);
    state.text_matrix = state.text_line_matrix;
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_td_with_leading(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let ty = get_number(&operands, 1).unwrap_or(0.0);
    ctx.states.current_mut().leading = -ty;
    handle_td(ctx, name, operands, offset)
}

fn handle_tm(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let m = matrix_from_operands(&operands);
    let state = ctx.states.current_mut();
    state.text_matrix = m;
    state.text_line_matrix = m;
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_next_line(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let state = ctx.states.current_mut();
    let leading = state.leading;
    state.text_line_matrix = Matrix::translation(0.0, -leading).multiply(&state.text_line_matrix);
    state.text_matrix = state.text_line_matrix;
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_tc(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.current_mut().char_space = get_number(&operands, 0).unwrap_or(0.0);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_tw(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.current_mut().word_space = get_number(&operands, 0).unwrap_or(0.0);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_tz(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.current_mut().horizontal_scaling = get_number(&operands, 0).unwrap_or(100.0);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_tl(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.current_mut().leading = get_number(&operands, 0).unwrap_or(0.0);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_ts(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.states.current_mut().text_rise = get_number(&operands, 0).unwrap_or(0.0);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_tr(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let mode = get_number(&operands, 0).unwrap_or(0.0) as u8;
    ctx.states.current_mut().render_mode = mode.min(7);
    ctx.op(name, operands, offset, OperationKind::TextState)
}

fn handle_path_construction(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.op(name, operands, offset, OperationKind::PathConstruction)
}

fn handle_path_painting(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    ctx.op(name, operands, offset, OperationKind::PathPainting)
}

fn handle_do(
    ctx: &mut ParserCtx<'_>,
    name: &str,
    operands: Vec<Object>,
    offset: usize,
) -> PdfOperation {
    let resource = get_name(&operands, 0).unwrap_or("").to_string();
    let invocation = ctx.image_invocation_for_xobject(resource);
    ctx.op(name, operands, offset, OperationKind::Image(invocation))
}

pub(crate) fn matrix_from_operands(operands: &[Object]) -> Matrix {
    Matrix::from_operands(
        get_number(operands, 0).unwrap_or(1.0),
        get_number(operands, 1).unwrap_or(0.0),
        get_number(operands, 2).unwrap_or(0.0),
        get_number(operands, 3).unwrap_or(1.0),
        get_number(operands, 4).unwrap_or(0.0),
        get_number(operands, 5).unwrap_or(0.0),
    )
}
