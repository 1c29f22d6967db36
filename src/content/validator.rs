//! Structural validation of serialized content streams.
//!
//! Runs after serialization, on the produced bytes, so it checks what will
//! actually be written into the page. A page that fails validation is
//! reverted; the orchestrator never emits a structurally invalid page.
//!
//! Checks:
//! 1. `BT`/`ET` counts are equal and never nested.
//! 2. `q`/`Q` balanced, with no `Q` before a matching `q`.
//! 3. Every text-showing operator is governed by some earlier `Tf`.
//! 4. Inline images are syntactically well-formed.
//! 5. No `Unknown` operator was lost (count matches the operation list).

use crate::content::lexer::{Token, is_whitespace, skip_whitespace_and_comments, token};
use crate::content::operators::{OperationKind, PdfOperation};
use crate::content::registry;
use crate::error::{Error, Result};

/// Count the operations a validated stream must retain as `Unknown`.
pub fn count_unknown(ops: &[PdfOperation]) -> usize {
    ops.iter()
        .filter(|op| matches!(op.kind, OperationKind::Unknown))
        .count()
}

/// Validate serialized content-stream bytes.
///
/// `expected_unknown` is the number of unknown operators the source
/// operation list carried; fewer in the output means one was dropped.
pub fn validate(data: &[u8], expected_unknown: usize) -> Result<()> {
    let mut input = data;
    let mut in_text = false;
    let mut bt_count = 0usize;
    let mut et_count = 0usize;
    let mut q_depth = 0usize;
    // Tf visibility respects q/Q save/restore
    let mut font_stack = vec![false];
    let mut unknown_seen = 0usize;

    loop {
        let trimmed = skip_whitespace_and_comments(input);
        if trimmed.is_empty() {
            break;
        }
        let offset = data.len() - trimmed.len();
        let (rest, tok) = token(trimmed).map_err(|_| {
            Error::ValidationFailure(format!("untokenizable byte at offset {}", offset))
        })?;
        input = rest;
        let Token::Word(word) = tok else {
            continue; // operand
        };
        match word {
            "BT" => {
                if in_text {
                    return Err(Error::ValidationFailure(format!(
                        "nested BT at offset {}",
                        offset
                    )));
                }
                in_text = true;
                bt_count += 1;
            },
            "ET" => {
                if !in_text {
                    return Err(Error::ValidationFailure(format!(
                        "ET without BT at offset {}",
                        offset
                    )));
                }
                in_text = false;
                et_count += 1;
            },
            "q" => {
                q_depth += 1;
                let current = *font_stack.last().unwrap_or(&false);
                font_stack.push(current);
            },
            "Q" => {
                if q_depth == 0 {
                    return Err(Error::ValidationFailure(format!(
                        "Q before q at offset {}",
                        offset
                    )));
                }
                q_depth -= 1;
                if font_stack.len() > 1 {
                    font_stack.pop();
                }
            },
            "Tf" => {
                if let Some(last) = font_stack.last_mut() {
                    *last = true;
                }
            },
            "Tj" | "TJ" | "'" | "\"" => {
                if !*font_stack.last().unwrap_or(&false) {
                    return Err(Error::ValidationFailure(format!(
                        "text shown without Tf at offset {}",
                        offset
                    )));
                }
            },
            "BI" => {
                input = validate_inline_image(input, offset)?;
            },
            "true" | "false" | "null" => {},
            _ => {
                if !registry::is_known(word) {
                    unknown_seen += 1;
                }
            },
        }
    }

    if bt_count != et_count {
        return Err(Error::ValidationFailure(format!(
            "unbalanced text blocks: {} BT vs {} ET",
            bt_count, et_count
        )));
    }
    if q_depth != 0 {
        return Err(Error::ValidationFailure(format!(
            "{} unrestored q",
            q_depth
        )));
    }
    if unknown_seen != expected_unknown {
        return Err(Error::ValidationFailure(format!(
            "unknown operator count changed: expected {}, found {}",
            expected_unknown, unknown_seen
        )));
    }
    Ok(())
}

/// Check an inline image body and return the input just past its `EI`.
fn validate_inline_image(mut input: &[u8], bi_offset: usize) -> Result<&[u8]> {
    // Parameter entries: /Name value pairs until ID
    loop {
        let trimmed = skip_whitespace_and_comments(input);
        if trimmed.len() >= 2 && &trimmed[..2] == b"ID" {
            input = &trimmed[2..];
            break;
        }
        let (rest, tok) = token(trimmed).map_err(|_| {
            Error::ValidationFailure(format!("malformed inline image after offset {}", bi_offset))
        })?;
        match tok {
            Token::Name(_) => {
                let (rest, _) =
                    crate::content::object_parser::parse_object(rest).map_err(|_| {
                        Error::ValidationFailure(format!(
                            "malformed inline image value after offset {}",
                            bi_offset
                        ))
                    })?;
                input = rest;
            },
            _ => {
                return Err(Error::ValidationFailure(format!(
                    "inline image dictionary expects names after offset {}",
                    bi_offset
                )));
            },
        }
    }
    if input.first().copied().is_some_and(is_whitespace) {
        input = &input[1..];
    }
    // Sample data runs until whitespace followed by EI
    let mut i = 0;
    if input.starts_with(b"EI") {
        return Ok(&input[2..]);
    }
    while i + 3 <= input.len() {
        if is_whitespace(input[i]) && &input[i + 1..i + 3] == b"EI" {
            return Ok(&input[i + 3..]);
        }
        i += 1;
    }
    Err(Error::ValidationFailure(format!(
        "inline image after offset {} has no EI",
        bi_offset
    )))
}
