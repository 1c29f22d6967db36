//! Content-stream lexer (tokenizer).
//!
//! This module provides low-level tokenization of PDF content-stream bytes.
//! It recognizes all token types that can appear between operators: numbers,
//! literal and hexadecimal strings, names, array and dictionary delimiters,
//! and bare words (operators and the `true`/`false`/`null` keywords).
//!
//! # Content-stream syntax
//!
//! Content streams use a postfix notation where operands precede their
//! operator:
//! - Numbers: integers (42, -123) and reals (3.14, -.5, 4.)
//! - Strings: literal (`(Hello)`) with balanced parens and backslash/octal
//!   escapes, and hexadecimal (`<48656C6C6F>`)
//! - Names: identifiers starting with `/`, with `#HH` escapes
//! - Words: operator names (`Tj`, `re`, `f*`, `'`, `"`) and keywords
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (`%` to end of line)
//! separate tokens and are skipped.

use nom::IResult;
use nom::error::{Error as NomError, ErrorKind};

/// Token types recognized by the content-stream lexer.
///
/// String tokens hold raw bytes; escape decoding happens at the object layer
/// so the lexer never allocates for the common pass-through case.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),
    /// Real (floating-point) number (e.g., 3.14, -.5)
    Real(f64),
    /// Literal string bytes (content of `(…)`, escapes NOT decoded)
    LiteralString(&'a [u8]),
    /// Hexadecimal string bytes (content of `<…>`, not yet paired)
    HexString(&'a [u8]),
    /// Name (without the leading `/`, `#HH` escapes decoded)
    Name(String),
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// `<<`
    DictOpen,
    /// `>>`
    DictClose,
    /// Bare word: an operator name or the keywords `true`/`false`/`null`
    Word(&'a str),
}

/// Check if a byte is PDF whitespace.
pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\0' | b'\x0C')
}

/// Check if a byte is a PDF delimiter.
pub fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Check if a byte is a regular character (neither whitespace nor delimiter).
pub fn is_regular(byte: u8) -> bool {
    !is_whitespace(byte) && !is_delimiter(byte)
}

/// Check if a byte can start an operator word.
///
/// Operators start with alphabetic characters or the special characters of
/// the `'`, `"` and `T*` family.
pub fn is_word_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'\'' | b'"')
}

/// Skip whitespace and `%` comments, returning the remaining input.
pub fn skip_whitespace_and_comments(mut input: &[u8]) -> &[u8] {
    loop {
        let before = input.len();
        while let Some(&b) = input.first() {
            if is_whitespace(b) {
                input = &input[1..];
            } else {
                break;
            }
        }
        if input.first() == Some(&b'%') {
            while let Some(&b) = input.first() {
                input = &input[1..];
                if b == b'\n' || b == b'\r' {
                    break;
                }
            }
        }
        if input.len() == before {
            return input;
        }
    }
}

fn lex_error<T>(input: &[u8]) -> IResult<&[u8], T> {
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)))
}

/// Lex a number token.
///
/// Accepts the PDF forms `42`, `-17`, `3.14`, `.5`, `4.`, `+2`. Integers that
/// do not fit `i64` fall back to `Real`.
fn number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let mut pos = 0;
    if matches!(input.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }
    let int_start = pos;
    while pos < input.len() && input[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut is_real = false;
    if input.get(pos) == Some(&b'.') {
        is_real = true;
        pos += 1;
        while pos < input.len() && input[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    // At least one digit somewhere
    if pos == int_start || !input[..pos].iter().any(|b| b.is_ascii_digit()) {
        return lex_error(input);
    }
    let text = std::str::from_utf8(&input[..pos])
        .map_err(|_| nom::Err::Error(NomError::new(input, ErrorKind::Char)))?;
    let token = if is_real {
        Token::Real(text.parse::<f64>().unwrap_or(0.0))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Token::Integer(i),
            Err(_) => Token::Real(text.parse::<f64>().unwrap_or(0.0)),
        }
    };
    Ok((&input[pos..], token))
}

/// Lex a literal string token: `(…)` with balanced parens.
///
/// A backslash escapes the following byte, so `\(` and `\)` do not affect
/// balancing. Returns the raw inner bytes.
fn literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.first() != Some(&b'(') {
        return lex_error(input);
    }
    let mut depth = 1usize;
    let mut pos = 1;
    while pos < input.len() {
        match input[pos] {
            b'\\' => pos += 1, // skip escaped byte
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], Token::LiteralString(&input[1..pos])));
                }
            },
            _ => {},
        }
        pos += 1;
    }
    lex_error(input)
}

/// Lex a hexadecimal string token: `<…>`.
fn hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.first() != Some(&b'<') {
        return lex_error(input);
    }
    let mut pos = 1;
    while pos < input.len() {
        if input[pos] == b'>' {
            return Ok((&input[pos + 1..], Token::HexString(&input[1..pos])));
        }
        pos += 1;
    }
    lex_error(input)
}

/// Lex a name token: `/…` with `#HH` escape decoding.
fn name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.first() != Some(&b'/') {
        return lex_error(input);
    }
    let mut pos = 1;
    while pos < input.len() && is_regular(input[pos]) {
        pos += 1;
    }
    let raw = &input[1..pos];
    Ok((&input[pos..], Token::Name(decode_name_escapes(raw))))
}

/// Decode `#HH` escape sequences in a name per ISO 32000-1 §7.3.5.
///
/// # Examples
///
/// ```
/// use redact_oxide::content::lexer::decode_name_escapes;
///
/// assert_eq!(decode_name_escapes(b"A#20B"), "A B");
/// assert_eq!(decode_name_escapes(b"Im1"), "Im1");
/// ```
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' {
            if let Some(hex) = raw.get(i + 1..i + 3) {
                if let Ok(byte) = u8::from_str_radix(&String::from_utf8_lossy(hex), 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decode the raw bytes of a hex string into its byte content.
///
/// Whitespace inside the brackets is ignored; an odd final digit is padded
/// with zero per the PDF specification.
pub fn decode_hex_string(raw: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| b.is_ascii_hexdigit())
        .collect();
    let mut out = Vec::with_capacity(digits.len() / 2 + 1);
    for pair in digits.chunks(2) {
        let hi = (pair[0] as char).to_digit(16).unwrap_or(0) as u8;
        let lo = if pair.len() == 2 {
            (pair[1] as char).to_digit(16).unwrap_or(0) as u8
        } else {
            0
        };
        out.push(hi << 4 | lo);
    }
    out
}

/// Decode escape sequences in a literal string per ISO 32000-1 §7.3.4.2.
///
/// Handles `\n \r \t \b \f \( \) \\`, octal `\ddd` (1-3 digits), and the
/// line-continuation `\<newline>` (ignored). Unknown escapes drop the
/// backslash and keep the byte.
///
/// # Examples
///
/// ```
/// use redact_oxide::content::lexer::decode_literal_string_escapes;
///
/// assert_eq!(decode_literal_string_escapes(br"a\(b\)c"), b"a(b)c");
/// assert_eq!(decode_literal_string_escapes(br"\101"), b"A");
/// ```
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        match raw[i + 1] {
            b'n' => {
                out.push(b'\n');
                i += 2;
            },
            b'r' => {
                out.push(b'\r');
                i += 2;
            },
            b't' => {
                out.push(b'\t');
                i += 2;
            },
            b'b' => {
                out.push(0x08);
                i += 2;
            },
            b'f' => {
                out.push(0x0C);
                i += 2;
            },
            b'(' | b')' | b'\\' => {
                out.push(raw[i + 1]);
                i += 2;
            },
            b'\n' => i += 2,
            b'\r' => {
                i += 2;
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 3 {
                    match raw.get(i + 1 + digits) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            digits += 1;
                        },
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
                i += 1 + digits;
            },
            other => {
                out.push(other);
                i += 2;
            },
        }
    }
    out
}

/// Lex one token, skipping leading whitespace and comments.
///
/// Fails on empty input or on a byte that cannot start any token.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let input = skip_whitespace_and_comments(input);
    let Some(&first) = input.first() else {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Eof)));
    };
    match first {
        b'(' => literal_string(input),
        b'/' => name(input),
        b'[' => Ok((&input[1..], Token::ArrayOpen)),
        b']' => Ok((&input[1..], Token::ArrayClose)),
        b'<' => {
            if input.get(1) == Some(&b'<') {
                Ok((&input[2..], Token::DictOpen))
            } else {
                hex_string(input)
            }
        },
        b'>' => {
            if input.get(1) == Some(&b'>') {
                Ok((&input[2..], Token::DictClose))
            } else {
                lex_error(input)
            }
        },
        b'+' | b'-' | b'.' | b'0'..=b'9' => number(input),
        _ if is_word_start(first) => {
            let mut pos = 1;
            while pos < input.len()
                && (input[pos].is_ascii_alphanumeric() || matches!(input[pos], b'*' | b'\'' | b'"'))
            {
                pos += 1;
            }
            let word = std::str::from_utf8(&input[..pos])
                .map_err(|_| nom::Err::Error(NomError::new(input, ErrorKind::Char)))?;
            Ok((&input[pos..], Token::Word(word)))
        },
        _ => lex_error(input),
    }
}
