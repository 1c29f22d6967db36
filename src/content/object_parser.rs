//! Operand parser for content streams.
//!
//! Combines lexer tokens into complete operand objects (arrays, inline-image
//! dictionaries, strings with escapes decoded). Operator words are not
//! operands; encountering one here is a parse error the caller handles by
//! dispatching the operator instead.

use crate::content::lexer::{
    Token, decode_hex_string, decode_literal_string_escapes, skip_whitespace_and_comments, token,
};
use crate::object::Object;
use indexmap::IndexMap;
use nom::IResult;
use nom::error::{Error as NomError, ErrorKind};

/// Parse a single operand object.
///
/// # Examples
///
/// ```
/// use redact_oxide::content::object_parser::parse_object;
/// use redact_oxide::object::Object;
///
/// let (_, obj) = parse_object(b"[(Hi) -120 (there)]").unwrap();
/// assert_eq!(obj.as_array().unwrap().len(), 3);
/// ```
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, tok) = token(input)?;
    object_from_token(rest, tok)
}

pub(crate) fn object_from_token<'a>(rest: &'a [u8], tok: Token<'a>) -> IResult<&'a [u8], Object> {
    match tok {
        Token::Integer(i) => Ok((rest, Object::Integer(i))),
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::LiteralString(raw) => {
            Ok((rest, Object::String(decode_literal_string_escapes(raw))))
        },
        Token::HexString(raw) => Ok((rest, Object::String(decode_hex_string(raw)))),
        Token::Name(n) => Ok((rest, Object::Name(n))),
        Token::ArrayOpen => parse_array_body(rest),
        Token::DictOpen => parse_dictionary_body(rest),
        Token::Word("true") => Ok((rest, Object::Boolean(true))),
        Token::Word("false") => Ok((rest, Object::Boolean(false))),
        Token::Word("null") => Ok((rest, Object::Null)),
        _ => Err(nom::Err::Error(NomError::new(rest, ErrorKind::Tag))),
    }
}

/// Parse array elements after the opening `[` up to the matching `]`.
fn parse_array_body(mut input: &[u8]) -> IResult<&[u8], Object> {
    let mut items = Vec::new();
    loop {
        let (rest, tok) = token(input)?;
        if tok == Token::ArrayClose {
            return Ok((rest, Object::Array(items)));
        }
        let (rest, obj) = object_from_token(rest, tok)?;
        items.push(obj);
        input = rest;
    }
}

/// Parse dictionary entries after the opening `<<` up to the matching `>>`.
///
/// Entries keep insertion order so inline-image parameter dictionaries
/// re-serialize with their original key sequence.
fn parse_dictionary_body(mut input: &[u8]) -> IResult<&[u8], Object> {
    let mut dict = IndexMap::new();
    loop {
        let (rest, tok) = token(input)?;
        match tok {
            Token::DictClose => return Ok((rest, Object::Dictionary(dict))),
            Token::Name(key) => {
                let (rest, value) = parse_object(rest)?;
                dict.insert(key, value);
                input = rest;
            },
            _ => return Err(nom::Err::Error(NomError::new(rest, ErrorKind::Tag))),
        }
    }
}

/// Parse the key/value entries of an inline-image parameter list.
///
/// Inline images write their parameters as bare `/Key value` pairs between
/// `BI` and `ID`, without `<< >>` brackets.
pub fn parse_inline_dict_entries(mut input: &[u8]) -> IResult<&[u8], IndexMap<String, Object>> {
    let mut dict = IndexMap::new();
    loop {
        let probe = skip_whitespace_and_comments(input);
        if probe.len() >= 2 && &probe[..2] == b"ID" {
            // Caller consumes ID and the sample data
            return Ok((probe, dict));
        }
        let (rest, tok) = token(input)?;
        match tok {
            Token::Name(key) => {
                let (rest, value) = parse_object(rest)?;
                dict.insert(key, value);
                input = rest;
            },
            _ => return Err(nom::Err::Error(NomError::new(rest, ErrorKind::Tag))),
        }
    }
}
