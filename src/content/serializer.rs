//! Content-stream serializer.
//!
//! Turns an operation list back into bytes. The output must parse losslessly
//! back to the same operation list, so formatting follows strict rules:
//!
//! - Numbers: decimal, no locale, integers without a decimal point, reals
//!   with up to six fraction digits and trailing zeros trimmed.
//! - Strings: balanced-parens literal form, switching to hex when the
//!   content is mostly non-printable.
//! - Names: bytes outside `!..~` and all delimiter bytes escaped as `#HH`.
//! - One operator per line.

use crate::content::operators::{ImageData, OperationKind, PdfOperation};
use crate::object::Object;

/// Share of non-printable bytes beyond which a string serializes as hex.
const HEX_STRING_THRESHOLD: f64 = 0.25;

/// Serialize an operation list to content-stream bytes.
pub fn serialize_operations(ops: &[PdfOperation]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in ops {
        write_operation(&mut out, op);
    }
    out
}

fn write_operation(out: &mut Vec<u8>, op: &PdfOperation) {
    if let OperationKind::Image(image) = &op.kind {
        if let ImageData::Inline { dict, data } = &image.data {
            out.extend_from_slice(b"BI");
            for (key, value) in dict {
                out.push(b' ');
                write_name(out, key);
                out.push(b' ');
                write_object(out, value);
            }
            out.extend_from_slice(b" ID\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nEI\n");
            return;
        }
    }
    for operand in &op.operands {
        write_object(out, operand);
        out.push(b' ');
    }
    out.extend_from_slice(op.name.as_bytes());
    out.push(b'\n');
}

/// Write one operand object.
pub fn write_object(out: &mut Vec<u8>, obj: &Object) {
    match obj {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(true) => out.extend_from_slice(b"true"),
        Object::Boolean(false) => out.extend_from_slice(b"false"),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => out.extend_from_slice(format_number(*r).as_bytes()),
        Object::String(bytes) => write_string(out, bytes),
        Object::Name(name) => write_name(out, name),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item);
            }
            out.push(b']');
        },
        Object::Dictionary(dict) => {
            out.extend_from_slice(b"<<");
            for (key, value) in dict {
                out.push(b' ');
                write_name(out, key);
                out.push(b' ');
                write_object(out, value);
            }
            out.extend_from_slice(b" >>");
        },
    }
}

/// Format a number per the serializer rules.
///
/// # Examples
///
/// ```
/// use redact_oxide::content::serializer::format_number;
///
/// assert_eq!(format_number(12.0), "12");
/// assert_eq!(format_number(0.5), "0.5");
/// assert_eq!(format_number(1.1234567), "1.123457");
/// assert_eq!(format_number(-0.0), "0");
/// ```
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let i = n as i64;
        // Avoid "-0"
        return if i == 0 { "0".to_string() } else { i.to_string() };
    }
    let mut s = format!("{:.6}", n);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

/// Write a string operand, choosing literal or hex form.
fn write_string(out: &mut Vec<u8>, bytes: &[u8]) {
    let non_printable = bytes
        .iter()
        .filter(|&&b| !(0x20..=0x7E).contains(&b))
        .count();
    let use_hex =
        !bytes.is_empty() && (non_printable as f64 / bytes.len() as f64) > HEX_STRING_THRESHOLD;
    if use_hex {
        out.push(b'<');
        for b in bytes {
            out.extend_from_slice(format!("{:02X}", b).as_bytes());
        }
        out.push(b'>');
    } else {
        out.push(b'(');
        for &b in bytes {
            match b {
                b'(' | b')' | b'\\' => {
                    out.push(b'\\');
                    out.push(b);
                },
                0x20..=0x7E => out.push(b),
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                b'\t' => out.extend_from_slice(b"\\t"),
                _ => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
            }
        }
        out.push(b')');
    }
}

/// Write a name with `#HH` escapes.
fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for &b in name.as_bytes() {
        let needs_escape = !(b'!'..=b'~').contains(&b)
            || matches!(
                b,
                b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
            );
        if needs_escape {
            out.extend_from_slice(format!("#{:02X}", b).as_bytes());
        } else {
            out.push(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::operators::PdfOperation;

    fn op(name: &str, operands: Vec<Object>) -> PdfOperation {
        PdfOperation::new(name, operands, 0, false, OperationKind::Unknown)
    }

    #[test]
    fn test_format_number_rules() {
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.123456789), "0.123457");
        assert_eq!(format_number(2.5000), "2.5");
        assert_eq!(format_number(f64::NAN), "0");
    }

    #[test]
    fn test_operator_per_line() {
        let ops = vec![
            op("q", vec![]),
            op("Td", vec![Object::Integer(100), Object::Integer(700)]),
        ];
        let bytes = serialize_operations(&ops);
        assert_eq!(bytes, b"q\n100 700 Td\n");
    }

    #[test]
    fn test_literal_string_with_escapes() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::String(b"a(b)c\\".to_vec()));
        assert_eq!(out, b"(a\\(b\\)c\\\\)");
    }

    #[test]
    fn test_binary_string_switches_to_hex() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::String(vec![0x00, 0x01, 0xFF, b'a']));
        assert_eq!(out, b"<0001FF61>");
    }

    #[test]
    fn test_name_escaping() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::Name("A B#/C".to_string()));
        assert_eq!(out, b"/A#20B#23#2FC");
    }

    #[test]
    fn test_array_and_dict() {
        let mut out = Vec::new();
        let mut dict = indexmap::IndexMap::new();
        dict.insert("W".to_string(), Object::Integer(4));
        write_object(
            &mut out,
            &Object::Array(vec![Object::Real(0.5), Object::Dictionary(dict)]),
        );
        assert_eq!(out, b"[0.5 << /W 4 >>]");
    }
}
