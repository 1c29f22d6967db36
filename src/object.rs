//! Content-stream operand objects.
//!
//! Operands in a content stream are a restricted subset of the PDF object
//! model: there are no indirect references and no streams, only direct
//! values. Dictionaries keep insertion order because inline-image parameter
//! dictionaries must survive a parse/serialize round-trip byte-faithfully.

use indexmap::IndexMap;

/// A direct PDF object as it appears among content-stream operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array, escapes already decoded)
    String(Vec<u8>),
    /// Name (without the leading /, # escapes already decoded)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (insertion-ordered key-value pairs)
    Dictionary(IndexMap<String, Object>),
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to a number, accepting both integers and reals.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::object::Object;
    ///
    /// assert_eq!(Object::Integer(3).as_number(), Some(3.0));
    /// assert_eq!(Object::Real(2.5).as_number(), Some(2.5));
    /// assert_eq!(Object::Null.as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to string bytes.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&IndexMap<String, Object>> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if this object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}
