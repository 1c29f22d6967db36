//! Typed content-stream operations.
//!
//! Every operation emitted by the parser records the operator name, its raw
//! operands, its byte offset in the source stream, and whether it sits inside
//! a `BT … ET` block. On top of that, each operation carries a semantic kind
//! so the editors can dispatch on what an operator *does* rather than on its
//! spelling.

use crate::content::graphics_state::Matrix;
use crate::geometry::{Point, Rect};
use crate::object::Object;
use bytes::Bytes;
use indexmap::IndexMap;

/// Semantic classification of a content-stream operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// Operators that mutate text state only
    /// (`Tf`, `Tm`, `Td`, `TD`, `T*`, `Tr`, `Tc`, `Tw`, `Tz`, `TL`, `Ts`, `BT`, `ET`)
    TextState,
    /// `q`, `Q`, `cm`, color and general graphics-state settings
    GraphicsState,
    /// `m`, `l`, `c`, `v`, `y`, `re`, `h`, and the clip markers `W`/`W*`
    PathConstruction,
    /// `S`, `s`, `f`, `F`, `f*`, `B`, `B*`, `b`, `b*`, `n`
    PathPainting,
    /// A `Do` invocation or an inline `BI … ID … EI` image
    Image(ImageInvocation),
    /// The text-showing family: `Tj`, `TJ`, `'`, `"`
    Text(TextShow),
    /// Any operator the registry does not know; operands retained verbatim
    Unknown,
}

/// Decoded payload of a text-showing operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShow {
    /// Unicode text produced by the character-map decoder
    pub text: String,
    /// Font resource name in effect at the show
    pub font: String,
    /// Effective font size: nominal `Tf` size × text-matrix x-row magnitude
    pub font_size: f64,
    /// Per-codepoint advances along the baseline, in page user-space units.
    /// Always the same length as `text.chars()`.
    pub advances: Vec<f64>,
    /// Bounding box in page user-space
    pub bbox: Rect,
    /// Baseline origin (pre-show) in page user-space
    pub start: Point,
    /// Character spacing in effect (Tc)
    pub char_space: f64,
    /// Word spacing in effect (Tw)
    pub word_space: f64,
    /// Horizontal scaling in effect, percent (Tz)
    pub horizontal_scaling: f64,
    /// Text rise in effect (Ts)
    pub rise: f64,
    /// Text rendering mode in effect (Tr); mode 3 shows invisible glyphs
    /// that still must be redactable
    pub render_mode: u8,
}

/// An image painted by the content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInvocation {
    /// Which image form this is
    pub data: ImageData,
    /// Page user-space footprint (unit square through the CTM)
    pub bbox: Rect,
    /// CTM in effect at the invocation; maps image space to page space
    pub ctm: Matrix,
}

/// The two image forms a content stream can paint.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// `Do` referencing a named XObject resource
    XObject {
        /// Resource name (without the leading `/`)
        name: String,
    },
    /// Inline `BI … ID … EI` block
    Inline {
        /// Parameter dictionary in source key order
        dict: IndexMap<String, Object>,
        /// Raw sample bytes between `ID` and `EI`
        data: Bytes,
    },
}

/// One parsed content-stream operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOperation {
    /// Operator name exactly as written (`"Tj"`, `"re"`, `"BI"`, …)
    pub name: String,
    /// Raw operands as parsed, retained for byte-faithful re-serialization
    pub operands: Vec<Object>,
    /// Byte offset of this operation (its first operand) in the source stream
    pub offset: usize,
    /// Whether this operation sits inside a `BT … ET` block
    pub inside_text_block: bool,
    /// Semantic kind
    pub kind: OperationKind,
}

impl PdfOperation {
    /// Create an operation parsed from the stream.
    pub fn new(
        name: impl Into<String>,
        operands: Vec<Object>,
        offset: usize,
        inside_text_block: bool,
        kind: OperationKind,
    ) -> Self {
        Self {
            name: name.into(),
            operands,
            offset,
            inside_text_block,
            kind,
        }
    }

    /// Create a synthetic operation emitted by an editor.
    ///
    /// Synthetic operations inherit the byte offset of the construct they
    /// replace so the operation list stays totally ordered by offset.
    pub fn synthetic(
        name: impl Into<String>,
        operands: Vec<Object>,
        offset: usize,
        inside_text_block: bool,
        kind: OperationKind,
    ) -> Self {
        Self::new(name, operands, offset, inside_text_block, kind)
    }

    /// Whether this is a text-showing operation.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, OperationKind::Text(_))
    }

    /// The text payload, if this is a text-showing operation.
    pub fn as_text(&self) -> Option<&TextShow> {
        match &self.kind {
            OperationKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The image payload, if this paints an image.
    pub fn as_image(&self) -> Option<&ImageInvocation> {
        match &self.kind {
            OperationKind::Image(i) => Some(i),
            _ => None,
        }
    }
}
