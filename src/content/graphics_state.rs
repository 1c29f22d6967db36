//! Graphics state management for content stream parsing.
//!
//! This module provides the state machine that tracks transformations and
//! text parameters as operators are executed, and the save/restore stack
//! driven by the `q` and `Q` operators.

use crate::geometry::Point;

/// A 2D affine transformation matrix.
///
/// PDF uses matrices of the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Where (a,b,c,d) define scaling/rotation/skewing and (e,f) define
/// translation. Points are row vectors multiplied on the left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f64,
    /// Rotation/skew component
    pub b: f64,
    /// Rotation/skew component
    pub c: f64,
    /// Vertical scaling component
    pub d: f64,
    /// Horizontal translation
    pub e: f64,
    /// Vertical translation
    pub f: f64,
}

impl Matrix {
    /// Create an identity matrix.
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a translation matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::content::Matrix;
    ///
    /// let m = Matrix::translation(10.0, 20.0);
    /// let p = m.transform_point(5.0, 10.0);
    /// assert_eq!(p.x, 15.0);
    /// assert_eq!(p.y, 30.0);
    /// ```
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a rotation matrix (counter-clockwise, radians).
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Build a matrix from the six operands of a `cm` or `Tm` operator.
    pub fn from_operands(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Multiply this matrix with another matrix.
    ///
    /// The result represents first applying `self`, then applying `other`,
    /// matching the PDF convention `M' = M_self × M_other` for row vectors.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f64, y: f64) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Transform a vector (ignores translation).
    pub fn transform_vector(&self, x: f64, y: f64) -> Point {
        Point {
            x: self.a * x + self.c * y,
            y: self.b * x + self.d * y,
        }
    }

    /// Get the determinant of this matrix.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Check if this matrix is invertible.
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() > f64::EPSILON
    }

    /// Compute the inverse of this matrix.
    ///
    /// Returns `None` when the matrix is degenerate. Used to map page-space
    /// redaction rectangles back into pre-transform coordinates (path
    /// re-emission, image sample addressing).
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() <= f64::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Matrix {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            e: (self.c * self.f - self.d * self.e) * inv_det,
            f: (self.b * self.e - self.a * self.f) * inv_det,
        })
    }

    /// Magnitude of the matrix's x-axis row, `|(a, b)|`.
    ///
    /// This is the scale the matrix applies along the text baseline and the
    /// factor that turns a nominal `Tf` size into the effective font size.
    pub fn x_scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Graphics state parameters tracked while parsing a content stream.
///
/// Snapshotted on `q`, restored on `Q`. The two text matrices are transient
/// state inside a `BT … ET` block; both reset to identity at `BT`.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (user space to page space)
    pub ctm: Matrix,
    /// Text matrix (text space to user space)
    pub text_matrix: Matrix,
    /// Text line matrix (saved position at start of line)
    pub text_line_matrix: Matrix,

    /// Current font resource name
    pub font_name: Option<String>,
    /// Current nominal font size (Tf)
    pub font_size: f64,
    /// Character spacing (Tc)
    pub char_space: f64,
    /// Word spacing (Tw)
    pub word_space: f64,
    /// Horizontal scaling percentage (Tz)
    pub horizontal_scaling: f64,
    /// Text leading (TL)
    pub leading: f64,
    /// Text rise (Ts)
    pub text_rise: f64,
    /// Text rendering mode (Tr); mode 3 is invisible but still shows characters
    pub render_mode: u8,
}

impl GraphicsState {
    /// Create a new graphics state with PDF default values.
    pub fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            font_name: None,
            font_size: 0.0,
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            text_rise: 0.0,
            render_mode: 0,
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack of graphics states for `q`/`Q` save/restore.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    stack: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// Create a new stack holding one default state.
    pub fn new() -> Self {
        Self {
            stack: vec![GraphicsState::new()],
        }
    }

    /// Current graphics state.
    pub fn current(&self) -> &GraphicsState {
        // Invariant: the stack is never empty; restore() refuses to pop the
        // last state.
        self.stack.last().expect("graphics state stack is never empty")
    }

    /// Mutable access to the current graphics state.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        self.stack.last_mut().expect("graphics state stack is never empty")
    }

    /// Save the current graphics state (`q`).
    pub fn save(&mut self) {
        let state = self.current().clone();
        self.stack.push(state);
    }

    /// Restore the previous graphics state (`Q`).
    ///
    /// Real-world streams restore more often than they save; an unbalanced
    /// `Q` leaves the last state in place rather than failing the parse.
    pub fn restore(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Current stack depth (always at least 1).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for GraphicsStateStack {
    fn default() -> Self {
        Self::new()
    }
}
