//! Geometric primitives for redaction-area arithmetic.
//!
//! This module provides the point and rectangle types used throughout the
//! content-stream editors. Rectangles are stored as their four edges because
//! the external text extractor reports rotated-text boxes with inverted axes;
//! the constructors normalize swapped edges so downstream code never sees a
//! rectangle with `left > right` or `bottom > top`.

use serde::{Deserialize, Serialize};

/// A 2D point in page user-space (points, origin at bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How one rectangle overlaps another.
///
/// Rectangles that touch only along a boundary do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// No intersection (boundary contact counts as no intersection)
    None,
    /// The outer rectangle fully contains the inner one
    Full,
    /// The rectangles intersect without full containment
    Partial,
}

/// An axis-aligned rectangle in page user-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge x-coordinate
    pub left: f64,
    /// Bottom edge y-coordinate
    pub bottom: f64,
    /// Right edge x-coordinate
    pub right: f64,
    /// Top edge y-coordinate
    pub top: f64,
}

impl Rect {
    /// Create a rectangle from its four edges, normalizing swapped edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::geometry::Rect;
    ///
    /// let r = Rect::new(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(r.left, 10.0);
    /// assert_eq!(r.bottom, 20.0);
    /// assert_eq!(r.right, 110.0);
    /// assert_eq!(r.top, 70.0);
    /// ```
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    /// Create a rectangle from an origin and dimensions.
    ///
    /// Negative dimensions are normalized, matching how a `re` operator with
    /// negative width or height behaves.
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point {
        Point {
            x: (self.left + self.right) / 2.0,
            y: (self.bottom + self.top) / 2.0,
        }
    }

    /// Whether the rectangle has zero (or negative) area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Check if this rectangle intersects another.
    ///
    /// Uses strict inequalities: rectangles that share only an edge or a
    /// corner do not intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::geometry::Rect;
    ///
    /// let a = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let b = Rect::new(50.0, 50.0, 150.0, 150.0);
    /// let touching = Rect::new(100.0, 0.0, 200.0, 100.0);
    ///
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&touching));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    /// Check if this rectangle fully contains another.
    pub fn contains(&self, inner: &Rect) -> bool {
        inner.left >= self.left
            && inner.right <= self.right
            && inner.bottom >= self.bottom
            && inner.top <= self.top
    }

    /// Check if a point lies inside this rectangle (edges inclusive).
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }

    /// Classify how this rectangle overlaps `inner`.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::geometry::{Overlap, Rect};
    ///
    /// let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// assert_eq!(outer.overlap(&Rect::new(10.0, 10.0, 20.0, 20.0)), Overlap::Full);
    /// assert_eq!(outer.overlap(&Rect::new(90.0, 90.0, 110.0, 110.0)), Overlap::Partial);
    /// assert_eq!(outer.overlap(&Rect::new(200.0, 0.0, 300.0, 100.0)), Overlap::None);
    /// ```
    pub fn overlap(&self, inner: &Rect) -> Overlap {
        if self.contains(inner) {
            Overlap::Full
        } else if self.intersects(inner) {
            Overlap::Partial
        } else {
            Overlap::None
        }
    }

    /// Compute the intersection of two rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect {
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.min(other.right),
            top: self.top.min(other.top),
        })
    }

    /// Compute the union of this rectangle with another.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Punch `other` out of this rectangle.
    ///
    /// Returns the visible remainders as up to four disjoint axis-aligned
    /// rectangles: left strip, right strip, and the bottom/top bands between
    /// them. If the rectangles do not intersect, the result is `self` alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::geometry::Rect;
    ///
    /// let base = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let hole = Rect::new(25.0, 25.0, 75.0, 75.0);
    /// let parts = base.subtract(&hole);
    /// assert_eq!(parts.len(), 4);
    /// let area: f64 = parts.iter().map(|r| r.width() * r.height()).sum();
    /// assert!((area - (100.0 * 100.0 - 50.0 * 50.0)).abs() < 1e-9);
    /// ```
    pub fn subtract(&self, other: &Rect) -> Vec<Rect> {
        if !self.intersects(other) {
            return vec![*self];
        }
        if other.contains(self) {
            return Vec::new();
        }
        let mut parts = Vec::new();
        if other.left > self.left {
            parts.push(Rect::new(self.left, self.bottom, other.left, self.top));
        }
        if other.right < self.right {
            parts.push(Rect::new(other.right, self.bottom, self.right, self.top));
        }
        let mid_left = self.left.max(other.left);
        let mid_right = self.right.min(other.right);
        if other.bottom > self.bottom {
            parts.push(Rect::new(mid_left, self.bottom, mid_right, other.bottom));
        }
        if other.top < self.top {
            parts.push(Rect::new(mid_left, other.top, mid_right, self.top));
        }
        parts.retain(|r| !r.is_empty());
        parts
    }

    /// Expand the rectangle outward by `pad` on every side.
    pub fn expand(&self, pad: f64) -> Rect {
        Rect::new(
            self.left - pad,
            self.bottom - pad,
            self.right + pad,
            self.top + pad,
        )
    }

    /// Smallest rectangle covering a set of points.
    ///
    /// Returns `None` for an empty slice.
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let mut r = Rect {
            left: first.x,
            bottom: first.y,
            right: first.x,
            top: first.y,
        };
        for p in &points[1..] {
            r.left = r.left.min(p.x);
            r.bottom = r.bottom.min(p.y);
            r.right = r.right.max(p.x);
            r.top = r.top.max(p.y);
        }
        Some(r)
    }
}
