//! Visual/user-space coordinate bridge for rotated pages.
//!
//! The text extractor reports glyph rectangles in a *visual* frame: the page
//! as a viewer sees it after `/Rotate` has been applied. Content streams work
//! in the page's intrinsic user-space frame. For rotations of 90 or 270 the
//! visual frame's width and height are the user-space height and width
//! swapped; the bridge always takes the *user-space* dimensions.

use crate::geometry::{Point, Rect};

/// Converts between visual and content-stream user-space coordinates.
#[derive(Debug, Clone, Copy)]
pub struct RotationBridge {
    rotation: u16,
    width: f64,
    height: f64,
}

impl RotationBridge {
    /// Create a bridge for a page.
    ///
    /// `rotation` is the page's `/Rotate` value; any multiple of 90 is
    /// normalized into {0, 90, 180, 270}. `width` and `height` are the page's
    /// user-space dimensions.
    pub fn new(rotation: u16, width: f64, height: f64) -> Self {
        Self {
            rotation: rotation % 360,
            width,
            height,
        }
    }

    /// The normalized rotation this bridge applies.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Map a visual-frame point into user space.
    ///
    /// # Examples
    ///
    /// ```
    /// use redact_oxide::redact::rotation::RotationBridge;
    /// use redact_oxide::geometry::Point;
    ///
    /// let bridge = RotationBridge::new(270, 612.0, 792.0);
    /// let p = bridge.visual_to_user(Point::new(100.0, 50.0));
    /// assert_eq!(p.x, 50.0);
    /// assert_eq!(p.y, 512.0);
    /// ```
    pub fn visual_to_user(&self, p: Point) -> Point {
        match self.rotation {
            90 => Point::new(self.height - p.y, p.x),
            180 => Point::new(self.width - p.x, self.height - p.y),
            270 => Point::new(p.y, self.width - p.x),
            _ => p,
        }
    }

    /// Map a user-space point into the visual frame.
    pub fn user_to_visual(&self, p: Point) -> Point {
        match self.rotation {
            90 => Point::new(p.y, self.height - p.x),
            180 => Point::new(self.width - p.x, self.height - p.y),
            270 => Point::new(self.width - p.y, p.x),
            _ => p,
        }
    }

    /// Map a visual-frame rectangle into user space.
    ///
    /// The mapped corners arrive with swapped edges for 90/180/270; the
    /// normalizing constructor straightens them.
    pub fn visual_rect_to_user(&self, r: Rect) -> Rect {
        let a = self.visual_to_user(Point::new(r.left, r.bottom));
        let b = self.visual_to_user(Point::new(r.right, r.top));
        Rect::new(a.x, a.y, b.x, b.y)
    }

    /// Map a user-space rectangle into the visual frame.
    pub fn user_rect_to_visual(&self, r: Rect) -> Rect {
        let a = self.user_to_visual(Point::new(r.left, r.bottom));
        let b = self.user_to_visual(Point::new(r.right, r.top));
        Rect::new(a.x, a.y, b.x, b.y)
    }
}
