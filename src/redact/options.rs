//! Redaction requests and options.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// How the segmenter decides that a glyph is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlyphRemovalPolicy {
    /// Removed iff the glyph rectangle intersects (strictly) any redaction
    /// rectangle
    #[default]
    AnyOverlap,
    /// Removed iff the glyph rectangle is fully contained
    FullyContained,
    /// Removed iff the glyph center lies inside a redaction rectangle
    CenterPoint,
}

/// What to do with images only partially covered by redaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartialImageMode {
    /// Drop the whole invocation; the marker overlay covers the area
    #[default]
    Remove,
    /// Keep the image but zero the samples under the redaction rectangle
    PreserveWithBlackout,
}

/// RGB fill color of the opaque marker overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerColor {
    /// Red component (0.0-1.0)
    pub r: f64,
    /// Green component (0.0-1.0)
    pub g: f64,
    /// Blue component (0.0-1.0)
    pub b: f64,
}

impl MarkerColor {
    /// Opaque black, the conventional redaction marker.
    pub const BLACK: MarkerColor = MarkerColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Create a marker color, clamping components into 0.0-1.0.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }
}

impl Default for MarkerColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// One page-space area to redact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RedactionArea {
    /// The rectangle to clear, in page user-space coordinates
    pub rect: Rect,
    /// Marker color override for this area
    pub color: Option<MarkerColor>,
}

impl RedactionArea {
    /// An area with the default marker color.
    pub fn new(rect: Rect) -> Self {
        Self { rect, color: None }
    }
}

/// A redaction request against one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRequest {
    /// Zero-based page index
    pub page_index: usize,
    /// Areas to clear on that page
    pub areas: Vec<RedactionArea>,
}

/// Options governing a redaction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactOptions {
    /// Whether text matching is case-sensitive
    pub case_sensitive: bool,
    /// Whether to append the opaque marker overlay after structural removal
    pub draw_visual_marker: bool,
    /// Default marker color
    pub marker_color: MarkerColor,
    /// Also drop all annotations regardless of position
    pub sanitize_metadata: bool,
    /// Partially covered image handling
    pub partial_image_mode: PartialImageMode,
    /// Glyph classification policy
    pub glyph_removal_policy: GlyphRemovalPolicy,
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            draw_visual_marker: true,
            marker_color: MarkerColor::BLACK,
            sanitize_metadata: false,
            partial_image_mode: PartialImageMode::default(),
            glyph_removal_policy: GlyphRemovalPolicy::default(),
        }
    }
}

impl RedactOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case sensitivity for text matching.
    pub fn with_case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    /// Enable or disable the visual marker overlay.
    pub fn with_visual_marker(mut self, value: bool) -> Self {
        self.draw_visual_marker = value;
        self
    }

    /// Set the default marker color.
    pub fn with_marker_color(mut self, color: MarkerColor) -> Self {
        self.marker_color = color;
        self
    }

    /// Drop all annotations and treat the pass as sanitizing.
    pub fn with_sanitize_metadata(mut self, value: bool) -> Self {
        self.sanitize_metadata = value;
        self
    }

    /// Set the partial-image handling mode.
    pub fn with_partial_image_mode(mut self, mode: PartialImageMode) -> Self {
        self.partial_image_mode = mode;
        self
    }

    /// Set the glyph classification policy.
    pub fn with_glyph_removal_policy(mut self, policy: GlyphRemovalPolicy) -> Self {
        self.glyph_removal_policy = policy;
        self
    }
}
