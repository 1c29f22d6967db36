//! Text segmentation: kept/removed character runs.
//!
//! Given a text-showing operation, its letter matches, and the redaction
//! rectangles on the page, every character is classified as kept or removed
//! under the configured policy, and adjacent same-classification characters
//! fuse into maximal segments. Characters the letter matching could not pair
//! (whitespace collapsed away, extractor gaps) inherit the classification of
//! their nearest classified neighbor.

use crate::content::operators::TextShow;
use crate::geometry::{Point, Rect};
use crate::redact::letters::LetterMatch;
use crate::redact::options::GlyphRemovalPolicy;

/// A maximal run of same-classification characters within one text
/// operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    /// First character index (inclusive), in `chars` order
    pub start_index: usize,
    /// Past-the-end character index
    pub end_index: usize,
    /// Whether this run survives redaction
    pub keep: bool,
    /// Baseline start position of the run, in user space
    pub start: Point,
    /// Width of the run along the baseline
    pub width: f64,
    /// Height of the run
    pub height: f64,
    /// The original substring covered by this run
    pub text: String,
}

/// Whether a glyph rectangle is removed under the policy.
pub fn removed_by_policy(glyph: &Rect, areas: &[Rect], policy: GlyphRemovalPolicy) -> bool {
    areas.iter().any(|area| match policy {
        GlyphRemovalPolicy::AnyOverlap => area.intersects(glyph),
        GlyphRemovalPolicy::FullyContained => area.contains(glyph),
        GlyphRemovalPolicy::CenterPoint => area.contains_point(&glyph.center()),
    })
}

/// Partition an operation's characters into kept/removed segments.
///
/// Returns `None` when the operation has no letter matches; the caller then
/// treats the whole operation as an atom (removed iff its own bounding box is
/// fully contained in a redaction area).
pub fn segment_text(
    show: &TextShow,
    matches: &[LetterMatch],
    areas: &[Rect],
    policy: GlyphRemovalPolicy,
) -> Option<Vec<TextSegment>> {
    if matches.is_empty() {
        return None;
    }
    let chars: Vec<char> = show.text.chars().collect();
    if chars.is_empty() {
        return Some(Vec::new());
    }

    let mut anchors: Vec<Option<Rect>> = vec![None; chars.len()];
    let mut classes: Vec<Option<bool>> = vec![None; chars.len()];
    for m in matches {
        if m.char_index < chars.len() {
            anchors[m.char_index] = Some(m.rect);
            classes[m.char_index] = Some(removed_by_policy(&m.rect, areas, policy));
        }
    }

    // Unclassified characters inherit from the nearest classified neighbor,
    // preferring the one on the left.
    let mut last: Option<bool> = None;
    for class in classes.iter_mut() {
        match class {
            Some(v) => last = Some(*v),
            None => *class = last,
        }
    }
    let mut next: Option<bool> = None;
    for class in classes.iter_mut().rev() {
        match class {
            Some(v) => next = Some(*v),
            None => *class = next,
        }
    }

    let mut segments = Vec::new();
    let mut run_start = 0usize;
    let mut run_removed = classes[0].unwrap_or(false);
    for i in 1..=chars.len() {
        let boundary = i == chars.len() || classes[i].unwrap_or(false) != run_removed;
        if !boundary {
            continue;
        }
        segments.push(build_segment(
            show,
            &chars,
            &anchors,
            run_start,
            i,
            !run_removed,
        ));
        if i < chars.len() {
            run_start = i;
            run_removed = classes[i].unwrap_or(false);
        }
    }
    Some(segments)
}

fn build_segment(
    show: &TextShow,
    chars: &[char],
    anchors: &[Option<Rect>],
    start_index: usize,
    end_index: usize,
    keep: bool,
) -> TextSegment {
    let run_anchors: Vec<&Rect> = anchors[start_index..end_index]
        .iter()
        .flatten()
        .collect();
    let start = match run_anchors.first() {
        Some(rect) => Point::new(rect.left, rect.bottom),
        None => {
            // No anchor inside the run: continue from the previous anchored
            // glyph, or fall back to the operation's own start.
            anchors[..start_index]
                .iter()
                .rev()
                .flatten()
                .next()
                .map(|r| Point::new(r.right, r.bottom))
                .unwrap_or(show.start)
        },
    };
    let width: f64 = (start_index..end_index)
        .map(|i| match anchors[i] {
            Some(rect) => rect.width(),
            None => show.advances.get(i).copied().unwrap_or(0.0),
        })
        .sum();
    let height = run_anchors
        .iter()
        .map(|r| r.height())
        .fold(0.0_f64, f64::max)
        .max(show.font_size);
    TextSegment {
        start_index,
        end_index,
        keep,
        start,
        width,
        height,
        text: chars[start_index..end_index].iter().collect(),
    }
}
