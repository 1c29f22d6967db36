//! Path collector and clipper.
//!
//! Groups path-construction operators into complete paths (closed by the
//! next painting operator) and rewrites the ones that cross a redaction
//! area:
//!
//! - fully outside: kept verbatim
//! - fully inside: the whole construction + painting sequence is deleted
//! - partial, axis-aligned `re` fill: replaced by the up-to-four remainder
//!   rectangles of `rect − redaction`
//! - partial, general fill: polygon subtraction, re-emitted as `m`/`l`/`h`
//! - partial stroke: geometry untouched (clipping a stroke changes its width
//!   behavior); an opaque patch is painted over the redacted span right
//!   after the stroke
//!
//! Clip paths (`W`/`W*`) are never edited: they constrain rendering rather
//! than paint it, and cutting them would change what everything after them
//! shows. The fill rule of a clipped path survives because the original
//! painting operator is re-emitted unchanged.

use crate::cancel::CancelToken;
use crate::content::graphics_state::Matrix;
use crate::content::operators::{OperationKind, PdfOperation};
use crate::content::registry::{get_number, matrix_from_operands};
use crate::content::serializer::format_number;
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::object::Object;
use log::debug;

/// Segments used when flattening a Bézier curve for clipping.
const CURVE_SEGMENTS: usize = 16;
/// Polygon pieces below this area are dropped as degenerate.
const MIN_PIECE_AREA: f64 = 1e-9;

/// How a collected path is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaintKind {
    None,
    Fill,
    Stroke,
    FillStroke,
}

impl PaintKind {
    fn from_operator(name: &str) -> PaintKind {
        match name {
            "S" | "s" => PaintKind::Stroke,
            "f" | "F" | "f*" => PaintKind::Fill,
            "B" | "B*" | "b" | "b*" => PaintKind::FillStroke,
            _ => PaintKind::None,
        }
    }
}

/// Clip the paths in an operation list against the redaction areas.
///
/// Returns the rewritten list and the number of paths deleted or cut.
pub fn clip_paths(
    ops: &[PdfOperation],
    areas: &[Rect],
    cancel: &CancelToken,
) -> Result<(Vec<PdfOperation>, usize)> {
    let mut out = Vec::with_capacity(ops.len());
    let mut removed = 0usize;
    let mut ctm = Matrix::identity();
    let mut line_width = 1.0f64;
    let mut saved: Vec<(Matrix, f64)> = Vec::new();
    let mut pending: Vec<&PdfOperation> = Vec::new();

    for op in ops {
        match &op.kind {
            OperationKind::PathConstruction => {
                pending.push(op);
                continue;
            },
            OperationKind::PathPainting => {
                cancel.check()?;
                let group: Vec<&PdfOperation> = pending.drain(..).collect();
                removed += paint_group(&group, op, ctm, line_width, areas, &mut out);
                continue;
            },
            _ => {},
        }
        if !pending.is_empty() {
            // Construction without a painting operator; emit untouched
            debug!("path construction at byte {} never painted", pending[0].offset);
            out.extend(pending.drain(..).cloned());
        }
        match op.name.as_str() {
            "q" => saved.push((ctm, line_width)),
            "Q" => {
                if let Some((m, w)) = saved.pop() {
                    ctm = m;
                    line_width = w;
                }
            },
            "cm" => ctm = matrix_from_operands(&op.operands).multiply(&ctm),
            "w" => line_width = get_number(&op.operands, 0).unwrap_or(line_width),
            _ => {},
        }
        out.push(op.clone());
    }
    out.extend(pending.drain(..).cloned());
    Ok((out, removed))
}

/// Handle one complete path group. Returns 1 if the path was deleted or cut.
fn paint_group(
    group: &[&PdfOperation],
    paint_op: &PdfOperation,
    ctm: Matrix,
    line_width: f64,
    areas: &[Rect],
    out: &mut Vec<PdfOperation>,
) -> usize {
    let verbatim = |out: &mut Vec<PdfOperation>| {
        out.extend(group.iter().map(|op| (*op).clone()));
        out.push(paint_op.clone());
    };

    let paint = PaintKind::from_operator(&paint_op.name);
    let has_clip = group.iter().any(|op| op.name == "W" || op.name == "W*");
    if has_clip || paint == PaintKind::None {
        verbatim(out);
        return 0;
    }

    let Some(shape) = collect_shape(group, &ctm) else {
        verbatim(out);
        return 0;
    };
    let Some(bbox) = shape.bbox() else {
        verbatim(out);
        return 0;
    };

    let hit: Vec<&Rect> = areas.iter().filter(|a| a.intersects(&bbox)).collect();
    if hit.is_empty() {
        verbatim(out);
        return 0;
    }
    if hit.iter().any(|a| a.contains(&bbox)) {
        // Entire path inside a redaction area: drop construction + painting
        return 1;
    }

    match paint {
        PaintKind::Stroke => {
            verbatim(out);
            // The stroke paints half its width either side of the geometry
            let reach = bbox.expand((line_width * ctm.x_scale() / 2.0).max(0.5));
            emit_stroke_patch(&reach, &hit, &ctm, paint_op.offset, out);
            0
        },
        _ => {
            let Some(inverse) = ctm.invert() else {
                debug!(
                    "degenerate CTM at path group (byte {}); left verbatim",
                    paint_op.offset
                );
                verbatim(out);
                return 0;
            };
            if let Some(rect) = shape.axis_rectangle {
                emit_rect_remainders(&rect, &hit, &inverse, paint_op, out);
            } else {
                emit_clipped_polygons(&shape.subpaths, &hit, &inverse, paint_op, out);
            }
            1
        },
    }
}

/// The path geometry in page space.
struct Shape {
    subpaths: Vec<Vec<Point>>,
    /// Set when the group is a single `re` whose page-space image is still
    /// axis-aligned
    axis_rectangle: Option<Rect>,
}

impl Shape {
    fn bbox(&self) -> Option<Rect> {
        let all: Vec<Point> = self.subpaths.iter().flatten().copied().collect();
        Rect::bounding(&all)
    }
}

/// Walk the construction operators and build flattened page-space subpaths.
fn collect_shape(group: &[&PdfOperation], ctm: &Matrix) -> Option<Shape> {
    let mut subpaths: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    // Current point in pre-CTM coordinates, for curve flattening
    let mut cursor = (0.0f64, 0.0f64);
    let mut re_count = 0usize;
    let mut other_count = 0usize;
    let mut re_rect: Option<Rect> = None;

    for op in group {
        let o = &op.operands;
        match op.name.as_str() {
            "m" => {
                if current.len() > 1 {
                    subpaths.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                let (x, y) = (get_number(o, 0)?, get_number(o, 1)?);
                cursor = (x, y);
                current.push(ctm.transform_point(x, y));
                other_count += 1;
            },
            "l" => {
                let (x, y) = (get_number(o, 0)?, get_number(o, 1)?);
                cursor = (x, y);
                current.push(ctm.transform_point(x, y));
                other_count += 1;
            },
            "c" | "v" | "y" => {
                let (p1, p2, p3) = curve_points(&op.name, o, cursor)?;
                flatten_curve(cursor, p1, p2, p3, ctm, &mut current);
                cursor = p3;
                other_count += 1;
            },
            "re" => {
                if current.len() > 1 {
                    subpaths.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                let x = get_number(o, 0)?;
                let y = get_number(o, 1)?;
                let w = get_number(o, 2)?;
                let h = get_number(o, 3)?;
                let corners = [
                    ctm.transform_point(x, y),
                    ctm.transform_point(x + w, y),
                    ctm.transform_point(x + w, y + h),
                    ctm.transform_point(x, y + h),
                ];
                subpaths.push(corners.to_vec());
                // Axis-aligned only while the CTM has no rotation/skew
                if ctm.b == 0.0 && ctm.c == 0.0 {
                    re_rect = Rect::bounding(&corners);
                }
                cursor = (x, y);
                re_count += 1;
            },
            "h" => {
                if current.len() > 1 {
                    subpaths.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            },
            _ => {}, // W/W* handled by the caller
        }
    }
    if current.len() > 1 {
        subpaths.push(current);
    }
    if subpaths.is_empty() {
        return None;
    }
    let axis_rectangle = if re_count == 1 && other_count == 0 {
        re_rect
    } else {
        None
    };
    Some(Shape {
        subpaths,
        axis_rectangle,
    })
}

fn curve_points(
    name: &str,
    o: &[Object],
    cursor: (f64, f64),
) -> Option<((f64, f64), (f64, f64), (f64, f64))> {
    match name {
        "c" => Some((
            (get_number(o, 0)?, get_number(o, 1)?),
            (get_number(o, 2)?, get_number(o, 3)?),
            (get_number(o, 4)?, get_number(o, 5)?),
        )),
        "v" => Some((
            cursor,
            (get_number(o, 0)?, get_number(o, 1)?),
            (get_number(o, 2)?, get_number(o, 3)?),
        )),
        "y" => {
            let p1 = (get_number(o, 0)?, get_number(o, 1)?);
            let p3 = (get_number(o, 2)?, get_number(o, 3)?);
            Some((p1, p3, p3))
        },
        _ => None,
    }
}

/// Flatten a cubic Bézier into line segments, in page space.
fn flatten_curve(
    p0: (f64, f64),
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    ctm: &Matrix,
    into: &mut Vec<Point>,
) {
    for step in 1..=CURVE_SEGMENTS {
        let t = step as f64 / CURVE_SEGMENTS as f64;
        let u = 1.0 - t;
        let x = u * u * u * p0.0
            + 3.0 * u * u * t * p1.0
            + 3.0 * u * t * t * p2.0
            + t * t * t * p3.0;
        let y = u * u * u * p0.1
            + 3.0 * u * u * t * p1.1
            + 3.0 * u * t * t * p2.1
            + t * t * t * p3.1;
        into.push(ctm.transform_point(x, y));
    }
}

/// Emit `rect − areas` as up to four `re` remainders per subtraction,
/// followed by the original painting operator.
fn emit_rect_remainders(
    rect: &Rect,
    areas: &[&Rect],
    inverse: &Matrix,
    paint_op: &PdfOperation,
    out: &mut Vec<PdfOperation>,
) {
    let mut pieces = vec![*rect];
    for area in areas {
        pieces = pieces
            .into_iter()
            .flat_map(|piece| piece.subtract(area))
            .collect();
    }
    if pieces.is_empty() {
        return;
    }
    for piece in &pieces {
        let a = inverse.transform_point(piece.left, piece.bottom);
        let b = inverse.transform_point(piece.right, piece.top);
        let r = Rect::new(a.x, a.y, b.x, b.y);
        out.push(number_op(
            "re",
            &[r.left, r.bottom, r.width(), r.height()],
            paint_op.offset,
            OperationKind::PathConstruction,
        ));
    }
    out.push(paint_op.clone());
}

/// Emit the polygon subtraction of each subpath, followed by the original
/// painting operator.
fn emit_clipped_polygons(
    subpaths: &[Vec<Point>],
    areas: &[&Rect],
    inverse: &Matrix,
    paint_op: &PdfOperation,
    out: &mut Vec<PdfOperation>,
) {
    let mut pieces: Vec<Vec<Point>> = subpaths.to_vec();
    for area in areas {
        pieces = pieces
            .into_iter()
            .flat_map(|piece| subtract_rect_from_polygon(&piece, area))
            .collect();
    }
    pieces.retain(|piece| polygon_area(piece).abs() > MIN_PIECE_AREA);
    if pieces.is_empty() {
        return;
    }
    for piece in &pieces {
        for (i, point) in piece.iter().enumerate() {
            let p = inverse.transform_point(point.x, point.y);
            let name = if i == 0 { "m" } else { "l" };
            out.push(number_op(
                name,
                &[p.x, p.y],
                paint_op.offset,
                OperationKind::PathConstruction,
            ));
        }
        out.push(PdfOperation::synthetic(
            "h",
            vec![],
            paint_op.offset,
            paint_op.inside_text_block,
            OperationKind::PathConstruction,
        ));
    }
    out.push(paint_op.clone());
}

/// Paint an opaque patch over the redacted span of a stroked path.
fn emit_stroke_patch(
    bbox: &Rect,
    areas: &[&Rect],
    ctm: &Matrix,
    offset: usize,
    out: &mut Vec<PdfOperation>,
) {
    let Some(inverse) = ctm.invert() else {
        return; // the marker overlay still covers the area
    };
    out.push(PdfOperation::synthetic(
        "q",
        vec![],
        offset,
        false,
        OperationKind::GraphicsState,
    ));
    out.push(number_op(
        "rg",
        &[0.0, 0.0, 0.0],
        offset,
        OperationKind::GraphicsState,
    ));
    for area in areas {
        let Some(cover) = area.intersection(bbox) else {
            continue;
        };
        // The patch may be rotated in content coordinates; emit as polygon
        let corners = [
            inverse.transform_point(cover.left, cover.bottom),
            inverse.transform_point(cover.right, cover.bottom),
            inverse.transform_point(cover.right, cover.top),
            inverse.transform_point(cover.left, cover.top),
        ];
        for (i, p) in corners.iter().enumerate() {
            let name = if i == 0 { "m" } else { "l" };
            out.push(number_op(
                name,
                &[p.x, p.y],
                offset,
                OperationKind::PathConstruction,
            ));
        }
        out.push(PdfOperation::synthetic(
            "h",
            vec![],
            offset,
            false,
            OperationKind::PathConstruction,
        ));
    }
    out.push(PdfOperation::synthetic(
        "f",
        vec![],
        offset,
        false,
        OperationKind::PathPainting,
    ));
    out.push(PdfOperation::synthetic(
        "Q",
        vec![],
        offset,
        false,
        OperationKind::GraphicsState,
    ));
}

/// Build a numeric-operand operation, rounding like the serializer so the
/// re-parsed stream compares equal.
fn number_op(name: &str, values: &[f64], offset: usize, kind: OperationKind) -> PdfOperation {
    let operands = values
        .iter()
        .map(|&v| {
            let formatted: f64 = format_number(v).parse().unwrap_or(v);
            if formatted.fract() == 0.0 && formatted.abs() < 1e15 {
                Object::Integer(formatted as i64)
            } else {
                Object::Real(formatted)
            }
        })
        .collect();
    PdfOperation::synthetic(name, operands, offset, false, kind)
}

/// Signed area of a polygon (shoelace).
fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    area / 2.0
}

/// Subtract an axis-aligned rectangle from a polygon.
///
/// The complement of the rectangle decomposes into four half-plane regions
/// (left of it, right of it, and the bottom/top bands between its x-range);
/// each region is convex, so clipping the polygon against each with
/// Sutherland–Hodgman yields the remainder pieces.
fn subtract_rect_from_polygon(polygon: &[Point], rect: &Rect) -> Vec<Vec<Point>> {
    let mut pieces = Vec::new();
    // Left of the rectangle
    pieces.push(clip_axis(polygon, Axis::X, rect.left, true));
    // Right of the rectangle
    pieces.push(clip_axis(polygon, Axis::X, rect.right, false));
    // Middle band, below and above
    let band = clip_axis(
        &clip_axis(polygon, Axis::X, rect.left, false),
        Axis::X,
        rect.right,
        true,
    );
    pieces.push(clip_axis(&band, Axis::Y, rect.bottom, true));
    pieces.push(clip_axis(&band, Axis::Y, rect.top, false));
    pieces.retain(|p| polygon_area(p).abs() > MIN_PIECE_AREA);
    pieces
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Sutherland–Hodgman clip against one axis-aligned half-plane.
///
/// `keep_less` keeps the side with coordinates ≤ `limit`.
fn clip_axis(polygon: &[Point], axis: Axis, limit: f64, keep_less: bool) -> Vec<Point> {
    let coord = |p: &Point| match axis {
        Axis::X => p.x,
        Axis::Y => p.y,
    };
    let inside = |p: &Point| {
        if keep_less {
            coord(p) <= limit
        } else {
            coord(p) >= limit
        }
    };
    let cross = |a: &Point, b: &Point| -> Point {
        let ca = coord(a);
        let cb = coord(b);
        let t = if (cb - ca).abs() < f64::EPSILON {
            0.0
        } else {
            (limit - ca) / (cb - ca)
        };
        Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
    };

    let mut out = Vec::with_capacity(polygon.len() + 4);
    for i in 0..polygon.len() {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % polygon.len()];
        match (inside(current), inside(next)) {
            (true, true) => out.push(*next),
            (true, false) => out.push(cross(current, next)),
            (false, true) => {
                out.push(cross(current, next));
                out.push(*next);
            },
            (false, false) => {},
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentParser;
    use crate::interfaces::CharacterMapDecoder;

    struct NoDecoder;

    impl CharacterMapDecoder for NoDecoder {
        fn decode(&self, _font: &str, bytes: &[u8]) -> Vec<(char, f64)> {
            bytes.iter().map(|&b| (b as char, 500.0)).collect()
        }
    }

    fn parse(stream: &[u8]) -> Vec<PdfOperation> {
        ContentParser::new(&NoDecoder, 792.0)
            .parse(stream, &CancelToken::new())
            .unwrap()
    }

    fn run(stream: &[u8], areas: &[Rect]) -> (Vec<PdfOperation>, usize) {
        clip_paths(&parse(stream), areas, &CancelToken::new()).unwrap()
    }

    #[test]
    fn test_disjoint_path_untouched() {
        let stream = b"100 500 200 80 re f";
        let (out, removed) = run(stream, &[Rect::new(400.0, 0.0, 500.0, 100.0)]);
        assert_eq!(removed, 0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "re");
    }

    #[test]
    fn test_contained_fill_deleted() {
        let stream = b"100 500 200 80 re f";
        let (out, removed) = run(stream, &[Rect::new(50.0, 450.0, 400.0, 650.0)]);
        assert_eq!(removed, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_rect_cut_at_x200() {
        // Scenario S5: 200x80 at (100,500), redaction (200,480)-(400,600)
        let stream = b"100 500 200 80 re f";
        let (out, removed) = run(stream, &[Rect::new(200.0, 480.0, 400.0, 600.0)]);
        assert_eq!(removed, 1);
        let re_ops: Vec<&PdfOperation> = out.iter().filter(|op| op.name == "re").collect();
        assert_eq!(re_ops.len(), 1);
        let nums: Vec<f64> = re_ops[0]
            .operands
            .iter()
            .map(|o| o.as_number().unwrap())
            .collect();
        assert_eq!(nums, vec![100.0, 500.0, 100.0, 80.0]);
        assert_eq!(out.last().unwrap().name, "f");
    }

    #[test]
    fn test_hole_produces_four_rects() {
        let stream = b"0 0 100 100 re f";
        let (out, removed) = run(stream, &[Rect::new(25.0, 25.0, 75.0, 75.0)]);
        assert_eq!(removed, 1);
        assert_eq!(out.iter().filter(|op| op.name == "re").count(), 4);
    }

    #[test]
    fn test_fill_rule_preserved() {
        let stream = b"0 0 100 100 re f*";
        let (out, _) = run(stream, &[Rect::new(50.0, -10.0, 150.0, 110.0)]);
        assert_eq!(out.last().unwrap().name, "f*");
    }

    #[test]
    fn test_general_path_clipped_to_polygons() {
        // Right triangle (0,0) (100,0) (0,100), cut by the right half-plane
        let stream = b"0 0 m 100 0 l 0 100 l h f";
        let (out, removed) = run(stream, &[Rect::new(50.0, -10.0, 200.0, 110.0)]);
        assert_eq!(removed, 1);
        assert!(out.iter().any(|op| op.name == "m"));
        assert_eq!(out.last().unwrap().name, "f");
        // All emitted points stay left of the cut
        for op in &out {
            if op.name == "m" || op.name == "l" {
                let x = op.operands[0].as_number().unwrap();
                assert!(x <= 50.0 + 1e-9, "point at x={} crossed the cut", x);
            }
        }
    }

    #[test]
    fn test_stroke_keeps_geometry_and_gets_patch() {
        let stream = b"0 50 m 100 50 l S";
        let (out, removed) = run(stream, &[Rect::new(40.0, 0.0, 60.0, 100.0)]);
        assert_eq!(removed, 0);
        // Original stroke survives
        assert!(out.iter().any(|op| op.name == "S"));
        // Patch painted after it
        let s_pos = out.iter().position(|op| op.name == "S").unwrap();
        assert!(out[s_pos + 1..].iter().any(|op| op.name == "f"));
        assert!(out[s_pos + 1..].iter().any(|op| op.name == "rg"));
    }

    #[test]
    fn test_stroke_fully_inside_deleted() {
        let stream = b"10 10 m 20 20 l S";
        let (out, removed) = run(stream, &[Rect::new(0.0, 0.0, 100.0, 100.0)]);
        assert_eq!(removed, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_clip_path_never_edited() {
        let stream = b"0 0 100 100 re W n 10 10 m 20 20 l S";
        let (out, _) = run(stream, &[Rect::new(25.0, 25.0, 75.0, 75.0)]);
        assert!(out.iter().any(|op| op.name == "W"));
        assert!(out.iter().any(|op| op.name == "n"));
    }

    #[test]
    fn test_ctm_transformed_rect() {
        // Unit square scaled to 100x100 at the origin, hole in the middle
        let stream = b"q 100 0 0 100 0 0 cm 0 0 1 1 re f Q";
        let (out, removed) = run(stream, &[Rect::new(25.0, 25.0, 75.0, 75.0)]);
        assert_eq!(removed, 1);
        let re_ops: Vec<&PdfOperation> = out.iter().filter(|op| op.name == "re").collect();
        assert_eq!(re_ops.len(), 4);
        // Remainders are expressed in pre-CTM coordinates
        let first: Vec<f64> = re_ops[0]
            .operands
            .iter()
            .map(|o| o.as_number().unwrap())
            .collect();
        assert_eq!(first, vec![0.0, 0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_polygon_area() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(polygon_area(&square), 100.0);
    }

    #[test]
    fn test_subtract_rect_from_polygon_areas_sum() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let pieces = subtract_rect_from_polygon(&square, &Rect::new(25.0, 25.0, 75.0, 75.0));
        let total: f64 = pieces.iter().map(|p| polygon_area(p).abs()).sum();
        assert!((total - (10000.0 - 2500.0)).abs() < 1e-6);
    }
}
