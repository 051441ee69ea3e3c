//! Point containment for the outlines produced by [`crate::geometry`].

use crate::geometry::{Extents, Point, Shape, ShapeKind};

/// Axis-aligned pieces a key outline is made of. Notches are right-angled,
/// so one or two rectangles describe every key exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Single(Extents),
    Pair(Extents, Extents),
}

impl Region {
    pub fn contains(&self, point: Point) -> bool {
        match self {
            Region::Single(rect) => rect.contains(point),
            Region::Pair(upper, lower) => upper.contains(point) || lower.contains(point),
        }
    }
}

/// Returns `true` when `point` lies inside `shape` (edges included).
pub fn contains(point: Point, shape: &Shape) -> bool {
    if !shape.extents.contains(point) {
        return false;
    }

    match key_region(shape) {
        Some(region) => region.contains(point),
        None => hexagon_contains(point, shape),
    }
}

/// Splits a key outline into its rectangles. Hexagons have no rectangular
/// decomposition and yield `None`.
pub fn key_region(shape: &Shape) -> Option<Region> {
    let v = &shape.vertices;
    if v.len() != shape.kind.vertex_count() {
        return Some(Region::Single(shape.extents));
    }

    let rect = |left: Point, right: Point, top: f64, bottom: f64| {
        Extents::new(left.x, right.x, top, bottom)
    };

    let region = match shape.kind {
        ShapeKind::HexSix => return None,
        ShapeKind::WhiteNoNotch | ShapeKind::BlackKey => Region::Single(shape.extents),
        // upper left, upper right, inner middle, outer middle, lower right, lower left
        ShapeKind::WhiteRightNotch => Region::Pair(
            rect(v[0], v[1], v[0].y, v[5].y),
            rect(v[2], v[3], v[3].y, v[4].y),
        ),
        // upper left, upper right, lower right, lower left, middle left, middle right
        ShapeKind::WhiteLeftNotch => Region::Pair(
            rect(v[0], v[1], v[0].y, v[2].y),
            rect(v[4], v[5], v[4].y, v[3].y),
        ),
        // The upper stem sits between both notches, the lower bar spans the
        // full key width. Together they cover the whole T.
        ShapeKind::WhiteBothNotch => Region::Pair(
            rect(v[0], v[1], v[0].y, v[2].y),
            rect(v[6], v[3], v[3].y, v[4].y),
        ),
    };

    Some(region)
}

/// Hexagon test: bounding box reject, inner rectangle accept, then compare
/// against the slanted edge on the point's side.
fn hexagon_contains(point: Point, shape: &Shape) -> bool {
    let v = &shape.vertices;
    if v.len() != ShapeKind::HexSix.vertex_count() {
        return shape.extents.contains(point);
    }

    // Vertices 2 and 1 bound the flat bottom edge, their x values frame the
    // inner rectangle.
    if point.x >= v[2].x && point.x <= v[1].x {
        return true;
    }

    let mid = shape.extents.center();
    let below = point.y > mid.y;

    if point.x < mid.x {
        let end = if below { v[2] } else { v[4] };
        point.x >= edge_x_at(v[3], end, point.y)
    } else {
        let end = if below { v[1] } else { v[5] };
        point.x <= edge_x_at(v[0], end, point.y)
    }
}

/// X coordinate of the edge `a -> b` on the scanline `y`.
fn edge_x_at(a: Point, b: Point, y: f64) -> f64 {
    let dy = b.y - a.y;
    if dy.abs() <= f64::EPSILON {
        return a.x.min(b.x);
    }

    let t = ((y - a.y) / dy).clamp(0.0, 1.0);
    a.x + (b.x - a.x) * t
}
