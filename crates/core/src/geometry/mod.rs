use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Number of sides sampled for a hexagon outline.
pub const HEXAGON_SIDES: usize = 6;

/// Position on the drawing surface. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds of a set of vertices, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extents {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Computes the bounds of `vertices`. An empty slice yields a degenerate
    /// box at the origin.
    pub fn from_vertices(vertices: &[Point]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(0.0, 0.0, 0.0, 0.0);
        };

        vertices.iter().skip(1).fold(
            Self::new(first.x, first.x, first.y, first.y),
            |acc, v| Self {
                min_x: acc.min_x.min(v.x),
                max_x: acc.max_x.max(v.x),
                min_y: acc.min_y.min(v.y),
                max_y: acc.max_y.max(v.y),
            },
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }
}

/// Outline category of a drawn key. Fixes the vertex count and order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Regular hexagon, vertices at `i * 60°` starting on the positive x axis.
    HexSix,
    /// White key whose upper right corner is cut away for the next black key.
    WhiteRightNotch,
    /// White key whose upper left corner is cut away for the previous black key.
    WhiteLeftNotch,
    /// Plain white rectangle.
    WhiteNoNotch,
    /// White key cut on both upper corners (a T shape).
    WhiteBothNotch,
    /// Narrow, short rectangle centred on a white key boundary.
    BlackKey,
}

impl ShapeKind {
    /// Number of vertices produced for this kind. Outlines are stored open;
    /// the closing edge back to vertex 0 is implied.
    pub fn vertex_count(self) -> usize {
        match self {
            ShapeKind::HexSix => HEXAGON_SIDES,
            ShapeKind::WhiteRightNotch | ShapeKind::WhiteLeftNotch => 6,
            ShapeKind::WhiteNoNotch | ShapeKind::BlackKey => 4,
            ShapeKind::WhiteBothNotch => 8,
        }
    }

    pub fn is_black(self) -> bool {
        matches!(self, ShapeKind::BlackKey)
    }

    /// Whether placing a key of this kind moves the horizontal cursor.
    pub fn advances_cursor(self) -> bool {
        !matches!(self, ShapeKind::BlackKey | ShapeKind::HexSix)
    }

    /// Picks the key outline for pitch class `index % 12`.
    ///
    /// The last key drawn has no black key after it, so a notch on its right
    /// side would cut into empty space and is dropped.
    pub fn for_pitch_class(index: usize, is_last: bool) -> Self {
        match index % 12 {
            1 | 3 | 6 | 8 | 10 => ShapeKind::BlackKey,
            0 | 5 if is_last => ShapeKind::WhiteNoNotch,
            0 | 5 => ShapeKind::WhiteRightNotch,
            2 | 7 | 9 if is_last => ShapeKind::WhiteLeftNotch,
            2 | 7 | 9 => ShapeKind::WhiteBothNotch,
            _ => ShapeKind::WhiteLeftNotch,
        }
    }
}

/// Sizes every key outline is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyDimensions {
    pub white_width: f64,
    pub white_height: f64,
    pub black_width: f64,
    pub black_height: f64,
}

impl Default for KeyDimensions {
    fn default() -> Self {
        Self {
            white_width: 60.0,
            white_height: 300.0,
            black_width: 36.0,
            black_height: 210.0,
        }
    }
}

/// A polygon ready to be stroked and hit-tested. Its fill colour depends on
/// interaction state and lives on [`crate::layout::KeyEntry`].
///
/// The vertex order is part of the contract with [`crate::hit`]: the
/// decomposition into rectangles reads specific vertices per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub vertices: Vec<Point>,
    pub extents: Extents,
    pub label: String,
    pub key: Option<char>,
}

impl Shape {
    fn new(kind: ShapeKind, vertices: Vec<Point>, label: String) -> Self {
        debug_assert_eq!(vertices.len(), kind.vertex_count());
        let extents = Extents::from_vertices(&vertices);
        Self {
            kind,
            vertices,
            extents,
            label,
            key: None,
        }
    }

    /// Binds a keyboard character to the shape.
    pub fn with_key(mut self, key: Option<char>) -> Self {
        self.key = key;
        self
    }
}

/// Builds the outline of a piano key with its top left corner at `origin`.
/// Every vertex lies inside the key's own width and height from there.
pub fn build_key(
    kind: ShapeKind,
    origin: Point,
    dims: &KeyDimensions,
    label: impl Into<String>,
) -> Shape {
    let Point { x, y } = origin;
    let w = dims.white_width;
    let h = dims.white_height;
    let bw = dims.black_width;
    let half_black = bw / 2.0;
    let bh = dims.black_height;

    let vertices = match kind {
        ShapeKind::WhiteRightNotch => vec![
            Point::new(x, y),
            Point::new(x + w - half_black, y),
            Point::new(x + w - half_black, y + bh),
            Point::new(x + w, y + bh),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ],
        ShapeKind::WhiteLeftNotch => vec![
            Point::new(x + half_black, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
            Point::new(x, y + bh),
            Point::new(x + half_black, y + bh),
        ],
        ShapeKind::WhiteNoNotch => vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ],
        ShapeKind::WhiteBothNotch => vec![
            Point::new(x + half_black, y),
            Point::new(x + w - half_black, y),
            Point::new(x + w - half_black, y + bh),
            Point::new(x + w, y + bh),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
            Point::new(x, y + bh),
            Point::new(x + half_black, y + bh),
        ],
        ShapeKind::BlackKey => vec![
            Point::new(x, y),
            Point::new(x + bw, y),
            Point::new(x + bw, y + bh),
            Point::new(x, y + bh),
        ],
        // A hexagon has no key origin; treat the origin as its centre with a
        // radius of half a white key.
        ShapeKind::HexSix => hexagon_vertices(origin, w / 2.0),
    };

    Shape::new(kind, vertices, label.into())
}

/// Builds a regular hexagon of radius `size` around `center`.
pub fn build_hexagon(
    center: Point,
    size: f64,
    label: impl Into<String>,
    key: Option<char>,
) -> Shape {
    Shape::new(
        ShapeKind::HexSix,
        hexagon_vertices(center, size),
        label.into(),
    )
    .with_key(key)
}

fn hexagon_vertices(center: Point, size: f64) -> Vec<Point> {
    (0..HEXAGON_SIDES)
        .map(|i| {
            let angle = i as f64 * 2.0 * PI / HEXAGON_SIDES as f64;
            Point::new(center.x + size * angle.cos(), center.y + size * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: [ShapeKind; 5] = [
        ShapeKind::WhiteRightNotch,
        ShapeKind::WhiteLeftNotch,
        ShapeKind::WhiteNoNotch,
        ShapeKind::WhiteBothNotch,
        ShapeKind::BlackKey,
    ];

    #[test]
    fn key_vertex_counts_match_topology() {
        let dims = KeyDimensions::default();
        for kind in ALL_KEYS {
            let shape = build_key(kind, Point::new(10.0, 20.0), &dims, "x");
            assert_eq!(shape.vertices.len(), kind.vertex_count(), "{kind:?}");
        }
    }

    #[test]
    fn white_key_vertices_stay_inside_footprint() {
        let dims = KeyDimensions::default();
        let origin = Point::new(100.0, 10.0);
        for kind in &ALL_KEYS[..4] {
            let shape = build_key(*kind, origin, &dims, "");
            for v in &shape.vertices {
                assert!(v.x >= origin.x && v.x <= origin.x + dims.white_width);
                assert!(v.y >= origin.y && v.y <= origin.y + dims.white_height);
            }
            assert_eq!(shape.extents.width(), dims.white_width);
            assert_eq!(shape.extents.height(), dims.white_height);
        }
    }

    #[test]
    fn black_key_vertices_stay_inside_footprint() {
        let dims = KeyDimensions::default();
        let origin = Point::new(100.0, 10.0);
        let shape = build_key(ShapeKind::BlackKey, origin, &dims, "");
        for v in &shape.vertices {
            assert!(v.x >= origin.x && v.x <= origin.x + dims.black_width);
            assert!(v.y >= origin.y && v.y <= origin.y + dims.black_height);
        }
    }

    #[test]
    fn black_key_is_narrow_and_short() {
        let dims = KeyDimensions::default();
        let shape = build_key(ShapeKind::BlackKey, Point::new(42.0, 10.0), &dims, "");

        assert_eq!(shape.extents, Extents::new(42.0, 78.0, 10.0, 220.0));
    }

    #[test]
    fn notches_leave_room_for_half_a_black_key() {
        let dims = KeyDimensions::default();
        let shape = build_key(ShapeKind::WhiteBothNotch, Point::new(0.0, 0.0), &dims, "");

        assert_eq!(shape.vertices[0], Point::new(18.0, 0.0));
        assert_eq!(shape.vertices[1], Point::new(42.0, 0.0));
        assert_eq!(shape.vertices[3], Point::new(60.0, 210.0));
        assert_eq!(shape.vertices[7], Point::new(18.0, 210.0));
    }

    #[test]
    fn pitch_classes_pick_expected_outlines() {
        let kinds: Vec<_> = (0..12)
            .map(|i| ShapeKind::for_pitch_class(i, false))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::WhiteRightNotch,
                ShapeKind::BlackKey,
                ShapeKind::WhiteBothNotch,
                ShapeKind::BlackKey,
                ShapeKind::WhiteLeftNotch,
                ShapeKind::WhiteRightNotch,
                ShapeKind::BlackKey,
                ShapeKind::WhiteBothNotch,
                ShapeKind::BlackKey,
                ShapeKind::WhiteBothNotch,
                ShapeKind::BlackKey,
                ShapeKind::WhiteLeftNotch,
            ]
        );
    }

    #[test]
    fn last_key_drops_its_right_notch() {
        assert_eq!(ShapeKind::for_pitch_class(12, true), ShapeKind::WhiteNoNotch);
        assert_eq!(ShapeKind::for_pitch_class(5, true), ShapeKind::WhiteNoNotch);
        assert_eq!(ShapeKind::for_pitch_class(7, true), ShapeKind::WhiteLeftNotch);
        assert_eq!(ShapeKind::for_pitch_class(4, true), ShapeKind::WhiteLeftNotch);
        assert_eq!(ShapeKind::for_pitch_class(11, true), ShapeKind::WhiteLeftNotch);
    }

    #[test]
    fn hexagon_samples_six_vertices_on_the_circle() {
        let center = Point::new(50.0, 40.0);
        let shape = build_hexagon(center, 20.0, "440.00", Some('q'));

        assert_eq!(shape.vertices.len(), 6);
        assert_eq!(shape.key, Some('q'));
        for v in &shape.vertices {
            let r = ((v.x - center.x).powi(2) + (v.y - center.y).powi(2)).sqrt();
            assert!((r - 20.0).abs() < 1e-9);
        }
        assert!((shape.extents.width() - 40.0).abs() < 1e-9);
        assert!((shape.extents.height() - 20.0 * 3f64.sqrt()).abs() < 1e-9);
    }
}
