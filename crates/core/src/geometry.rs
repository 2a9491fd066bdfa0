use serde::Serialize;
use std::f64::consts::PI;

/// Radius of a single residue circle.
pub const RADIUS_CONST: f64 = 7.0;
/// Gap between two consecutive residue circles along a helix.
pub const SPACE_BETWEEN_RESIDUES: f64 = 5.0;
/// Helix width factor, in residue radii.
pub const DELTA_HELIX_WIDTH: f64 = 5.0;
/// Shift applied to phosphodiester bond endpoints.
pub const DELTA_PHOSPHO_SHIFT: f64 = 0.0;
/// Scale factor for Leontis-Westhof symbols.
pub const DELTA_LW_SYMBOLS: f64 = 1.2;

const TWO_PI: f64 = 2.0 * PI;

/// Drawn length of a helix of `n_pairs` base pairs.
pub fn helix_drawing_length(n_pairs: usize) -> f64 {
    let n = n_pairs.saturating_sub(1) as f64;
    n * RADIUS_CONST * 2.0 + n * SPACE_BETWEEN_RESIDUES
}

/// Drawn width of a helix (distance between its two strands).
pub fn helix_drawing_width() -> f64 {
    RADIUS_CONST * DELTA_HELIX_WIDTH
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    pub fn new(p1: Point, p2: Point) -> Self {
        Line { p1, p2 }
    }

    pub fn length(&self) -> f64 {
        distance(self.p1, self.p2)
    }
}

/// Axis-aligned rectangle, min corner to max corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Rect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut r = Rect::new(first.x, first.y, first.x, first.y);
        for p in it {
            r.min_x = r.min_x.min(p.x);
            r.min_y = r.min_y.min(p.y);
            r.max_x = r.max_x.max(p.x);
            r.max_y = r.max_y.max(p.y);
        }
        Some(r)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Grown by `d` on every side.
    pub fn inflated(&self, d: f64) -> Rect {
        Rect::new(self.min_x - d, self.min_y - d, self.max_x + d, self.max_y + d)
    }

    /// The four corners, clockwise from min.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

// ── Point helpers ───────────────────────────────────────────────────

pub fn distance(p1: Point, p2: Point) -> f64 {
    (p2.x - p1.x).hypot(p2.y - p1.y)
}

/// Both endpoints of segment p1p2 moved towards each other by `dist`.
/// A negative `dist` moves them outward, extending the segment.
pub fn points_from(p1: Point, p2: Point, dist: f64) -> (Point, Point) {
    let len = distance(p1, p2);
    if len == 0.0 {
        return (p1, p2);
    }
    let ux = (p2.x - p1.x) / len;
    let uy = (p2.y - p1.y) / len;
    (
        Point::new(p1.x + ux * dist, p1.y + uy * dist),
        Point::new(p2.x - ux * dist, p2.y - uy * dist),
    )
}

/// Angle at vertex `at` in the triangle (at, p2, p3), in degrees.
pub fn angle_from(at: Point, p2: Point, p3: Point) -> f64 {
    let a = distance(at, p2);
    let b = distance(at, p3);
    let opposite = distance(p2, p3);
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    let cos = ((a * a + b * b - opposite * opposite) / (2.0 * a * b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Z component of (p2 − shared) × (p3 − shared).
pub fn cross_product(shared: Point, p2: Point, p3: Point) -> f64 {
    (p2.x - shared.x) * (p3.y - shared.y) - (p2.y - shared.y) * (p3.x - shared.x)
}

/// The two points at distance `dist` from `p0` along the normal of p1p2.
pub fn get_perpendicular(p0: Point, p1: Point, p2: Point, dist: f64) -> (Point, Point) {
    let len = distance(p1, p2);
    if len == 0.0 {
        return (p0, p0);
    }
    let nx = -(p2.y - p1.y) / len;
    let ny = (p2.x - p1.x) / len;
    (
        Point::new(p0.x + nx * dist, p0.y + ny * dist),
        Point::new(p0.x - nx * dist, p0.y - ny * dist),
    )
}

/// Rotate `target` around `center`. Positive degrees rotate clockwise in
/// screen coordinates (y axis pointing down).
pub fn rotate_point(target: Point, center: Point, degrees: f64) -> Point {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    let dx = target.x - center.x;
    let dy = target.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

fn ccw(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// True when segments p1p2 and p3p4 properly cross.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}

pub fn circles_intersect(c1: Point, r1: f64, c2: Point, r2: f64) -> bool {
    distance(c1, c2) <= r1 + r2
}

pub fn circle_contains(center: Point, radius: f64, p: Point) -> bool {
    distance(center, p) <= radius
}

/// Circumference of a junction circle: each residue outside a helix slot
/// takes a residue diameter, each slot a full helix width.
pub fn circumference_of(len: usize, slots: usize) -> f64 {
    (len.saturating_sub(slots * 2)) as f64 * (RADIUS_CONST * 2.0)
        + slots as f64 * helix_drawing_width()
}

/// Radius of a junction circle with `len` residues and `slots` helix slots.
pub fn junction_radius(len: usize, slots: usize) -> f64 {
    circumference_of(len, slots) / TWO_PI
}

/// Alternate elements of `a` and `b`, starting with `a`, leftovers appended.
pub fn interleave<T: Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let common = a.len().min(b.len());
    for i in 0..common {
        out.push(a[i]);
        out.push(b[i]);
    }
    out.extend_from_slice(&a[common..]);
    out.extend_from_slice(&b[common..]);
    out
}
