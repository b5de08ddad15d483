//! Plain geometry shared by the layout engines, router and label placer.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Point) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= 1e-4 && (self.y - other.y).abs() <= 1e-4
    }

    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square box of side `2 * radius` around a circle centre.
    pub fn around(center: Point, radius: f32) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn inflate(&self, padding: f32) -> Rect {
        Rect::new(
            self.x - padding,
            self.y - padding,
            self.width + padding * 2.0,
            self.height + padding * 2.0,
        )
    }

    /// Closed-interval containment: points on the border count as inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Open-interval overlap: rectangles that only touch do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Bounding box of a segment, at least one unit thick, grown by `padding`.
    pub fn from_segment(a: Point, b: Point, padding: f32) -> Rect {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        let width = (a.x - b.x).abs().max(1.0);
        let height = (a.y - b.y).abs().max(1.0);
        Rect::new(min_x, min_y, width, height).inflate(padding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Evaluation order of the anchor search.
    pub const SEARCH_ORDER: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn normal(self) -> (f32, f32) {
        match self {
            Side::Top => (0.0, -1.0),
            Side::Right => (1.0, 0.0),
            Side::Bottom => (0.0, 1.0),
            Side::Left => (-1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// A connector endpoint on a rectangle boundary.
///
/// `side` is `None` for free-floating endpoints; those get no stub and no
/// preferred first direction when routed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub side: Option<Side>,
}

impl Anchor {
    pub fn new(x: f32, y: f32, side: Side) -> Self {
        Self {
            x,
            y,
            side: Some(side),
        }
    }

    pub fn free(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            side: None,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn normal(&self) -> (f32, f32) {
        self.side.map(Side::normal).unwrap_or((0.0, 0.0))
    }

    pub fn shifted(&self, dx: f32, dy: f32) -> Anchor {
        Anchor {
            x: self.x + dx,
            y: self.y + dy,
            side: self.side,
        }
    }
}

/// A rectangle the router must avoid, tagged with the node that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub owner: String,
    pub rect: Rect,
}

impl Obstacle {
    pub fn new(owner: impl Into<String>, rect: Rect) -> Self {
        Self {
            owner: owner.into(),
            rect,
        }
    }
}

/// Obstacles minus the ones owned by the edge's own endpoints.
pub fn obstacles_excluding(obstacles: &[Obstacle], owners: &[&str]) -> Vec<Obstacle> {
    obstacles
        .iter()
        .filter(|obs| !owners.contains(&obs.owner.as_str()))
        .cloned()
        .collect()
}
