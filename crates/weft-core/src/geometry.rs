//! Geometric primitives for diagram layout and wire routing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//! - [`Segment`] - A straight line segment, with a strict intersection test
//!
//! # Coordinate System
//!
//! Weft uses the SVG coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X   (rank grows rightward)
//!     │
//!     │
//!     ▼
//!    +Y                   (track grows downward)
//! ```

/// Tolerance used by orientation tests so that touching endpoints and
/// collinear overlaps are never reported as crossings.
const EPSILON: f32 = 1e-4;

/// A 2D point in diagram coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Cross product of `(a - self)` and `(b - self)`.
    ///
    /// Positive when `self → a → b` turns counter-clockwise in a y-up frame.
    fn orientation(self, a: Point, b: Point) -> f32 {
        (a.x - self.x) * (b.y - self.y) - (a.y - self.y) * (b.x - self.x)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Merges two bounds into the smallest bounds containing both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use weft_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let b = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = a.merge(&b);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Expands the bounds outward by the given insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left(),
            min_y: self.min_y - insets.top(),
            max_x: self.max_x + insets.right(),
            max_y: self.max_y + insets.bottom(),
        }
    }
}

/// Spacing around an element with potentially different values for each side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates insets in CSS order: top, right, bottom, left.
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates insets with the same value on all four sides.
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }
}

/// A straight line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    start: Point,
    end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> Point {
        self.start
    }

    pub fn end(self) -> Point {
        self.end
    }

    /// Returns the crossing point when the two segments intersect strictly
    /// between their endpoints.
    ///
    /// Segments that merely touch (shared endpoint, T-junction on an
    /// endpoint) or overlap collinearly do not count.
    ///
    /// # Examples
    ///
    /// ```
    /// # use weft_core::geometry::{Point, Segment};
    /// let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    /// let b = Segment::new(Point::new(0.0, 10.0), Point::new(10.0, 0.0));
    /// let hit = a.crossing(b).unwrap();
    /// assert_eq!(hit.x(), 5.0);
    /// assert_eq!(hit.y(), 5.0);
    ///
    /// let touching = Segment::new(Point::new(10.0, 10.0), Point::new(20.0, 0.0));
    /// assert!(a.crossing(touching).is_none());
    /// ```
    pub fn crossing(self, other: Segment) -> Option<Point> {
        let d1 = other.start.orientation(other.end, self.start);
        let d2 = other.start.orientation(other.end, self.end);
        let d3 = self.start.orientation(self.end, other.start);
        let d4 = self.start.orientation(self.end, other.end);

        let straddles = |a: f32, b: f32| (a > EPSILON && b < -EPSILON) || (a < -EPSILON && b > EPSILON);
        if !(straddles(d1, d2) && straddles(d3, d4)) {
            return None;
        }

        let t = d1 / (d1 - d2);
        Some(Point::new(
            self.start.x + t * (self.end.x - self.start.x),
            self.start.y + t * (self.end.y - self.start.y),
        ))
    }

    /// Returns the midpoint of the stretch two axis-aligned segments share.
    ///
    /// Both segments must be horizontal on the same line, or vertical on the
    /// same line, and share more than a single point. Everything
    /// [`Segment::crossing`] rejects as collinear lands here instead.
    ///
    /// ```
    /// # use weft_core::geometry::{Point, Segment};
    /// let a = Segment::new(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
    /// let b = Segment::new(Point::new(16.0, 5.0), Point::new(6.0, 5.0));
    /// assert_eq!(a.overlap(b), Some(Point::new(8.0, 5.0)));
    /// ```
    pub fn overlap(self, other: Segment) -> Option<Point> {
        let level = |a: f32, b: f32| (a - b).abs() <= EPSILON;
        let shared = |a: (f32, f32), b: (f32, f32)| {
            let low = a.0.min(a.1).max(b.0.min(b.1));
            let high = a.0.max(a.1).min(b.0.max(b.1));
            (high - low > EPSILON).then_some((low + high) / 2.0)
        };

        let horizontal = |s: Segment| level(s.start.y, s.end.y) && !level(s.start.x, s.end.x);
        let vertical = |s: Segment| level(s.start.x, s.end.x) && !level(s.start.y, s.end.y);

        if horizontal(self) && horizontal(other) && level(self.start.y, other.start.y) {
            let x = shared((self.start.x, self.end.x), (other.start.x, other.end.x))?;
            return Some(Point::new(x, self.start.y));
        }
        if vertical(self) && vertical(other) && level(self.start.x, other.start.x) {
            let y = shared((self.start.y, self.end.y), (other.start.y, other.end.y))?;
            return Some(Point::new(self.start.x, y));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_with_y_keeps_x() {
        let p = Point::new(3.0, 4.0).with_y(6.0);
        assert_eq!(p, Point::new(3.0, 6.0));
    }

    #[test]
    fn test_bounds_new_from_top_left() {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(30.0, 40.0));
        assert_eq!(bounds.min_x(), 10.0);
        assert_eq!(bounds.min_y(), 20.0);
        assert_eq!(bounds.max_x(), 40.0);
        assert_eq!(bounds.max_y(), 60.0);
        assert_eq!(bounds.center(), Point::new(25.0, 40.0));
        assert_eq!(bounds.width(), 30.0);
    }

    #[test]
    fn test_bounds_padding() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let padded = bounds.add_padding(Insets::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(padded.min_x(), -4.0);
        assert_eq!(padded.min_y(), -1.0);
        assert_eq!(padded.width(), 16.0);
        assert_eq!(padded.height(), 14.0);
    }

    #[test]
    fn test_size_max() {
        assert_eq!(
            Size::new(1.0, 8.0).max(Size::new(4.0, 2.0)),
            Size::new(4.0, 8.0)
        );
    }

    #[test]
    fn test_segment_crossing_proper() {
        let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = Segment::new(Point::new(5.0, -5.0), Point::new(5.0, 5.0));
        assert_eq!(a.crossing(b), Some(Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_segment_crossing_ignores_shared_endpoint() {
        let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = Segment::new(Point::new(10.0, 0.0), Point::new(10.0, 10.0));
        assert!(a.crossing(b).is_none());
    }

    #[test]
    fn test_segment_crossing_ignores_t_junction() {
        let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = Segment::new(Point::new(5.0, 0.0), Point::new(5.0, 10.0));
        assert!(a.crossing(b).is_none());
    }

    #[test]
    fn test_segment_crossing_ignores_collinear_overlap() {
        let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = Segment::new(Point::new(5.0, 0.0), Point::new(15.0, 0.0));
        assert!(a.crossing(b).is_none());
    }

    #[test]
    fn test_segment_overlap_horizontal() {
        let a = Segment::new(Point::new(156.0, 120.0), Point::new(204.0, 120.0));
        let b = Segment::new(Point::new(180.0, 120.0), Point::new(228.0, 120.0));
        assert_eq!(a.overlap(b), Some(Point::new(192.0, 120.0)));
        assert_eq!(b.overlap(a), Some(Point::new(192.0, 120.0)));
    }

    #[test]
    fn test_segment_overlap_vertical() {
        let a = Segment::new(Point::new(3.0, 0.0), Point::new(3.0, 10.0));
        let b = Segment::new(Point::new(3.0, 8.0), Point::new(3.0, 4.0));
        assert_eq!(a.overlap(b), Some(Point::new(3.0, 6.0)));
    }

    #[test]
    fn test_segment_overlap_needs_shared_length() {
        let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let touching = Segment::new(Point::new(10.0, 0.0), Point::new(20.0, 0.0));
        let parallel = Segment::new(Point::new(0.0, 1.0), Point::new(10.0, 1.0));
        let across = Segment::new(Point::new(5.0, -5.0), Point::new(5.0, 5.0));
        assert!(a.overlap(touching).is_none());
        assert!(a.overlap(parallel).is_none());
        assert!(a.overlap(across).is_none());
    }

    #[test]
    fn test_segment_parallel_no_crossing() {
        let a = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = Segment::new(Point::new(0.0, 1.0), Point::new(10.0, 1.0));
        assert!(a.crossing(b).is_none());
    }
}
