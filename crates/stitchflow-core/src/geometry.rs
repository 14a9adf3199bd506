//! Geometric primitives for canvas positions and rendered label extents.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in canvas space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangle reported by the rendering surface
//!
//! # Coordinate System
//!
//! Canvas coordinates follow the rendering surface:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Part node positions are their top-left corner; connector positions are the
//! anchor point of the group's label.

use serde::{Deserialize, Serialize};

/// A 2D point in canvas coordinate space.
///
/// # Examples
///
/// ```
/// # use stitchflow_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
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

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the arithmetic mean of `points`, or `None` when empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stitchflow_core::geometry::Point;
    /// let c = Point::centroid([Point::new(0.0, 0.0), Point::new(10.0, 20.0)]).unwrap();
    /// assert_eq!(c, Point::new(5.0, 10.0));
    ///
    /// assert!(Point::centroid([]).is_none());
    /// ```
    pub fn centroid(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let (sum, count) = points
            .into_iter()
            .fold((Point::default(), 0usize), |(sum, count), p| {
                (sum.add_point(p), count + 1)
            });
        (count > 0).then(|| sum.scale(1.0 / count as f32))
    }
}

/// Width and height of an element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
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

    /// Returns the point at half width and half height.
    pub fn half(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A rectangular bounding box with minimum and maximum coordinates
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

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns true when both width and height are strictly positive.
    ///
    /// A label that has not been laid out yet reports zero extent.
    pub fn has_extent(self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Merges two bounds into the smallest bounds containing both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stitchflow_core::geometry::{Bounds, Point, Size};
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
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_add() {
        let p1 = Point::new(1.0, 2.0);
        let p2 = Point::new(3.0, 4.0);

        assert_eq!(p1.add_point(p2), Point::new(4.0, 6.0));
    }

    #[test]
    fn test_centroid_of_three_points() {
        let c = Point::centroid([
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(0.0, 30.0),
        ])
        .unwrap();

        assert_approx_eq!(f32, c.x(), 10.0);
        assert_approx_eq!(f32, c.y(), 10.0);
    }

    #[test]
    fn test_size_half() {
        assert_eq!(Size::new(140.0, 60.0).half(), Point::new(70.0, 30.0));
    }

    #[test]
    fn test_bounds_from_top_left() {
        let bounds = Bounds::new_from_top_left(Point::new(40.0, 45.0), Size::new(20.0, 10.0));

        assert_approx_eq!(f32, bounds.width(), 20.0);
        assert_approx_eq!(f32, bounds.height(), 10.0);
        assert_eq!(bounds.center(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_bounds_has_extent() {
        let rendered = Bounds::new_from_top_left(Point::new(5.0, 5.0), Size::new(40.0, 16.0));
        let pending = Bounds::new_from_top_left(Point::new(5.0, 5.0), Size::new(0.0, 16.0));

        assert!(rendered.has_extent());
        assert!(!pending.has_extent());
        assert!(!Bounds::default().has_extent());
    }

    #[test]
    fn test_bounds_merge_center() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::new_from_top_left(Point::new(30.0, 30.0), Size::new(10.0, 10.0));

        assert_eq!(a.merge(&b).center(), Point::new(20.0, 20.0));
    }
}
