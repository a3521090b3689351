//! Planar geometric primitives.

use cgmath::Vector4;
use mint;

use Matrix;

/// Axis-aligned rectangle given by its bottom-left origin and its size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Extent along the X axis.
    pub width: f32,
    /// Extent along the Y axis.
    pub height: f32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const ZERO: Rect = Rect { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    /// Create a rectangle from its origin and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    /// Smallest rectangle containing all the given points, `None` for no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = mint::Point2<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Left edge.
    pub fn min_x(&self) -> f32 {
        self.x
    }

    /// Bottom edge.
    pub fn min_y(&self) -> f32 {
        self.y
    }

    /// Right edge.
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Corners in counter-clockwise order, starting from the origin.
    pub fn corners(&self) -> [mint::Point2<f32>; 4] {
        [
            [self.min_x(), self.min_y()].into(),
            [self.max_x(), self.min_y()].into(),
            [self.max_x(), self.max_y()].into(),
            [self.min_x(), self.max_y()].into(),
        ]
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Checks if the point lies inside the rectangle, edges included.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// Maps the rectangle through an affine transform and returns the
    /// axis-aligned bounds of the result.
    pub fn apply_transform(&self, transform: &Matrix) -> Rect {
        let mapped = self.corners().iter().map(|c| transform_point(transform, *c)).collect::<Vec<_>>();
        Rect::from_points(mapped).unwrap_or(Rect::ZERO)
    }
}

/// Maps a point of the XY plane through a transform.
pub fn transform_point(
    transform: &Matrix,
    point: mint::Point2<f32>,
) -> mint::Point2<f32> {
    let v = transform * Vector4::new(point.x, point.y, 0.0, 1.0);
    [v.x, v.y].into()
}
