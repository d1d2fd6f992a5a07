//! Point and index types for the bundle grid.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// 2D point in meters (world or map frame, f64).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters (forward in ROS convention)
    pub x: f64,
    /// Y coordinate in meters (left in ROS convention)
    pub y: f64,
}

impl Point2D {
    /// Zero point (origin)
    pub const ZERO: Point2D = Point2D { x: 0.0, y: 0.0 };

    /// Create a new point
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (faster, avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Vector length (distance from the origin)
    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Point2D::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Point2D::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Point2D::new(self.x * scalar, self.y * scalar)
    }
}

/// Integer index of a bundle or storey cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellIndex {
    /// X index (column)
    pub x: i32,
    /// Y index (row)
    pub y: i32,
}

impl CellIndex {
    /// Create a new cell index
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared integer distance to another index
    #[inline]
    pub fn distance_squared(&self, other: &CellIndex) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Componentwise Euclidean division (quotient rounds toward
    /// negative infinity, so negative indices stay consistent)
    #[inline]
    pub fn div_euclid(&self, rhs: i32) -> CellIndex {
        CellIndex::new(self.x.div_euclid(rhs), self.y.div_euclid(rhs))
    }

    /// Componentwise Euclidean remainder (always non-negative for a
    /// positive divisor)
    #[inline]
    pub fn rem_euclid(&self, rhs: i32) -> CellIndex {
        CellIndex::new(self.x.rem_euclid(rhs), self.y.rem_euclid(rhs))
    }

    /// Componentwise minimum
    #[inline]
    pub fn min_components(&self, other: &CellIndex) -> CellIndex {
        CellIndex::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Componentwise maximum
    #[inline]
    pub fn max_components(&self, other: &CellIndex) -> CellIndex {
        CellIndex::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl Add for CellIndex {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        CellIndex::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for CellIndex {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        CellIndex::new(self.x - other.x, self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert_eq!(a.distance_squared(&b), 25.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(0.5, -1.0);
        assert_eq!(a + b, Point2D::new(1.5, 1.0));
        assert_eq!(a - b, Point2D::new(0.5, 3.0));
        assert_eq!(b * 2.0, Point2D::new(1.0, -2.0));
    }

    #[test]
    fn test_index_distance_squared() {
        let a = CellIndex::new(0, 0);
        let b = CellIndex::new(3, 4);
        assert_eq!(a.distance_squared(&b), 25);
        assert_eq!(b.distance_squared(&a), 25);
    }

    #[test]
    fn test_index_euclidean_div_rem() {
        let a = CellIndex::new(5, 4);
        assert_eq!(a.div_euclid(2), CellIndex::new(2, 2));
        assert_eq!(a.rem_euclid(2), CellIndex::new(1, 0));

        // Negative indices round toward negative infinity
        let b = CellIndex::new(-1, -4);
        assert_eq!(b.div_euclid(2), CellIndex::new(-1, -2));
        assert_eq!(b.rem_euclid(2), CellIndex::new(1, 0));
    }

    #[test]
    fn test_index_min_max() {
        let a = CellIndex::new(-2, 5);
        let b = CellIndex::new(1, -3);
        assert_eq!(a.min_components(&b), CellIndex::new(-2, -3));
        assert_eq!(a.max_components(&b), CellIndex::new(1, 5));
    }
}
