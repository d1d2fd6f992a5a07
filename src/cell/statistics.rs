//! Running Gaussian statistics over 2D points.

use crate::core::{Point2D, SymMat2};
use serde::{Deserialize, Serialize};

/// Minimum number of points before mean and covariance are defined.
const MIN_POINTS: u64 = 3;

/// Running Gaussian over 2D points.
///
/// Stores the point count, the coordinate sums, and the sums of outer
/// products. Mean, covariance and information matrix are derived on
/// demand; the stored sums are always the exact sums of the inserted
/// points, so accumulation never loses information.
///
/// A cell is [`valid`](GaussianCell::valid) only once it has seen at
/// least three points and its covariance is positive-definite. Invalid
/// cells report no mean or covariance and sample to zero; they are never
/// regularized silently.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GaussianCell {
    num_points: u64,
    sum_x: f64,
    sum_y: f64,
    // Sums of outer products (symmetric, three entries)
    sum_xx: f64,
    sum_xy: f64,
    sum_yy: f64,
}

impl GaussianCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point to the running statistics
    #[inline]
    pub fn add(&mut self, p: Point2D) {
        self.num_points += 1;
        self.sum_x += p.x;
        self.sum_y += p.y;
        self.sum_xx += p.x * p.x;
        self.sum_xy += p.x * p.y;
        self.sum_yy += p.y * p.y;
    }

    /// Number of points accumulated
    #[inline]
    pub fn num_points(&self) -> u64 {
        self.num_points
    }

    /// Raw coordinate sums (for persistence)
    #[inline]
    pub fn sums(&self) -> Point2D {
        Point2D::new(self.sum_x, self.sum_y)
    }

    /// Raw sums of outer products (for persistence)
    #[inline]
    pub fn outer_sums(&self) -> SymMat2 {
        SymMat2::new(self.sum_xx, self.sum_xy, self.sum_yy)
    }

    /// Reconstruct a cell from persisted sums.
    pub fn from_sums(num_points: u64, sums: Point2D, outer_sums: SymMat2) -> Self {
        Self {
            num_points,
            sum_x: sums.x,
            sum_y: sums.y,
            sum_xx: outer_sums.xx,
            sum_xy: outer_sums.xy,
            sum_yy: outer_sums.yy,
        }
    }

    /// Sample mean, defined once three points have been seen
    #[inline]
    pub fn mean(&self) -> Option<Point2D> {
        if self.num_points < MIN_POINTS {
            return None;
        }
        let n = self.num_points as f64;
        Some(Point2D::new(self.sum_x / n, self.sum_y / n))
    }

    /// Unbiased sample covariance (N-1 denominator)
    #[inline]
    pub fn covariance(&self) -> Option<SymMat2> {
        if self.num_points < MIN_POINTS {
            return None;
        }
        let n = self.num_points as f64;
        let scale = 1.0 / (n - 1.0);
        Some(SymMat2::new(
            (self.sum_xx - self.sum_x * self.sum_x / n) * scale,
            (self.sum_xy - self.sum_x * self.sum_y / n) * scale,
            (self.sum_yy - self.sum_y * self.sum_y / n) * scale,
        ))
    }

    /// Information matrix (inverse covariance).
    ///
    /// `None` when the cell is invalid: fewer than three points, or a
    /// degenerate (non-positive-definite) covariance.
    #[inline]
    pub fn information(&self) -> Option<SymMat2> {
        self.covariance().and_then(|cov| cov.inverse())
    }

    /// Whether mean, covariance and information matrix are all defined
    #[inline]
    pub fn valid(&self) -> bool {
        self.covariance()
            .map(|cov| cov.is_positive_definite())
            .unwrap_or(false)
    }

    /// Normalized Gaussian density at `p`; 0 when the cell is invalid
    pub fn sample(&self, p: Point2D) -> f64 {
        let (Some(mean), Some(cov), Some(info)) = (self.mean(), self.covariance(), self.information())
        else {
            return 0.0;
        };
        let exponent = -0.5 * info.quadratic_form(p - mean);
        let norm = 1.0 / (2.0 * std::f64::consts::PI * cov.determinant().sqrt());
        norm * exponent.exp()
    }

    /// Gaussian density at `p` without the normalization constant;
    /// 0 when the cell is invalid
    pub fn sample_non_normalized(&self, p: Point2D) -> f64 {
        let (Some(mean), Some(info)) = (self.mean(), self.information()) else {
            return 0.0;
        };
        (-0.5 * info.quadratic_form(p - mean)).exp()
    }
}
