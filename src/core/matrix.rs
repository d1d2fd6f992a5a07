//! Symmetric 2x2 matrix for covariance and information matrices.

use super::point::Point2D;
use serde::{Deserialize, Serialize};

/// Determinant floor below which a covariance is treated as degenerate.
pub const DET_EPSILON: f64 = 1e-12;

/// Symmetric 2x2 matrix stored as its three independent entries.
///
/// ```text
/// | xx  xy |
/// | xy  yy |
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SymMat2 {
    /// Top-left entry
    pub xx: f64,
    /// Off-diagonal entry
    pub xy: f64,
    /// Bottom-right entry
    pub yy: f64,
}

impl SymMat2 {
    /// Create a new symmetric matrix
    #[inline]
    pub fn new(xx: f64, xy: f64, yy: f64) -> Self {
        Self { xx, xy, yy }
    }

    /// Determinant
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.xy
    }

    /// Trace
    #[inline]
    pub fn trace(&self) -> f64 {
        self.xx + self.yy
    }

    /// Positive-definiteness check with the determinant floor applied.
    ///
    /// Sylvester's criterion for 2x2: xx > 0 and det > 0.
    #[inline]
    pub fn is_positive_definite(&self) -> bool {
        self.xx > 0.0 && self.determinant() >= DET_EPSILON
    }

    /// Closed-form inverse.
    ///
    /// Returns `None` when the matrix is not positive-definite or its
    /// determinant is below [`DET_EPSILON`].
    #[inline]
    pub fn inverse(&self) -> Option<SymMat2> {
        if !self.is_positive_definite() {
            return None;
        }
        let det_inv = 1.0 / self.determinant();
        Some(SymMat2::new(
            self.yy * det_inv,
            -self.xy * det_inv,
            self.xx * det_inv,
        ))
    }

    /// Quadratic form `d^T M d`
    #[inline]
    pub fn quadratic_form(&self, d: Point2D) -> f64 {
        d.x * (self.xx * d.x + self.xy * d.y) + d.y * (self.xy * d.x + self.yy * d.y)
    }
}
