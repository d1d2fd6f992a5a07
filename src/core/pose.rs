//! Planar rigid transform (map origin, robot pose).

use super::point::Point2D;
use serde::{Deserialize, Serialize};

/// Planar rigid transform: translation plus CCW rotation.
///
/// Used both as the map's world-to-map origin and as a robot pose.
/// Angles are in radians, counter-clockwise positive from +X.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Pose2D {
    /// X translation in meters
    pub x: f64,
    /// Y translation in meters
    pub y: f64,
    /// Rotation in radians (CCW positive from +X)
    pub theta: f64,
}

impl Pose2D {
    /// Create a new transform
    #[inline]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    /// Identity transform
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Get the translation as a point
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Apply the transform to a point: `R(theta) * p + t`
    #[inline]
    pub fn transform_point(&self, p: Point2D) -> Point2D {
        let cos_t = self.theta.cos();
        let sin_t = self.theta.sin();

        Point2D::new(
            self.x + p.x * cos_t - p.y * sin_t,
            self.y + p.x * sin_t + p.y * cos_t,
        )
    }

    /// Apply the inverse transform to a point
    #[inline]
    pub fn inverse_transform_point(&self, p: Point2D) -> Point2D {
        let cos_t = self.theta.cos();
        let sin_t = self.theta.sin();

        let dx = p.x - self.x;
        let dy = p.y - self.y;

        Point2D::new(dx * cos_t + dy * sin_t, -dx * sin_t + dy * cos_t)
    }

    /// Compose two transforms: `self * other`.
    ///
    /// Applies `other` in `self`'s frame.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let translated = self.transform_point(other.position());
        Pose2D::new(
            translated.x,
            translated.y,
            normalize_angle(self.theta + other.theta),
        )
    }

    /// Inverse of this transform
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let cos_t = self.theta.cos();
        let sin_t = self.theta.sin();

        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            normalize_angle(-self.theta),
        )
    }
}

impl PartialEq for Pose2D {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < 1e-9
            && (self.y - other.y).abs() < 1e-9
            && normalize_angle(self.theta - other.theta).abs() < 1e-9
    }
}

/// Normalize an angle to [-pi, pi)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut a = angle % two_pi;
    if a >= std::f64::consts::PI {
        a -= two_pi;
    } else if a < -std::f64::consts::PI {
        a += two_pi;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transform() {
        let t = Pose2D::identity();
        let p = Point2D::new(3.0, -2.0);
        assert_eq!(t.transform_point(p), p);
        assert_eq!(t.inverse_transform_point(p), p);
    }

    #[test]
    fn test_transform_round_trip() {
        let t = Pose2D::new(1.5, -0.5, 0.7);
        let p = Point2D::new(3.0, 4.0);

        let q = t.transform_point(p);
        let back = t.inverse_transform_point(q);

        assert_relative_eq!(back.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_matches_inverse_transform() {
        let t = Pose2D::new(-2.0, 1.0, -1.2);
        let p = Point2D::new(0.3, 0.9);

        let a = t.inverse_transform_point(p);
        let b = t.inverse().transform_point(p);

        assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let t = Pose2D::new(1.5, -0.5, 0.7);
        let composed = t.compose(&t.inverse());

        assert_relative_eq!(composed.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(composed.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(composed.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_matches_chained_transforms() {
        let a = Pose2D::new(0.5, 1.0, 0.3);
        let b = Pose2D::new(-1.0, 2.0, -0.8);
        let p = Point2D::new(0.7, -0.4);

        let chained = a.transform_point(b.transform_point(p));
        let composed = a.compose(&b).transform_point(p);

        assert_relative_eq!(chained.x, composed.x, epsilon = 1e-12);
        assert_relative_eq!(chained.y, composed.y, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_angle() {
        let pi = std::f64::consts::PI;
        assert_relative_eq!(normalize_angle(3.0 * pi), -pi, epsilon = 1e-9);
        assert_relative_eq!(normalize_angle(pi / 2.0), pi / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-pi / 2.0), -pi / 2.0, epsilon = 1e-12);
    }
}
