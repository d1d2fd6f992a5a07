//! Direct NDT scan-match cost.
//!
//! Evaluates `1 - s(q)` where `s` is the occupancy-weighted Gaussian
//! mixture of the bundle containing the query. The minimum of the cost
//! sits where the query aligns with mapped structure, so the functor
//! plugs straight into a nonlinear least-squares solver as a value (and,
//! through [`Jet`](crate::core::Jet) inputs, gradient) oracle.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::{CellIndex, Point2D, Real};
use crate::grid::map::{Bundle, BundleGrid, STOREY_WEIGHT};
use crate::sensor::InverseModel;

/// Direct scan-match cost over a [`BundleGrid`].
///
/// The functor never allocates map cells: bundle lookups go through a
/// small per-functor cache of resolved bundles, and a query outside any
/// allocated region scores the neutral value 1. The map and the inverse
/// model must outlive the functor.
pub struct NdtCost<'a> {
    map: &'a BundleGrid,
    model: &'a InverseModel,
    cache: Mutex<HashMap<CellIndex, Option<Bundle>>>,
}

impl<'a> NdtCost<'a> {
    /// Create a cost functor over a map and an inverse sensor model.
    pub fn new(map: &'a BundleGrid, model: &'a InverseModel) -> Self {
        Self {
            map,
            model,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn bundle(&self, bi: CellIndex) -> Option<Bundle> {
        let mut cache = self.cache.lock();
        cache
            .entry(bi)
            .or_insert_with(|| self.map.try_bundle_at(bi))
            .clone()
    }

    /// Evaluate the cost at a query vector.
    ///
    /// The query is zero-padded to 2D. The scalar type chooses the
    /// evaluation: `f64` yields the plain value, [`Jet`](crate::core::Jet)
    /// additionally carries exact partials. Bundle selection always uses
    /// the scalar parts, so derivatives are taken with the cell's mean and
    /// information matrix held fixed; they are valid wherever the bundle
    /// index is stable, i.e. away from bundle boundaries.
    ///
    /// Not-a-number queries and queries outside any allocated bundle
    /// return the neutral value 1.
    pub fn evaluate<T: Real>(&self, q: &[T]) -> T {
        let one = T::from_f64(1.0);

        let qx = q.first().copied().unwrap_or_else(|| T::from_f64(0.0));
        let qy = q.get(1).copied().unwrap_or_else(|| T::from_f64(0.0));
        if !qx.value().is_finite() || !qy.value().is_finite() {
            return one;
        }

        let pt = Point2D::new(qx.value(), qy.value());
        let Some(bundle) = self.bundle(self.map.to_bundle_index(pt)) else {
            return one;
        };

        // Into the map-local frame. The origin is fixed, so its rotation
        // and translation enter as lifted constants.
        let inv = self.map.initial_origin().inverse();
        let cos_t = T::from_f64(inv.theta.cos());
        let sin_t = T::from_f64(inv.theta.sin());
        let px = qx * cos_t - qy * sin_t + T::from_f64(inv.x);
        let py = qx * sin_t + qy * cos_t + T::from_f64(inv.y);

        let mut value = one;
        for handle in bundle.cells() {
            let cell = *handle.read();
            let (Some(mean), Some(info)) = (cell.statistics().mean(), cell.statistics().information())
            else {
                continue;
            };
            let occupancy = cell.occupancy(self.model);
            if occupancy <= 0.0 {
                continue;
            }

            let dx = px - T::from_f64(mean.x);
            let dy = py - T::from_f64(mean.y);
            let exponent = T::from_f64(-0.5)
                * (dx * (T::from_f64(info.xx) * dx + T::from_f64(info.xy) * dy)
                    + dy * (T::from_f64(info.xy) * dx + T::from_f64(info.yy) * dy));
            value = value - T::from_f64(STOREY_WEIGHT * occupancy) * exponent.exp();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Jet, Pose2D};
    use approx::assert_relative_eq;

    /// Map with one Gaussian: mean (1, 1), covariance exactly 0.25 I.
    ///
    /// Four symmetric points around (1, 1) with offset a = sqrt(0.375)
    /// give an unbiased covariance of 2a^2/3 = 0.25 per axis. Resolution 4
    /// keeps all four points (and the queries) inside bundle (0, 0).
    fn single_gaussian_map() -> BundleGrid {
        let map = BundleGrid::new(Pose2D::identity(), 4.0);
        let a = 0.375_f64.sqrt();
        map.add_point(Point2D::new(1.0 + a, 1.0));
        map.add_point(Point2D::new(1.0 - a, 1.0));
        map.add_point(Point2D::new(1.0, 1.0 + a));
        map.add_point(Point2D::new(1.0, 1.0 - a));
        map
    }

    #[test]
    fn test_value_complements_map_sample() {
        let map = single_gaussian_map();
        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        let q = Point2D::new(1.2, 0.8);
        let value = cost.evaluate(&[q.x, q.y]);
        assert_relative_eq!(
            value,
            1.0 - map.sample_non_normalized(q, &model),
            epsilon = 1e-12
        );
        assert!(value < 1.0);
    }

    #[test]
    fn test_missing_bundle_is_neutral() {
        let map = BundleGrid::new(Pose2D::identity(), 1.0);
        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        // Nothing allocated: the functor does not allocate either
        assert_eq!(cost.evaluate(&[3.0, 3.0]), 1.0);
        assert!(map.min_index().is_none());
    }

    #[test]
    fn test_nan_query_is_neutral() {
        let map = single_gaussian_map();
        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        assert_eq!(cost.evaluate(&[f64::NAN, 0.8]), 1.0);
        assert_eq!(cost.evaluate(&[1.2, f64::NAN]), 1.0);
    }

    #[test]
    fn test_short_query_is_zero_padded() {
        let map = single_gaussian_map();
        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        assert_relative_eq!(
            cost.evaluate(&[1.2]),
            cost.evaluate(&[1.2, 0.0]),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_invalid_cells_are_skipped() {
        // Identical endpoints: statistics stay degenerate, cost stays 1
        let map = BundleGrid::new(Pose2D::identity(), 4.0);
        for _ in 0..10 {
            map.add_point(Point2D::new(1.0, 1.0));
        }
        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        assert_eq!(cost.evaluate(&[1.0, 1.0]), 1.0);
    }

    #[test]
    fn test_jet_gradient_matches_central_difference() {
        let map = single_gaussian_map();
        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        let q = Point2D::new(1.2, 0.8);
        let jet = cost.evaluate(&[Jet::<2>::variable(q.x, 0), Jet::<2>::variable(q.y, 1)]);

        let h = 1e-5;
        let ddx =
            (cost.evaluate(&[q.x + h, q.y]) - cost.evaluate(&[q.x - h, q.y])) / (2.0 * h);
        let ddy =
            (cost.evaluate(&[q.x, q.y + h]) - cost.evaluate(&[q.x, q.y - h])) / (2.0 * h);

        assert_relative_eq!(jet.v, cost.evaluate(&[q.x, q.y]), epsilon = 1e-12);
        assert_relative_eq!(jet.d[0], ddx, epsilon = 1e-4);
        assert_relative_eq!(jet.d[1], ddy, epsilon = 1e-4);
    }

    #[test]
    fn test_gradient_through_rotated_origin() {
        // Non-identity origin: the lifted rotation must participate in the
        // derivative
        let map = BundleGrid::new(Pose2D::new(0.3, -0.2, 0.4), 4.0);
        let a = 0.375_f64.sqrt();
        map.add_point(Point2D::new(1.0 + a, 1.0));
        map.add_point(Point2D::new(1.0 - a, 1.0));
        map.add_point(Point2D::new(1.0, 1.0 + a));
        map.add_point(Point2D::new(1.0, 1.0 - a));

        let model = InverseModel::default();
        let cost = NdtCost::new(&map, &model);

        let q = Point2D::new(1.1, 0.9);
        let jet = cost.evaluate(&[Jet::<2>::variable(q.x, 0), Jet::<2>::variable(q.y, 1)]);

        let h = 1e-5;
        let ddx =
            (cost.evaluate(&[q.x + h, q.y]) - cost.evaluate(&[q.x - h, q.y])) / (2.0 * h);
        let ddy =
            (cost.evaluate(&[q.x, q.y + h]) - cost.evaluate(&[q.x, q.y - h])) / (2.0 * h);

        assert_relative_eq!(jet.d[0], ddx, epsilon = 1e-4);
        assert_relative_eq!(jet.d[1], ddy, epsilon = 1e-4);
    }
}
