//! Occupancy cell: Gaussian statistics plus free/occupied evidence counters.

use super::statistics::GaussianCell;
use crate::core::Point2D;
use crate::sensor::InverseModel;
use serde::{Deserialize, Serialize};

/// A storey cell of the bundle grid.
///
/// Combines a [`GaussianCell`] with two evidence counters. Rays passing
/// through the cell call [`update_free`](OccupancyCell::update_free); ray
/// endpoints call [`update_occupied`](OccupancyCell::update_occupied),
/// which bumps the occupied counter and folds the endpoint into the
/// statistics in one call. Counters only ever grow.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct OccupancyCell {
    statistics: GaussianCell,
    num_free: u32,
    num_occupied: u32,
}

impl OccupancyCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ray passing through this cell
    #[inline]
    pub fn update_free(&mut self) {
        self.num_free = self.num_free.saturating_add(1);
    }

    /// Record a ray endpoint at `p` (map frame)
    #[inline]
    pub fn update_occupied(&mut self, p: Point2D) {
        self.num_occupied = self.num_occupied.saturating_add(1);
        self.statistics.add(p);
    }

    /// Number of free observations
    #[inline]
    pub fn num_free(&self) -> u32 {
        self.num_free
    }

    /// Number of occupied observations
    #[inline]
    pub fn num_occupied(&self) -> u32 {
        self.num_occupied
    }

    /// The embedded Gaussian statistics
    #[inline]
    pub fn statistics(&self) -> &GaussianCell {
        &self.statistics
    }

    /// Occupancy posterior in [0, 1] under the given inverse sensor model.
    ///
    /// `sigmoid(F * l_free + O * l_occupied - l_prior)`. A cell that has
    /// never received an occupied observation reports 0: there is no
    /// distribution to stand behind the evidence yet, so sampling and range
    /// queries skip it.
    pub fn occupancy(&self, model: &InverseModel) -> f64 {
        if self.num_occupied == 0 {
            return 0.0;
        }
        let log_odds = self.num_free as f64 * model.log_odds_free
            + self.num_occupied as f64 * model.log_odds_occupied
            - model.log_odds_prior;
        sigmoid(log_odds)
    }

    /// Reconstruct a cell from persisted parts.
    pub fn from_parts(statistics: GaussianCell, num_free: u32, num_occupied: u32) -> Self {
        Self {
            statistics,
            num_free,
            num_occupied,
        }
    }

    /// Whether this cell has received any observation at all
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.num_free > 0 || self.num_occupied > 0
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_free_only_cell_reports_zero() {
        let model = InverseModel::default();
        let mut cell = OccupancyCell::new();
        for _ in 0..50 {
            cell.update_free();
        }
        assert_eq!(cell.num_free(), 50);
        assert_eq!(cell.occupancy(&model), 0.0);
    }

    #[test]
    fn test_occupied_evidence_raises_posterior() {
        let model = InverseModel::default();
        let mut cell = OccupancyCell::new();

        cell.update_occupied(Point2D::new(1.0, 0.0));
        let one_hit = cell.occupancy(&model);
        assert!(one_hit > 0.5, "single hit should exceed prior: {}", one_hit);

        cell.update_occupied(Point2D::new(1.0, 0.1));
        cell.update_occupied(Point2D::new(1.1, 0.0));
        assert!(cell.occupancy(&model) > one_hit);
    }

    #[test]
    fn test_posterior_matches_sigmoid() {
        let model = InverseModel::new(-0.4, 0.85, 0.1);
        let mut cell = OccupancyCell::new();
        for _ in 0..3 {
            cell.update_free();
        }
        for i in 0..2 {
            cell.update_occupied(Point2D::new(i as f64, 0.0));
        }

        let log_odds = 3.0 * (-0.4) + 2.0 * 0.85 - 0.1;
        assert_relative_eq!(
            cell.occupancy(&model),
            1.0 / (1.0 + (-log_odds as f64).exp()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_update_occupied_feeds_statistics() {
        let mut cell = OccupancyCell::new();
        cell.update_occupied(Point2D::new(1.0, 2.0));
        cell.update_occupied(Point2D::new(3.0, 4.0));

        assert_eq!(cell.num_occupied(), 2);
        assert_eq!(cell.statistics().num_points(), 2);
        assert_eq!(cell.statistics().sums(), Point2D::new(4.0, 6.0));
    }
}
