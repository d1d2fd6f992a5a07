//! Inverse sensor model for occupancy updates.

use serde::{Deserialize, Serialize};

/// Calibrated log-odds weights of a range sensor.
///
/// Maps free/occupied hit counts to an occupancy posterior: a cell with
/// `F` free and `O` occupied observations has log-odds
/// `F * log_odds_free + O * log_odds_occupied - log_odds_prior`.
///
/// The model is passed by reference to every query that needs it; the map
/// holds no ambient copy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InverseModel {
    /// Log-odds contribution of one free observation (negative)
    pub log_odds_free: f64,
    /// Log-odds contribution of one occupied observation (positive)
    pub log_odds_occupied: f64,
    /// Log-odds of the occupancy prior
    pub log_odds_prior: f64,
}

impl InverseModel {
    /// Create a model directly from log-odds weights
    pub fn new(log_odds_free: f64, log_odds_occupied: f64, log_odds_prior: f64) -> Self {
        Self {
            log_odds_free,
            log_odds_occupied,
            log_odds_prior,
        }
    }

    /// Create a model from probabilities.
    ///
    /// Typical values: `p_free` below 0.5, `p_occupied` above 0.5,
    /// `p_prior` at 0.5 for an uninformative prior.
    pub fn from_probabilities(p_free: f64, p_occupied: f64, p_prior: f64) -> Self {
        Self {
            log_odds_free: log_odds(p_free),
            log_odds_occupied: log_odds(p_occupied),
            log_odds_prior: log_odds(p_prior),
        }
    }
}

impl Default for InverseModel {
    fn default() -> Self {
        Self::from_probabilities(0.4, 0.7, 0.5)
    }
}

#[inline]
fn log_odds(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
