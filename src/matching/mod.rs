//! Scan-match cost functors over the bundle grid.
//!
//! Two evaluation modes feed the host optimizer:
//! - [`NdtCost`]: the direct occupancy-weighted Gaussian mixture, exact
//!   analytic derivatives via [`Jet`](crate::core::Jet) inputs
//! - [`InterpolatedNdtCost`]: a bicubic interpolation of the sampled
//!   scalar field, C1 everywhere

pub mod cost;
pub mod interpolation;

pub use cost::NdtCost;
pub use interpolation::{BicubicInterpolator, GridSampler, InterpolatedNdtCost, NdtSampler};
