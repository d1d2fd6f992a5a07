//! Core types for vitaran-map.
//!
//! This module provides the fundamental types the grid and the matchers
//! are built from:
//! - [`Point2D`]: 2D point in meters
//! - [`CellIndex`]: integer bundle/storey index
//! - [`Pose2D`]: planar rigid transform
//! - [`SymMat2`]: symmetric 2x2 matrix (covariance, information)
//! - [`Real`] / [`Jet`]: generic scalar seam for derivative-carrying
//!   cost evaluation
//!
//! All coordinates follow the ROS REP-103 convention: X-forward, Y-left,
//! counter-clockwise positive rotation.

pub mod matrix;
pub mod num;
pub mod point;
pub mod pose;

pub use matrix::SymMat2;
pub use num::{Jet, Real};
pub use point::{CellIndex, Point2D};
pub use pose::Pose2D;
