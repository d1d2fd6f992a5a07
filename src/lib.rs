//! # Vitaran-Map
//!
//! 2D NDT occupancy grid mapping with a differentiable scan-match cost.
//!
//! ## Overview
//!
//! Vitaran-Map represents the environment as a sparse, dynamically growing
//! grid of Gaussian distributions (a Normal Distributions Transform map)
//! with per-cell log-odds occupancy evidence:
//!
//! - **Bundle Grid**: four staggered sparse storeys of Gaussian cells;
//!   every query point is covered by four overlapping cells whose scores
//!   are averaged, so the likelihood surface is smooth without a dense
//!   raster
//! - **Ray Integration**: Bresenham traversal marks cells along a ray as
//!   free and folds the endpoint into the Gaussian statistics
//! - **Scan-Match Cost**: a value-and-gradient oracle over the map for a
//!   nonlinear least-squares optimizer, either directly on the Gaussian
//!   mixture (exact derivatives via dual numbers) or through a C1 bicubic
//!   interpolation of the sampled field
//!
//! ## Quick Start
//!
//! ```rust
//! use vitaran_map::{BundleGrid, InverseModel, NdtCost, Point2D, Pose2D};
//!
//! // Create a map and integrate a few rays against a wall near x = 5
//! let map = BundleGrid::new(Pose2D::identity(), 1.0);
//! for i in 0..5 {
//!     let end = Point2D::new(5.0 + 0.05 * (i % 2) as f64, 0.1 * i as f64);
//!     map.add(Point2D::new(0.0, 0.0), end);
//! }
//!
//! // Evaluate the scan-match cost near the mapped structure
//! let model = InverseModel::default();
//! let cost = NdtCost::new(&map, &model);
//! let value = cost.evaluate(&[5.0, 0.2]);
//! assert!(value < 1.0);
//! ```
//!
//! ## Coordinate System
//!
//! Uses ROS REP-103 convention:
//! - X: Forward, Y: Left
//! - Rotation in radians, CCW positive from +X axis
//!
//! World points go in; the map transforms them through the inverse of its
//! initial origin and keeps all statistics in the map-local frame.
//!
//! ## Concurrency
//!
//! The map is `Sync`: scan-integration threads can call
//! [`BundleGrid::add`] while query threads sample or evaluate costs. Cell
//! allocation is guarded by two coarse mutexes held only across hash
//! lookups; cell content sits behind per-cell read-write locks, and all
//! cell handles stay valid for the lifetime of the map.

#![warn(missing_docs)]

// Core types
pub mod core;

// Gaussian statistics and occupancy cells
pub mod cell;

// Inverse sensor model
pub mod sensor;

// The bundle grid: storage, ray integration, persistence
pub mod grid;

// Scan-match cost functors
pub mod matching;

// Map configuration
pub mod config;

// Re-export main types at crate root
pub use cell::{GaussianCell, OccupancyCell};
pub use config::{ConfigError, MapConfig};
pub use crate::core::{CellIndex, Jet, Point2D, Pose2D, Real, SymMat2};
pub use grid::{
    Bundle, BundleGrid, DistributionBundle, MapSnapshot, QueryMode, SnapshotError, StaticGridView,
};
pub use matching::{GridSampler, InterpolatedNdtCost, NdtCost, NdtSampler};
pub use sensor::InverseModel;
