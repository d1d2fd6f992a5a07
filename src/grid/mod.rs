//! The NDT bundle grid: sparse staggered storeys, ray integration,
//! occupancy-weighted sampling, persistence and dense conversion.

pub mod bresenham;
pub mod convert;
pub mod map;
pub mod snapshot;

pub use bresenham::BresenhamLine;
pub use convert::{StaticGridView, StaticStoreyView};
pub use map::{Bundle, BundleGrid, CellHandle, DistributionBundle, QueryMode};
pub use snapshot::{CellRecord, MapSnapshot, SnapshotError};
