//! Map persistence: snapshot model and YAML round-trip.
//!
//! The persisted form carries the map geometry (resolution, initial
//! origin, index extent) and one record per allocated storey cell with
//! its raw statistics sums and evidence counters. The bundle cache is
//! not persisted; it is rebuilt lazily when the restored map is queried.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cell::{GaussianCell, OccupancyCell};
use crate::core::{CellIndex, Point2D, Pose2D, SymMat2};
use crate::grid::map::{BundleGrid, STOREY_COUNT};

/// One persisted storey cell.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CellRecord {
    /// Storey the cell belongs to (0..4)
    pub storey: u8,
    /// Index of the cell within its storey
    pub index: CellIndex,
    /// Number of points in the Gaussian statistics
    pub num_points: u64,
    /// Coordinate sums
    pub sum: Point2D,
    /// Sums of outer products
    pub outer: SymMat2,
    /// Free observation count
    pub num_free: u32,
    /// Occupied observation count
    pub num_occupied: u32,
}

/// Serializable snapshot of a [`BundleGrid`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Cell resolution in meters
    pub resolution: f64,
    /// Initial world-to-map origin
    pub origin: Pose2D,
    /// Smallest bundle index ever allocated
    pub min_index: Option<CellIndex>,
    /// Largest bundle index ever allocated
    pub max_index: Option<CellIndex>,
    /// Every allocated storey cell
    pub cells: Vec<CellRecord>,
}

/// Snapshot restore/IO error
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing or serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A cell record names a storey outside 0..4
    #[error("invalid storey id {storey} in snapshot")]
    InvalidStorey {
        /// The offending storey id
        storey: u8,
    },
    /// The snapshot geometry is not usable
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

impl BundleGrid {
    /// Capture a snapshot of the current map content.
    ///
    /// Records are sorted by storey and index, so equal maps produce
    /// identical snapshots.
    pub fn snapshot(&self) -> MapSnapshot {
        let mut cells = Vec::new();
        for storey in 0..STOREY_COUNT {
            for (index, cell) in self.storey_cells(storey) {
                cells.push(CellRecord {
                    storey: storey as u8,
                    index,
                    num_points: cell.statistics().num_points(),
                    sum: cell.statistics().sums(),
                    outer: cell.statistics().outer_sums(),
                    num_free: cell.num_free(),
                    num_occupied: cell.num_occupied(),
                });
            }
        }
        cells.sort_by_key(|record| (record.storey, record.index.x, record.index.y));

        MapSnapshot {
            resolution: self.resolution(),
            origin: self.initial_origin(),
            min_index: self.min_index(),
            max_index: self.max_index(),
            cells,
        }
    }

    /// Rebuild a map from a snapshot.
    ///
    /// The restored map uses the default allocate-on-query policy; the
    /// bundle cache starts empty and is filled lazily.
    pub fn from_snapshot(snapshot: &MapSnapshot) -> Result<Self, SnapshotError> {
        if !(snapshot.resolution.is_finite() && snapshot.resolution > 0.0) {
            return Err(SnapshotError::Invalid(format!(
                "resolution must be positive, got {}",
                snapshot.resolution
            )));
        }

        let map = BundleGrid::new(snapshot.origin, snapshot.resolution);
        for record in &snapshot.cells {
            if record.storey as usize >= STOREY_COUNT {
                return Err(SnapshotError::InvalidStorey {
                    storey: record.storey,
                });
            }
            let statistics = GaussianCell::from_sums(record.num_points, record.sum, record.outer);
            let cell = OccupancyCell::from_parts(statistics, record.num_free, record.num_occupied);
            map.insert_cell(record.storey as usize, record.index, cell);
        }
        map.restore_extent(match (snapshot.min_index, snapshot.max_index) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        });

        log::info!(
            "restored NDT map: {} storey cells, resolution {}",
            snapshot.cells.len(),
            snapshot.resolution
        );
        Ok(map)
    }

    /// Serialize the map to a YAML string.
    pub fn to_yaml(&self) -> Result<String, SnapshotError> {
        Ok(serde_yaml::to_string(&self.snapshot())?)
    }

    /// Restore a map from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SnapshotError> {
        let snapshot: MapSnapshot = serde_yaml::from_str(yaml)?;
        Self::from_snapshot(&snapshot)
    }

    /// Save the map to a YAML file.
    pub fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let yaml = self.to_yaml()?;
        std::fs::write(&path, yaml)?;
        log::debug!("saved NDT map to {}", path.as_ref().display());
        Ok(())
    }

    /// Load a map from a YAML file.
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::InverseModel;

    fn sample_map() -> BundleGrid {
        let map = BundleGrid::new(Pose2D::new(0.5, -0.25, 0.1), 2.0);
        map.add(Point2D::new(0.0, 0.0), Point2D::new(4.0, 1.0));
        map.add(Point2D::new(0.0, 0.0), Point2D::new(4.1, 0.9));
        map.add(Point2D::new(0.0, 0.0), Point2D::new(3.9, 1.1));
        map.add_point(Point2D::new(-2.0, -1.0));
        map
    }

    #[test]
    fn test_snapshot_round_trip_preserves_cells() {
        let map = sample_map();
        let snapshot = map.snapshot();
        let restored = BundleGrid::from_snapshot(&snapshot).unwrap();

        assert_eq!(restored.resolution(), map.resolution());
        assert_eq!(restored.bundle_resolution(), map.bundle_resolution());
        assert_eq!(restored.initial_origin(), map.initial_origin());
        assert_eq!(restored.min_index(), map.min_index());
        assert_eq!(restored.max_index(), map.max_index());

        for storey in 0..STOREY_COUNT {
            let mut original = map.storey_cells(storey);
            let mut rebuilt = restored.storey_cells(storey);
            original.sort_by_key(|(i, _)| (i.x, i.y));
            rebuilt.sort_by_key(|(i, _)| (i.x, i.y));
            assert_eq!(original.len(), rebuilt.len());

            for ((ia, a), (ib, b)) in original.iter().zip(rebuilt.iter()) {
                assert_eq!(ia, ib);
                assert_eq!(a.num_free(), b.num_free());
                assert_eq!(a.num_occupied(), b.num_occupied());
                assert_eq!(a.statistics().num_points(), b.statistics().num_points());
                assert_eq!(a.statistics().sums(), b.statistics().sums());
                assert_eq!(a.statistics().outer_sums(), b.statistics().outer_sums());
            }
        }
    }

    #[test]
    fn test_restored_map_samples_identically() {
        let map = sample_map();
        let restored = BundleGrid::from_yaml(&map.to_yaml().unwrap()).unwrap();
        let model = InverseModel::default();

        let query = Point2D::new(4.0, 1.0);
        assert_eq!(
            map.sample_non_normalized(query, &model),
            restored.sample_non_normalized(query, &model)
        );
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let map = sample_map();
        assert_eq!(map.to_yaml().unwrap(), map.to_yaml().unwrap());
    }

    #[test]
    fn test_invalid_storey_rejected() {
        let map = sample_map();
        let mut snapshot = map.snapshot();
        snapshot.cells[0].storey = 7;

        assert!(matches!(
            BundleGrid::from_snapshot(&snapshot),
            Err(SnapshotError::InvalidStorey { storey: 7 })
        ));
    }

    #[test]
    fn test_empty_map_round_trip() {
        let map = BundleGrid::new(Pose2D::identity(), 1.0);
        let restored = BundleGrid::from_yaml(&map.to_yaml().unwrap()).unwrap();

        assert!(restored.min_index().is_none());
        assert!(restored.bundle_indices().is_empty());
    }
}
