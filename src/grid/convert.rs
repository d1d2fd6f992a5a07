//! Conversion between the sparse map and a dense static view.
//!
//! The static view lays every storey out as a row-major rectangle over
//! its allocated bounding box. It is the hand-off format for consumers
//! that want a fixed-size map (rendering, export, offline evaluation);
//! converting back yields a sparse map with identical geometry and
//! per-cell statistics.

use serde::{Deserialize, Serialize};

use crate::cell::OccupancyCell;
use crate::core::{CellIndex, Pose2D};
use crate::grid::map::{BundleGrid, STOREY_COUNT};

/// One storey as a dense row-major rectangle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticStoreyView {
    /// Storey index of the rectangle's lower-left cell
    pub min_index: CellIndex,
    /// Rectangle width in cells
    pub width: usize,
    /// Rectangle height in cells
    pub height: usize,
    /// Row-major cells; unobserved positions hold empty cells
    cells: Vec<OccupancyCell>,
}

impl StaticStoreyView {
    /// Cell at storey index `idx`, if inside the rectangle
    pub fn cell(&self, idx: CellIndex) -> Option<&OccupancyCell> {
        let col = idx.x.checked_sub(self.min_index.x)?;
        let row = idx.y.checked_sub(self.min_index.y)?;
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return None;
        }
        self.cells.get(row as usize * self.width + col as usize)
    }

    /// Iterate over observed cells with their storey indices
    pub fn observed_cells(&self) -> impl Iterator<Item = (CellIndex, &OccupancyCell)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            if !cell.is_observed() {
                return None;
            }
            let idx = CellIndex::new(
                self.min_index.x + (i % self.width) as i32,
                self.min_index.y + (i / self.width) as i32,
            );
            Some((idx, cell))
        })
    }
}

/// Dense view of a [`BundleGrid`]: geometry metadata plus four storey
/// rectangles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticGridView {
    /// Cell resolution in meters
    pub resolution: f64,
    /// Initial world-to-map origin
    pub origin: Pose2D,
    /// Smallest bundle index of the source map
    pub min_index: CellIndex,
    /// Largest bundle index of the source map
    pub max_index: CellIndex,
    /// The four storey rectangles
    pub storeys: [StaticStoreyView; STOREY_COUNT],
}

impl StaticGridView {
    /// Bundle resolution (half the cell resolution)
    #[inline]
    pub fn bundle_resolution(&self) -> f64 {
        0.5 * self.resolution
    }

    /// Width of the bundle extent in meters
    pub fn width(&self) -> f64 {
        (self.max_index.x - self.min_index.x + 1) as f64 * self.bundle_resolution()
    }

    /// Height of the bundle extent in meters
    pub fn height(&self) -> f64 {
        (self.max_index.y - self.min_index.y + 1) as f64 * self.bundle_resolution()
    }

    /// Build a dense view of a map. Returns `None` while the map is empty.
    pub fn from_map(map: &BundleGrid) -> Option<Self> {
        let min_index = map.min_index()?;
        let max_index = map.max_index()?;

        let storeys = std::array::from_fn(|storey| {
            let cells = map.storey_cells(storey);
            let mut min = CellIndex::new(0, 0);
            let mut max = CellIndex::new(0, 0);
            for (i, (idx, _)) in cells.iter().enumerate() {
                if i == 0 {
                    min = *idx;
                    max = *idx;
                } else {
                    min = min.min_components(idx);
                    max = max.max_components(idx);
                }
            }

            let width = (max.x - min.x + 1) as usize;
            let height = (max.y - min.y + 1) as usize;
            let mut dense = vec![OccupancyCell::new(); width * height];
            for (idx, cell) in &cells {
                let col = (idx.x - min.x) as usize;
                let row = (idx.y - min.y) as usize;
                dense[row * width + col] = *cell;
            }

            StaticStoreyView {
                min_index: min,
                width,
                height,
                cells: dense,
            }
        });

        Some(Self {
            resolution: map.resolution(),
            origin: map.initial_origin(),
            min_index,
            max_index,
            storeys,
        })
    }

    /// Convert back into a sparse map.
    ///
    /// Only observed cells are re-inserted; empty rectangle positions stay
    /// unallocated, matching a map that never touched them.
    pub fn to_map(&self) -> BundleGrid {
        let map = BundleGrid::new(self.origin, self.resolution);
        for (storey, view) in self.storeys.iter().enumerate() {
            for (idx, cell) in view.observed_cells() {
                map.insert_cell(storey, idx, *cell);
            }
        }
        map.restore_extent(Some((self.min_index, self.max_index)));
        map
    }
}
