//! The bundle grid: four staggered sparse storeys of occupancy cells.
//!
//! Every bundle index resolves to four overlapping storey cells, offset
//! against each other by half a bundle cell. A world point therefore
//! contributes to four Gaussians whose scores are averaged, which gives a
//! spatially smooth likelihood surface without a dense raster.
//!
//! ## Storage and locking
//!
//! Storeys are sparse hash maps from [`CellIndex`] to reference-counted
//! cells; resolved bundles are cached in a second map. Cell handles stay
//! valid for the lifetime of the map regardless of hash-table growth, so
//! bundles can be held across queries. Two coarse mutexes guard
//! allocation (one for the storeys, one for the bundle cache and the
//! index extent); they are held only across the lookup or insertion
//! itself, never across Gaussian arithmetic. Cell content is behind a
//! per-cell `RwLock`, so scan-integration threads and query threads can
//! run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::cell::OccupancyCell;
use crate::config::MapConfig;
use crate::core::{CellIndex, Point2D, Pose2D};
use crate::grid::bresenham::BresenhamLine;
use crate::sensor::InverseModel;

/// Shared handle to one storey cell. Stable for the lifetime of the map.
pub type CellHandle = Arc<RwLock<OccupancyCell>>;

/// Number of storeys (and of cells per bundle).
pub const STOREY_COUNT: usize = 4;

/// Weight of a single storey cell in the bundle average.
pub const STOREY_WEIGHT: f64 = 0.25;

/// Whether grid queries may allocate cells at unseen indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    /// Queries materialize missing bundles (get-or-create). Later queries
    /// at the same index return the same handles, and there is no
    /// missing-cell branch on the sampling path.
    Allocate,
    /// Queries never mutate the map; missing bundles sample to zero.
    ReadOnly,
}

/// The four overlapping storey cells resolved for one bundle index.
///
/// Holds non-owning (reference-counted) handles into the storeys; the
/// storeys own the cells and keep them alive as long as the map lives.
pub struct DistributionBundle {
    cells: [CellHandle; STOREY_COUNT],
}

/// Shared handle to a resolved bundle.
pub type Bundle = Arc<DistributionBundle>;

impl DistributionBundle {
    /// Handles of the four storey cells
    #[inline]
    pub fn cells(&self) -> &[CellHandle; STOREY_COUNT] {
        &self.cells
    }

    /// Handle of the storey-`k` cell
    #[inline]
    pub fn cell(&self, k: usize) -> &CellHandle {
        &self.cells[k]
    }

    /// Average occupancy of the four storey cells
    pub fn average_occupancy(&self, model: &InverseModel) -> f64 {
        let mut sum = 0.0;
        for handle in &self.cells {
            sum += handle.read().occupancy(model);
        }
        STOREY_WEIGHT * sum
    }

    /// Occupancy-weighted normalized Gaussian mixture at `p` (map frame)
    pub fn sample(&self, p: Point2D, model: &InverseModel) -> f64 {
        self.mixture(p, model, true)
    }

    /// Occupancy-weighted non-normalized Gaussian mixture at `p` (map frame)
    pub fn sample_non_normalized(&self, p: Point2D, model: &InverseModel) -> f64 {
        self.mixture(p, model, false)
    }

    fn mixture(&self, p: Point2D, model: &InverseModel, normalized: bool) -> f64 {
        let mut sum = 0.0;
        for handle in &self.cells {
            // Snapshot the cell so the Gaussian math runs outside the lock.
            let cell = *handle.read();
            let occupancy = cell.occupancy(model);
            if occupancy <= 0.0 {
                continue;
            }
            let density = if normalized {
                cell.statistics().sample(p)
            } else {
                cell.statistics().sample_non_normalized(p)
            };
            sum += occupancy * density;
        }
        STOREY_WEIGHT * sum
    }
}

/// Storey indices backing a bundle index.
///
/// The four storeys are staggered by half a bundle cell: with
/// `d = floor(bi / 2)` and `m = bi mod 2` (componentwise, Euclidean),
/// storey 0 sits at `d`, storey 1 is shifted in x, storey 2 in y and
/// storey 3 diagonally. Adjacent bundles share storey cells.
#[inline]
pub(crate) fn storey_indices(bi: CellIndex) -> [CellIndex; STOREY_COUNT] {
    let d = bi.div_euclid(2);
    let m = bi.rem_euclid(2);

    [
        CellIndex::new(d.x, d.y),
        CellIndex::new(d.x + m.x, d.y),
        CellIndex::new(d.x, d.y + m.y),
        CellIndex::new(d.x + m.x, d.y + m.y),
    ]
}

/// Bundle cache plus the index extent it implies.
///
/// Extent widening happens under the same lock as bundle insertion, so
/// a cached bundle is always inside the reported extent.
#[derive(Default)]
struct BundleCache {
    bundles: HashMap<CellIndex, Bundle>,
    extent: Option<(CellIndex, CellIndex)>,
}

impl BundleCache {
    fn widen(&mut self, bi: CellIndex) {
        self.extent = Some(match self.extent {
            Some((min, max)) => (min.min_components(&bi), max.max_components(&bi)),
            None => (bi, bi),
        });
    }
}

/// Sparse, dynamically growing 2D NDT occupancy map.
///
/// Cells carry Gaussian distributions fitted to ray endpoints together
/// with log-odds occupancy evidence. Ray integration ([`add`]
/// (BundleGrid::add)) walks a Bresenham line over bundle indices; queries
/// evaluate the occupancy-weighted mixture of the four storey Gaussians
/// of the bundle containing the query point.
///
/// All statistics live in the map-local frame: insertions and queries
/// transform world points through the inverse of the initial origin.
pub struct BundleGrid {
    resolution: f64,
    bundle_resolution: f64,
    bundle_resolution_inv: f64,
    /// Squared distance threshold separating "near the ray source" from
    /// "free along the ray": (bundle_resolution / 2)^2.
    bundle_resolution_2: f64,
    /// Map-to-world transform (the initial origin)
    w_t_m: Pose2D,
    /// World-to-map transform (inverse of the initial origin)
    m_t_w: Pose2D,
    query_mode: QueryMode,
    storeys: [Mutex<HashMap<CellIndex, CellHandle>>; STOREY_COUNT],
    cache: Mutex<BundleCache>,
}

impl BundleGrid {
    /// Create an empty map with the given initial origin and cell
    /// resolution (meters). Bundles are indexed at half that resolution.
    pub fn new(origin: Pose2D, resolution: f64) -> Self {
        Self::with_mode(origin, resolution, QueryMode::Allocate)
    }

    /// Create an empty map with an explicit query policy.
    pub fn with_mode(origin: Pose2D, resolution: f64, query_mode: QueryMode) -> Self {
        let bundle_resolution = 0.5 * resolution;
        Self {
            resolution,
            bundle_resolution,
            bundle_resolution_inv: 1.0 / bundle_resolution,
            bundle_resolution_2: 0.25 * bundle_resolution * bundle_resolution,
            w_t_m: origin,
            m_t_w: origin.inverse(),
            query_mode,
            storeys: std::array::from_fn(|_| Mutex::new(HashMap::new())),
            cache: Mutex::new(BundleCache::default()),
        }
    }

    /// Create an empty map from a configuration.
    pub fn with_config(config: &MapConfig) -> Self {
        Self::with_mode(config.origin, config.resolution, config.query_mode)
    }

    // === Geometry ===

    /// Cell resolution in meters
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Bundle resolution (half the cell resolution)
    #[inline]
    pub fn bundle_resolution(&self) -> f64 {
        self.bundle_resolution
    }

    /// The initial origin this map was constructed with
    #[inline]
    pub fn initial_origin(&self) -> Pose2D {
        self.w_t_m
    }

    /// Query policy chosen at construction
    #[inline]
    pub fn query_mode(&self) -> QueryMode {
        self.query_mode
    }

    /// Bundle index containing a world point
    #[inline]
    pub fn to_bundle_index(&self, p: Point2D) -> CellIndex {
        let p_m = self.m_t_w.transform_point(p);
        CellIndex::new(
            (p_m.x * self.bundle_resolution_inv).floor() as i32,
            (p_m.y * self.bundle_resolution_inv).floor() as i32,
        )
    }

    /// Smallest bundle index ever allocated, if any
    pub fn min_index(&self) -> Option<CellIndex> {
        self.cache.lock().extent.map(|(min, _)| min)
    }

    /// Largest bundle index ever allocated, if any
    pub fn max_index(&self) -> Option<CellIndex> {
        self.cache.lock().extent.map(|(_, max)| max)
    }

    /// Lower-left corner of the allocated region (map frame)
    pub fn min_point(&self) -> Option<Point2D> {
        self.min_index().map(|min| {
            Point2D::new(
                min.x as f64 * self.bundle_resolution,
                min.y as f64 * self.bundle_resolution,
            )
        })
    }

    /// Upper-right corner of the allocated region (map frame)
    pub fn max_point(&self) -> Option<Point2D> {
        self.max_index().map(|max| {
            Point2D::new(
                (max.x + 1) as f64 * self.bundle_resolution,
                (max.y + 1) as f64 * self.bundle_resolution,
            )
        })
    }

    /// Width of the allocated region in meters (0 while empty)
    pub fn width(&self) -> f64 {
        match self.cache.lock().extent {
            Some((min, max)) => (max.x - min.x + 1) as f64 * self.bundle_resolution,
            None => 0.0,
        }
    }

    /// Height of the allocated region in meters (0 while empty)
    pub fn height(&self) -> f64 {
        match self.cache.lock().extent {
            Some((min, max)) => (max.y - min.y + 1) as f64 * self.bundle_resolution,
            None => 0.0,
        }
    }

    /// The initial origin with its translation moved to [`min_point`]
    /// (BundleGrid::min_point); identical to the initial origin while the
    /// map is empty.
    pub fn origin(&self) -> Pose2D {
        match self.min_point() {
            Some(min) => Pose2D::new(min.x, min.y, self.w_t_m.theta),
            None => self.w_t_m,
        }
    }

    /// Every bundle index currently cached (unordered)
    pub fn bundle_indices(&self) -> Vec<CellIndex> {
        self.cache.lock().bundles.keys().copied().collect()
    }

    // === Allocation ===

    /// Resolve (and allocate, if missing) the bundle at `bi`.
    ///
    /// Lookup is idempotent: repeated calls return handles to the same
    /// storey cells.
    pub fn bundle_at(&self, bi: CellIndex) -> Bundle {
        {
            let cache = self.cache.lock();
            if let Some(bundle) = cache.bundles.get(&bi) {
                return bundle.clone();
            }
        }

        // Allocate the storey cells outside the bundle lock; the storey
        // maps hand back the same handles if another thread races us here.
        let indices = storey_indices(bi);
        let cells = std::array::from_fn(|k| self.cell_at(k, indices[k]));
        let bundle = Arc::new(DistributionBundle { cells });

        let mut cache = self.cache.lock();
        cache.widen(bi);
        cache.bundles.entry(bi).or_insert(bundle).clone()
    }

    /// The bundle at `bi` if it has been resolved before; never allocates.
    pub fn try_bundle_at(&self, bi: CellIndex) -> Option<Bundle> {
        self.cache.lock().bundles.get(&bi).cloned()
    }

    fn cell_at(&self, storey: usize, index: CellIndex) -> CellHandle {
        let mut cells = self.storeys[storey].lock();
        cells
            .entry(index)
            .or_insert_with(|| Arc::new(RwLock::new(OccupancyCell::new())))
            .clone()
    }

    // === Integration ===

    /// Integrate one ray from `start` to `end` (world frame).
    ///
    /// Bundle indices along the Bresenham line receive a free update once
    /// their squared distance to the ray source exceeds a quarter of the
    /// squared bundle resolution; indices at or near the source receive
    /// an occupied update instead, so scanner-adjacent cells are never
    /// marked free. The endpoint's bundle is unconditionally updated as
    /// occupied with the endpoint itself.
    pub fn add(&self, start: Point2D, end: Point2D) {
        let start_index = self.to_bundle_index(start);
        let end_index = self.to_bundle_index(end);
        let end_m = self.m_t_w.transform_point(end);

        let mut line = BresenhamLine::new(start_index, end_index).peekable();
        while let Some(bi) = line.next() {
            if line.peek().is_none() {
                // The endpoint is handled below.
                break;
            }
            let distance_2 = bi.distance_squared(&start_index) as f64
                * self.bundle_resolution
                * self.bundle_resolution;
            if distance_2 > self.bundle_resolution_2 {
                self.update_free(bi);
            } else {
                self.update_occupied(bi, end_m);
            }
        }
        self.update_occupied(end_index, end_m);
    }

    /// Integrate a single endpoint observation (world frame).
    pub fn add_point(&self, p: Point2D) {
        let bi = self.to_bundle_index(p);
        let p_m = self.m_t_w.transform_point(p);
        self.update_occupied(bi, p_m);
    }

    fn update_free(&self, bi: CellIndex) {
        let bundle = self.bundle_at(bi);
        for handle in bundle.cells() {
            handle.write().update_free();
        }
    }

    fn update_occupied(&self, bi: CellIndex, p_m: Point2D) {
        let bundle = self.bundle_at(bi);
        for handle in bundle.cells() {
            handle.write().update_occupied(p_m);
        }
    }

    // === Queries ===

    /// Distance from `start` to the first bundle along the segment whose
    /// average occupancy reaches `threshold`, or the full segment length
    /// if none does.
    pub fn get_range(
        &self,
        start: Point2D,
        end: Point2D,
        model: &InverseModel,
        threshold: f64,
    ) -> f64 {
        let start_index = self.to_bundle_index(start);
        let end_index = self.to_bundle_index(end);
        let start_m = self.m_t_w.transform_point(start);

        for bi in BresenhamLine::new(start_index, end_index) {
            let occupied = match self.query_bundle(bi) {
                Some(bundle) => bundle.average_occupancy(model) >= threshold,
                None => false,
            };
            if occupied {
                let cell_corner = Point2D::new(
                    bi.x as f64 * self.bundle_resolution,
                    bi.y as f64 * self.bundle_resolution,
                );
                return (start_m - cell_corner).length();
            }
        }

        (start - end).length()
    }

    /// Occupancy-weighted normalized mixture at a world point
    pub fn sample(&self, p: Point2D, model: &InverseModel) -> f64 {
        self.sample_at(p, self.to_bundle_index(p), model)
    }

    /// Normalized mixture at a world point, with the bundle index already
    /// resolved
    pub fn sample_at(&self, p: Point2D, bi: CellIndex, model: &InverseModel) -> f64 {
        match self.query_bundle(bi) {
            Some(bundle) => bundle.sample(self.m_t_w.transform_point(p), model),
            None => 0.0,
        }
    }

    /// Occupancy-weighted non-normalized mixture at a world point
    pub fn sample_non_normalized(&self, p: Point2D, model: &InverseModel) -> f64 {
        self.sample_non_normalized_at(p, self.to_bundle_index(p), model)
    }

    /// Non-normalized mixture at a world point, with the bundle index
    /// already resolved
    pub fn sample_non_normalized_at(&self, p: Point2D, bi: CellIndex, model: &InverseModel) -> f64 {
        match self.query_bundle(bi) {
            Some(bundle) => bundle.sample_non_normalized(self.m_t_w.transform_point(p), model),
            None => 0.0,
        }
    }

    fn query_bundle(&self, bi: CellIndex) -> Option<Bundle> {
        match self.query_mode {
            QueryMode::Allocate => Some(self.bundle_at(bi)),
            QueryMode::ReadOnly => self.try_bundle_at(bi),
        }
    }

    // === Persistence support ===

    /// Clone of every allocated cell of one storey (unordered).
    pub fn storey_cells(&self, storey: usize) -> Vec<(CellIndex, OccupancyCell)> {
        self.storeys[storey]
            .lock()
            .iter()
            .map(|(index, handle)| (*index, *handle.read()))
            .collect()
    }

    /// Insert a cell into a storey directly (snapshot restore).
    pub(crate) fn insert_cell(&self, storey: usize, index: CellIndex, cell: OccupancyCell) {
        self.storeys[storey]
            .lock()
            .insert(index, Arc::new(RwLock::new(cell)));
    }

    /// Restore the index extent (snapshot restore).
    pub(crate) fn restore_extent(&self, extent: Option<(CellIndex, CellIndex)>) {
        self.cache.lock().extent = extent;
    }
}
