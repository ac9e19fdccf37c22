//! Reconciliation of raster estimates against footprint area.

use geo::{BooleanOps, BoundingRect, MultiPolygon, Relate};
use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::config::AreaUnits;
use crate::crs::{self, AreaMeasure};
use crate::error::{Error, Result};
use crate::geom::FeatureCollection;
use crate::zonal::ZonalResult;

/// Raster estimate, footprint area and their ratio for one spatial unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct PrecisionRow {
    pub raster_sum: f64,
    pub vector_area: f64,
    /// `raster_sum / vector_area × 100`, or 0 where that is not finite.
    pub ratio: f64,
}

impl PrecisionRow {
    pub fn new(raster_sum: f64, vector_area: f64) -> Self {
        Self { raster_sum, vector_area, ratio: precision_ratio(raster_sum, vector_area) }
    }
}

/// Per-cell reconciliation, indexed like the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct PrecisionResult {
    rows: Vec<PrecisionRow>,
    joined: usize, // number of (footprint, cell) pairs found by the spatial join
}

impl PrecisionResult {
    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    #[inline] pub fn rows(&self) -> &[PrecisionRow] { &self.rows }

    #[inline] pub fn get(&self, idx: usize) -> Option<&PrecisionRow> { self.rows.get(idx) }

    /// Number of overlapping (footprint, cell) pairs.
    #[inline] pub fn joined_pairs(&self) -> usize { self.joined }

    /// True when no footprint intersected any cell. This is a valid all-zero result.
    #[inline] pub fn is_empty_join(&self) -> bool { self.joined == 0 }

    pub fn ratios(&self) -> Vec<f64> { self.rows.iter().map(|row| row.ratio).collect() }

    pub fn vector_areas(&self) -> Vec<f64> { self.rows.iter().map(|row| row.vector_area).collect() }

    /// Region-wide totals: summed raster estimate and footprint area, and the ratio of the sums.
    pub fn totals(&self) -> PrecisionRow {
        let raster_sum = self.rows.iter().map(|row| row.raster_sum).sum();
        let vector_area = self.rows.iter().map(|row| row.vector_area).sum();
        PrecisionRow::new(raster_sum, vector_area)
    }
}

/// Ratio of raster estimate to footprint area as a percentage. Division results that are
/// not finite (no footprint area) are reported as 0.
#[inline]
pub fn precision_ratio(raster_sum: f64, vector_area: f64) -> f64 {
    let ratio = raster_sum / vector_area * 100.0;
    if ratio.is_finite() { ratio } else { 0.0 }
}

/// How a footprint contributes to one cell.
enum Piece {
    /// The cell covers the whole footprint.
    Whole,
    /// Only this part of the footprint lies in the cell.
    Clipped(MultiPolygon<f64>),
}

type Pieces = SmallVec<[(usize, Piece); 4]>; // (cell, piece)

/// Footprint area per cell.
///
/// Every footprint is joined to each cell whose interior it overlaps and contributes the area of
/// its part inside that cell; a footprint inside a single cell contributes its precomputed
/// `areas[i]`. `areas` must be measured in `units`, as [`crs::footprint_areas`] does.
pub fn cell_areas(
    footprints: &FeatureCollection,
    areas: &[f64],
    grid: &FeatureCollection,
    units: AreaUnits,
    parallel: bool,
) -> Result<(Vec<f64>, usize)> {
    let crs = crs::ensure_same(grid.crs(), footprints.crs())?;

    if areas.len() != footprints.len() {
        return Err(Error::invalid(format!("{} areas for {} footprints", areas.len(), footprints.len())));
    }
    if let Some((idx, area)) = areas.iter().enumerate().find(|(_, area)| !(**area >= 0.0 && area.is_finite())) {
        return Err(Error::invalid(format!("footprint {idx} has invalid area {area}")));
    }

    let join = |shape: &MultiPolygon<f64>| -> Pieces {
        let Some(rect) = shape.bounding_rect() else { return Pieces::new() };
        grid.query(&rect).into_iter()
            .filter_map(|cell| {
                let matrix = grid.shapes()[cell].relate(shape);
                // Contact along an edge contributes no area.
                if !matrix.is_intersects() || matrix.is_touches() { return None }
                let piece = if matrix.is_covers() {
                    Piece::Whole
                } else {
                    Piece::Clipped(grid.shapes()[cell].intersection(shape))
                };
                Some((cell, piece))
            })
            .collect()
    };

    let joined = if parallel {
        footprints.shapes().par_iter().map(join).collect::<Vec<_>>()
    } else {
        footprints.shapes().iter().map(join).collect::<Vec<_>>()
    };

    // Accumulate in footprint order so the sums do not depend on scheduling.
    let measure = AreaMeasure::new(Some(crs), units, footprints.bounds())?;
    let mut cell_area = vec![0.0; grid.len()];
    let mut pairs = 0;
    for (idx, pieces) in joined.into_iter().enumerate() {
        for (cell, piece) in pieces {
            cell_area[cell] += match piece {
                Piece::Whole => areas[idx],
                Piece::Clipped(part) => measure.area(&part)?,
            };
            pairs += 1;
        }
    }

    Ok((cell_area, pairs))
}

/// Reconcile a grid's zonal sums against the footprints that fall in each cell.
pub fn reconcile(
    grid: &FeatureCollection,
    zonal: &ZonalResult,
    footprints: &FeatureCollection,
    areas: &[f64],
    units: AreaUnits,
    parallel: bool,
) -> Result<PrecisionResult> {
    if zonal.len() != grid.len() {
        return Err(Error::invalid(format!("{} zonal sums for {} grid cells", zonal.len(), grid.len())));
    }
    if let Some((idx, sum)) = zonal.sums().iter().enumerate().find(|(_, sum)| **sum < 0.0) {
        return Err(Error::invalid(format!("grid cell {idx} has negative raster sum {sum}")));
    }

    let (vector_areas, joined) = cell_areas(footprints, areas, grid, units, parallel)?;
    if joined == 0 {
        warn!(cells = grid.len(), footprints = footprints.len(), "spatial join is empty; every ratio is 0");
    }

    let rows = zonal.sums().iter().zip(&vector_areas)
        .map(|(&raster_sum, &vector_area)| PrecisionRow::new(raster_sum, vector_area))
        .collect::<Vec<_>>();

    let result = PrecisionResult { rows, joined };
    let totals = result.totals();
    debug!(cells = result.len(), joined, ratio = totals.ratio, "reconciled grid");
    Ok(result)
}
