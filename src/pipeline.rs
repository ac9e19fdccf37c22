//! End-to-end analyses composed from the individual stages.
//!
//! Both entry points take their inputs by reference and return new collections; the inputs
//! are never modified. All geometry work happens in the raster's CRS.

use geo::{MultiPolygon, Rect};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::crs::{self, Crs};
use crate::error::{Error, Result};
use crate::geom::FeatureCollection;
use crate::grid;
use crate::precision::{self, PrecisionResult, PrecisionRow};
use crate::raster::RasterGrid;
use crate::zonal::{self, ZonalResult};

/// How the analysis grid is laid out.
#[derive(Clone, Debug, PartialEq)]
pub enum GridSpec {
    /// One cell per raster pixel.
    Raster,
    /// Square cells of `cell_size` over `bounds`, given in the raster CRS.
    Bounds { bounds: Rect<f64>, cell_size: f64 },
    /// Square cells of `cell_size` over the total bounds of the footprints.
    FootprintBounds { cell_size: f64 },
}

/// Output of [`grid_analysis`].
#[derive(Clone, Debug)]
pub struct GridAnalysis {
    /// Footprints in the raster CRS, with an `area` column.
    pub footprints: FeatureCollection,
    /// Grid cells with `ghsl_sum`, `area` and `precision_ratio` columns.
    pub grid: FeatureCollection,
    pub zonal: ZonalResult,
    pub precision: PrecisionResult,
}

/// Output of [`region_analysis`].
#[derive(Clone, Debug)]
pub struct RegionAnalysis {
    /// Footprints in the raster CRS, with `area` and `ghsl_sum` columns.
    pub footprints: FeatureCollection,
    /// The single cell the region was reduced to.
    pub extent: Rect<f64>,
    /// Raster sum over the extent against the footprint area inside it.
    pub summary: PrecisionRow,
    /// Sum of the per-footprint raster sums against the total footprint area.
    pub footprint_summary: PrecisionRow,
}

/// Footprints in the raster CRS with their areas.
fn prepare(footprints: &FeatureCollection, raster: &RasterGrid, config: &AnalysisConfig) -> Result<(FeatureCollection, Vec<f64>)> {
    let target = raster.crs()
        .ok_or_else(|| Error::UnknownCrs("raster has no CRS".into()))?;

    let footprints = crs::reproject(footprints, target)?;
    debug!(footprints = footprints.len(), crs = %target, "footprints in raster CRS");

    let areas = crs::footprint_areas(&footprints, config.area_units)?;
    let footprints = footprints.with_column("area", &areas)?;
    Ok((footprints, areas))
}

/// Total bounds of the footprints, or the raster extent when there are none.
fn footprint_extent(footprints: &FeatureCollection, raster: &RasterGrid) -> Rect<f64> {
    footprints.bounds().unwrap_or_else(|| {
        debug!("no footprint geometry, using the raster extent");
        raster.bounds()
    })
}

fn build_grid(spec: &GridSpec, footprints: &FeatureCollection, raster: &RasterGrid, crs: &Crs) -> Result<FeatureCollection> {
    match spec {
        GridSpec::Raster => grid::from_raster(raster),
        GridSpec::Bounds { bounds, cell_size } => grid::from_bounds(bounds, *cell_size, Some(crs.clone())),
        GridSpec::FootprintBounds { cell_size } => {
            grid::from_bounds(&footprint_extent(footprints, raster), *cell_size, Some(crs.clone()))
        }
    }
}

/// Per-cell precision ratios over a grid.
pub fn grid_analysis(
    footprints: &FeatureCollection,
    raster: &RasterGrid,
    spec: &GridSpec,
    config: &AnalysisConfig,
) -> Result<GridAnalysis> {
    info!(footprints = footprints.len(), width = raster.width(), height = raster.height(), "starting grid analysis");
    let (footprints, areas) = prepare(footprints, raster, config)?;
    let crs = footprints.require_crs()?.clone();

    let cells = build_grid(spec, &footprints, raster, &crs)?;
    info!(cells = cells.len(), "grid built");

    let zonal = zonal::zonal_sums(&cells, raster, &config.zonal, config.parallel)?;
    info!(total = zonal.total(), "zonal sums computed");

    let precision = precision::reconcile(&cells, &zonal, &footprints, &areas, config.area_units, config.parallel)?;
    let totals = precision.totals();
    info!(raster_sum = totals.raster_sum, vector_area = totals.vector_area, ratio = totals.ratio, "grid reconciled");

    let grid = cells
        .with_column("ghsl_sum", zonal.sums())?
        .with_column("area", &precision.vector_areas())?
        .with_column("precision_ratio", &precision.ratios())?;

    Ok(GridAnalysis { footprints, grid, zonal, precision })
}

/// One precision ratio for a whole region. `extent` is in the raster CRS; without it the
/// region is the total bounds of the footprints, or the raster extent if there are none.
pub fn region_analysis(
    footprints: &FeatureCollection,
    raster: &RasterGrid,
    extent: Option<Rect<f64>>,
    config: &AnalysisConfig,
) -> Result<RegionAnalysis> {
    info!(footprints = footprints.len(), "starting region analysis");
    let (footprints, areas) = prepare(footprints, raster, config)?;
    let crs = footprints.require_crs()?.clone();

    let extent = match extent {
        Some(extent) => crate::geom::bbox(extent.min().x, extent.min().y, extent.max().x, extent.max().y)?,
        None => footprint_extent(&footprints, raster),
    };
    let region = FeatureCollection::new(vec![MultiPolygon(vec![extent.to_polygon()])], Some(crs));

    let zonal = zonal::zonal_sums(&region, raster, &config.zonal, config.parallel)?;
    let precision = precision::reconcile(&region, &zonal, &footprints, &areas, config.area_units, config.parallel)?;
    let summary = precision.totals();
    info!(raster_sum = summary.raster_sum, vector_area = summary.vector_area, ratio = summary.ratio, "region reconciled");

    // Footprint-level view: every footprint gets the raster pixels it touches.
    let per_footprint = zonal::zonal_sums(&footprints, raster, &config.zonal, config.parallel)?;
    let footprint_summary = PrecisionRow::new(per_footprint.total(), areas.iter().sum());
    debug!(raster_sum = footprint_summary.raster_sum, ratio = footprint_summary.ratio, "footprint-level totals");

    let footprints = footprints.with_column("ghsl_sum", per_footprint.sums())?;
    Ok(RegionAnalysis { footprints, extent, summary, footprint_summary })
}
