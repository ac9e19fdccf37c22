//! Per-cell precision tables.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{CsvWriter, NamedFrom}, series::Series};

use crate::geom::FeatureCollection;
use crate::io::fs::open_for_write;
use crate::precision::PrecisionResult;

/// One row per grid cell: `cell`, `row`, `col`, `ghsl_sum`, `area`, `precision_ratio`.
pub fn precision_table(grid: &FeatureCollection, result: &PrecisionResult) -> Result<DataFrame> {
    ensure!(
        grid.len() == result.len(),
        "[io::csv] {} grid cells but {} precision rows", grid.len(), result.len()
    );

    let index = |column: Vec<Option<f64>>| column.into_iter().map(|v| v.map(|v| v as u64)).collect::<Vec<_>>();
    let rows = result.rows();

    let df = DataFrame::new(vec![
        Series::new("cell".into(), (0..grid.len() as u64).collect::<Vec<_>>()).into(),
        Series::new("row".into(), index(grid.column("row"))).into(),
        Series::new("col".into(), index(grid.column("col"))).into(),
        Series::new("ghsl_sum".into(), rows.iter().map(|r| r.raster_sum).collect::<Vec<_>>()).into(),
        Series::new("area".into(), rows.iter().map(|r| r.vector_area).collect::<Vec<_>>()).into(),
        Series::new("precision_ratio".into(), rows.iter().map(|r| r.ratio).collect::<Vec<_>>()).into(),
    ])?;
    Ok(df)
}

/// Write a DataFrame as CSV to `path`, atomically.
pub fn write_csv(df: &mut DataFrame, path: &Path, force: bool) -> Result<()> {
    let mut pending = open_for_write(path, force)?;
    CsvWriter::new(&mut pending)
        .finish(df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {}", path.display()))?;
    pending.finalize()
}

/// Write the per-cell precision table of a grid analysis.
pub fn write_precision_csv(grid: &FeatureCollection, result: &PrecisionResult, path: &Path, force: bool) -> Result<()> {
    let mut df = precision_table(grid, result)?;
    write_csv(&mut df, path, force)
}
