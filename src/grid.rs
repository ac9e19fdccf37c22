//! Regular rectangular tilings used as analysis units.
//!
//! Cells are numbered row-major from the north-west corner: row 0 is the northernmost row and
//! columns run west to east, which is also the memory order of a north-up raster. Every cell
//! carries `row` and `col` attributes.

use geo::{Coord, MultiPolygon, Rect};
use serde_json::Value;
use tracing::debug;

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::geom::{bbox, Attributes, FeatureCollection};
use crate::raster::RasterGrid;

/// 30 arc-seconds in degrees, the native GHSL grid spacing.
pub const ARC_SECONDS_30: f64 = 30.0 / 3600.0;

/// Upper bound on generated cells, to catch unit mistakes (e.g. metres passed as degrees).
const MAX_CELLS: usize = 50_000_000;

/// Fraction of a cell below which a remainder is treated as rounding noise.
const SLIVER: f64 = 1e-9;

/// Tile `bounds` with square cells of `cell_size`, anchored at the top-left corner.
/// The last column and row are clipped to the extent when it is not an exact multiple of
/// the cell size.
///
/// Fails with `InvalidParameter` for a non-positive cell size, and also when the tiling would
/// exceed 50 million cells. That cap is a memory guard against a cell size given in the
/// wrong unit; a real GHSL tile at 30″ is far below it.
pub fn from_bounds(bounds: &Rect<f64>, cell_size: f64, crs: Option<Crs>) -> Result<FeatureCollection> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(Error::invalid(format!("cell size must be positive, got {cell_size}")));
    }
    let bounds = bbox(bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y)?;

    let count = |extent: f64| ((extent / cell_size) - SLIVER).ceil().max(1.0);
    let (cols, rows) = (count(bounds.width()), count(bounds.height()));
    if cols * rows > MAX_CELLS as f64 {
        return Err(Error::invalid(format!(
            "{cols} × {rows} cells of size {cell_size} exceeds the {MAX_CELLS} cell limit"
        )));
    }
    let (cols, rows) = (cols as usize, rows as usize);

    let (min, max) = (bounds.min(), bounds.max());
    let edge_x = |col: usize| if col == cols { max.x } else { min.x + col as f64 * cell_size };
    let edge_y = |row: usize| if row == rows { min.y } else { max.y - row as f64 * cell_size };

    let mut shapes = Vec::with_capacity(rows * cols);
    let mut attributes = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let rect = Rect::new(
                Coord { x: edge_x(col), y: edge_y(row + 1) },
                Coord { x: edge_x(col + 1), y: edge_y(row) },
            );
            shapes.push(MultiPolygon(vec![rect.to_polygon()]));
            attributes.push(cell_attributes(row, col));
        }
    }

    debug!(rows, cols, cell_size, "generated grid from bounds");
    FeatureCollection::with_attributes(shapes, attributes, crs)
}

/// One cell per raster pixel, in raster memory order.
pub fn from_raster(raster: &RasterGrid) -> Result<FeatureCollection> {
    let (rows, cols) = (raster.height(), raster.width());

    let mut shapes = Vec::with_capacity(rows * cols);
    let mut attributes = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            shapes.push(MultiPolygon(vec![raster.pixel_rect(row, col).to_polygon()]));
            attributes.push(cell_attributes(row, col));
        }
    }

    debug!(rows, cols, "generated grid from raster");
    FeatureCollection::with_attributes(shapes, attributes, raster.crs().cloned())
}

fn cell_attributes(row: usize, col: usize) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("row".into(), Value::from(row));
    attrs.insert("col".into(), Value::from(col));
    attrs
}
