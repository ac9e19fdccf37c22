mod transform;

use geo::Rect;
use ndarray::Array2;

use crate::crs::Crs;
use crate::error::{Error, Result};

pub use transform::{GeoTransform, PixelWindow};

/// A single-band raster: cell values, their placement, CRS and no-data sentinel.
/// Values are held widened to `f64` whatever the source sample type.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    values: Array2<f64>, // (row, col), row 0 is the first raster row
    transform: GeoTransform,
    crs: Option<Crs>,
    nodata: Option<f64>,
}

impl RasterGrid {
    pub fn new(values: Array2<f64>, transform: GeoTransform, crs: Option<Crs>, nodata: Option<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::invalid("raster has no cells"));
        }
        Ok(Self { values, transform, crs, nodata })
    }

    /// Build a raster from row-major values, e.g. `[[10, 20], [30, 40]]` as a flat vector.
    pub fn from_rows(rows: usize, cols: usize, values: Vec<f64>, transform: GeoTransform, crs: Option<Crs>, nodata: Option<f64>) -> Result<Self> {
        let values = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::invalid(format!("raster values do not fit {rows} × {cols}: {e}")))?;
        Self::new(values, transform, crs, nodata)
    }

    #[inline] pub fn width(&self) -> usize { self.values.ncols() }

    #[inline] pub fn height(&self) -> usize { self.values.nrows() }

    #[inline] pub fn values(&self) -> &Array2<f64> { &self.values }

    #[inline] pub fn transform(&self) -> &GeoTransform { &self.transform }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    /// The sentinel declared by the raster source, if any.
    #[inline] pub fn nodata(&self) -> Option<f64> { self.nodata }

    /// Per-axis absolute resolution (x, y).
    #[inline] pub fn resolution(&self) -> (f64, f64) { self.transform.resolution() }

    #[inline] pub fn get(&self, row: usize, col: usize) -> Option<f64> { self.values.get((row, col)).copied() }

    /// Footprint of one pixel.
    #[inline] pub fn pixel_rect(&self, row: usize, col: usize) -> Rect<f64> { self.transform.pixel_rect(row, col) }

    /// Extent covered by the whole raster.
    pub fn bounds(&self) -> Rect<f64> {
        Rect::new(
            self.transform.pixel_to_geo(0.0, 0.0),
            self.transform.pixel_to_geo(self.width() as f64, self.height() as f64),
        )
    }

    /// Pixels that may meet `rect`, clamped to the raster.
    #[inline]
    pub fn window(&self, rect: &Rect<f64>) -> Option<PixelWindow> {
        self.transform.window(rect, self.width(), self.height())
    }
}
