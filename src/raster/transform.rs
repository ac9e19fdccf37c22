use geo::{Coord, Rect};

use crate::error::{Error, Result};

/// North-up affine transform from (col, row) pixel indices to CRS coordinates.
///
/// Pixel `(row, col)` covers `[origin_x + col·pixel_width, origin_x + (col+1)·pixel_width]`
/// horizontally and `[origin_y + row·pixel_height, origin_y + (row+1)·pixel_height]` vertically.
/// `pixel_height` is negative for the usual top-down layout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoTransform {
    /// X-coordinate of the outer corner of pixel (0, 0)
    pub origin_x: f64,
    /// Y-coordinate of the outer corner of pixel (0, 0)
    pub origin_y: f64,
    /// Pixel width in CRS units
    pub pixel_width: f64,
    /// Pixel height in CRS units (typically negative)
    pub pixel_height: f64,
}

/// Inclusive pixel index ranges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelWindow {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl PixelWindow {
    /// Iterate (row, col) pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row_min..=self.row_max)
            .flat_map(move |row| (self.col_min..=self.col_max).map(move |col| (row, col)))
    }
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v != 0.0;
        if !origin_x.is_finite() || !origin_y.is_finite() || !valid(pixel_width) || !valid(pixel_height) {
            return Err(Error::invalid(format!(
                "degenerate raster transform: origin ({origin_x}, {origin_y}), pixel {pixel_width} × {pixel_height}"
            )));
        }
        Ok(Self { origin_x, origin_y, pixel_width, pixel_height })
    }

    /// Convert pixel coordinates to CRS coordinates.
    #[inline]
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> Coord<f64> {
        Coord {
            x: self.origin_x + col * self.pixel_width,
            y: self.origin_y + row * self.pixel_height,
        }
    }

    /// Convert CRS coordinates to fractional pixel coordinates (col, row).
    #[inline]
    pub fn geo_to_pixel(&self, coord: Coord<f64>) -> (f64, f64) {
        ((coord.x - self.origin_x) / self.pixel_width, (coord.y - self.origin_y) / self.pixel_height)
    }

    /// Footprint of a single pixel.
    #[inline]
    pub fn pixel_rect(&self, row: usize, col: usize) -> Rect<f64> {
        Rect::new(
            self.pixel_to_geo(col as f64, row as f64),
            self.pixel_to_geo(col as f64 + 1.0, row as f64 + 1.0),
        )
    }

    /// Centre of a single pixel.
    #[inline]
    pub fn pixel_center(&self, row: usize, col: usize) -> Coord<f64> {
        self.pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Absolute (x, y) resolution.
    #[inline]
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Candidate pixels for a rectangle in a `width × height` raster: every pixel whose footprint
    /// meets the rectangle, padded by one pixel on each side to absorb rounding.
    /// `None` if the rectangle lies entirely outside the raster.
    pub fn window(&self, rect: &Rect<f64>, width: usize, height: usize) -> Option<PixelWindow> {
        if width == 0 || height == 0 { return None }

        let (c0, r0) = self.geo_to_pixel(rect.min());
        let (c1, r1) = self.geo_to_pixel(rect.max());

        let span = |a: f64, b: f64, n: usize| -> Option<(usize, usize)> {
            let (lo, hi) = (a.min(b), a.max(b));
            if !lo.is_finite() || !hi.is_finite() || hi < -1.0 || lo > n as f64 + 1.0 { return None }
            let lo = (lo.floor() - 1.0).max(0.0) as usize;
            let hi = ((hi.floor() + 1.0).max(0.0) as usize).min(n - 1);
            (lo <= hi).then_some((lo, hi))
        };

        let (col_min, col_max) = span(c0, c1, width)?;
        let (row_min, row_max) = span(r0, r1, height)?;
        Some(PixelWindow { row_min, row_max, col_min, col_max })
    }
}
