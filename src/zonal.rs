//! Zonal sums of raster values over polygons.

use geo::{Area, BooleanOps, BoundingRect, Coord, Intersects, MultiPolygon, Point, Rect};
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::debug;

use crate::config::{NoDataPolicy, TouchPolicy, ZonalConfig};
use crate::crs;
use crate::error::{Error, Result};
use crate::geom::FeatureCollection;
use crate::raster::RasterGrid;

/// Aggregate raster value per feature, indexed like the input collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalResult {
    sums: Vec<f64>,
    counts: Vec<usize>,
}

impl ZonalResult {
    pub fn new(sums: Vec<f64>, counts: Vec<usize>) -> Result<Self> {
        if sums.len() != counts.len() {
            return Err(Error::invalid(format!("{} sums but {} counts", sums.len(), counts.len())));
        }
        Ok(Self { sums, counts })
    }

    #[inline] pub fn len(&self) -> usize { self.sums.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.sums.is_empty() }

    /// Sums per feature; features without a valid pixel read 0.
    #[inline] pub fn sums(&self) -> &[f64] { &self.sums }

    /// Number of valid pixels that contributed to each sum.
    #[inline] pub fn counts(&self) -> &[usize] { &self.counts }

    #[inline] pub fn sum(&self, idx: usize) -> Option<f64> { self.sums.get(idx).copied() }

    /// Sum over all features.
    pub fn total(&self) -> f64 { self.sums.iter().sum() }
}

/// Sum the raster values attributed to every polygon of `features`.
///
/// Polygons and raster must share a CRS. With `parallel` the polygons are spread over the
/// rayon pool; each polygon is still summed sequentially in row-major pixel order, so the
/// result does not depend on the thread count.
pub fn zonal_sums(features: &FeatureCollection, raster: &RasterGrid, config: &ZonalConfig, parallel: bool) -> Result<ZonalResult> {
    crs::ensure_same(features.crs(), raster.crs())?;

    if !(0.0..0.5).contains(&config.edge_tolerance) {
        return Err(Error::invalid(format!("edge tolerance must be in [0, 0.5), got {}", config.edge_tolerance)));
    }

    let zones = Zones::new(raster, config);
    let stats = if parallel {
        features.shapes().par_iter().map(|shape| zones.stat(shape)).collect::<Vec<_>>()
    } else {
        features.shapes().iter().map(|shape| zones.stat(shape)).collect::<Vec<_>>()
    };

    let (sums, counts): (Vec<_>, Vec<_>) = stats.into_iter().unzip();
    let empty = counts.iter().filter(|&&count| count == 0).count();
    debug!(features = sums.len(), empty, policy = ?config.touch, "zonal sums computed");

    ZonalResult::new(sums, counts)
}

type Hits = SmallVec<[(usize, usize, f64); 16]>; // (row, col, weight)

/// Pixel selection over one raster under one configuration.
struct Zones<'a> {
    raster: &'a RasterGrid,
    touch: TouchPolicy,
    nodata: Option<f64>,
    shrink: (f64, f64),
}

impl<'a> Zones<'a> {
    fn new(raster: &'a RasterGrid, config: &ZonalConfig) -> Self {
        let nodata = match config.nodata {
            NoDataPolicy::Sentinel => config.nodata_value.or(raster.nodata()),
            NoDataPolicy::None => None,
        };
        let (dx, dy) = raster.resolution();
        Self {
            raster,
            touch: config.touch,
            nodata,
            shrink: (dx * config.edge_tolerance, dy * config.edge_tolerance),
        }
    }

    #[inline]
    fn is_valid(&self, value: f64) -> bool {
        !value.is_nan() && self.nodata.is_none_or(|nodata| value != nodata)
    }

    /// (sum, valid pixel count) for one polygon.
    fn stat(&self, shape: &MultiPolygon<f64>) -> (f64, usize) {
        let mut sum = 0.0;
        let mut count = 0;
        for (row, col, weight) in self.hits(shape) {
            let Some(value) = self.raster.get(row, col) else { continue };
            if self.is_valid(value) {
                sum += value * weight;
                count += 1;
            }
        }
        (sum, count)
    }

    /// Pixels attributed to `shape`, row-major, with their weights.
    fn hits(&self, shape: &MultiPolygon<f64>) -> Hits {
        let Some(window) = shape.bounding_rect().and_then(|rect| self.raster.window(&rect)) else {
            return Hits::new();
        };

        match self.touch {
            TouchPolicy::AllTouched => {
                let strict = window.iter()
                    .filter(|&(row, col)| shape.intersects(&self.shrunk(self.raster.pixel_rect(row, col))))
                    .map(|(row, col)| (row, col, 1.0))
                    .collect::<Hits>();
                if !strict.is_empty() || shape.unsigned_area() > 0.0 { return strict }

                // Zero-area polygon lying on pixel boundaries.
                window.iter()
                    .filter(|&(row, col)| shape.intersects(&self.raster.pixel_rect(row, col)))
                    .map(|(row, col)| (row, col, 1.0))
                    .collect()
            }
            TouchPolicy::CenterInside => window.iter()
                .filter(|&(row, col)| shape.intersects(&Point::from(self.raster.transform().pixel_center(row, col))))
                .map(|(row, col)| (row, col, 1.0))
                .collect(),
            TouchPolicy::AreaWeighted => window.iter()
                .filter_map(|(row, col)| {
                    let pixel = self.raster.pixel_rect(row, col);
                    if !shape.intersects(&pixel) { return None }
                    let inside = shape.intersection(&pixel.to_polygon()).unsigned_area();
                    (inside > 0.0).then(|| (row, col, inside / pixel.unsigned_area()))
                })
                .collect(),
        }
    }

    /// Pixel footprint pulled in by the edge tolerance on every side.
    #[inline]
    fn shrunk(&self, rect: Rect<f64>) -> Rect<f64> {
        let (sx, sy) = self.shrink;
        Rect::new(
            Coord { x: rect.min().x + sx, y: rect.min().y + sy },
            Coord { x: rect.max().x - sx, y: rect.max().y - sy },
        )
    }
}
