use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};
use tracing::debug;

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::geom::FeatureCollection;

/// A resolved source → target coordinate transformation.
/// Geographic coordinates are taken and returned in degrees.
pub struct Transformer {
    source: Crs,
    target: Crs,
    from: Proj,
    to: Proj,
}

impl Transformer {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        Ok(Self {
            from: source.to_proj()?,
            to: target.to_proj()?,
            source: source.clone(),
            target: target.clone(),
        })
    }

    /// Transform a single coordinate.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        // proj4rs works in radians for geographic CRS.
        let mut point = if self.source.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(&self.from, &self.to, &mut point)
            .map_err(|e| Error::Reprojection(format!(
                "({}, {}) from {} to {}: {e:?}", coord.x, coord.y, self.source, self.target
            )))?;

        let (x, y) = if self.target.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(Error::Reprojection(format!(
                "({}, {}) has no finite image from {} in {}", coord.x, coord.y, self.source, self.target
            )));
        }
        Ok(Coord { x, y })
    }

    /// Transform every coordinate of a shape.
    pub fn multipolygon(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        shape.try_map_coords(|coord| self.coord(coord))
    }
}

/// Reproject a collection into `target`. Both CRS are validated even when they are
/// identical, in which case the coordinates are returned untouched.
pub fn reproject(features: &FeatureCollection, target: &Crs) -> Result<FeatureCollection> {
    let source = features.require_crs()?;
    let transformer = Transformer::new(source, target)?;

    if source == target {
        debug!(crs = %target, "reprojection is a no-op");
        return Ok(features.clone());
    }

    debug!(from = %source, to = %target, features = features.len(), "reprojecting");
    let shapes = features.shapes().iter()
        .map(|shape| transformer.multipolygon(shape))
        .collect::<Result<Vec<_>>>()?;

    Ok(features.with_shapes(shapes, target.clone()))
}
