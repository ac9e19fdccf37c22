use geo::{Area, Coord, MultiPolygon, Rect};
use tracing::debug;

use crate::config::AreaUnits;
use crate::crs::{Crs, Transformer};
use crate::error::{Error, Result};
use crate::geom::FeatureCollection;

/// The WGS84 UTM zone CRS containing a lon/lat point:
/// 326zz north of the equator, 327zz south of it.
pub fn utm_zone_crs(center: Coord<f64>) -> Result<Crs> {
    if !center.x.is_finite() || !center.y.is_finite() || center.y.abs() > 90.0 {
        return Err(Error::invalid(format!("({}, {}) is not a lon/lat position", center.x, center.y)));
    }

    let zone = (((center.x + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u32;
    let base = if center.y >= 0.0 { 32600 } else { 32700 };
    Crs::from_epsg(base + zone)
}

/// Measures planar area either directly in the working CRS or after projecting to metres.
pub(crate) enum AreaMeasure {
    Planar,
    Projected(Transformer),
}

impl AreaMeasure {
    /// Choose how to measure shapes in `crs` whose extent is `bounds`.
    pub(crate) fn new(crs: Option<&Crs>, units: AreaUnits, bounds: Option<Rect<f64>>) -> Result<Self> {
        match units {
            AreaUnits::Native => Ok(Self::Planar),
            AreaUnits::Metric => {
                let crs = crs.ok_or_else(|| Error::UnknownCrs("metric areas need a CRS".into()))?;
                if !crs.is_geographic() {
                    // Projected CRS are measured in their own linear unit.
                    return Ok(Self::Planar);
                }

                let center = bounds.map(|b| b.center()).unwrap_or(Coord { x: 0.0, y: 0.0 });
                let utm = utm_zone_crs(center)?;
                debug!(from = %crs, to = %utm, "measuring areas in UTM");
                Ok(Self::Projected(Transformer::new(crs, &utm)?))
            }
        }
    }

    pub(crate) fn area(&self, shape: &MultiPolygon<f64>) -> Result<f64> {
        match self {
            Self::Planar => Ok(shape.unsigned_area()),
            Self::Projected(transformer) => Ok(transformer.multipolygon(shape)?.unsigned_area()),
        }
    }
}

/// Planar area of every feature, in insertion order.
pub fn footprint_areas(features: &FeatureCollection, units: AreaUnits) -> Result<Vec<f64>> {
    let measure = AreaMeasure::new(features.crs(), units, features.bounds())?;
    features.shapes().iter()
        .map(|shape| measure.area(shape))
        .collect()
}
