//! Coordinate reference systems: identification, reprojection and area measurement.

mod area;
mod transform;

use std::fmt;

use proj4rs::proj::Proj;

use crate::error::{Error, Result};

pub use area::{footprint_areas, utm_zone_crs};
pub(crate) use area::AreaMeasure;
pub use transform::{reproject, Transformer};

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// A coordinate reference system identified by EPSG code and resolved to a PROJ.4 definition.
#[derive(Clone, Debug)]
pub struct Crs {
    epsg: u16,
    proj4: &'static str,
}

impl Crs {
    /// WGS84 longitude/latitude (EPSG:4326), the GeoJSON default.
    pub fn wgs84() -> Self {
        Self { epsg: 4326, proj4: WGS84_PROJ4 }
    }

    /// Resolve an EPSG code against the bundled definitions database.
    pub fn from_epsg(code: u32) -> Result<Self> {
        if code == 4326 { return Ok(Self::wgs84()) }

        let unknown = || Error::UnknownCrs(format!("EPSG:{code} is not a known CRS"));
        let epsg = u16::try_from(code).map_err(|_| unknown())?;
        let proj4 = crs_definitions::from_code(epsg)
            .map(|def| def.proj4)
            .ok_or_else(unknown)?;

        Ok(Self { epsg, proj4 })
    }

    /// Parse a CRS identifier: `4326`, `EPSG:4326`, `urn:ogc:def:crs:EPSG::4326`, or the
    /// OGC CRS84 aliases (which are lon/lat WGS84).
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let upper = text.to_ascii_uppercase();

        if upper == "CRS84" || upper.ends_with(":CRS84") {
            return Ok(Self::wgs84());
        }

        let code = upper.rsplit(':').next().unwrap_or_default();
        let code = code.parse::<u32>()
            .map_err(|_| Error::UnknownCrs(format!("cannot parse CRS identifier {text:?}")))?;
        Self::from_epsg(code)
    }

    #[inline] pub fn epsg(&self) -> u16 { self.epsg }

    #[inline] pub fn proj4(&self) -> &'static str { self.proj4 }

    /// Whether coordinates are longitude/latitude in degrees.
    #[inline] pub fn is_geographic(&self) -> bool { self.proj4.contains("+proj=longlat") }

    /// The URN used for the GeoJSON `crs` member.
    pub fn urn(&self) -> String { format!("urn:ogc:def:crs:EPSG::{}", self.epsg) }

    /// Build the projection, validating that the definition is usable.
    pub fn to_proj(&self) -> Result<Proj> {
        Proj::from_proj_string(self.proj4)
            .map_err(|e| Error::UnknownCrs(format!("{self}: {e:?}")))
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool { self.epsg == other.epsg }
}

impl Eq for Crs {}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Require two datasets to carry the same, known CRS.
pub(crate) fn ensure_same<'a>(left: Option<&'a Crs>, right: Option<&Crs>) -> Result<&'a Crs> {
    match (left, right) {
        (Some(left), Some(right)) if left == right => Ok(left),
        (Some(left), Some(right)) => Err(Error::CrsMismatch { left: left.to_string(), right: right.to_string() }),
        _ => Err(Error::UnknownCrs("both datasets must declare a CRS".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        for text in ["4326", "EPSG:4326", "epsg:4326", "urn:ogc:def:crs:EPSG::4326", "urn:ogc:def:crs:OGC:1.3:CRS84", "OGC:CRS84"] {
            assert_eq!(Crs::parse(text).unwrap().epsg(), 4326, "{text}");
        }
        assert_eq!(Crs::parse("EPSG:32617").unwrap().epsg(), 32617);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert!(matches!(Crs::from_epsg(1), Err(Error::UnknownCrs(_))));
        assert!(matches!(Crs::from_epsg(1_000_000), Err(Error::UnknownCrs(_))));
        assert!(matches!(Crs::parse("EPSG:abc"), Err(Error::UnknownCrs(_))));
        assert!(matches!(Crs::parse(""), Err(Error::UnknownCrs(_))));
    }

    #[test]
    fn geographic_detection() {
        assert!(Crs::wgs84().is_geographic());
        assert!(!Crs::from_epsg(32617).unwrap().is_geographic());
        assert!(!Crs::from_epsg(3857).unwrap().is_geographic());
    }

    #[test]
    fn same_crs_is_required() {
        let wgs84 = Crs::wgs84();
        let utm = Crs::from_epsg(32617).unwrap();
        assert!(ensure_same(Some(&wgs84), Some(&Crs::wgs84())).is_ok());
        assert!(matches!(ensure_same(Some(&wgs84), Some(&utm)), Err(Error::CrsMismatch { .. })));
        assert!(matches!(ensure_same(None, Some(&utm)), Err(Error::UnknownCrs(_))));
    }

    #[test]
    fn urn_round_trips() {
        let crs = Crs::from_epsg(32617).unwrap();
        assert_eq!(Crs::parse(&crs.urn()).unwrap(), crs);
    }
}
