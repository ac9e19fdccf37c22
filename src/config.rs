use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which raster pixels are attributed to a polygon.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPolicy {
    /// Any pixel whose footprint meets the polygon, including boundary contact.
    #[default]
    AllTouched,
    /// Pixels whose centre lies inside (or on the boundary of) the polygon.
    CenterInside,
    /// Every touched pixel, weighted by the fraction of its area inside the polygon.
    AreaWeighted,
}

/// How raster values are screened before summing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Skip pixels equal to the no-data sentinel.
    #[default]
    Sentinel,
    /// Every finite value counts.
    None,
}

/// Units in which footprint and cell areas are measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnits {
    /// Planar area in the working CRS's own units (degrees² for EPSG:4326).
    #[default]
    Native,
    /// Square metres, measured in the UTM zone at the data's centre.
    Metric,
}

/// Pixel selection and screening rules for the zonal aggregator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonalConfig {
    pub touch: TouchPolicy,
    pub nodata: NoDataPolicy,
    /// Overrides the sentinel declared by the raster.
    pub nodata_value: Option<f64>,
    /// Fraction of a pixel's size by which its footprint is shrunk before
    /// testing contact, so exactly shared edges do not count as touching.
    pub edge_tolerance: f64,
}

impl Default for ZonalConfig {
    fn default() -> Self {
        Self {
            touch: TouchPolicy::AllTouched,
            nodata: NoDataPolicy::Sentinel,
            nodata_value: None,
            edge_tolerance: 1e-9,
        }
    }
}

/// Settings shared by every stage of an analysis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub zonal: ZonalConfig,
    pub area_units: AreaUnits,
    /// Spread per-feature work over the rayon pool. Results are identical either way.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            zonal: ZonalConfig::default(),
            area_units: AreaUnits::Native,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_bytes(&bytes)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_touched_with_native_areas() {
        let config = AnalysisConfig::default();
        assert_eq!(config.zonal.touch, TouchPolicy::AllTouched);
        assert_eq!(config.zonal.nodata, NoDataPolicy::Sentinel);
        assert_eq!(config.zonal.nodata_value, None);
        assert_eq!(config.area_units, AreaUnits::Native);
        assert!(config.parallel);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_bytes(
            br#"{ "zonal": { "touch": "area_weighted", "nodata_value": 0 }, "parallel": false }"#,
        ).unwrap();

        assert_eq!(config.zonal.touch, TouchPolicy::AreaWeighted);
        assert_eq!(config.zonal.nodata_value, Some(0.0));
        assert_eq!(config.zonal.edge_tolerance, 1e-9);
        assert_eq!(config.area_units, AreaUnits::Native);
        assert!(!config.parallel);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(AnalysisConfig::from_json_bytes(br#"{ "zonal": { "touch": "sometimes" } }"#).is_err());
    }
}
