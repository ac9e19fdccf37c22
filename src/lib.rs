#![doc = "Builtup public API: raster-vector areal reconciliation of built-up surface estimates"]
mod config;
mod error;
mod geom;
mod precision;
mod raster;
mod zonal;

pub mod acquire;
pub mod crs;
pub mod grid;
pub mod io;
pub mod pipeline;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use config::{AnalysisConfig, AreaUnits, NoDataPolicy, TouchPolicy, ZonalConfig};

#[doc(inline)]
pub use crs::{reproject, Crs};

#[doc(inline)]
pub use geom::{bbox, format_bbox, parse_bbox, Attributes, FeatureCollection};

#[doc(inline)]
pub use raster::{GeoTransform, PixelWindow, RasterGrid};

#[doc(inline)]
pub use zonal::{zonal_sums, ZonalResult};

#[doc(inline)]
pub use precision::{cell_areas, precision_ratio, reconcile, PrecisionResult, PrecisionRow};

#[doc(inline)]
pub use pipeline::{grid_analysis, region_analysis, GridAnalysis, GridSpec, RegionAnalysis};
