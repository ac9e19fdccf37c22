//! File collaborators of the analysis core, organized by format.
//!
//! - `geojson` - footprint and grid feature collections
//! - `geotiff` - single-band rasters
//! - `csv` - per-cell precision tables
//! - `fs` - atomic output files

pub mod csv;
pub mod fs;
pub mod geojson;
pub mod geotiff;

pub use csv::{precision_table, write_precision_csv};
pub use geojson::{read_feature_collection, write_feature_collection};
pub use geotiff::{read_raster, DEFAULT_NODATA};
