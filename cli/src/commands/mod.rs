pub mod fetch;
pub mod grid;
pub mod region;

use anyhow::{Context, Result};
use builtup::{AnalysisConfig, AreaUnits, FeatureCollection, NoDataPolicy, RasterGrid};
use tracing::info;

use crate::cli::AnalysisArgs;

/// Load the configuration file (if any) and apply the command-line overrides.
pub(crate) fn load_config(args: &AnalysisArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(nodata) = args.nodata {
        config.zonal.nodata = NoDataPolicy::Sentinel;
        config.zonal.nodata_value = Some(nodata);
    }
    if args.metric { config.area_units = AreaUnits::Metric; }
    if args.sequential { config.parallel = false; }

    Ok(config)
}

/// Read the footprints and the raster named on the command line.
pub(crate) fn load_inputs(args: &AnalysisArgs, config: &AnalysisConfig) -> Result<(FeatureCollection, RasterGrid)> {
    let footprints = builtup::io::read_feature_collection(&args.footprints)?;
    info!(path = %args.footprints.display(), features = footprints.len(), "loaded footprints");

    let raster = builtup::io::read_raster(&args.raster, config.zonal.nodata_value.or(Some(builtup::io::DEFAULT_NODATA)))
        .with_context(|| format!("Failed to load raster {}", args.raster.display()))?;
    info!(path = %args.raster.display(), width = raster.width(), height = raster.height(), "loaded raster");

    Ok((footprints, raster))
}
