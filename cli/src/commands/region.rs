use anyhow::{Context, Result};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RegionArgs) -> Result<()> {
    let extent = args.bbox.as_deref()
        .map(|text| builtup::parse_bbox(text).with_context(|| format!("Invalid --bbox {text:?}")))
        .transpose()?;

    let config = super::load_config(&args.analysis)?;
    let (footprints, raster) = super::load_inputs(&args.analysis, &config)?;

    let analysis = builtup::region_analysis(&footprints, &raster, extent, &config)?;
    if let Some(output) = &args.output {
        builtup::io::write_feature_collection(&analysis.footprints, output, args.force)?;
    }

    let summary = analysis.summary;
    println!("extent: {}", builtup::format_bbox(&analysis.extent));
    println!("raster sum: {}", summary.raster_sum);
    println!("footprint area: {}", summary.vector_area);
    println!("precision ratio: {:.2}%", summary.ratio);
    println!("footprint-level raster sum: {}", analysis.footprint_summary.raster_sum);
    println!("footprint-level precision ratio: {:.2}%", analysis.footprint_summary.ratio);

    Ok(())
}
