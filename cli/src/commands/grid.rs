use anyhow::{bail, Context, Result};
use builtup::GridSpec;

/// Cell size from `--cell-size` or `--arcsec`, in raster CRS units.
fn cell_size(args: &crate::cli::GridArgs) -> Option<f64> {
    args.cell_size.or(args.arcsec.map(|arcsec| arcsec / 3600.0))
}

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::GridArgs) -> Result<()> {
    let spec = match (cell_size(args), &args.bbox) {
        (None, None) => GridSpec::Raster,
        (None, Some(_)) => bail!("--bbox needs --cell-size or --arcsec"),
        (Some(cell_size), None) => GridSpec::FootprintBounds { cell_size },
        (Some(cell_size), Some(text)) => GridSpec::Bounds {
            bounds: builtup::parse_bbox(text).with_context(|| format!("Invalid --bbox {text:?}"))?,
            cell_size,
        },
    };

    let config = super::load_config(&args.analysis)?;
    let (footprints, raster) = super::load_inputs(&args.analysis, &config)?;

    let analysis = builtup::grid_analysis(&footprints, &raster, &spec, &config)?;
    if analysis.precision.is_empty_join() {
        eprintln!("warning: no footprint intersects the grid; every ratio is 0");
    }

    builtup::io::write_feature_collection(&analysis.grid, &args.output, args.force)?;
    if let Some(csv) = &args.csv {
        builtup::io::write_precision_csv(&analysis.grid, &analysis.precision, csv, args.force)?;
    }

    let totals = analysis.precision.totals();
    println!("cells: {}", analysis.grid.len());
    println!("raster sum: {}", totals.raster_sum);
    println!("footprint area: {}", totals.vector_area);
    println!("precision ratio: {:.2}%", totals.ratio);

    Ok(())
}
