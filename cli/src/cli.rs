use std::path::PathBuf;

/// Built-up area precision analysis (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "builtup", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Download Overture building footprints for a bounding box
    Fetch(FetchArgs),

    /// Per-cell precision ratios over a grid (forbids stdout)
    Grid(GridArgs),

    /// One precision ratio for a whole region
    Region(RegionArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Bounding box as MINX,MINY,MAXX,MAXY in lon/lat
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: String,

    /// Output GeoJSON file (left untouched if it already exists)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Executable to run instead of `overturemaps`
    #[arg(long, default_value = builtup::acquire::OVERTURE_COMMAND)]
    pub command: String,
}

/// Inputs and analysis options shared by `grid` and `region`.
#[derive(clap::Args, Debug)]
pub struct AnalysisArgs {
    /// Building footprints (GeoJSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub footprints: PathBuf,

    /// Built-up surface raster (GeoTIFF)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub raster: PathBuf,

    /// Analysis configuration (JSON); flags below override it
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// No-data sentinel, overriding the one declared by the raster
    #[arg(long, allow_hyphen_values = true)]
    pub nodata: Option<f64>,

    /// Measure footprint areas in square metres (local UTM zone)
    #[arg(long)]
    pub metric: bool,

    /// Run on a single thread
    #[arg(long)]
    pub sequential: bool,
}

#[derive(clap::Args, Debug)]
pub struct GridArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Cell size in raster CRS units; without it the grid follows the raster pixels
    #[arg(long, conflicts_with = "arcsec")]
    pub cell_size: Option<f64>,

    /// Cell size in arc-seconds, e.g. 30 for the native GHSL spacing
    #[arg(long)]
    pub arcsec: Option<f64>,

    /// Grid extent as MINX,MINY,MAXX,MAXY in the raster CRS, defaults to the footprints' bounds
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Output grid GeoJSON with ghsl_sum, area and precision_ratio columns
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Also write the per-cell table as CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub csv: Option<PathBuf>,

    /// Overwrite existing outputs
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct RegionArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Region extent as MINX,MINY,MAXX,MAXY in the raster CRS, defaults to the footprints' bounds
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Write the footprints with area and ghsl_sum columns
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Overwrite existing outputs
    #[arg(long)]
    pub force: bool,
}
