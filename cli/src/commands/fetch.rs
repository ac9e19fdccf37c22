use anyhow::{Context, Result};
use builtup::acquire::{fetch_buildings, FetchOutcome};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::FetchArgs) -> Result<()> {
    let bbox = builtup::parse_bbox(&args.bbox)
        .with_context(|| format!("Invalid --bbox {:?}", args.bbox))?;

    match fetch_buildings(&bbox, &args.output, &args.command)? {
        FetchOutcome::Existing => eprintln!("{} already exists, skipping download", args.output.display()),
        FetchOutcome::Downloaded => eprintln!("wrote {}", args.output.display()),
    }

    Ok(())
}
