//! Building footprint acquisition through the `overturemaps` command-line tool.

use std::path::Path;
use std::process::Command;

use geo::Rect;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::geom::format_bbox;

/// Default executable for Overture Maps downloads.
pub const OVERTURE_COMMAND: &str = "overturemaps";

/// What [`fetch_buildings`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The output file was already present; nothing was run.
    Existing,
    /// The command ran and produced the output file.
    Downloaded,
}

/// Download the Overture building footprints inside `bbox` as GeoJSON to `output`, unless
/// `output` already exists. Failures are reported once and never retried.
pub fn fetch_buildings(bbox: &Rect<f64>, output: &Path, command: &str) -> Result<FetchOutcome> {
    if output.exists() {
        info!(path = %output.display(), "footprints already downloaded");
        return Ok(FetchOutcome::Existing);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let bbox = format_bbox(bbox);
    info!(command, bbox = %bbox, path = %output.display(), "downloading building footprints");

    let result = Command::new(command)
        .arg("download")
        .arg(format!("--bbox={bbox}"))
        .args(["-f", "geojson", "-t", "building", "-o"])
        .arg(output)
        .output()
        .map_err(|e| Error::AcquisitionFailure(format!("{command} failed to start: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(command, status = %result.status, "download command failed");
        return Err(Error::AcquisitionFailure(format!("{command} exited with {}: {}", result.status, stderr.trim())));
    }
    if !output.exists() {
        return Err(Error::AcquisitionFailure(format!(
            "{command} succeeded but did not produce {}", output.display()
        )));
    }

    Ok(FetchOutcome::Downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bbox;

    fn durham() -> Rect<f64> {
        bbox(-78.9382, 35.9940, -78.9005, 36.0402).unwrap()
    }

    #[test]
    fn existing_output_is_not_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        std::fs::write(&path, "{}").unwrap();

        let outcome = fetch_buildings(&durham(), &path, "command-that-does-not-exist").unwrap();
        assert_eq!(outcome, FetchOutcome::Existing);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn missing_command_is_an_acquisition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        assert!(matches!(
            fetch_buildings(&durham(), &path, "command-that-does-not-exist"),
            Err(Error::AcquisitionFailure(_))
        ));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn success_without_output_is_an_acquisition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        assert!(matches!(fetch_buildings(&durham(), &path, "true"), Err(Error::AcquisitionFailure(_))));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_an_acquisition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        assert!(matches!(fetch_buildings(&durham(), &path, "false"), Err(Error::AcquisitionFailure(_))));
    }
}
