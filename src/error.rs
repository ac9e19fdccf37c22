use std::path::PathBuf;

/// Errors produced by the reconciliation core and its file collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A numeric or geometric argument is out of its valid domain
    /// (non-positive cell size, malformed bounding box, negative area, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A CRS identifier is missing or cannot be resolved to a definition.
    #[error("unknown CRS: {0}")]
    UnknownCrs(String),

    /// Two datasets are used together without being in the same CRS.
    #[error("CRS mismatch: {left} vs {right} (reproject first)")]
    CrsMismatch { left: String, right: String },

    /// A coordinate could not be transformed between two resolved CRS.
    #[error("reprojection failed: {0}")]
    Reprojection(String),

    /// The external fetch did not produce the expected file.
    #[error("acquisition failed: {0}")]
    AcquisitionFailure(String),

    /// The raster could not be read; there is no partial-result recovery.
    #[error("failed to read raster {}: {reason}", path.display())]
    RasterRead { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub(crate) fn raster(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::RasterRead { path: path.into(), reason: reason.to_string() }
    }
}
