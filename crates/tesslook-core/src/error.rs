use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Query rejected by service: {0}")]
    QueryRejected(String),

    #[error("Cutout service error: {0}")]
    Service(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Corrupt archive {}: {reason}", path.display())]
    ArchiveCorrupt { path: PathBuf, reason: String },

    #[error("Cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl TessError {
    pub(crate) fn decode(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn archive(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::ArchiveCorrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TessError>;
