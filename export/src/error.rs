use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Writing slice `slice` failed. For 3D exports, slices before it are
    /// already on disk.
    #[error("failed to write slice {slice} to {path:?}: {source}")]
    Io {
        slice: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode slice {slice}: {source}")]
    Encode {
        slice: u32,
        #[source]
        source: image::ImageError,
    },

    #[error("export cancelled after {slices_written} slice(s)")]
    Cancelled { slices_written: u32 },

    #[error("an export to {path:?} is already running")]
    Busy { path: PathBuf },

    #[error("export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExportError>;
