//! Error types for the zonal statistics pipeline.

use thiserror::Error;

/// Errors that end a batch run.
///
/// Per-feature problems are not errors: they become
/// [`BatchWarning`](crate::BatchWarning)s and the batch keeps going.
#[derive(Debug, Error)]
pub enum ZonalError {
    /// Tile access failed in a way that prevents the batch from starting.
    #[error(transparent)]
    Tile(#[from] gpsinfo_tiles::TileError),

    /// I/O error outside the tile layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller aborted the batch at a tile checkpoint.
    #[error("batch cancelled")]
    Cancelled,
}
