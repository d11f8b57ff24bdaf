//! Error types for tile access.

use crate::spec::TileIndex;
use thiserror::Error;

/// Errors that can occur while fetching or decoding tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// I/O error reading or writing grid data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error when fetching tiles.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The tile archive could not be read.
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The server has no archive for this tile (HTTP 404).
    #[error("tile {index} is not present on the server")]
    TileUnavailable {
        /// Requested tile.
        index: TileIndex,
    },

    /// The server answered, but not with a usable tile archive.
    #[error("failed to download tile {index}: {reason}")]
    DownloadFailed {
        /// Requested tile.
        index: TileIndex,
        /// Reason for failure.
        reason: String,
    },

    /// The ASCII-grid payload violates the service's file convention.
    #[error("malformed ASCII grid: {0}")]
    MalformedGrid(String),

    /// Neither fetch strategy could retrieve the probe tile.
    #[error("no fetch strategy could reach the tile service: {0}")]
    ServiceUnreachable(String),
}
