//! Applying a mask to a fetched tile and collecting in-polygon values.

use crate::canvas::MergeCanvas;
use crate::clip::Mask;
use gpsinfo_tiles::{TileData, TileIndex, TileSpec};

/// Values extracted for one feature, across all of its tiles.
///
/// Once a no-data coordinate is captured, no further values are appended
/// for the feature: the first no-data cell found (in tile scan order, then
/// row-major cell order) terminates the scan.
#[derive(Debug, Clone, Default)]
pub struct ClipResult {
    /// In-polygon cell values, in scan order.
    pub values: Vec<f32>,
    /// World center of the first no-data cell found inside the polygon.
    pub nodata_at: Option<(f64, f64)>,
}

impl ClipResult {
    /// Create an empty result.
    pub fn new() -> Self {
        ClipResult::default()
    }

    /// Whether the scan hit a no-data cell and must not continue.
    pub fn terminated(&self) -> bool {
        self.nodata_at.is_some()
    }

    /// Arithmetic mean of the collected values, or `None` if none were
    /// collected.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        Some(sum / self.values.len() as f64)
    }
}

/// Extract one tile's in-polygon values into `clip`.
///
/// Cells are scanned row-major, northern row first. A masked cell holding
/// the no-data sentinel captures its world center and stops the scan; a
/// valid masked cell is appended to `clip.values` and, when a merge canvas
/// is active, placed at its global position in the canvas.
pub fn accumulate(
    tile: &TileData,
    mask: &Mask,
    spec: &TileSpec,
    index: TileIndex,
    mut canvas: Option<&mut MergeCanvas>,
    clip: &mut ClipResult,
) {
    for row in 0..tile.nrows() {
        for col in 0..tile.ncols() {
            if !mask.is_inside(row, col) {
                continue;
            }
            let value = tile.value(row, col);
            if value == spec.nodata {
                clip.nodata_at = Some(tile.cell_center(col, row));
                return;
            }
            clip.values.push(value);
            if let Some(canvas) = canvas.as_deref_mut() {
                canvas.place(index, row, col, value);
            }
        }
    }
}
