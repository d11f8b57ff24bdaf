//! The merged output raster covering a whole batch.

use gpsinfo_tiles::{write_asc, AscHeader, Geotransform, TileIndex, TileRange, TileSpec};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// One raster spanning the union tile range of every feature in a batch.
///
/// Created once per batch when the caller requests a combined artifact,
/// filled incrementally during accumulation, and written out once at the
/// end. Cells start at the no-data sentinel; in-polygon values are placed
/// at their global offsets, and where features overlap the last writer (in
/// feature processing order) wins.
#[derive(Debug)]
pub struct MergeCanvas {
    values: Vec<f32>,
    ncols: usize,
    nrows: usize,
    geotransform: Geotransform,
    union: TileRange,
    tile_ncols: usize,
    tile_nrows: usize,
    nodata: f32,
    cellsize: f64,
}

impl MergeCanvas {
    /// Allocate a canvas for the union tile range of a batch.
    ///
    /// `top_left` is the geotransform of the fetched tile at the union's
    /// upper-left corner; the canvas inherits it rather than deriving one
    /// from the tiling scheme, so the artifact is anchored exactly like the
    /// tiles it was assembled from.
    pub fn new(spec: &TileSpec, union: TileRange, top_left: Geotransform) -> Self {
        let ncols = union.width() as usize * spec.ncols;
        let nrows = union.height() as usize * spec.nrows;
        debug!(
            tiles_x = union.width(),
            tiles_y = union.height(),
            ncols,
            nrows,
            "allocating merge canvas"
        );
        MergeCanvas {
            values: vec![spec.nodata; ncols * nrows],
            ncols,
            nrows,
            geotransform: top_left,
            union,
            tile_ncols: spec.ncols,
            tile_nrows: spec.nrows,
            nodata: spec.nodata,
            cellsize: spec.cellsize,
        }
    }

    /// Number of cell columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of cell rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Cell value at (row, col) of the merged grid.
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.ncols + col]
    }

    /// Place one in-polygon cell value at its global position.
    ///
    /// Tile rows are stored north-down while tile indices grow northward,
    /// so the tile's row block is mirrored within the union range.
    pub fn place(&mut self, index: TileIndex, local_row: usize, local_col: usize, value: f32) {
        debug_assert!(
            index.x >= self.union.x_min
                && index.x <= self.union.x_max
                && index.y >= self.union.y_min
                && index.y <= self.union.y_max,
            "tile {index} outside union range"
        );
        let tiles_y = self.union.height();
        let block_row = (tiles_y - (index.y - self.union.y_min) - 1) as usize;
        let block_col = (index.x - self.union.x_min) as usize;
        let row = block_row * self.tile_nrows + local_row;
        let col = block_col * self.tile_ncols + local_col;
        self.values[row * self.ncols + col] = value;
    }

    /// Write the canvas as an ASCII-grid artifact.
    pub fn write_to<W: std::io::Write>(&self, out: W) -> std::io::Result<()> {
        let header = AscHeader {
            ncols: self.ncols,
            nrows: self.nrows,
            xllcorner: self.geotransform.origin_x,
            yllcorner: self.geotransform.origin_y + self.geotransform.pixel_height * self.nrows as f64,
            cellsize: self.cellsize,
            nodata: self.nodata,
        };
        write_asc(out, &header, &self.values)
    }

    /// Write the canvas to a file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        debug!(path = %path.display(), "writing merged raster");
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spec() -> TileSpec {
        TileSpec {
            ncols: 2,
            nrows: 2,
            xll: 0.0,
            yll: 0.0,
            cellsize: 10.0,
            ..TileSpec::default()
        }
    }

    fn union_2x2() -> TileRange {
        TileRange {
            x_min: 3,
            x_max: 4,
            y_min: 5,
            y_max: 6,
        }
    }

    #[test]
    fn starts_filled_with_nodata() {
        let s = spec();
        let canvas = MergeCanvas::new(&s, union_2x2(), s.tile_geotransform(TileIndex::new(3, 6)));
        assert_eq!(canvas.ncols(), 4);
        assert_eq!(canvas.nrows(), 4);
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(canvas.value(row, col), s.nodata);
            }
        }
    }

    #[test]
    fn places_tiles_in_mirrored_row_blocks() {
        let s = spec();
        let mut canvas =
            MergeCanvas::new(&s, union_2x2(), s.tile_geotransform(TileIndex::new(3, 6)));

        // The top-left union tile lands in the first row block.
        canvas.place(TileIndex::new(3, 6), 0, 0, 1.0);
        // The bottom-right union tile lands in the last row block.
        canvas.place(TileIndex::new(4, 5), 1, 1, 2.0);

        assert_eq!(canvas.value(0, 0), 1.0);
        assert_eq!(canvas.value(3, 3), 2.0);
        // Everything else stays no-data.
        let filled = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .filter(|&(r, c)| canvas.value(r, c) != s.nodata)
            .count();
        assert_eq!(filled, 2);
    }

    #[test]
    fn artifact_header_uses_the_union_origin() {
        let s = spec();
        let canvas = MergeCanvas::new(&s, union_2x2(), s.tile_geotransform(TileIndex::new(3, 6)));
        let mut out = Vec::new();
        canvas.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ncols 4");
        assert_eq!(lines[1], "nrows 4");
        assert_eq!(lines[2], "xllcorner 60");
        // Top edge of tile row 6 minus four 10-unit cells.
        assert_eq!(lines[3], "yllcorner 100");

        // Worth cross-checking against the spec's own lower-left corner.
        let yll = s.yll + 5.0 * s.tile_height();
        assert_relative_eq!(yll, 100.0);
    }
}
