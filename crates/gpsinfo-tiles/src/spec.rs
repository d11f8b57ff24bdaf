//! Tiling scheme constants and tile coordinate math.
//!
//! The slope dataset is published as a fixed grid of square tiles in a
//! projected coordinate reference system. All of the math in this module is
//! pure: a [`TileSpec`] value is created once and passed explicitly to
//! everything that needs it.

use serde::{Deserialize, Serialize};

/// Immutable description of the fixed tiling scheme.
///
/// The default value describes the `AT_OGD_DHM_LAMB_10M_SLOPE` dataset:
/// 150x150 cell tiles of 10 m cells in EPSG:31287 (Austria Lambert), with
/// tile (0, 0) anchored at the dataset's lower-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Number of cell columns per tile.
    pub ncols: usize,
    /// Number of cell rows per tile.
    pub nrows: usize,
    /// Coordinate reference system of the dataset, as an EPSG code string.
    ///
    /// Feature geometries handed to the pipeline must already be expressed
    /// in this CRS; no reprojection happens anywhere in these crates.
    pub epsg: String,
    /// World X of the dataset's lower-left corner.
    pub xll: f64,
    /// World Y of the dataset's lower-left corner.
    pub yll: f64,
    /// Cell size in world units, uniform in X and Y.
    pub cellsize: f64,
    /// Reserved value meaning "no measurement available at this cell".
    pub nodata: f32,
    /// Largest valid tile column index (inclusive).
    pub max_tile_x: i64,
    /// Largest valid tile row index (inclusive).
    pub max_tile_y: i64,
}

impl Default for TileSpec {
    fn default() -> Self {
        TileSpec {
            ncols: 150,
            nrows: 150,
            epsg: "EPSG:31287".to_string(),
            xll: 106_549.267_203_768_89,
            yll: 273_692.512_073_625_81,
            cellsize: 10.0,
            nodata: -99_999.0,
            max_tile_x: 392,
            max_tile_y: 202,
        }
    }
}

/// Integer pair identifying one tile in the global tiling scheme.
///
/// Tile (0, 0) sits at the dataset's lower-left corner; `x` increases
/// eastward and `y` increases northward. Indices outside the valid range
/// mean "no data available here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    /// Tile column.
    pub x: i64,
    /// Tile row.
    pub y: i64,
}

impl TileIndex {
    /// Create a new tile index.
    pub fn new(x: i64, y: i64) -> Self {
        TileIndex { x, y }
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.x, self.y)
    }
}

/// Inclusive rectangular range of tile indices covering a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    /// Leftmost tile column.
    pub x_min: i64,
    /// Rightmost tile column.
    pub x_max: i64,
    /// Bottommost tile row.
    pub y_min: i64,
    /// Topmost tile row.
    pub y_max: i64,
}

impl TileRange {
    /// Number of tile columns in the range.
    pub fn width(&self) -> i64 {
        self.x_max - self.x_min + 1
    }

    /// Number of tile rows in the range.
    pub fn height(&self) -> i64 {
        self.y_max - self.y_min + 1
    }

    /// Total number of tiles in the range.
    pub fn count(&self) -> usize {
        (self.width() * self.height()) as usize
    }

    /// Extend the range so it also covers `other`.
    pub fn extend(&mut self, other: &TileRange) {
        self.x_min = self.x_min.min(other.x_min);
        self.x_max = self.x_max.max(other.x_max);
        self.y_min = self.y_min.min(other.y_min);
        self.y_max = self.y_max.max(other.y_max);
    }

    /// Iterate over the tiles of the range in scan order: columns left to
    /// right, rows bottom to top within each column.
    ///
    /// Accumulation relies on this order being fixed, so that "the first
    /// no-data cell" of a feature is a reproducible value.
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> + '_ {
        let ys = self.y_min..=self.y_max;
        (self.x_min..=self.x_max)
            .flat_map(move |x| ys.clone().map(move |y| TileIndex::new(x, y)))
    }
}

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    /// Left edge.
    pub x_min: f64,
    /// Bottom edge.
    pub y_min: f64,
    /// Right edge.
    pub x_max: f64,
    /// Top edge.
    pub y_max: f64,
}

/// Affine mapping from cell (column, row) to world (x, y) coordinates.
///
/// Follows the usual north-up raster convention: `origin_x`/`origin_y` is
/// the world position of the grid's upper-left corner, `pixel_width` is
/// positive and `pixel_height` is negative (row 0 is the northern edge).
/// Rotation terms are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geotransform {
    /// World X of the upper-left grid corner.
    pub origin_x: f64,
    /// Cell size along X (positive).
    pub pixel_width: f64,
    /// World Y of the upper-left grid corner.
    pub origin_y: f64,
    /// Cell size along Y (negative for north-up grids).
    pub pixel_height: f64,
}

impl Geotransform {
    /// Map fractional cell coordinates to world coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// World coordinates of a cell's center.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }
}

impl TileSpec {
    /// Width of one tile in world units.
    pub fn tile_width(&self) -> f64 {
        self.cellsize * self.ncols as f64
    }

    /// Height of one tile in world units.
    pub fn tile_height(&self) -> f64 {
        self.cellsize * self.nrows as f64
    }

    /// Compute the inclusive range of tile indices covering a bounding box.
    ///
    /// Uses floor division, so any world point inside the box maps to a tile
    /// index within the returned range. Coordinates west or south of the
    /// dataset origin produce negative indices, which
    /// [`covers`](TileSpec::covers) rejects as out of coverage.
    pub fn tile_range(&self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> TileRange {
        TileRange {
            x_min: ((x_min - self.xll) / self.tile_width()).floor() as i64,
            x_max: ((x_max - self.xll) / self.tile_width()).floor() as i64,
            y_min: ((y_min - self.yll) / self.tile_height()).floor() as i64,
            y_max: ((y_max - self.yll) / self.tile_height()).floor() as i64,
        }
    }

    /// Whether an entire tile range lies inside the dataset's coverage.
    pub fn covers(&self, range: &TileRange) -> bool {
        range.x_min >= 0
            && range.y_min >= 0
            && range.x_max <= self.max_tile_x
            && range.y_max <= self.max_tile_y
    }

    /// World rectangle of a tile, inset by `margin_cells` on the left and
    /// bottom edges.
    ///
    /// The inset rectangle is used as a conservative intersection probe:
    /// a polygon that only touches the shared boundary line of two tiles
    /// must not register as intersecting both of them. A point exactly on a
    /// tile boundary belongs to the tile with the higher index (floor
    /// semantics), so only the low-side edges need the margin.
    pub fn probe_rect(&self, index: TileIndex, margin_cells: usize) -> WorldRect {
        let m = margin_cells as f64;
        WorldRect {
            x_min: self.xll + (index.x as f64 * self.ncols as f64 + m) * self.cellsize,
            x_max: self.xll + (index.x + 1) as f64 * self.ncols as f64 * self.cellsize,
            y_min: self.yll + (index.y as f64 * self.nrows as f64 + m) * self.cellsize,
            y_max: self.yll + (index.y + 1) as f64 * self.nrows as f64 * self.cellsize,
        }
    }

    /// The geotransform a tile at `index` is expected to carry.
    ///
    /// Fetched tiles confirm their geotransform from the server response;
    /// this derivation exists for synthesizing tiles in tests and for
    /// consistency checks.
    pub fn tile_geotransform(&self, index: TileIndex) -> Geotransform {
        Geotransform {
            origin_x: self.xll + index.x as f64 * self.tile_width(),
            pixel_width: self.cellsize,
            origin_y: self.yll + (index.y + 1) as f64 * self.tile_height(),
            pixel_height: -self.cellsize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spec() -> TileSpec {
        TileSpec {
            xll: 0.0,
            yll: 0.0,
            ..TileSpec::default()
        }
    }

    #[test]
    fn range_inside_one_tile() {
        let s = spec();
        // Tile (5, 5) spans [7500, 9000) in both axes. Stay one cell away
        // from the low edges, matching the probe inset.
        let r = s.tile_range(7510.0, 8990.0, 7510.0, 8990.0);
        assert_eq!(
            r,
            TileRange {
                x_min: 5,
                x_max: 5,
                y_min: 5,
                y_max: 5
            }
        );
        assert_eq!(r.count(), 1);
    }

    #[test]
    fn range_straddles_tile_boundary() {
        let s = spec();
        // 1500.0 is exactly the boundary between tile 0 and tile 1; floor
        // semantics assign it to tile 1.
        let r = s.tile_range(1490.0, 1500.0, 100.0, 200.0);
        assert_eq!(r.x_min, 0);
        assert_eq!(r.x_max, 1);
        assert_eq!(r.y_min, 0);
        assert_eq!(r.y_max, 0);
        assert_eq!(r.count(), 2);
    }

    #[test]
    fn range_floor_semantics_for_negative_coordinates() {
        let s = spec();
        let r = s.tile_range(-10.0, 10.0, -3000.0, -1.0);
        assert_eq!(r.x_min, -1);
        assert_eq!(r.x_max, 0);
        assert_eq!(r.y_min, -2);
        assert_eq!(r.y_max, -1);
        assert!(!s.covers(&r));
    }

    #[test]
    fn covers_rejects_indices_past_dataset_edge() {
        let s = spec();
        let inside = TileRange {
            x_min: 0,
            x_max: s.max_tile_x,
            y_min: 0,
            y_max: s.max_tile_y,
        };
        assert!(s.covers(&inside));

        let east = TileRange {
            x_max: s.max_tile_x + 1,
            ..inside
        };
        assert!(!s.covers(&east));
    }

    #[test]
    fn probe_rect_is_inset_on_low_edges_only() {
        let s = spec();
        let r = s.probe_rect(TileIndex::new(2, 3), 1);
        assert_relative_eq!(r.x_min, 2.0 * 1500.0 + 10.0);
        assert_relative_eq!(r.x_max, 3.0 * 1500.0);
        assert_relative_eq!(r.y_min, 3.0 * 1500.0 + 10.0);
        assert_relative_eq!(r.y_max, 4.0 * 1500.0);
    }

    #[test]
    fn scan_order_is_columns_then_rows() {
        let r = TileRange {
            x_min: 1,
            x_max: 2,
            y_min: 5,
            y_max: 6,
        };
        let order: Vec<TileIndex> = r.iter().collect();
        assert_eq!(
            order,
            vec![
                TileIndex::new(1, 5),
                TileIndex::new(1, 6),
                TileIndex::new(2, 5),
                TileIndex::new(2, 6),
            ]
        );
    }

    #[test]
    fn tile_geotransform_is_north_up() {
        let s = spec();
        let gt = s.tile_geotransform(TileIndex::new(0, 0));
        assert_relative_eq!(gt.origin_x, 0.0);
        assert_relative_eq!(gt.origin_y, 1500.0);
        assert_relative_eq!(gt.pixel_height, -10.0);

        // Center of the top-left cell.
        let (x, y) = gt.cell_center(0, 0);
        assert_relative_eq!(x, 5.0);
        assert_relative_eq!(y, 1495.0);
    }
}
