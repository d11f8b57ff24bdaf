//! Polygon-to-tile clipping: the intersection probe and the raster mask.

use geo::{coord, Contains, Intersects, MultiPolygon, Point, Rect};
use gpsinfo_tiles::{Geotransform, TileIndex, TileSpec};

/// Tile-shaped 0/1 grid marking which cells fall inside a polygon.
///
/// One mask is computed per (feature, tile) pair and discarded right after
/// accumulation.
#[derive(Debug, Clone)]
pub struct Mask {
    cells: Vec<u8>,
    ncols: usize,
    nrows: usize,
}

impl Mask {
    /// Number of cell columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of cell rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Whether the cell at (row, col) is inside the polygon.
    pub fn is_inside(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.ncols + col] == 1
    }

    /// Number of cells inside the polygon.
    pub fn count_inside(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }
}

/// Test whether a tile genuinely intersects a polygon.
///
/// Uses the tile's probe rectangle, inset by one cell on its low edges, so
/// that a polygon sharing only a boundary line with a neighboring tile does
/// not drag that tile into the download set.
pub fn tile_intersects(spec: &TileSpec, index: TileIndex, geometry: &MultiPolygon<f64>) -> bool {
    let probe = spec.probe_rect(index, 1);
    let rect = Rect::new(
        coord! { x: probe.x_min, y: probe.y_min },
        coord! { x: probe.x_max, y: probe.y_max },
    );
    rect.to_polygon().intersects(geometry)
}

/// Rasterize a polygon into a 0/1 mask aligned with a tile's grid.
///
/// A cell is burned to 1 exactly when its center lies strictly inside the
/// polygon. The same rule produces every mask, so statistics derived from
/// masks are mutually consistent; cell centers exactly on a polygon
/// boundary count as outside.
pub fn rasterize(
    geometry: &MultiPolygon<f64>,
    geotransform: &Geotransform,
    ncols: usize,
    nrows: usize,
) -> Mask {
    let mut cells = vec![0u8; ncols * nrows];
    for row in 0..nrows {
        for col in 0..ncols {
            let (x, y) = geotransform.cell_center(col, row);
            if geometry.contains(&Point::new(x, y)) {
                cells[row * ncols + col] = 1;
            }
        }
    }
    Mask {
        cells,
        ncols,
        nrows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn spec() -> TileSpec {
        TileSpec {
            ncols: 4,
            nrows: 4,
            xll: 0.0,
            yll: 0.0,
            cellsize: 10.0,
            ..TileSpec::default()
        }
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]])
    }

    #[test]
    fn mask_burns_cells_with_center_inside() {
        let s = spec();
        // Tile (0, 0) is 40x40 world units; cover its lower-left quarter.
        let geom = square(0.0, 0.0, 20.0, 20.0);
        let gt = s.tile_geotransform(TileIndex::new(0, 0));
        let mask = rasterize(&geom, &gt, s.ncols, s.nrows);

        assert_eq!(mask.count_inside(), 4);
        // Row 0 is the northern edge; the burned cells are the bottom rows.
        assert!(mask.is_inside(2, 0));
        assert!(mask.is_inside(3, 1));
        assert!(!mask.is_inside(0, 0));
        assert!(!mask.is_inside(3, 2));
    }

    #[test]
    fn mask_respects_holes() {
        let s = spec();
        let outer = polygon![
            (x: 0.0, y: 0.0),
            (x: 40.0, y: 0.0),
            (x: 40.0, y: 40.0),
            (x: 0.0, y: 40.0),
            (x: 0.0, y: 0.0),
        ];
        let with_hole = geo::Polygon::new(
            outer.exterior().clone(),
            vec![geo::LineString::from(vec![
                (12.0, 12.0),
                (28.0, 12.0),
                (28.0, 28.0),
                (12.0, 28.0),
                (12.0, 12.0),
            ])],
        );
        let geom = MultiPolygon::new(vec![with_hole]);
        let gt = s.tile_geotransform(TileIndex::new(0, 0));
        let mask = rasterize(&geom, &gt, s.ncols, s.nrows);

        // The hole swallows the four center cells.
        assert_eq!(mask.count_inside(), 12);
        assert!(!mask.is_inside(1, 1));
        assert!(!mask.is_inside(2, 2));
        assert!(mask.is_inside(0, 0));
    }

    #[test]
    fn boundary_sharing_neighbor_does_not_intersect() {
        let s = spec();
        // Polygon fills the right half of tile (0, 0), ending exactly on
        // the boundary with tile (1, 0).
        let geom = square(20.0, 0.0, 40.0, 40.0);
        assert!(tile_intersects(&s, TileIndex::new(0, 0), &geom));
        assert!(!tile_intersects(&s, TileIndex::new(1, 0), &geom));
    }

    #[test]
    fn distant_tile_does_not_intersect() {
        let s = spec();
        let geom = square(0.0, 0.0, 10.0, 10.0);
        assert!(!tile_intersects(&s, TileIndex::new(2, 2), &geom));
    }
}
