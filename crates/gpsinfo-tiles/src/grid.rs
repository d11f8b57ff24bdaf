//! In-memory tile grids and the ASCII-grid codec.
//!
//! Tiles travel over the wire as zip-compressed Esri ASCII grid files. The
//! files on the gpsinfo server follow a stricter convention than the format
//! requires: the header is always the same six lines (`ncols`, `nrows`,
//! `xllcorner`, `yllcorner`, `cellsize`, `NODATA_value`) and the data rows
//! start on line seven. The parser here relies on that convention, the same
//! way the service's other clients do.

use crate::spec::{Geotransform, TileSpec};
use crate::{Result, TileError};
use std::io::{BufRead, Write};

/// A single fetched tile: a dense row-major grid plus its geotransform.
///
/// Row 0 is the tile's northern edge. A tile is owned exclusively by the
/// fetch call that created it and is discarded once its values have been
/// consumed; nothing in these crates caches tiles across features.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    values: Vec<f32>,
    ncols: usize,
    nrows: usize,
    geotransform: Geotransform,
}

impl TileData {
    /// Build a tile from row-major values.
    ///
    /// Fails if `values.len() != ncols * nrows`.
    pub fn from_values(
        values: Vec<f32>,
        ncols: usize,
        nrows: usize,
        geotransform: Geotransform,
    ) -> Result<Self> {
        if values.len() != ncols * nrows {
            return Err(TileError::MalformedGrid(format!(
                "expected {} values for a {}x{} grid, got {}",
                ncols * nrows,
                ncols,
                nrows,
                values.len()
            )));
        }
        Ok(TileData {
            values,
            ncols,
            nrows,
            geotransform,
        })
    }

    /// Number of cell columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of cell rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// The tile's geotransform, as confirmed from the server response.
    pub fn geotransform(&self) -> &Geotransform {
        &self.geotransform
    }

    /// Cell value at (row, col). Row 0 is the northern edge.
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.ncols + col]
    }

    /// World coordinates of a cell's center.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.geotransform.cell_center(col, row)
    }

    /// Parse a tile from ASCII-grid text.
    ///
    /// The geotransform is reconstructed from the `xllcorner`/`yllcorner`
    /// header fields plus the tiling scheme's cell size and row count; the
    /// vertical cell size is the negative of the horizontal one because the
    /// first data row is the tile's northern edge.
    pub fn from_asc_reader<R: BufRead>(reader: R, spec: &TileSpec) -> Result<Self> {
        let mut lines = reader.lines();
        let mut header = [0f64; 6];
        for (i, name) in [
            "ncols",
            "nrows",
            "xllcorner",
            "yllcorner",
            "cellsize",
            "NODATA_value",
        ]
        .iter()
        .enumerate()
        {
            let line = lines
                .next()
                .ok_or_else(|| TileError::MalformedGrid(format!("missing header line {name}")))??;
            header[i] = parse_header_value(&line, name)?;
        }

        let ncols = header[0] as usize;
        let nrows = header[1] as usize;
        if ncols != spec.ncols || nrows != spec.nrows {
            return Err(TileError::MalformedGrid(format!(
                "tile is {}x{}, tiling scheme expects {}x{}",
                ncols, nrows, spec.ncols, spec.nrows
            )));
        }

        let geotransform = Geotransform {
            origin_x: header[2],
            pixel_width: spec.cellsize,
            origin_y: header[3] + spec.cellsize * spec.nrows as f64,
            pixel_height: -spec.cellsize,
        };

        let mut values = Vec::with_capacity(ncols * nrows);
        for line in lines {
            let line = line?;
            for token in line.split_whitespace() {
                let v: f32 = token.parse().map_err(|_| {
                    TileError::MalformedGrid(format!("invalid cell value {token:?}"))
                })?;
                values.push(v);
            }
        }
        if values.len() != ncols * nrows {
            return Err(TileError::MalformedGrid(format!(
                "expected {} data values, got {}",
                ncols * nrows,
                values.len()
            )));
        }

        Ok(TileData {
            values,
            ncols,
            nrows,
            geotransform,
        })
    }
}

fn parse_header_value(line: &str, name: &str) -> Result<f64> {
    let mut parts = line.split_whitespace();
    let key = parts
        .next()
        .ok_or_else(|| TileError::MalformedGrid(format!("empty header line, expected {name}")))?;
    if !key.eq_ignore_ascii_case(name) {
        return Err(TileError::MalformedGrid(format!(
            "expected header {name}, found {key}"
        )));
    }
    let value = parts
        .next()
        .ok_or_else(|| TileError::MalformedGrid(format!("header {name} has no value")))?;
    value
        .parse()
        .map_err(|_| TileError::MalformedGrid(format!("header {name} has invalid value {value:?}")))
}

/// Header of an ASCII-grid artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AscHeader {
    /// Number of cell columns.
    pub ncols: usize,
    /// Number of cell rows.
    pub nrows: usize,
    /// World X of the lower-left grid corner.
    pub xllcorner: f64,
    /// World Y of the lower-left grid corner.
    pub yllcorner: f64,
    /// Cell size in world units.
    pub cellsize: f64,
    /// No-data sentinel value.
    pub nodata: f32,
}

/// Write a grid as an ASCII-grid file with the fixed six-line header.
///
/// `values` are row-major with row 0 as the northern edge, the same layout
/// [`TileData`] uses.
pub fn write_asc<W: Write>(mut out: W, header: &AscHeader, values: &[f32]) -> std::io::Result<()> {
    writeln!(out, "ncols {}", header.ncols)?;
    writeln!(out, "nrows {}", header.nrows)?;
    writeln!(out, "xllcorner {}", header.xllcorner)?;
    writeln!(out, "yllcorner {}", header.yllcorner)?;
    writeln!(out, "cellsize {}", header.cellsize)?;
    writeln!(out, "NODATA_value {}", header.nodata)?;
    for row in values.chunks(header.ncols) {
        let mut first = true;
        for v in row {
            if !first {
                write!(out, " ")?;
            }
            write!(out, "{v}")?;
            first = false;
        }
        writeln!(out)?;
    }
    Ok(())
}
