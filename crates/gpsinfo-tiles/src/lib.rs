//! # gpsinfo-tiles
//!
//! Access to the gpsinfo tiled slope raster: the fixed tiling scheme, the
//! ASCII-grid tile format, and two interchangeable network fetch strategies.
//!
//! The dataset is a planet-tiled grid of fixed-size raster tiles served over
//! HTTP, one zip-compressed ASCII-grid file per tile. This crate knows how
//! to map world coordinates to tile indices, retrieve individual tiles, and
//! hand them out as in-memory grids with their geotransforms; everything on
//! top of that (clipping, statistics, merged rasters) lives in
//! `gpsinfo-zonal`.
//!
//! ## Examples
//!
//! ### Mapping a bounding box to tiles
//!
//! ```
//! use gpsinfo_tiles::TileSpec;
//!
//! let spec = TileSpec::default();
//! let range = spec.tile_range(520_000.0, 522_000.0, 470_000.0, 471_000.0);
//! assert!(spec.covers(&range));
//! for index in range.iter() {
//!     println!("need tile {index}");
//! }
//! ```
//!
//! ### Fetching a tile
//!
//! ```no_run
//! use gpsinfo_tiles::{select_fetcher, DatasetConfig, TileIndex};
//!
//! let config = DatasetConfig::default();
//! // Probes the service once and picks a working strategy.
//! let fetcher = select_fetcher(&config)?;
//! let tile = fetcher.fetch(TileIndex::new(200, 100))?;
//! println!("top-left cell: {}", tile.value(0, 0));
//! # Ok::<(), gpsinfo_tiles::TileError>(())
//! ```

mod error;
mod fetch;
mod grid;
mod spec;

pub use error::TileError;
pub use fetch::{
    select_fetcher, ArchiveFetcher, DatasetConfig, StreamingFetcher, TileFetcher, PROBE_TILE,
};
pub use grid::{write_asc, AscHeader, TileData};
pub use spec::{Geotransform, TileIndex, TileRange, TileSpec, WorldRect};

/// Result type for tile operations.
pub type Result<T> = std::result::Result<T, TileError>;
