//! # gpsinfo-zonal
//!
//! Area-weighted mean slope over arbitrary polygon features, computed from
//! the gpsinfo tiled slope raster.
//!
//! For each polygon the pipeline determines which tiles intersect it,
//! fetches only those, masks every tile to the polygon's exact footprint,
//! and accumulates the in-polygon cell values, aborting that polygon on
//! the first no-data cell it finds. Optionally all clipped cells are
//! re-assembled into one merged raster covering the whole batch.
//!
//! Everything interactive (dialogs, result tables, progress bars, CSV
//! export) lives outside these crates. The caller supplies [`Feature`]s
//! and renders the returned [`FeatureResult`]s and [`BatchWarning`]s.
//!
//! ## Example
//!
//! ```no_run
//! use geo::polygon;
//! use gpsinfo_tiles::DatasetConfig;
//! use gpsinfo_zonal::{compute_batch, BatchOptions, Feature};
//!
//! let config = DatasetConfig::default();
//! let features = vec![Feature::from_polygon(
//!     "NAME",
//!     "EZG 1",
//!     polygon![
//!         (x: 520_000.0, y: 470_000.0),
//!         (x: 521_000.0, y: 470_000.0),
//!         (x: 521_000.0, y: 471_000.0),
//!         (x: 520_000.0, y: 471_000.0),
//!         (x: 520_000.0, y: 470_000.0),
//!     ],
//! )];
//!
//! let outcome = compute_batch(&config, &features, BatchOptions::default(), None)?;
//! for row in &outcome.results {
//!     println!("{}: mean slope {:.2}", row.value, row.mean);
//! }
//! eprintln!("{}", outcome.warning_report());
//! # Ok::<(), gpsinfo_zonal::ZonalError>(())
//! ```

mod accumulate;
mod batch;
mod canvas;
mod clip;
mod error;
mod feature;

pub use accumulate::{accumulate, ClipResult};
pub use batch::{
    compute_batch, BatchOptions, BatchOutcome, BatchPipeline, BatchWarning, FeatureResult,
    ProgressCallback,
};
pub use canvas::MergeCanvas;
pub use clip::{rasterize, tile_intersects, Mask};
pub use error::ZonalError;
pub use feature::Feature;
