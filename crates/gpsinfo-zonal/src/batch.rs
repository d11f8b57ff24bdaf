//! Batch orchestration: per-feature state machine, warnings, progress.

use crate::accumulate::{accumulate, ClipResult};
use crate::canvas::MergeCanvas;
use crate::clip::{rasterize, tile_intersects};
use crate::error::ZonalError;
use crate::feature::Feature;
use gpsinfo_tiles::{select_fetcher, DatasetConfig, TileFetcher, TileIndex, TileRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback invoked once per tile-processing step.
///
/// Receives the number of completed steps and the precomputed total; the
/// counter increases monotonically and never exceeds the total.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Caller choices for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Process only features flagged as selected.
    pub only_selected: bool,
    /// Where to write the merged raster artifact; `None` disables the
    /// merge canvas entirely.
    pub merged_raster: Option<PathBuf>,
}

/// Statistics row for one successfully processed feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureResult {
    /// The feature's identifying attribute value.
    pub value: String,
    /// Polygon centroid as (x, y) in the dataset CRS.
    pub centroid: (f64, f64),
    /// Planar polygon area in the CRS's square units.
    pub area: f64,
    /// Arithmetic mean of the in-polygon slope values.
    pub mean: f64,
}

/// One problem encountered while processing a batch.
///
/// Warnings never interrupt the batch; they are collected and rendered as
/// one consolidated report at the end.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWarning {
    /// The feature's tile range falls outside the dataset.
    OutOfCoverage {
        /// Name of the identifying attribute column.
        field: String,
        /// The feature's attribute value.
        value: String,
    },
    /// A no-data cell was found inside the feature's polygon.
    NoData {
        /// Name of the identifying attribute column.
        field: String,
        /// The feature's attribute value.
        value: String,
        /// World X of the no-data cell's center.
        x: f64,
        /// World Y of the no-data cell's center.
        y: f64,
    },
    /// Features smaller than the grid resolution, aggregated per batch.
    TooSmall {
        /// Number of such features.
        count: usize,
    },
    /// A tile inside the dataset's coverage could not be fetched.
    FetchFailed {
        /// The tile that failed.
        index: TileIndex,
        /// Transport- or decode-level detail.
        detail: String,
    },
    /// The merged raster could not be produced.
    OutputWriteFailed {
        /// I/O- or fetch-level detail.
        detail: String,
    },
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchWarning::OutOfCoverage { field, value } => write!(
                f,
                "No data was queried for the feature with {field} = {value} because it lies outside the dataset."
            ),
            BatchWarning::NoData { field, value, x, y } => write!(
                f,
                "No data was queried for the feature with {field} = {value} because a cell without data was found at ({x:.0}, {y:.0})."
            ),
            BatchWarning::TooSmall { count } => {
                if *count == 1 {
                    write!(
                        f,
                        "One feature is smaller than the resolution of the underlying raster dataset and is not part of the results."
                    )
                } else {
                    write!(
                        f,
                        "{count} features are smaller than the resolution of the underlying raster dataset and are not part of the results."
                    )
                }
            }
            BatchWarning::FetchFailed { index, detail } => {
                write!(f, "Tile {index} could not be fetched: {detail}.")
            }
            BatchWarning::OutputWriteFailed { detail } => {
                write!(f, "There was an error writing the raster data to file: {detail}.")
            }
        }
    }
}

/// Everything a batch run produces.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One row per successful feature, in processing order.
    pub results: Vec<FeatureResult>,
    /// Consolidated warnings, in the order they occurred.
    pub warnings: Vec<BatchWarning>,
}

impl BatchOutcome {
    /// Render all warnings as one report, one line per warning.
    pub fn warning_report(&self) -> String {
        self.warnings
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A feature that survived the coverage check, with its tile range.
struct CoveredFeature<'a> {
    feature: &'a Feature,
    range: TileRange,
}

/// Orchestrates tile resolution, fetching, clipping and accumulation over a
/// collection of features.
///
/// The pipeline is single-threaded and synchronous: each tile fetch blocks
/// until it completes or fails, and each feature reaches a terminal state
/// before the next one starts. Tiles are fetched per (feature, tile) pair
/// and discarded immediately after accumulation.
pub struct BatchPipeline<'a> {
    fetcher: &'a dyn TileFetcher,
    config: &'a DatasetConfig,
    options: BatchOptions,
    progress: Option<ProgressCallback>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> BatchPipeline<'a> {
    /// Create a pipeline over an already selected fetch strategy.
    pub fn new(fetcher: &'a dyn TileFetcher, config: &'a DatasetConfig, options: BatchOptions) -> Self {
        BatchPipeline {
            fetcher,
            config,
            options,
            progress: None,
            cancel: None,
        }
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach a cancellation flag, checked between tile steps.
    ///
    /// Once a tile fetch has started it runs to completion or failure; the
    /// flag takes effect at the next checkpoint.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Process a batch of features to completion.
    ///
    /// Per-feature problems (out of coverage, no-data, fetch failures, too
    /// small) become warnings and never interrupt the batch; only
    /// cancellation ends the run early.
    pub fn run(&self, features: &[Feature]) -> Result<BatchOutcome, ZonalError> {
        let spec = &self.config.spec;
        let mut outcome = BatchOutcome::default();

        // Coverage pass: tile ranges, the progress total and the union
        // range are all known before the first fetch.
        let mut covered: Vec<CoveredFeature> = Vec::new();
        let mut total_steps = 0usize;
        let mut union: Option<TileRange> = None;
        let mut too_small = 0usize;

        for feature in features {
            if self.options.only_selected && !feature.selected {
                continue;
            }
            let Some(bbox) = feature.bounding_rect() else {
                // An empty geometry intersects no cell centers; classify it
                // with the below-resolution features.
                too_small += 1;
                continue;
            };
            let range = spec.tile_range(bbox.min().x, bbox.max().x, bbox.min().y, bbox.max().y);
            if !spec.covers(&range) {
                debug!(value = %feature.value, ?range, "feature outside dataset coverage");
                outcome.warnings.push(BatchWarning::OutOfCoverage {
                    field: feature.field.clone(),
                    value: feature.value.clone(),
                });
                continue;
            }
            total_steps += range.count();
            union = Some(match union {
                Some(mut u) => {
                    u.extend(&range);
                    u
                }
                None => range,
            });
            covered.push(CoveredFeature { feature, range });
        }

        let mut canvas = match (&self.options.merged_raster, union) {
            (Some(_), Some(union)) => self.allocate_canvas(union, &mut outcome.warnings),
            _ => None,
        };

        let mut done = 0usize;

        for item in &covered {
            let feature = item.feature;
            let mut clip = ClipResult::new();
            let mut fetch_failed = false;

            for index in item.range.iter() {
                if self.cancelled() {
                    warn!("batch cancelled between tile steps");
                    return Err(ZonalError::Cancelled);
                }

                // A found no-data cell or a failed fetch parks the feature;
                // the remaining tiles still count as progress steps so the
                // precomputed total stays exact.
                if !clip.terminated()
                    && !fetch_failed
                    && tile_intersects(spec, index, &feature.geometry)
                {
                    match self.fetcher.fetch(index) {
                        Ok(tile) => {
                            let mask = rasterize(
                                &feature.geometry,
                                tile.geotransform(),
                                tile.ncols(),
                                tile.nrows(),
                            );
                            accumulate(&tile, &mask, spec, index, canvas.as_mut(), &mut clip);
                        }
                        Err(err) => {
                            warn!(%index, %err, "tile fetch failed");
                            outcome.warnings.push(BatchWarning::FetchFailed {
                                index,
                                detail: err.to_string(),
                            });
                            fetch_failed = true;
                        }
                    }
                }

                done += 1;
                if let Some(progress) = &self.progress {
                    progress(done, total_steps);
                }
            }

            if fetch_failed {
                continue;
            }
            if let Some((x, y)) = clip.nodata_at {
                outcome.warnings.push(BatchWarning::NoData {
                    field: feature.field.clone(),
                    value: feature.value.clone(),
                    x,
                    y,
                });
                continue;
            }
            match clip.mean() {
                Some(mean) => {
                    let centroid = feature.centroid().unwrap_or_default();
                    outcome.results.push(FeatureResult {
                        value: feature.value.clone(),
                        centroid,
                        area: feature.area(),
                        mean,
                    });
                }
                None => too_small += 1,
            }
        }

        if too_small > 0 {
            outcome.warnings.push(BatchWarning::TooSmall { count: too_small });
        }

        if let (Some(path), Some(canvas)) = (&self.options.merged_raster, &canvas) {
            if let Err(err) = canvas.save(path) {
                outcome.warnings.push(BatchWarning::OutputWriteFailed {
                    detail: err.to_string(),
                });
            }
        }

        Ok(outcome)
    }

    /// Fetch the union's top-left tile and allocate the canvas from its
    /// geotransform. Failure disables the merged raster but not the batch.
    fn allocate_canvas(
        &self,
        union: TileRange,
        warnings: &mut Vec<BatchWarning>,
    ) -> Option<MergeCanvas> {
        let top_left = TileIndex::new(union.x_min, union.y_max);
        match self.fetcher.fetch(top_left) {
            Ok(tile) => Some(MergeCanvas::new(&self.config.spec, union, *tile.geotransform())),
            Err(err) => {
                warn!(%top_left, %err, "cannot anchor merge canvas");
                warnings.push(BatchWarning::OutputWriteFailed {
                    detail: format!("tile {top_left} for the raster origin could not be fetched: {err}"),
                });
                None
            }
        }
    }
}

/// Probe the service, pick a fetch strategy, and process a batch.
///
/// This is the caller-facing entry point: the interactive layer hands in
/// its features and options and renders the returned results and warnings.
pub fn compute_batch(
    config: &DatasetConfig,
    features: &[Feature],
    options: BatchOptions,
    progress: Option<ProgressCallback>,
) -> Result<BatchOutcome, ZonalError> {
    let fetcher = select_fetcher(config)?;
    let mut pipeline = BatchPipeline::new(fetcher.as_ref(), config, options);
    if let Some(progress) = progress {
        pipeline = pipeline.with_progress(progress);
    }
    pipeline.run(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_small_warning_wording_matches_count() {
        let one = BatchWarning::TooSmall { count: 1 }.to_string();
        assert!(one.starts_with("One feature is smaller"));

        let three = BatchWarning::TooSmall { count: 3 }.to_string();
        assert!(three.starts_with("3 features are smaller"));
    }

    #[test]
    fn nodata_warning_carries_rounded_coordinates() {
        let w = BatchWarning::NoData {
            field: "NAME".to_string(),
            value: "EZG 7".to_string(),
            x: 520_123.4,
            y: 470_987.6,
        };
        let text = w.to_string();
        assert!(text.contains("NAME = EZG 7"));
        assert!(text.contains("(520123, 470988)"));
    }
}
