//! Network access to the tile service.
//!
//! Tiles are served as per-tile zip archives at
//! `{base_url}/{layer}_COMPRESSED/{x}/{y}.asc.zip`, each containing a single
//! ASCII-grid entry at `{layer}_TILED/{x}/{y}.asc`. Two interchangeable
//! strategies retrieve them:
//!
//! - [`StreamingFetcher`] decodes the archive entry directly from the HTTP
//!   response stream without buffering the archive.
//! - [`ArchiveFetcher`] downloads the whole archive into memory first and
//!   then unpacks it. This is the fallback for environments where streaming
//!   decompression fails.
//!
//! Both produce identical [`TileData`] for the same tile.
//! [`select_fetcher`] probes the service once and picks whichever strategy
//! works; the chosen strategy is then used for the rest of the batch.

use crate::grid::TileData;
use crate::spec::{TileIndex, TileSpec};
use crate::{Result, TileError};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Cursor, Read};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP timeout for a single tile download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Tile used for the one-shot strategy probe at batch start.
pub const PROBE_TILE: TileIndex = TileIndex { x: 1, y: 1 };

/// Everything needed to reach one published tile dataset.
///
/// The default value points at the `AT_OGD_DHM_LAMB_10M_SLOPE` layer of the
/// gpsinfo service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Base URL of the tile service, without a trailing slash.
    pub base_url: String,
    /// Published layer name.
    pub layer: String,
    /// Tiling scheme of the layer.
    pub spec: TileSpec,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            base_url: "https://austrian-geodata-services.org/gpsinfo".to_string(),
            layer: "AT_OGD_DHM_LAMB_10M_SLOPE".to_string(),
            spec: TileSpec::default(),
        }
    }
}

impl DatasetConfig {
    /// URL of a tile's zip archive.
    pub fn zip_url(&self, index: TileIndex) -> String {
        format!(
            "{}/{}_COMPRESSED/{}/{}.asc.zip",
            self.base_url, self.layer, index.x, index.y
        )
    }

    /// Path of the ASCII-grid entry inside a tile's archive.
    pub fn entry_path(&self, index: TileIndex) -> String {
        format!("{}_TILED/{}/{}.asc", self.layer, index.x, index.y)
    }
}

/// Capability interface for retrieving one tile.
///
/// Implementations must be interchangeable: for the same tile index they
/// yield the same cell values and the same geotransform.
pub trait TileFetcher {
    /// Retrieve one tile.
    ///
    /// An absent tile (the server has no archive at the tile's URL) is
    /// [`TileError::TileUnavailable`]; transport and decode failures map to
    /// the other [`TileError`] variants so the caller can tell a missing
    /// tile from a broken download.
    fn fetch(&self, index: TileIndex) -> Result<TileData>;
}

fn build_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?)
}

fn check_status(index: TileIndex, response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(TileError::TileUnavailable { index });
    }
    if !status.is_success() {
        return Err(TileError::DownloadFailed {
            index,
            reason: format!("HTTP {status}"),
        });
    }
    Ok(response)
}

/// Fetch strategy that decodes the archive from the response stream.
pub struct StreamingFetcher {
    config: DatasetConfig,
    client: reqwest::blocking::Client,
}

impl StreamingFetcher {
    /// Create a streaming fetcher for a dataset.
    pub fn new(config: DatasetConfig) -> Result<Self> {
        Ok(StreamingFetcher {
            config,
            client: build_client()?,
        })
    }

    /// Decode the first ASCII-grid entry of a zip stream.
    ///
    /// Exposed so the decoding path can be exercised against in-memory
    /// archives; [`fetch`](TileFetcher::fetch) feeds it the HTTP body.
    pub fn decode_stream<R: Read>(mut reader: R, spec: &TileSpec) -> Result<TileData> {
        while let Some(entry) = zip::read::read_zipfile_from_stream(&mut reader)? {
            if entry.name().ends_with(".asc") {
                return TileData::from_asc_reader(BufReader::new(entry), spec);
            }
        }
        Err(TileError::MalformedGrid(
            "archive contains no .asc entry".to_string(),
        ))
    }
}

impl TileFetcher for StreamingFetcher {
    fn fetch(&self, index: TileIndex) -> Result<TileData> {
        let url = self.config.zip_url(index);
        debug!(%index, %url, "streaming tile");
        let response = check_status(index, self.client.get(&url).send()?)?;
        Self::decode_stream(response, &self.config.spec)
    }
}

/// Fallback fetch strategy: download the whole archive, then unpack.
pub struct ArchiveFetcher {
    config: DatasetConfig,
    client: reqwest::blocking::Client,
}

impl ArchiveFetcher {
    /// Create an archive fetcher for a dataset.
    pub fn new(config: DatasetConfig) -> Result<Self> {
        Ok(ArchiveFetcher {
            config,
            client: build_client()?,
        })
    }

    /// Unpack a fully downloaded archive and parse its first entry.
    ///
    /// Exposed so the decoding path can be exercised against in-memory
    /// archives; [`fetch`](TileFetcher::fetch) feeds it the HTTP body.
    pub fn decode_archive(bytes: &[u8], spec: &TileSpec) -> Result<TileData> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        if archive.len() == 0 {
            return Err(TileError::MalformedGrid(
                "archive contains no entries".to_string(),
            ));
        }
        let entry = archive.by_index(0)?;
        TileData::from_asc_reader(BufReader::new(entry), spec)
    }
}

impl TileFetcher for ArchiveFetcher {
    fn fetch(&self, index: TileIndex) -> Result<TileData> {
        let url = self.config.zip_url(index);
        debug!(%index, %url, "downloading tile archive");
        let mut response = check_status(index, self.client.get(&url).send()?)?;
        let mut bytes = Vec::new();
        response.read_to_end(&mut bytes)?;
        Self::decode_archive(&bytes, &self.config.spec)
    }
}

/// Probe the service once and pick a working fetch strategy.
///
/// Tries the streaming strategy on the probe tile first and falls back to
/// the archive strategy. If neither can retrieve the probe tile the service
/// is considered unreachable and the batch cannot start.
pub fn select_fetcher(config: &DatasetConfig) -> Result<Box<dyn TileFetcher>> {
    let streaming = StreamingFetcher::new(config.clone())?;
    match streaming.fetch(PROBE_TILE) {
        Ok(_) => {
            debug!("using streaming fetch strategy");
            return Ok(Box::new(streaming));
        }
        Err(err) => {
            warn!(%err, "streaming strategy failed probe, falling back to archive download");
        }
    }

    let archive = ArchiveFetcher::new(config.clone())?;
    archive
        .fetch(PROBE_TILE)
        .map_err(|err| TileError::ServiceUnreachable(err.to_string()))?;
    debug!("using archive fetch strategy");
    Ok(Box::new(archive))
}
