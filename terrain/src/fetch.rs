//! Remote HGT tile retrieval.

use crate::TerrainError;
use geo::geometry::Coord;
use log::debug;
use nasadem::Tile;
use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Distinguishes temporary files of concurrent downloads.
static PARTIAL_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Default time allowed for a single tile download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to download tiles missing from the local tile directory.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL; tiles are requested as `{base_url}/{N38W087.hgt}`.
    pub base_url: String,

    /// Credential sent with every request.
    pub api_key: String,

    /// Upper bound on a single download.
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

pub(crate) struct Fetcher {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub(crate) fn new(config: &RemoteConfig) -> Result<Self, TerrainError> {
        if config.base_url.trim().is_empty() {
            return Err(TerrainError::Config("remote tile URL is empty".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(TerrainError::Config(
                "remote tile source requires an API key".into(),
            ));
        }
        if config.timeout.is_zero() {
            return Err(TerrainError::Config("fetch timeout must be non-zero".into()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// Downloads `file_name` into `dest` and returns it parsed.
    ///
    /// A body which isn't a whole HGT raster is rejected before
    /// anything is written. The tile goes to a temporary file first so
    /// that a partial write never looks like a valid tile.
    pub(crate) fn fetch(
        &self,
        file_name: &str,
        sw_corner: Coord<i16>,
        dest: &Path,
    ) -> Result<Tile, TerrainError> {
        let url = format!("{}/{file_name}", self.base_url);
        debug!("fetching {url}");
        let bytes = self
            .client
            .get(&url)
            .query(&[("API_Key", &self.api_key)])
            .send()?
            .error_for_status()?
            .bytes()?;
        let tile = Tile::from_bytes(sw_corner, &bytes, file_name)?;
        let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
        let partial = dest.with_extension(format!("hgt.{seq}.partial"));
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, dest)?;
        debug!("fetched {file_name}; {} bytes", bytes.len());
        Ok(tile)
    }
}
