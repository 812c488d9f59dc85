//! Tile-backed elevation provider.

use crate::{fetch::Fetcher, RemoteConfig, TerrainError, TerrainProvider, C};
use dashmap::DashMap;
use geo::geometry::Coord;
use log::{debug, warn};
use nasadem::{Tile, VOID};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};

/// How to load tiles.
///
/// The trade off between loading tile data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    /// Parse tile and load into memory.
    InMem,

    /// Memory map file contents.
    MemMap,
}

/// Default bound on the exact-coordinate cache, about 24 MiB of entries.
pub const DEFAULT_CACHED_ELEVATIONS: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct TileSourceConfig {
    /// Directory containing (or caching) HGT tile files.
    pub tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    pub tile_mode: TileMode,

    /// Maximum number of tiles kept resident at once.
    pub resident_tiles: usize,

    /// Elevation reported where source data is missing.
    pub sentinel_m: C,

    /// Maximum number of exact-coordinate elevations remembered. The
    /// cache is emptied when it fills.
    pub cached_elevations: usize,

    /// Where to download tiles missing from `tile_dir`.
    pub remote: Option<RemoteConfig>,
}

impl TileSourceConfig {
    pub fn new(tile_dir: impl Into<PathBuf>) -> Self {
        Self {
            tile_dir: tile_dir.into(),
            tile_mode: TileMode::InMem,
            resident_tiles: 1,
            sentinel_m: 0.0,
            cached_elevations: DEFAULT_CACHED_ELEVATIONS,
            remote: None,
        }
    }
}

/// Elevation provider over a directory of integer-degree HGT tiles.
///
/// Tiles are loaded lazily on first access. At most
/// `resident_tiles` rasters are held at once; the least recently used
/// one is dropped to make room. Tiles which can neither be read nor
/// fetched are remembered as tombstones and answered with the sentinel
/// elevation until [`TileSource::retry_failed`] is called.
pub struct TileSource {
    tile_dir: PathBuf,
    tile_mode: TileMode,
    sentinel_m: C,
    fetcher: Option<Fetcher>,

    /// Resident tiles, most recently used first.
    resident: Mutex<Resident>,

    /// Tiles which failed to load.
    failed: DashMap<Coord<i16>, Arc<Tile>>,

    /// Exact-coordinate elevation cache, keyed by coordinate bits.
    elevations: DashMap<(u64, u64), C>,
    cached_elevations: usize,

    degraded: AtomicUsize,
}

struct Resident {
    capacity: usize,
    tiles: VecDeque<Arc<Tile>>,
}

impl Resident {
    /// Moves the tile at `sw_corner`, if resident, to the front.
    fn promote(&mut self, sw_corner: Coord<i16>) -> Option<Arc<Tile>> {
        let pos = self
            .tiles
            .iter()
            .position(|tile| tile.sw_corner() == sw_corner)?;
        let tile = self.tiles.remove(pos)?;
        self.tiles.push_front(tile.clone());
        Some(tile)
    }
}

impl TileSource {
    pub fn new(config: TileSourceConfig) -> Result<Self, TerrainError> {
        let TileSourceConfig {
            tile_dir,
            tile_mode,
            resident_tiles,
            sentinel_m,
            cached_elevations,
            remote,
        } = config;

        if resident_tiles == 0 {
            return Err(TerrainError::Config(
                "at least one resident tile is required".into(),
            ));
        }
        if cached_elevations == 0 {
            return Err(TerrainError::Config(
                "elevation cache must hold at least one entry".into(),
            ));
        }
        if !sentinel_m.is_finite() {
            return Err(TerrainError::Config("sentinel elevation must be finite".into()));
        }

        let fetcher = remote.as_ref().map(Fetcher::new).transpose()?;

        if fetcher.is_some() {
            std::fs::create_dir_all(&tile_dir)?;
        } else if !has_height_files(&tile_dir)? {
            // Without a remote source every query would degrade, so
            // refuse to start.
            return Err(TerrainError::Path(tile_dir));
        }

        Ok(Self {
            tile_dir,
            tile_mode,
            sentinel_m,
            fetcher,
            resident: Mutex::new(Resident {
                capacity: resident_tiles,
                tiles: VecDeque::with_capacity(resident_tiles),
            }),
            failed: DashMap::new(),
            elevations: DashMap::new(),
            cached_elevations,
            degraded: AtomicUsize::new(0),
        })
    }

    /// Returns the tile containing `coord`.
    ///
    /// `TileSource` will attempt to read the tile from disk, then from
    /// the remote source, if it isn't resident. A tombstone is returned
    /// when both fail.
    pub fn tile(&self, coord: Coord<C>) -> Arc<Tile> {
        let sw_corner = sw_corner(coord);
        if let Some(tombstone) = self.failed.get(&sw_corner) {
            return tombstone.clone();
        }

        if let Some(tile) = self.touch_resident(sw_corner) {
            return tile;
        }

        // Loading, possibly over the network, happens unlocked so other
        // lookups keep going; a racing load of the same tile is dropped.
        match self.load_tile(sw_corner) {
            Ok(tile) => {
                let mut resident = self.resident.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(tile) = resident.promote(sw_corner) {
                    return tile;
                }
                let tile = Arc::new(tile);
                if resident.tiles.len() >= resident.capacity {
                    if let Some(evicted) = resident.tiles.pop_back() {
                        debug!("evicting tile {:?}", evicted.sw_corner());
                    }
                }
                resident.tiles.push_front(tile.clone());
                tile
            }
            Err(e) => {
                warn!("no elevation data for tile {sw_corner:?}: {e}");
                let tombstone = Arc::new(Tile::tombstone(sw_corner));
                self.failed.insert(sw_corner, tombstone.clone());
                tombstone
            }
        }
    }

    /// Forgets failed tiles so they are attempted again on next access.
    pub fn retry_failed(&self) {
        self.failed.clear();
    }

    /// Number of tiles currently known to be unavailable.
    pub fn failed_tiles(&self) -> usize {
        self.failed.len()
    }

    /// Drops every cached elevation and resident tile.
    pub fn clear_cache(&self) {
        self.elevations.clear();
        self.resident
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tiles
            .clear();
    }

    /// Resets the degraded lookup counter.
    pub fn reset_degraded(&self) {
        self.degraded.store(0, Ordering::Relaxed);
    }

    pub fn sentinel(&self) -> C {
        self.sentinel_m
    }

    /// Number of exact-coordinate elevations currently cached.
    pub fn cached_elevations(&self) -> usize {
        self.elevations.len()
    }
}

impl TerrainProvider for TileSource {
    fn get_elevation(&self, coord: Coord<C>) -> Result<C, TerrainError> {
        let key = (coord.x.to_bits(), coord.y.to_bits());
        if let Some(elevation) = self.elevations.get(&key) {
            return Ok(*elevation);
        }

        match self.tile(coord).get(coord) {
            Some(sample) if sample != VOID => {
                let elevation = C::from(sample);
                if self.elevations.len() >= self.cached_elevations {
                    debug!("elevation cache full; clearing");
                    self.elevations.clear();
                }
                self.elevations.insert(key, elevation);
                Ok(elevation)
            }
            _ => {
                warn!("no elevation at {coord:?}, using {} m", self.sentinel_m);
                self.degraded.fetch_add(1, Ordering::Relaxed);
                Ok(self.sentinel_m)
            }
        }
    }

    fn degraded(&self) -> usize {
        self.degraded.load(Ordering::Relaxed)
    }
}

/// Private API.
impl TileSource {
    fn touch_resident(&self, sw_corner: Coord<i16>) -> Option<Arc<Tile>> {
        self.resident
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .promote(sw_corner)
    }

    fn load_tile(&self, sw_corner: Coord<i16>) -> Result<Tile, TerrainError> {
        let file_name = file_name(sw_corner);
        let tile_path = match self.find_tile(&file_name) {
            Some(path) => path,
            None => {
                let fetcher = self
                    .fetcher
                    .as_ref()
                    .ok_or_else(|| TerrainError::DataUnavailable {
                        lat: C::from(sw_corner.y),
                        lon: C::from(sw_corner.x),
                    })?;
                let dest = self.tile_dir.join(&file_name);
                let tile = fetcher.fetch(&file_name, sw_corner, &dest)?;
                if self.tile_mode == TileMode::InMem {
                    return Ok(tile);
                }
                dest
            }
        };
        debug!("loading {tile_path:?}");
        match self.tile_mode {
            TileMode::InMem => Ok(Tile::load(tile_path)?),
            TileMode::MemMap => Ok(Tile::memmap(tile_path)?),
        }
    }

    fn find_tile(&self, file_name: &str) -> Option<PathBuf> {
        [file_name.to_owned(), file_name.to_lowercase()]
            .into_iter()
            .map(|name| self.tile_dir.join(name))
            .find(|path| path.exists())
    }
}

fn has_height_files(dir: &Path) -> Result<bool, TerrainError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("hgt"))
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns the southwest corner as integers for coord.
fn sw_corner(Coord { x, y }: Coord<C>) -> Coord<i16> {
    #[allow(clippy::cast_possible_truncation)]
    Coord {
        x: (x.floor() as i16),
        y: (y.floor() as i16),
    }
}

/// Returns the expected file name for coord
fn file_name(Coord { x, y }: Coord<i16>) -> String {
    let (n_s, lat) = {
        let lat = y.abs();
        let n_s = if y.is_negative() { 'S' } else { 'N' };
        (n_s, lat)
    };
    let (e_w, lon) = {
        let lon = x.abs();
        let e_w = if x.is_negative() { 'W' } else { 'E' };
        (e_w, lon)
    };
    format!("{n_s}{lat:02}{e_w}{lon:03}.hgt")
}
