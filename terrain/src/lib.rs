//! Terrain elevation lookup and profiling.
//!
//! All providers implement [`TerrainProvider`]. Missing source data never
//! fails a query: it is answered with a sentinel elevation and counted,
//! see [`TerrainProvider::degraded`].

mod error;
mod fetch;
mod math;
mod profile;
mod provider;
mod synthetic;
mod tiles;

pub use crate::{
    error::TerrainError,
    fetch::RemoteConfig,
    profile::{ElevationSample, TerrainProfile},
    provider::TerrainProvider,
    synthetic::{FlatTerrain, SyntheticTerrain},
    tiles::{TileMode, TileSource, TileSourceConfig, DEFAULT_CACHED_ELEVATIONS},
};
pub use geo;

/// Floating point type used for coordinates and elevations.
pub type C = f64;

/// Kilometers per degree used for radius-to-degree conversions.
pub const KM_PER_DEGREE: C = 111.0;
