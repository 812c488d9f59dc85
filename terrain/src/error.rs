use nasadem::NasademError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("no elevation data at ({lat}, {lon})")]
    DataUnavailable { lat: f64, lon: f64 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no height files in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Nasadem(#[from] NasademError),

    #[error("tile fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}
