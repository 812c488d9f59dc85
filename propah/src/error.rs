use terrain::TerrainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropahError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("antenna {field} out of range: {value}")]
    InvalidAntenna { field: &'static str, value: f64 },

    #[error("{0}")]
    Terrain(#[from] TerrainError),
}
