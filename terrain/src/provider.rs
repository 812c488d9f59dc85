use crate::{math::linspace, ElevationSample, TerrainError, TerrainProfile, C, KM_PER_DEGREE};
use geo::geometry::Coord;
use std::f64::consts::TAU;

/// A source of ground elevation.
///
/// Implementations must be deterministic for a fixed dataset: asking
/// twice for the same coordinate returns the same elevation. Missing
/// data is answered with a sentinel elevation rather than an error, and
/// recorded in [`TerrainProvider::degraded`].
pub trait TerrainProvider: Send + Sync {
    /// Returns the elevation at `coord` in meters above sea level.
    ///
    /// `coord.x` is longitude and `coord.y` latitude, in degrees.
    fn get_elevation(&self, coord: Coord<C>) -> Result<C, TerrainError>;

    /// Returns `n` samples evenly spaced in coordinate space from
    /// `start` to `end`, inclusive.
    fn get_elevation_profile(
        &self,
        start: Coord<C>,
        end: Coord<C>,
        n: usize,
    ) -> Result<TerrainProfile, TerrainError> {
        if n < 2 {
            return Err(TerrainError::InvalidArgument(
                "a terrain profile needs at least 2 samples",
            ));
        }
        let samples = linspace(start.y, end.y, n)
            .zip(linspace(start.x, end.x, n))
            .map(|(lat, lon)| {
                let elevation = self.get_elevation(Coord { x: lon, y: lat })?;
                Ok(ElevationSample {
                    lat,
                    lon,
                    elevation,
                })
            })
            .collect::<Result<Vec<_>, TerrainError>>()?;
        TerrainProfile::from_samples(samples)
    }

    /// Returns the mean elevation of `n` points evenly spaced around a
    /// circle of `radius_km` centered on `center`.
    #[allow(clippy::cast_precision_loss)]
    fn get_average_elevation(
        &self,
        center: Coord<C>,
        radius_km: C,
        n: usize,
    ) -> Result<C, TerrainError> {
        if n == 0 {
            return Err(TerrainError::InvalidArgument(
                "average elevation needs at least 1 sample",
            ));
        }
        if !(radius_km >= 0.0) {
            return Err(TerrainError::InvalidArgument("radius must be non-negative"));
        }
        let radius_deg = radius_km / KM_PER_DEGREE;
        let mut sum = 0.0;
        for i in 0..n {
            let angle = TAU * i as C / n as C;
            let (sin, cos) = angle.sin_cos();
            sum += self.get_elevation(Coord {
                x: center.x + radius_deg * sin,
                y: center.y + radius_deg * cos,
            })?;
        }
        Ok(sum / n as C)
    }

    /// Number of lookups answered with the sentinel elevation because
    /// source data was missing.
    fn degraded(&self) -> usize {
        0
    }
}
