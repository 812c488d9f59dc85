use crate::{TerrainError, C};
use geo::{algorithm::HaversineDistance, geometry::Point};
use serde::Serialize;

/// Ground elevation at a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationSample {
    pub lat: C,
    pub lon: C,
    /// Meters above sea level.
    pub elevation: C,
}

impl ElevationSample {
    pub fn point(&self) -> Point<C> {
        Point::new(self.lon, self.lat)
    }
}

/// Elevation samples evenly spaced (in coordinate space) from a start
/// coordinate to an end coordinate, both included.
///
/// A profile always holds at least two samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainProfile {
    samples: Vec<ElevationSample>,
}

impl TerrainProfile {
    /// Returns a profile over `samples`, which must be ordered from
    /// start to end.
    pub fn from_samples(samples: Vec<ElevationSample>) -> Result<Self, TerrainError> {
        if samples.len() < 2 {
            return Err(TerrainError::InvalidArgument(
                "a terrain profile needs at least 2 samples",
            ));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[ElevationSample] {
        &self.samples
    }

    /// Number of samples, endpoints included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn start(&self) -> &ElevationSample {
        &self.samples[0]
    }

    pub fn end(&self) -> &ElevationSample {
        &self.samples[self.samples.len() - 1]
    }

    /// Great circle distance from start to end in kilometers.
    pub fn distance_km(&self) -> C {
        self.start().point().haversine_distance(&self.end().point()) / 1000.0
    }

    /// Fraction of the path covered at sample `idx`.
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self, idx: usize) -> C {
        idx as C / (self.samples.len() - 1) as C
    }

    pub fn elevations(&self) -> impl Iterator<Item = C> + '_ {
        self.samples.iter().map(|s| s.elevation)
    }
}

#[cfg(test)]
mod tests {
    use super::{ElevationSample, TerrainProfile};
    use approx::assert_relative_eq;

    fn sample(lat: f64, lon: f64, elevation: f64) -> ElevationSample {
        ElevationSample {
            lat,
            lon,
            elevation,
        }
    }

    #[test]
    fn test_profile_needs_two_samples() {
        assert!(TerrainProfile::from_samples(vec![]).is_err());
        assert!(TerrainProfile::from_samples(vec![sample(0.0, 0.0, 1.0)]).is_err());
        assert!(
            TerrainProfile::from_samples(vec![sample(0.0, 0.0, 1.0), sample(0.0, 1.0, 2.0)])
                .is_ok()
        );
    }

    #[test]
    fn test_profile_distance_and_fraction() {
        let profile = TerrainProfile::from_samples(vec![
            sample(0.0, 0.0, 10.0),
            sample(0.0, 0.5, 20.0),
            sample(0.0, 1.0, 30.0),
        ])
        .unwrap();
        // One degree of longitude on the equator.
        assert_relative_eq!(profile.distance_km(), 111.195, epsilon = 0.01);
        assert_relative_eq!(profile.fraction(1), 0.5);
        assert_eq!(profile.elevations().collect::<Vec<_>>(), [10.0, 20.0, 30.0]);
    }
}
