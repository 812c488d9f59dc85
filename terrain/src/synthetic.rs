//! Elevation providers which need no source data.

use crate::{TerrainError, TerrainProvider, C};
use geo::geometry::Coord;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A level plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub elevation_m: C,
}

impl FlatTerrain {
    pub fn new(elevation_m: C) -> Self {
        Self { elevation_m }
    }
}

impl TerrainProvider for FlatTerrain {
    fn get_elevation(&self, _coord: Coord<C>) -> Result<C, TerrainError> {
        Ok(self.elevation_m)
    }
}

/// Rolling hills on a square grid around a center coordinate.
///
/// Elevation at grid offset `(x, y)` degrees is
/// `baseline + 20·sin(5x)·cos(5y) + 30·sin(2x)·sin(2y)`. Queries snap to
/// the nearest grid node; queries off the grid get the baseline and
/// count as degraded.
#[derive(Debug)]
pub struct SyntheticTerrain {
    center: Coord<C>,
    baseline_m: C,
    half_span_deg: C,
    grid_size: usize,
    degraded: AtomicUsize,
}

impl SyntheticTerrain {
    /// Palmyra, Indiana.
    pub const DEFAULT_CENTER: Coord<C> = Coord {
        x: -86.1091,
        y: 38.4064,
    };

    pub fn new(center: Coord<C>) -> Self {
        Self {
            center,
            baseline_m: 200.0,
            half_span_deg: 0.1,
            grid_size: 100,
            degraded: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn baseline(mut self, meters: C) -> Self {
        self.baseline_m = meters;
        self
    }

    /// Grid extends `degrees` each way from the center.
    ///
    /// The span must be positive and finite.
    pub fn half_span(mut self, degrees: C) -> Result<Self, TerrainError> {
        if !(degrees > 0.0 && degrees.is_finite()) {
            return Err(TerrainError::InvalidArgument(
                "synthetic grid span must be positive",
            ));
        }
        self.half_span_deg = degrees;
        Ok(self)
    }

    /// Number of grid nodes per side (at least 2).
    #[must_use]
    pub fn grid_size(mut self, nodes: usize) -> Self {
        self.grid_size = nodes.max(2);
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn snap(&self, offset: C) -> C {
        let step = 2.0 * self.half_span_deg / (self.grid_size - 1) as C;
        let idx = ((offset + self.half_span_deg) / step).round();
        -self.half_span_deg + idx * step
    }
}

impl Default for SyntheticTerrain {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CENTER)
    }
}

impl TerrainProvider for SyntheticTerrain {
    fn get_elevation(&self, coord: Coord<C>) -> Result<C, TerrainError> {
        let dx = coord.x - self.center.x;
        let dy = coord.y - self.center.y;
        if dx.abs() > self.half_span_deg || dy.abs() > self.half_span_deg {
            self.degraded.fetch_add(1, Ordering::Relaxed);
            return Ok(self.baseline_m);
        }
        let (x, y) = (self.snap(dx), self.snap(dy));
        let hills = (5.0 * x).sin() * (5.0 * y).cos() * 20.0;
        let features = (2.0 * x).sin() * (2.0 * y).sin() * 30.0;
        Ok(self.baseline_m + hills + features)
    }

    fn degraded(&self) -> usize {
        self.degraded.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, FlatTerrain, SyntheticTerrain};
    use crate::{TerrainError, TerrainProvider};
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_terrain() {
        let flat = FlatTerrain::new(200.0);
        let profile = flat
            .get_elevation_profile(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }, 10)
            .unwrap();
        assert!(profile.elevations().all(|e| e == 200.0));
        assert_eq!(flat.degraded(), 0);
    }

    #[test]
    fn test_synthetic_center_is_baseline() {
        let terrain = SyntheticTerrain::default();
        // The grid has an even node count, so the center snaps to a
        // node a half step away from zero.
        let elevation = terrain
            .get_elevation(SyntheticTerrain::DEFAULT_CENTER)
            .unwrap();
        assert_relative_eq!(elevation, 200.0, epsilon = 0.2);
    }

    #[test]
    fn test_synthetic_is_deterministic_and_bounded() {
        let terrain = SyntheticTerrain::default();
        let coord = Coord {
            x: -86.05,
            y: 38.45,
        };
        let first = terrain.get_elevation(coord).unwrap();
        assert_eq!(first, terrain.get_elevation(coord).unwrap());
        assert!((150.0..=250.0).contains(&first));
        assert_eq!(terrain.degraded(), 0);
    }

    #[test]
    fn test_synthetic_rejects_empty_span() {
        for span in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SyntheticTerrain::default().half_span(span),
                Err(TerrainError::InvalidArgument(_))
            ));
        }
        let terrain = SyntheticTerrain::default().half_span(0.5).unwrap();
        let elevation = terrain
            .get_elevation(Coord {
                x: -86.4,
                y: 38.7,
            })
            .unwrap();
        assert!(elevation.is_finite());
        assert_eq!(terrain.degraded(), 0);
    }

    #[test]
    fn test_synthetic_off_grid_degrades() {
        let terrain = SyntheticTerrain::default().baseline(100.0);
        let far = Coord { x: 0.0, y: 0.0 };
        assert_eq!(terrain.get_elevation(far).unwrap(), 100.0);
        assert_eq!(terrain.degraded(), 1);
    }
}
