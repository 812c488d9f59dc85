//! Line of sight analysis over a terrain profile.

use crate::{fresnel::fresnel_zone_radius, loss::terrain_diffraction_loss, Antenna, PropahError};
use geo::geometry::Coord;
use log::trace;
use terrain::{TerrainProfile, TerrainProvider, C};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: C = 6_371_000.0;

/// Fraction of the first fresnel zone which must stay unobstructed.
pub const FRESNEL_CLEARANCE: C = 0.6;

/// Smallest clearance ever required of an interior point, in meters.
///
/// The curvature correction outgrows the fresnel requirement on long
/// paths; past that point the sight line only needs to stay above
/// ground.
pub const MIN_REQUIRED_CLEARANCE_M: C = 0.1;

/// Result of a line of sight check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOfSight {
    /// `true` when every interior point meets its required clearance.
    pub clear: bool,

    /// Worst ratio of actual to required clearance along the path.
    ///
    /// Negative when terrain rises above the sight line.
    pub min_clearance_ratio: C,
}

impl LineOfSight {
    /// Knife-edge diffraction loss (dB) implied by the worst clearance.
    pub fn diffraction_loss_db(&self) -> C {
        terrain_diffraction_loss(self.min_clearance_ratio)
    }
}

/// Checks whether `antenna` has a clear path to a receiver
/// `target_height_m` above ground at `target`.
///
/// Terrain is sampled at `samples` points, endpoints included; at
/// least 3 are needed so there is something between the endpoints to
/// check.
pub fn check_line_of_sight<T>(
    antenna: &Antenna,
    target: Coord<C>,
    target_height_m: C,
    terrain: &T,
    samples: usize,
) -> Result<LineOfSight, PropahError>
where
    T: TerrainProvider + ?Sized,
{
    if samples < 3 {
        return Err(PropahError::InvalidArgument(
            "line of sight needs at least 3 samples",
        ));
    }
    let profile = terrain.get_elevation_profile(antenna.coord(), target, samples)?;
    profile_line_of_sight(antenna, &profile, target_height_m)
}

/// Line of sight over an already sampled profile starting at the
/// antenna.
pub fn profile_line_of_sight(
    antenna: &Antenna,
    profile: &TerrainProfile,
    target_height_m: C,
) -> Result<LineOfSight, PropahError> {
    if profile.len() < 3 {
        return Err(PropahError::InvalidArgument(
            "line of sight needs at least 3 samples",
        ));
    }
    if !(target_height_m >= 0.0) {
        return Err(PropahError::InvalidArgument(
            "target height must be non-negative",
        ));
    }

    let total_km = profile.distance_km();
    let tx_m = profile.start().elevation + antenna.height_m();
    let rx_m = profile.end().elevation + target_height_m;

    let mut min_clearance_ratio = C::INFINITY;
    let interior = &profile.samples()[1..profile.len() - 1];
    for (idx, sample) in interior.iter().enumerate().map(|(i, s)| (i + 1, s)) {
        let fraction = profile.fraction(idx);
        let sight_m = tx_m + (rx_m - tx_m) * fraction;
        let distance_km = total_km * fraction;
        let distance_m = distance_km * 1000.0;

        let fresnel_m = fresnel_zone_radius(distance_km, antenna.frequency_ghz(), 1)?;
        let curvature_m = distance_m.powi(2) / (2.0 * EARTH_RADIUS_M);
        let required_m = (FRESNEL_CLEARANCE * fresnel_m - curvature_m).max(MIN_REQUIRED_CLEARANCE_M);
        let clearance_m = sight_m - sample.elevation;

        min_clearance_ratio = min_clearance_ratio.min(clearance_m / required_m);
    }

    trace!(
        "los {}; {total_km:.3} km, min clearance ratio {min_clearance_ratio:.3}",
        antenna.name()
    );

    Ok(LineOfSight {
        clear: min_clearance_ratio >= 1.0,
        min_clearance_ratio,
    })
}
