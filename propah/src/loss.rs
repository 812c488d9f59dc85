//! Path and diffraction loss.

use crate::PropahError;
use std::f64::consts::SQRT_2;
use terrain::C;

/// FSPL constant for kilometers and gigahertz.
const FSPL_KM_GHZ_DB: C = 92.45;

/// Returns free space path loss in dB over `distance_km` at `freq_ghz`.
pub fn free_space_path_loss(distance_km: C, freq_ghz: C) -> Result<C, PropahError> {
    if !(distance_km > 0.0) {
        return Err(PropahError::InvalidArgument("distance must be positive"));
    }
    if !(freq_ghz > 0.0) {
        return Err(PropahError::InvalidArgument("frequency must be positive"));
    }
    Ok(20.0 * distance_km.log10() + 20.0 * freq_ghz.log10() + FSPL_KM_GHZ_DB)
}

/// Inverse of [`free_space_path_loss`]: the distance in km at which
/// free space loss reaches `loss_db`.
pub fn free_space_range_km(loss_db: C, freq_ghz: C) -> Result<C, PropahError> {
    if !(freq_ghz > 0.0) {
        return Err(PropahError::InvalidArgument("frequency must be positive"));
    }
    if !loss_db.is_finite() {
        return Err(PropahError::InvalidArgument("path loss must be finite"));
    }
    Ok(10_f64.powf((loss_db - FSPL_KM_GHZ_DB - 20.0 * freq_ghz.log10()) / 20.0))
}

/// Returns single knife-edge diffraction loss in dB for a path whose
/// worst clearance ratio is `clearance_ratio`.
///
/// Unobstructed paths (`ratio >= 1`) lose nothing; fully blocked paths
/// (`ratio <= 0`) lose everything.
pub fn terrain_diffraction_loss(clearance_ratio: C) -> C {
    if clearance_ratio >= 1.0 {
        return 0.0;
    }
    if !(clearance_ratio > 0.0) {
        return C::INFINITY;
    }
    let v = -0.6 + SQRT_2 * (1.0 - clearance_ratio);
    let loss = 6.9 + 20.0 * (((v - 0.1).powi(2) + 1.0).sqrt() + v - 0.1).log10();
    loss.max(0.0)
}
