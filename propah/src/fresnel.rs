use crate::PropahError;
use terrain::C;

/// Speed of light used for wavelength conversions, in m/ns.
const C_M_PER_NS: C = 0.3;

/// Returns the wavelength in meters of a `freq_ghz` signal.
pub fn wavelength_m(freq_ghz: C) -> C {
    C_M_PER_NS / freq_ghz
}

/// Returns the radius in meters of the `n`th fresnel zone for a point
/// `distance_km` away, treating that point as the midpoint of the path.
///
/// ```
/// let r1 = propah::fresnel::fresnel_zone_radius(1.0, 5.8, 1).unwrap();
/// assert!((r1 - 5.085).abs() < 1e-3);
/// ```
pub fn fresnel_zone_radius(distance_km: C, freq_ghz: C, n: u32) -> Result<C, PropahError> {
    if !(distance_km >= 0.0) {
        return Err(PropahError::InvalidArgument("distance must be non-negative"));
    }
    if !(freq_ghz > 0.0) {
        return Err(PropahError::InvalidArgument("frequency must be positive"));
    }
    if n == 0 {
        return Err(PropahError::InvalidArgument("fresnel zones start at 1"));
    }
    let d1 = distance_km * 1000.0;
    let d2 = d1;
    if d1 == 0.0 {
        return Ok(0.0);
    }
    Ok((C::from(n) * wavelength_m(freq_ghz) * d1 * d2 / (d1 + d2)).sqrt())
}

#[cfg(test)]
mod tests {
    use super::{fresnel_zone_radius, wavelength_m};
    use approx::assert_relative_eq;

    #[test]
    fn test_wavelength() {
        assert_relative_eq!(wavelength_m(2.4), 0.125);
    }

    #[test]
    fn test_1st_fresnel_zone() {
        // sqrt(0.3/0.9 * 500 m)
        assert_relative_eq!(
            fresnel_zone_radius(1.0, 0.9, 1).unwrap(),
            12.909_944_487_358_056,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zone_scales_with_sqrt_n() {
        for (d, f) in [(0.5, 2.4), (3.0, 5.8), (20.0, 24.0)] {
            let r1 = fresnel_zone_radius(d, f, 1).unwrap();
            let r2 = fresnel_zone_radius(d, f, 2).unwrap();
            let r3 = fresnel_zone_radius(d, f, 3).unwrap();
            assert_relative_eq!(r2, r1 * 2_f64.sqrt(), max_relative = 1e-12);
            assert_relative_eq!(r3, r1 * 3_f64.sqrt(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(fresnel_zone_radius(0.0, 5.8, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(fresnel_zone_radius(-1.0, 5.8, 1).is_err());
        assert!(fresnel_zone_radius(1.0, 0.0, 1).is_err());
        assert!(fresnel_zone_radius(1.0, 5.8, 0).is_err());
    }
}
