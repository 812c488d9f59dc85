use crate::{Antenna, AntennaCategory};
use terrain::C;

/// Returns the antenna's directional gain as a linear factor (>= 1).
///
/// Omnidirectional antennas, and any antenna without a beam width,
/// have a factor of 1. Point-to-point antennas gain `360 / beam_width`;
/// sector antennas gain the gentler `2 * sqrt(360 / beam_width)`.
pub fn directional_factor(antenna: &Antenna) -> C {
    let beam_width = match (antenna.category(), antenna.beam_width_deg()) {
        (AntennaCategory::Omni, _) | (_, None) => return 1.0,
        (_, Some(beam_width)) => beam_width,
    };
    let factor = match antenna.category() {
        AntennaCategory::PointToPoint => 360.0 / beam_width,
        _ => 2.0 * (360.0 / beam_width).sqrt(),
    };
    factor.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::directional_factor;
    use crate::{Antenna, AntennaCategory};
    use approx::assert_relative_eq;

    fn builder() -> crate::AntennaBuilder {
        Antenna::builder("a")
            .location(38.3864, -86.1091)
            .height(30.0)
            .power(1000.0)
            .frequency(5.8)
    }

    #[test]
    fn test_no_beam_width_is_unity() {
        for category in [AntennaCategory::Omni, AntennaCategory::Sector] {
            let antenna = builder().category(category).build().unwrap();
            assert_eq!(directional_factor(&antenna), 1.0);
        }
    }

    #[test]
    fn test_sector() {
        let antenna = builder().beam_width(90.0).build().unwrap();
        assert_relative_eq!(directional_factor(&antenna), 4.0);
    }

    #[test]
    fn test_point_to_point() {
        let antenna = builder()
            .beam_width(5.0)
            .category(AntennaCategory::PointToPoint)
            .build()
            .unwrap();
        assert_relative_eq!(directional_factor(&antenna), 72.0);

        // Unset beam width falls back to the 5 degree default.
        let antenna = builder()
            .category(AntennaCategory::PointToPoint)
            .build()
            .unwrap();
        assert_relative_eq!(directional_factor(&antenna), 72.0);
    }

    #[test]
    fn test_omni_ignores_beam_width() {
        let antenna = builder()
            .beam_width(360.0)
            .category(AntennaCategory::Omni)
            .build()
            .unwrap();
        assert_eq!(directional_factor(&antenna), 1.0);
    }

    #[test]
    fn test_wide_sector_is_at_least_unity() {
        let antenna = builder().beam_width(360.0).build().unwrap();
        assert!(directional_factor(&antenna) >= 1.0);
    }
}
