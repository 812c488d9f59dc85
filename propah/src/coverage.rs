//! Coverage radius estimation.

use crate::{
    gain::directional_factor,
    los::check_line_of_sight,
    loss::{free_space_path_loss, free_space_range_km},
    units::{destination, watts_to_dbm},
    Antenna, AntennaCategory, PropahError,
};
use log::{debug, warn};
use rayon::prelude::*;
use std::f64::consts::PI;
use terrain::{TerrainError, TerrainProvider, C};

const KM_PER_MILE: C = 1.609_34;

/// Tunables for [`CoverageEstimator`].
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Weakest usable received signal for area coverage (dBm).
    pub min_signal_dbm: C,

    /// Weakest usable received signal for point-to-point links (dBm).
    pub p2p_min_signal_dbm: C,

    /// Radius ceilings per category (km).
    pub p2p_max_km: C,
    pub sector_max_km: C,
    pub omni_max_km: C,

    /// Radius floor for every category (km).
    pub min_km: C,

    /// Angle between sampled azimuths (degrees).
    pub azimuth_step_deg: C,

    /// Receiver height above ground used for terrain checks (meters).
    pub receiver_height_m: C,

    /// Terrain samples per line of sight check.
    pub profile_samples: usize,

    /// Stride of the outward scan for the first unreachable distance (km).
    pub scan_step_km: C,

    /// Radial search stops once the bracket is this narrow (km).
    pub tolerance_km: C,

    /// Circumference of the observed reference coverage area (miles).
    pub reference_circumference_mi: C,

    /// Height at which the reference coverage was observed (meters).
    pub reference_height_m: C,

    /// Power at which the reference coverage was observed (watts).
    pub reference_power_w: C,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_signal_dbm: -80.0,
            p2p_min_signal_dbm: -90.0,
            p2p_max_km: 50.0,
            sector_max_km: 15.0,
            omni_max_km: 8.0,
            min_km: 0.5,
            azimuth_step_deg: 10.0,
            receiver_height_m: 5.0,
            profile_samples: 64,
            scan_step_km: 0.25,
            tolerance_km: 0.025,
            reference_circumference_mi: 8.0,
            reference_height_m: 30.0,
            reference_power_w: 1000.0,
        }
    }
}

impl EstimatorConfig {
    /// Radius of the reference coverage circle (km).
    pub fn base_radius_km(&self) -> C {
        self.reference_circumference_mi / (2.0 * PI) * KM_PER_MILE
    }

    fn validate(&self) -> Result<(), PropahError> {
        let positive = [
            (self.p2p_max_km, "point-to-point ceiling must be positive"),
            (self.sector_max_km, "sector ceiling must be positive"),
            (self.omni_max_km, "omni ceiling must be positive"),
            (self.min_km, "radius floor must be positive"),
            (self.scan_step_km, "scan step must be positive"),
            (self.tolerance_km, "search tolerance must be positive"),
            (self.reference_circumference_mi, "reference circumference must be positive"),
            (self.reference_height_m, "reference height must be positive"),
            (self.reference_power_w, "reference power must be positive"),
        ];
        for (value, msg) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(PropahError::InvalidArgument(msg));
            }
        }
        if !(self.azimuth_step_deg > 0.0 && self.azimuth_step_deg <= 360.0) {
            return Err(PropahError::InvalidArgument(
                "azimuth step must be in (0, 360]",
            ));
        }
        if !(self.receiver_height_m >= 0.0) {
            return Err(PropahError::InvalidArgument(
                "receiver height must be non-negative",
            ));
        }
        if self.profile_samples < 3 {
            return Err(PropahError::InvalidArgument(
                "line of sight needs at least 3 samples",
            ));
        }
        if !self.min_signal_dbm.is_finite() || !self.p2p_min_signal_dbm.is_finite() {
            return Err(PropahError::InvalidArgument("signal floors must be finite"));
        }
        Ok(())
    }

    fn ceiling_km(&self, category: AntennaCategory) -> C {
        match category {
            AntennaCategory::Omni => self.omni_max_km,
            AntennaCategory::Sector => self.sector_max_km,
            AntennaCategory::PointToPoint => self.p2p_max_km,
        }
    }

    fn clamp(&self, category: AntennaCategory, radius_km: C) -> C {
        radius_km.min(self.ceiling_km(category)).max(self.min_km)
    }
}

/// How a coverage estimate was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Free space link budget of a point-to-point link.
    PointToPoint,

    /// Calibrated area coverage without terrain.
    Calibrated,

    /// Calibrated area coverage limited by terrain and signal.
    Terrain,
}

/// Terrain-limited radius along one azimuth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzimuthRadius {
    /// Degrees clockwise from north.
    pub azimuth_deg: C,
    pub radius_km: C,
}

/// Coverage of one antenna.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageEstimate {
    /// Usable radius (km).
    pub radius_km: C,

    pub regime: Regime,

    /// Per-azimuth radii before aggregation; empty unless terrain was
    /// considered.
    pub azimuths: Vec<AzimuthRadius>,

    /// Elevation lookups answered with a sentinel while estimating.
    ///
    /// Non-zero means the estimate rests partly on missing data.
    pub degraded_lookups: usize,
}

/// Estimates how far an antenna's signal stays usable.
#[derive(Debug, Clone, Default)]
pub struct CoverageEstimator {
    config: EstimatorConfig,
}

impl CoverageEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, PropahError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates `antenna`'s coverage, limited by `terrain` when given.
    pub fn estimate(
        &self,
        antenna: &Antenna,
        terrain: Option<&dyn TerrainProvider>,
    ) -> Result<CoverageEstimate, PropahError> {
        if antenna.category() == AntennaCategory::PointToPoint {
            if terrain.is_some() {
                debug!("{}: point-to-point range ignores terrain", antenna.name());
            }
            return Ok(CoverageEstimate {
                radius_km: self.p2p_radius_km(antenna)?,
                regime: Regime::PointToPoint,
                azimuths: Vec::new(),
                degraded_lookups: 0,
            });
        }

        let Some(terrain) = terrain else {
            return Ok(CoverageEstimate {
                radius_km: self
                    .config
                    .clamp(antenna.category(), self.calibrated_radius_km(antenna)),
                regime: Regime::Calibrated,
                azimuths: Vec::new(),
                degraded_lookups: 0,
            });
        };

        let degraded_before = terrain.degraded();
        let azimuths = self.coverage_profile(antenna, terrain)?;
        let degraded_lookups = terrain.degraded().saturating_sub(degraded_before);
        if degraded_lookups > 0 {
            warn!(
                "{}: {degraded_lookups} elevation lookups fell back to the sentinel",
                antenna.name()
            );
        }

        let radii: Vec<C> = azimuths.iter().map(|a| a.radius_km).collect();
        let radius_km = self.config.clamp(antenna.category(), median(radii));
        debug!("{}: terrain-limited radius {radius_km:.3} km", antenna.name());

        Ok(CoverageEstimate {
            radius_km,
            regime: Regime::Terrain,
            azimuths,
            degraded_lookups,
        })
    }

    /// Returns the terrain-limited radius along each sampled azimuth,
    /// in azimuth order.
    ///
    /// Each azimuth is searched out to the clamped calibrated radius, so
    /// terrain can only shorten coverage. Azimuths are searched in
    /// parallel.
    pub fn coverage_profile(
        &self,
        antenna: &Antenna,
        terrain: &dyn TerrainProvider,
    ) -> Result<Vec<AzimuthRadius>, PropahError> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = ((360.0 / self.config.azimuth_step_deg).round() as usize).max(1);
        #[allow(clippy::cast_precision_loss)]
        let step_deg = 360.0 / steps as C;
        let max_km = self
            .config
            .clamp(antenna.category(), self.calibrated_radius_km(antenna));

        (0..steps)
            .into_par_iter()
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let azimuth_deg = i as C * step_deg;
                let radius_km = self.search_azimuth(antenna, terrain, azimuth_deg, max_km)?;
                debug!(
                    "{}: azimuth {azimuth_deg:.1} reaches {radius_km:.3} km",
                    antenna.name()
                );
                Ok(AzimuthRadius {
                    azimuth_deg,
                    radius_km,
                })
            })
            .collect()
    }

    /// Height and power scaled reference radius (km), before clamping.
    pub fn calibrated_radius_km(&self, antenna: &Antenna) -> C {
        let height_factor = (antenna.height_m() / self.config.reference_height_m).sqrt();
        let power_factor = (antenna.power_w() / self.config.reference_power_w).sqrt();
        self.config.base_radius_km() * height_factor * power_factor * directional_factor(antenna)
    }

    /// Free space range of a point-to-point link (km), clamped.
    pub fn p2p_radius_km(&self, antenna: &Antenna) -> Result<C, PropahError> {
        let eirp_dbm = watts_to_dbm(antenna.power_w()) + 10.0 * directional_factor(antenna).log10();
        let floor_dbm = self.config.min_signal_dbm.min(self.config.p2p_min_signal_dbm);
        let range_km = free_space_range_km(eirp_dbm - floor_dbm, antenna.frequency_ghz())?;
        debug!(
            "{}: eirp {eirp_dbm:.1} dBm, free space range {range_km:.1} km",
            antenna.name()
        );
        Ok(self.config.clamp(AntennaCategory::PointToPoint, range_km))
    }
}

/// Private API.
impl CoverageEstimator {
    /// Returns the last reachable distance along `azimuth_deg` before
    /// the first unreachable one, up to `max_km`.
    ///
    /// Reachability is not monotonic in distance (a receiver behind a
    /// ridge may be blind while one farther out sees over it), so the
    /// search walks outward in `scan_step_km` strides and only bisects
    /// the stride holding the first failure.
    fn search_azimuth(
        &self,
        antenna: &Antenna,
        terrain: &dyn TerrainProvider,
        azimuth_deg: C,
        max_km: C,
    ) -> Result<C, PropahError> {
        let mut near_km = 0.0;
        let far_km = loop {
            let next_km = (near_km + self.config.scan_step_km).min(max_km);
            if !self.reachable(antenna, terrain, azimuth_deg, next_km)? {
                break next_km;
            }
            if next_km >= max_km {
                return Ok(max_km);
            }
            near_km = next_km;
        };
        self.bisect(antenna, terrain, azimuth_deg, near_km, far_km)
    }

    /// Narrows `[near_km, far_km]`, reachable at `near_km` and not at
    /// `far_km`, down to the configured tolerance.
    fn bisect(
        &self,
        antenna: &Antenna,
        terrain: &dyn TerrainProvider,
        azimuth_deg: C,
        mut near_km: C,
        mut far_km: C,
    ) -> Result<C, PropahError> {
        while far_km - near_km > self.config.tolerance_km {
            let mid_km = (near_km + far_km) / 2.0;
            if self.reachable(antenna, terrain, azimuth_deg, mid_km)? {
                near_km = mid_km;
            } else {
                far_km = mid_km;
            }
        }
        Ok(near_km)
    }

    /// A receiver `distance_km` out is reachable when the path is clear
    /// and the received signal meets the configured floor.
    fn reachable(
        &self,
        antenna: &Antenna,
        terrain: &dyn TerrainProvider,
        azimuth_deg: C,
        distance_km: C,
    ) -> Result<bool, PropahError> {
        let received_dbm = watts_to_dbm(antenna.power_w())
            - free_space_path_loss(distance_km, antenna.frequency_ghz())?;
        if received_dbm < self.config.min_signal_dbm {
            return Ok(false);
        }

        let target = destination(antenna.coord(), azimuth_deg, distance_km);
        match check_line_of_sight(
            antenna,
            target,
            self.config.receiver_height_m,
            terrain,
            self.config.profile_samples,
        ) {
            Ok(los) => Ok(los.clear),
            Err(PropahError::Terrain(e)) if !matches!(e, TerrainError::InvalidArgument(_)) => {
                warn!(
                    "{}: treating {distance_km:.3} km at {azimuth_deg:.1} as blocked: {e}",
                    antenna.name()
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Estimates `antenna`'s coverage radius in km with default tunables
/// and the given minimum usable signal.
pub fn estimate_coverage_radius(
    antenna: &Antenna,
    terrain: Option<&dyn TerrainProvider>,
    min_signal_dbm: C,
) -> Result<C, PropahError> {
    let estimator = CoverageEstimator::new(EstimatorConfig {
        min_signal_dbm,
        ..EstimatorConfig::default()
    })?;
    Ok(estimator.estimate(antenna, terrain)?.radius_km)
}

fn median(mut values: Vec<C>) -> C {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(C::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
