//! # Radio Frequency Propagation
//!
//! `propah` models how far a fixed wireless antenna reaches: free space
//! path loss, fresnel zones, directional gain, terrain line of sight
//! and, built on all of those, coverage radius estimation.

mod antenna;
pub mod coverage;
mod error;
pub mod fresnel;
pub mod gain;
pub mod los;
pub mod loss;
pub mod units;

pub use {
    crate::{
        antenna::{Antenna, AntennaBuilder, AntennaCategory, DEFAULT_P2P_BEAM_WIDTH_DEG},
        coverage::{
            estimate_coverage_radius, AzimuthRadius, CoverageEstimate, CoverageEstimator,
            EstimatorConfig, Regime,
        },
        error::PropahError,
        fresnel::fresnel_zone_radius,
        gain::directional_factor,
        los::{check_line_of_sight, profile_line_of_sight, LineOfSight},
        loss::{free_space_path_loss, terrain_diffraction_loss},
    },
    geo, terrain,
};
