//! Unit conversions and geodesy helpers.

use geo::{
    algorithm::{HaversineDestination, HaversineDistance},
    geometry::{Coord, Point},
};
use terrain::C;

/// Converts watts to dBm.
pub fn watts_to_dbm(watts: C) -> C {
    10.0 * (watts * 1000.0).log10()
}

/// Converts dBm to watts.
pub fn dbm_to_watts(dbm: C) -> C {
    10_f64.powf((dbm - 30.0) / 10.0)
}

/// Great circle distance between `a` and `b` in kilometers.
pub fn haversine_km(a: Coord<C>, b: Coord<C>) -> C {
    Point::from(a).haversine_distance(&Point::from(b)) / 1000.0
}

/// Returns the coordinate `distance_km` from `origin` along
/// `bearing_deg` (clockwise from north).
pub fn destination(origin: Coord<C>, bearing_deg: C, distance_km: C) -> Coord<C> {
    Point::from(origin)
        .haversine_destination(bearing_deg, distance_km * 1000.0)
        .0
}
