use crate::PropahError;
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use terrain::C;

/// Beam width given to point-to-point antennas built without one.
pub const DEFAULT_P2P_BEAM_WIDTH_DEG: C = 5.0;

/// What an antenna is deployed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntennaCategory {
    /// Area coverage in every direction.
    Omni,

    /// Area coverage within a beam.
    Sector,

    /// Long-haul backhaul link.
    PointToPoint,
}

/// A fixed-site antenna.
///
/// Every field is range checked by [`AntennaBuilder::build`]; an
/// `Antenna` can not be modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AntennaRecord")]
pub struct Antenna {
    name: String,
    longitude: C,
    latitude: C,
    /// Meters above ground.
    height: C,
    /// Watts.
    power: C,
    /// GHz.
    frequency: C,
    azimuth: Option<C>,
    beam_width: Option<C>,
    tilt: Option<C>,
    category: AntennaCategory,
}

impl Antenna {
    pub fn builder(name: impl Into<String>) -> AntennaBuilder {
        AntennaBuilder {
            name: name.into(),
            latitude: None,
            longitude: None,
            height_m: None,
            power_w: None,
            frequency_ghz: None,
            azimuth_deg: None,
            beam_width_deg: None,
            tilt_deg: None,
            category: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> C {
        self.latitude
    }

    pub fn longitude(&self) -> C {
        self.longitude
    }

    /// Location as `x: longitude, y: latitude`.
    pub fn coord(&self) -> Coord<C> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    pub fn height_m(&self) -> C {
        self.height
    }

    pub fn power_w(&self) -> C {
        self.power
    }

    pub fn frequency_ghz(&self) -> C {
        self.frequency
    }

    pub fn azimuth_deg(&self) -> Option<C> {
        self.azimuth
    }

    /// `None` for omnidirectional antennas.
    pub fn beam_width_deg(&self) -> Option<C> {
        self.beam_width
    }

    pub fn tilt_deg(&self) -> Option<C> {
        self.tilt
    }

    pub fn category(&self) -> AntennaCategory {
        self.category
    }
}

pub struct AntennaBuilder {
    name: String,
    latitude: Option<C>,
    longitude: Option<C>,
    height_m: Option<C>,
    power_w: Option<C>,
    frequency_ghz: Option<C>,
    azimuth_deg: Option<C>,
    beam_width_deg: Option<C>,
    tilt_deg: Option<C>,
    category: Option<AntennaCategory>,
}

impl AntennaBuilder {
    /// Site location in degrees (required).
    #[must_use]
    pub fn location(mut self, latitude: C, longitude: C) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Mounting height above ground (meters, required).
    #[must_use]
    pub fn height(mut self, meters: C) -> Self {
        self.height_m = Some(meters);
        self
    }

    /// Transmit power (watts, required).
    #[must_use]
    pub fn power(mut self, watts: C) -> Self {
        self.power_w = Some(watts);
        self
    }

    /// Carrier frequency (GHz, required).
    #[must_use]
    pub fn frequency(mut self, ghz: C) -> Self {
        self.frequency_ghz = Some(ghz);
        self
    }

    /// Pointing direction, clockwise from north (degrees).
    #[must_use]
    pub fn azimuth(mut self, degrees: C) -> Self {
        self.azimuth_deg = Some(degrees);
        self
    }

    /// Beam width (degrees); leave unset for omnidirectional antennas.
    #[must_use]
    pub fn beam_width(mut self, degrees: C) -> Self {
        self.beam_width_deg = Some(degrees);
        self
    }

    /// Mechanical down/up tilt (degrees).
    #[must_use]
    pub fn tilt(mut self, degrees: C) -> Self {
        self.tilt_deg = Some(degrees);
        self
    }

    /// Deployment category.
    ///
    /// Defaults to [`AntennaCategory::Omni`] without a beam width and
    /// [`AntennaCategory::Sector`] with one.
    #[must_use]
    pub fn category(mut self, category: AntennaCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn build(self) -> Result<Antenna, PropahError> {
        let latitude = self.latitude.ok_or(PropahError::Builder("latitude"))?;
        let longitude = self.longitude.ok_or(PropahError::Builder("longitude"))?;
        let height = self.height_m.ok_or(PropahError::Builder("height"))?;
        let power = self.power_w.ok_or(PropahError::Builder("power"))?;
        let frequency = self.frequency_ghz.ok_or(PropahError::Builder("frequency"))?;

        check("longitude", longitude, &(-180.0..=180.0))?;
        check("latitude", latitude, &(-90.0..=90.0))?;
        check_positive("height", height)?;
        check_positive("power", power)?;
        check_positive("frequency", frequency)?;
        if let Some(azimuth) = self.azimuth_deg {
            if !(0.0..360.0).contains(&azimuth) {
                return Err(PropahError::InvalidAntenna {
                    field: "azimuth",
                    value: azimuth,
                });
            }
        }
        if let Some(beam_width) = self.beam_width_deg {
            if !(beam_width > 0.0 && beam_width <= 360.0) {
                return Err(PropahError::InvalidAntenna {
                    field: "beam_width",
                    value: beam_width,
                });
            }
        }
        if let Some(tilt) = self.tilt_deg {
            check("tilt", tilt, &(-90.0..=90.0))?;
        }

        let category = self.category.unwrap_or(match self.beam_width_deg {
            None => AntennaCategory::Omni,
            Some(_) => AntennaCategory::Sector,
        });
        let beam_width = match (category, self.beam_width_deg) {
            (AntennaCategory::PointToPoint, None) => Some(DEFAULT_P2P_BEAM_WIDTH_DEG),
            (_, beam_width) => beam_width,
        };

        Ok(Antenna {
            name: self.name,
            longitude,
            latitude,
            height,
            power,
            frequency,
            azimuth: self.azimuth_deg,
            beam_width,
            tilt: self.tilt_deg,
            category,
        })
    }
}

fn check(field: &'static str, value: C, range: &RangeInclusive<C>) -> Result<(), PropahError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PropahError::InvalidAntenna { field, value })
    }
}

fn check_positive(field: &'static str, value: C) -> Result<(), PropahError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PropahError::InvalidAntenna { field, value })
    }
}

/// Serialized form of an [`Antenna`], validated on conversion.
#[derive(Deserialize)]
struct AntennaRecord {
    name: String,
    longitude: C,
    latitude: C,
    height: C,
    power: C,
    frequency: C,
    #[serde(default)]
    azimuth: Option<C>,
    #[serde(default)]
    beam_width: Option<C>,
    #[serde(default)]
    tilt: Option<C>,
    #[serde(default)]
    category: Option<AntennaCategory>,
}

impl TryFrom<AntennaRecord> for Antenna {
    type Error = PropahError;

    fn try_from(record: AntennaRecord) -> Result<Self, Self::Error> {
        let mut builder = Antenna::builder(record.name)
            .location(record.latitude, record.longitude)
            .height(record.height)
            .power(record.power)
            .frequency(record.frequency);
        builder.azimuth_deg = record.azimuth;
        builder.beam_width_deg = record.beam_width;
        builder.tilt_deg = record.tilt;
        builder.category = record.category;
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::{Antenna, AntennaCategory, PropahError, DEFAULT_P2P_BEAM_WIDTH_DEG};

    fn base() -> super::AntennaBuilder {
        Antenna::builder("Palmyra-Hub")
            .location(38.3864, -86.1091)
            .height(45.0)
            .power(1000.0)
            .frequency(2.4)
    }

    #[test]
    fn test_build_omni() {
        let antenna = base().build().unwrap();
        assert_eq!(antenna.category(), AntennaCategory::Omni);
        assert_eq!(antenna.beam_width_deg(), None);
        assert_eq!(antenna.coord().x, -86.1091);
    }

    #[test]
    fn test_beam_width_implies_sector() {
        let antenna = base().beam_width(90.0).azimuth(180.0).build().unwrap();
        assert_eq!(antenna.category(), AntennaCategory::Sector);
    }

    #[test]
    fn test_p2p_gets_default_beam_width() {
        let antenna = base()
            .category(AntennaCategory::PointToPoint)
            .build()
            .unwrap();
        assert_eq!(antenna.beam_width_deg(), Some(DEFAULT_P2P_BEAM_WIDTH_DEG));
    }

    #[test]
    fn test_missing_required() {
        assert!(matches!(
            Antenna::builder("x").build(),
            Err(PropahError::Builder("latitude"))
        ));
    }

    #[test]
    fn test_out_of_range() {
        for (builder, field) in [
            (base().location(91.0, 0.0), "latitude"),
            (base().location(0.0, -181.0), "longitude"),
            (base().height(0.0), "height"),
            (base().power(-1.0), "power"),
            (base().frequency(f64::NAN), "frequency"),
            (base().azimuth(360.0), "azimuth"),
            (base().beam_width(0.0), "beam_width"),
            (base().tilt(-91.0), "tilt"),
        ] {
            match builder.build() {
                Err(PropahError::InvalidAntenna { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected {field} error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "name": "Palmyra-Backhaul",
            "longitude": -86.1091,
            "latitude": 38.3864,
            "height": 50,
            "power": 1500,
            "frequency": 5.8,
            "beam_width": 5,
            "category": "point_to_point"
        }"#;
        let antenna: Antenna = serde_json::from_str(json).unwrap();
        assert_eq!(antenna.category(), AntennaCategory::PointToPoint);
        assert_eq!(antenna.beam_width_deg(), Some(5.0));

        let bad = json.replace("\"height\": 50", "\"height\": -5");
        assert!(serde_json::from_str::<Antenna>(&bad).is_err());
    }
}
