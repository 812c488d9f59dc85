use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};

/// Estimate fixed wireless coverage over terrain.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    #[command(flatten)]
    pub terrain: TerrainArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

/// Where elevations come from. Without any of these flags, terrain is
/// not considered.
#[derive(Args, Debug, Clone)]
pub struct TerrainArgs {
    /// Directory of NASADEM/SRTM hgt tiles.
    #[arg(short, long, conflicts_with_all = ["flat", "synthetic"])]
    pub tile_dir: Option<PathBuf>,

    /// Memory map tiles instead of reading them into memory.
    #[arg(long, default_value_t = false)]
    pub memmap: bool,

    /// Number of tiles kept resident at once.
    #[arg(long, default_value_t = 1)]
    pub resident_tiles: usize,

    /// Elevation, in meters, reported where data is missing.
    #[arg(long, default_value_t = 0.0)]
    pub sentinel: f64,

    /// Fetch missing tiles from this URL.
    #[arg(long, requires = "tile_dir")]
    pub remote_url: Option<String>,

    /// API key for the remote tile service.
    #[arg(long, env = "WISPCOV_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Use level terrain at this elevation, in meters.
    #[arg(long, conflicts_with = "synthetic")]
    pub flat: Option<f64>,

    /// Use synthetic rolling hills centered on "lat,lon".
    #[arg(long)]
    pub synthetic: Option<LatLon>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Estimate the coverage radius of each antenna in a JSON file.
    Radius {
        /// JSON array of antennas.
        antennas: PathBuf,

        /// Weakest usable signal, in dBm.
        #[arg(long, default_value_t = -80.0, allow_negative_numbers = true)]
        min_signal: f64,

        /// Degrees between sampled azimuths.
        #[arg(long, default_value_t = 10.0)]
        azimuth_step: f64,

        /// Print results as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Check line of sight from an antenna to a target.
    Los {
        /// JSON antenna.
        antenna: PathBuf,

        /// Target "lat,lon,alt", where 'alt' is meters above ground.
        #[arg(long)]
        target: LatLonAlt,

        /// Terrain samples along the path.
        #[arg(long, default_value_t = 64)]
        samples: usize,
    },

    /// Print the elevation profile between two points.
    Profile {
        /// Start "lat,lon"
        #[arg(long)]
        start: LatLon,

        /// Destination "lat,lon"
        #[arg(long)]
        dest: LatLon,

        /// Number of samples, endpoints included.
        #[arg(long, default_value_t = 100)]
        samples: usize,

        #[arg(long, value_enum, default_value_t = ProfileFormat::Csv)]
        format: ProfileFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProfileFormat {
    /// Print samples as CSV.
    Csv,

    /// Print samples as JSON.
    Json,

    /// Plot to terminal.
    Plot,
}

#[derive(Clone, Debug, Copy)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        Ok(Self(Coord { y: lat, x: lon }))
    }
}

#[derive(Clone, Debug, Copy)]
pub struct LatLonAlt(pub Coord<f64>, pub f64);

impl FromStr for LatLonAlt {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_lon, alt_str) = s
            .rsplit_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon,alt"))?;
        let LatLon(coord) = lat_lon
            .parse()
            .map_err(|_| anyhow!("not a valid lat,lon,alt"))?;
        let alt = f64::from_str(alt_str.trim())?;
        Ok(Self(coord, alt))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, LatLon, LatLonAlt};
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_parse_lat_lon() {
        let LatLon(coord) = "38.3864,-86.1091".parse().unwrap();
        assert_eq!(coord.y, 38.3864);
        assert_eq!(coord.x, -86.1091);
        assert!("38.3864".parse::<LatLon>().is_err());
        assert!("north,west".parse::<LatLon>().is_err());
    }

    #[test]
    fn test_parse_lat_lon_alt() {
        let LatLonAlt(coord, alt) = "38.3864, -86.1091, 10".parse().unwrap();
        assert_eq!(coord.y, 38.3864);
        assert_eq!(coord.x, -86.1091);
        assert_eq!(alt, 10.0);
        assert!("38.3864,-86.1091".parse::<LatLonAlt>().is_err());
    }

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
        let cli = Cli::try_parse_from([
            "wispcov",
            "--flat",
            "200",
            "radius",
            "antennas.json",
            "--min-signal",
            "-70",
        ])
        .unwrap();
        assert_eq!(cli.terrain.flat, Some(200.0));
        assert!(matches!(cli.cmd, Command::Radius { min_signal, .. } if min_signal == -70.0));
    }

    #[test]
    fn test_terrain_sources_conflict() {
        assert!(Cli::try_parse_from([
            "wispcov",
            "--flat",
            "200",
            "--synthetic",
            "38.4,-86.1",
            "radius",
            "antennas.json",
        ])
        .is_err());
    }
}
