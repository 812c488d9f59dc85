mod options;

use anyhow::{anyhow, Context, Error as AnyError};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use options::{Cli, Command as CliCmd, LatLon, LatLonAlt, ProfileFormat, TerrainArgs};
use propah::{check_line_of_sight, Antenna, CoverageEstimator, EstimatorConfig, Regime};
use serde::Serialize;
use std::{fs::File, io::Write, path::Path};
use terrain::{
    FlatTerrain, RemoteConfig, SyntheticTerrain, TerrainProfile, TerrainProvider, TileMode,
    TileSource, TileSourceConfig,
};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli { terrain, cmd } = Cli::parse();

    env_logger::init();

    let provider = terrain_provider(terrain)?;

    match cmd {
        CliCmd::Radius {
            antennas,
            min_signal,
            azimuth_step,
            json,
        } => {
            let estimator = CoverageEstimator::new(EstimatorConfig {
                min_signal_dbm: min_signal,
                azimuth_step_deg: azimuth_step,
                ..EstimatorConfig::default()
            })?;
            radius(&antennas, &estimator, provider.as_deref(), json)
        }
        CliCmd::Los {
            antenna,
            target,
            samples,
        } => {
            let provider = provider
                .ok_or_else(|| anyhow!("line of sight needs a terrain source"))?;
            los(&antenna, target, samples, &*provider)
        }
        CliCmd::Profile {
            start: LatLon(start),
            dest: LatLon(dest),
            samples,
            format,
        } => {
            let provider = provider.ok_or_else(|| anyhow!("profiles need a terrain source"))?;
            let profile = provider.get_elevation_profile(start, dest, samples)?;
            match format {
                ProfileFormat::Csv => print_csv(&profile),
                ProfileFormat::Json => print_json(&profile),
                ProfileFormat::Plot => {
                    plot_ascii(&profile);
                    Ok(())
                }
            }
        }
    }
}

fn terrain_provider(args: TerrainArgs) -> Result<Option<Box<dyn TerrainProvider>>, AnyError> {
    let TerrainArgs {
        tile_dir,
        memmap,
        resident_tiles,
        sentinel,
        remote_url,
        api_key,
        flat,
        synthetic,
    } = args;

    if let Some(elevation) = flat {
        return Ok(Some(Box::new(FlatTerrain::new(elevation))));
    }
    if let Some(LatLon(center)) = synthetic {
        return Ok(Some(Box::new(SyntheticTerrain::new(center))));
    }
    let Some(tile_dir) = tile_dir else {
        return Ok(None);
    };

    let mut config = TileSourceConfig::new(tile_dir);
    config.tile_mode = if memmap {
        TileMode::MemMap
    } else {
        TileMode::InMem
    };
    config.resident_tiles = resident_tiles;
    config.sentinel_m = sentinel;
    config.remote = remote_url.map(|url| RemoteConfig::new(url, api_key.unwrap_or_default()));
    let tiles = TileSource::new(config).context("opening tile source")?;
    Ok(Some(Box::new(tiles)))
}

#[derive(Serialize)]
struct RadiusEntry<'a> {
    name: &'a str,
    radius_km: f64,
    terrain_limited: bool,
    degraded_lookups: usize,
}

fn radius(
    path: &Path,
    estimator: &CoverageEstimator,
    terrain: Option<&dyn TerrainProvider>,
    json: bool,
) -> Result<(), AnyError> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let antennas: Vec<Antenna> =
        serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))?;
    info!("estimating coverage for {} antennas", antennas.len());

    let progress = ProgressBar::new(antennas.len() as u64);
    progress.set_prefix("Estimating coverage");
    progress.set_style(
        ProgressStyle::with_template("{prefix}... {pos}/{len} {msg}\n[{wide_bar:.cyan/blue}]")?
            .progress_chars("#>-"),
    );
    let mut entries = Vec::with_capacity(antennas.len());
    for antenna in &antennas {
        progress.set_message(antenna.name().to_owned());
        let estimate = estimator.estimate(antenna, terrain)?;
        entries.push(RadiusEntry {
            name: antenna.name(),
            radius_km: estimate.radius_km,
            terrain_limited: estimate.regime == Regime::Terrain,
            degraded_lookups: estimate.degraded_lookups,
        });
        progress.inc(1);
    }
    progress.finish_and_clear();

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &entries)?;
        writeln!(stdout)?;
    } else {
        for entry in &entries {
            write!(stdout, "{}: {:.3} km", entry.name, entry.radius_km)?;
            if entry.degraded_lookups > 0 {
                write!(stdout, " ({} degraded lookups)", entry.degraded_lookups)?;
            }
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn los(
    path: &Path,
    LatLonAlt(target, target_height): LatLonAlt,
    samples: usize,
    terrain: &dyn TerrainProvider,
) -> Result<(), AnyError> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let antenna: Antenna =
        serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))?;
    let los = check_line_of_sight(&antenna, target, target_height, terrain, samples)?;
    println!(
        "{}: {} (min clearance ratio {:.3}, diffraction loss {:.1} dB)",
        antenna.name(),
        if los.clear { "clear" } else { "obstructed" },
        los.min_clearance_ratio,
        los.diffraction_loss_db(),
    );
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// wispcov --synthetic=38.4064,-86.1091 profile --start=38.38,-86.11 --dest=38.44,-86.05 | tr ',' ' ' > /tmp/plot && gnuplot -p -e "plot '/tmp/plot' using 1:4 with lines"
/// ```
fn print_csv(profile: &TerrainProfile) -> Result<(), AnyError> {
    let total_km = profile.distance_km();
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Distance,Latitude,Longitude,Elevation")?;
    for (idx, sample) in profile.samples().iter().enumerate() {
        let distance = total_km * profile.fraction(idx);
        writeln!(
            stdout,
            "{distance},{},{},{}",
            sample.lat, sample.lon, sample.elevation
        )?;
    }
    Ok(())
}

fn print_json(profile: &TerrainProfile) -> Result<(), AnyError> {
    let json = serde_json::to_string(profile.samples())?;
    println!("{json}");
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn plot_ascii(profile: &TerrainProfile) {
    let plot_data: Vec<(f32, f32)> = profile
        .elevations()
        .enumerate()
        .map(|(idx, elev)| (idx as f32, elev as f32))
        .collect();
    Chart::new(300, 150, 0.0, plot_data.len() as f32)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}
