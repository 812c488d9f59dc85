use criterion::{criterion_group, criterion_main, Criterion};
use geo::geometry::Coord;
use std::path::PathBuf;
use terrain::{SyntheticTerrain, TerrainProvider, TileMode, TileSource, TileSourceConfig};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn three_arcsecond_dir() -> PathBuf {
    [
        env!("CARGO_MANIFEST_DIR"),
        "..",
        "data",
        "nasadem",
        "3arcsecond",
    ]
    .iter()
    .collect()
}

fn terrain_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("Terrain Profile");

    let start = Coord {
        x: -86.1091,
        y: 38.3864,
    };

    let end = Coord {
        x: -86.0500,
        y: 38.4400,
    };

    let synthetic = SyntheticTerrain::default();
    group.bench_with_input(
        "synthetic",
        &(start, end),
        |b, (s, e)| b.iter(|| synthetic.get_elevation_profile(*s, *e, 256).unwrap()),
    );

    // Tile data is optional; skip when the directory holds no tiles.
    let mut config = TileSourceConfig::new(three_arcsecond_dir());
    config.tile_mode = TileMode::MemMap;
    if let Ok(tiles) = TileSource::new(config) {
        group.bench_with_input("nasadem", &(start, end), |b, (s, e)| {
            b.iter(|| tiles.get_elevation_profile(*s, *e, 256).unwrap())
        });
    }
}

criterion_group!(benches, terrain_profile);
criterion_main!(benches);
