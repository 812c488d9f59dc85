//! NASADEM/SRTM elevation (`.hgt`) tiles.
//!
//! A tile covers one integer-degree cell and is named after its
//! southwest corner, e.g. `N38W087.hgt`. Samples are big-endian `i16`
//! meters, stored row-major from the north edge down.
//!
//! # References
//!
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;

pub use crate::error::NasademError;
use byteorder::{BigEndian as BE, ByteOrder, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Base floating point type used for all coordinates.
pub type C = f64;

/// Sample value marking a hole in the source data.
pub const VOID: i16 = i16::MIN;

const ARCSEC_PER_DEG: C = 3600.0;

pub struct Tile {
    /// Integer southwest corner of the tile.
    sw_corner: Coord<i16>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of (columns, rows) in this tile.
    dimensions: (usize, usize),

    /// Elevation samples.
    samples: SampleStore,
}

enum SampleStore {
    /// Stand-in for a tile which could not be loaded.
    Tombstone,
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> i16 {
        match self {
            Self::Tombstone => VOID,
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                BE::read_i16(&raw[start..start + size_of::<i16>()])
            }
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let sw_corner = parse_sw_corner(&path)?;
        let len = path.as_ref().metadata()?.len();
        let (resolution, dimensions @ (cols, rows)) =
            resolution_for_len(len).ok_or_else(|| NasademError::HgtLen(len, path.as_ref().into()))?;

        let mut file = BufReader::new(File::open(&path)?);
        let mut samples = Vec::with_capacity(cols * rows);
        for _ in 0..(cols * rows) {
            samples.push(file.read_i16::<BE>()?);
        }

        Ok(Self {
            sw_corner,
            resolution,
            dimensions,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let sw_corner = parse_sw_corner(&path)?;
        let len = path.as_ref().metadata()?.len();
        let (resolution, dimensions) =
            resolution_for_len(len).ok_or_else(|| NasademError::HgtLen(len, path.as_ref().into()))?;

        let file = File::open(&path)?;
        // The file is opened read-only and never resized by us.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self {
            sw_corner,
            resolution,
            dimensions,
            samples: SampleStore::MemMap(mmap),
        })
    }

    /// Returns a Tile parsed from raw HGT bytes.
    ///
    /// `name` is only used for error reporting.
    pub fn from_bytes(sw_corner: Coord<i16>, bytes: &[u8], name: &str) -> Result<Self, NasademError> {
        let len = bytes.len() as u64;
        let (resolution, dimensions) =
            resolution_for_len(len).ok_or_else(|| NasademError::HgtLen(len, name.into()))?;
        let mut samples = vec![0_i16; dimensions.0 * dimensions.1];
        BE::read_i16_into(bytes, &mut samples);
        Ok(Self {
            sw_corner,
            resolution,
            dimensions,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a data-less tile covering `sw_corner`.
    ///
    /// Every lookup inside a tombstone yields [`VOID`].
    pub fn tombstone(sw_corner: Coord<i16>) -> Self {
        Self {
            sw_corner,
            resolution: 3,
            dimensions: (1201, 1201),
            samples: SampleStore::Tombstone,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self.samples, SampleStore::Tombstone)
    }

    /// Integer southwest corner of this tile.
    pub fn sw_corner(&self) -> Coord<i16> {
        self.sw_corner
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (x, y) = self.dimensions;
        x * y
    }

    /// Returns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns true if `coord` falls inside this tile's cell.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        let x0 = C::from(self.sw_corner.x);
        let y0 = C::from(self.sw_corner.y);
        x0 <= coord.x && coord.x < x0 + 1.0 && y0 <= coord.y && coord.y < y0 + 1.0
    }

    /// Returns the sample nearest to `coord`, or `None` when `coord`
    /// is outside this tile.
    ///
    /// The returned sample may be [`VOID`].
    pub fn get(&self, coord: Coord<C>) -> Option<i16> {
        let (idx_x, idx_y) = self.coord_to_xy(coord);
        #[allow(clippy::cast_possible_wrap)]
        if 0 <= idx_x
            && idx_x < self.dimensions.0 as isize
            && 0 <= idx_y
            && idx_y < self.dimensions.1 as isize
        {
            #[allow(clippy::cast_sign_loss)]
            let idx_1d = self.xy_to_linear_index((idx_x as usize, idx_y as usize));
            Some(self.samples.get_unchecked(idx_1d))
        } else {
            None
        }
    }
}

/// Private API
impl Tile {
    fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        let c = ARCSEC_PER_DEG / C::from(self.resolution);
        // Round to the nearest sample center.
        let half = 0.5;
        #[allow(clippy::cast_possible_truncation)]
        let x = ((coord.x - C::from(self.sw_corner.x)) * c + half).floor() as isize;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((coord.y - C::from(self.sw_corner.y)) * c + half).floor() as isize;
        (x, y)
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimensions.0 * (self.dimensions.1 - y - 1) + x
    }
}

fn resolution_for_len(len: u64) -> Option<(u8, (usize, usize))> {
    const RES_1_ARCSECOND_LEN: u64 = 3601 * 3601 * size_of::<i16>() as u64;
    const RES_3_ARCSECOND_LEN: u64 = 1201 * 1201 * size_of::<i16>() as u64;
    match len {
        RES_1_ARCSECOND_LEN => Some((1, (3601, 3601))),
        RES_3_ARCSECOND_LEN => Some((3, (1201, 1201))),
        _ => None,
    }
}

/// Parses the southwest corner out of a name like `N38W087.hgt`.
pub fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, NasademError> {
    let mk_err = || NasademError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}

#[cfg(test)]
mod tests {
    use super::{parse_sw_corner, Coord, Tile, BE, VOID};
    use byteorder::WriteBytesExt;
    use std::path::{Path, PathBuf};

    /// Writes a 3-arcsecond tile whose samples are `f(col, row)`,
    /// row 0 being the southernmost row.
    fn write_tile(dir: &Path, name: &str, f: impl Fn(usize, usize) -> i16) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let mut buf = Vec::with_capacity(1201 * 1201 * 2);
        for row in (0..1201).rev() {
            for col in 0..1201 {
                buf.write_i16::<BE>(f(col, row)).unwrap();
            }
        }
        std::fs::write(&path, buf).unwrap();
        path
    }

    fn scratch_dir(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nasadem-{}-{test}", std::process::id()))
    }

    #[test]
    fn test_parse_hgt_name() {
        assert_eq!(
            parse_sw_corner("N38W087.hgt").unwrap(),
            Coord { x: -87, y: 38 }
        );
        assert_eq!(
            parse_sw_corner("s01e000.hgt").unwrap(),
            Coord { x: 0, y: -1 }
        );
        assert!(parse_sw_corner("X38W087.hgt").is_err());
        assert!(parse_sw_corner("N38W87.hgt").is_err());
    }

    #[test]
    fn test_load_and_memmap_agree() {
        let dir = scratch_dir("agree");
        let path = write_tile(&dir, "N38W087.hgt", |col, row| (col + row) as i16);
        let in_mem = Tile::load(&path).unwrap();
        let mapped = Tile::memmap(&path).unwrap();
        assert_eq!(in_mem.resolution(), 3);
        assert_eq!(in_mem.len(), 1201 * 1201);
        for coord in [
            Coord { x: -87.0, y: 38.0 },
            Coord { x: -86.5, y: 38.25 },
            Coord { x: -86.001, y: 38.999 },
        ] {
            assert_eq!(in_mem.get(coord), mapped.get(coord));
        }
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_sample_indexing() {
        let dir = scratch_dir("index");
        let path = write_tile(&dir, "N38W087.hgt", |col, row| (col * 2 + row) as i16);
        let tile = Tile::load(path).unwrap();
        // SW corner sample.
        assert_eq!(tile.get(Coord { x: -87.0, y: 38.0 }), Some(0));
        // One sample east, one north (3 arcseconds each).
        let step = 3.0 / 3600.0;
        assert_eq!(tile.get(Coord { x: -87.0 + step, y: 38.0 }), Some(2));
        assert_eq!(tile.get(Coord { x: -87.0, y: 38.0 + step }), Some(1));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_out_of_bounds_get_returns_none() {
        let tile = Tile::tombstone(Coord { x: -87, y: 38 });
        assert_eq!(tile.get(Coord { x: -86.5, y: 39.1 }), None);
        assert_eq!(tile.get(Coord { x: -85.9, y: 38.5 }), None);
        assert_eq!(tile.get(Coord { x: -86.5, y: 37.9 }), None);
        assert_eq!(tile.get(Coord { x: -87.1, y: 38.5 }), None);
    }

    #[test]
    fn test_tombstone_is_void() {
        let tile = Tile::tombstone(Coord { x: 0, y: 0 });
        assert!(tile.is_tombstone());
        assert_eq!(tile.get(Coord { x: 0.5, y: 0.5 }), Some(VOID));
    }

    #[test]
    fn test_from_bytes_rejects_bad_len() {
        assert!(Tile::from_bytes(Coord { x: 0, y: 0 }, &[0, 1, 2], "N00E000.hgt").is_err());
        let bytes = vec![0_u8; 1201 * 1201 * 2];
        let tile = Tile::from_bytes(Coord { x: 0, y: 0 }, &bytes, "N00E000.hgt").unwrap();
        assert!(tile.contains(Coord { x: 0.5, y: 0.5 }));
        assert!(!tile.contains(Coord { x: 1.5, y: 0.5 }));
    }
}
