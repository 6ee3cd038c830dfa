use bevy::prelude::*;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Tile value that blocks movement
pub const SOLID_TILE: u8 = 1;

/// Fixed-size grid of tile bytes, row-major.
///
/// The on-disk format is little-endian: `tile_res: u32`, `height: u32`,
/// `width: u32`, the NUL-terminated tileset bitmap name, then
/// `height * width` tile bytes.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct Tilemap {
    tile_res: u32,
    width: u32,
    height: u32,
    bitmap_name: String,
    tiles: Vec<u8>,
}

impl Tilemap {
    /// Empty map (all tiles 0) of `height` rows by `width` columns.
    /// Loaded maps are checked with `validate_dimensions`; callers creating
    /// maps directly are expected to stay inside the same limits.
    pub fn create(tile_res: u32, height: u32, width: u32, bitmap_name: &str) -> Self {
        Self {
            tile_res,
            width,
            height,
            bitmap_name: bitmap_name.to_string(),
            tiles: vec![0; (width as usize) * (height as usize)],
        }
    }

    pub fn tile_res(&self) -> u32 {
        self.tile_res
    }

    /// Number of columns
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bitmap_name(&self) -> &str {
        &self.bitmap_name
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_res as f32
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_res as f32
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    /// Solid test for a cell inside the grid. Cells outside are not solid;
    /// the scans treat the grid border as a wall on their own.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.get_tile(x, y) == Some(SOLID_TILE)
    }

    /// Overwrite one cell. Returns the previous value.
    pub fn set_tile(&mut self, x: i32, y: i32, value: u8) -> Result<u8, MapError> {
        let index = self.index(x, y).ok_or(MapError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        Ok(std::mem::replace(&mut self.tiles[index], value))
    }

    /// Iterate `(x, y, value)` over every cell
    pub fn iter_tiles(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        let width = self.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, &tile)| ((i % width) as i32, (i / width) as i32, tile))
    }

    /// Tile coordinates containing a map-pixel point
    pub fn tile_at_pixel(&self, x: f32, y: f32) -> (i32, i32) {
        let res = self.tile_res.max(1) as f32;
        ((x / res).floor() as i32, (y / res).floor() as i32)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MapError> {
        let tile_res = read_u32(reader, "tile resolution")?;
        let height = read_u32(reader, "height")?;
        let width = read_u32(reader, "width")?;

        let mut name_bytes = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            reader
                .read_exact(&mut byte)
                .map_err(|e| truncated_or_io(e, "bitmap name"))?;
            if byte[0] == 0 {
                break;
            }
            name_bytes.push(byte[0]);
        }
        let bitmap_name = String::from_utf8(name_bytes)
            .map_err(|e| MapError::ParseError(format!("Bitmap name is not UTF-8: {}", e)))?;

        validate_dimensions(tile_res, height, width)?;

        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| {
                MapError::ValidationError(format!("Map size {}x{} overflows", width, height))
            })?;
        let mut tiles = Vec::new();
        reader
            .take(count as u64)
            .read_to_end(&mut tiles)
            .map_err(|e| MapError::IoError(e.to_string()))?;
        if tiles.len() != count {
            return Err(MapError::Truncated(format!(
                "expected {} tiles, found {}",
                count,
                tiles.len()
            )));
        }

        Ok(Self {
            tile_res,
            width,
            height,
            bitmap_name,
            tiles,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.tile_res.to_le_bytes())?;
        writer.write_all(&self.height.to_le_bytes())?;
        writer.write_all(&self.width.to_le_bytes())?;
        writer.write_all(self.bitmap_name.as_bytes())?;
        writer.write_all(&[0])?;
        writer.write_all(&self.tiles)?;
        Ok(())
    }

    /// Load a map from a binary `.map` file
    pub fn load_file(path: &str) -> Result<Self, MapError> {
        if !Path::new(path).exists() {
            return Err(MapError::FileNotFound(path.to_string()));
        }
        let file = File::open(path).map_err(|e| MapError::IoError(e.to_string()))?;
        Self::read_from(&mut BufReader::new(file))
    }

    pub fn save_file(&self, path: &str) -> Result<(), MapError> {
        let file = File::create(path).map_err(|e| MapError::IoError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| MapError::IoError(e.to_string()))
    }
}

/// Reject grids whose pixel extent does not fit pixel coordinates (`i32`)
pub fn validate_dimensions(tile_res: u32, height: u32, width: u32) -> Result<(), MapError> {
    if tile_res == 0 {
        return Err(MapError::ValidationError(
            "Tile resolution must be positive".to_string(),
        ));
    }
    let limit = i32::MAX as u64;
    let res = tile_res as u64;
    if width as u64 * res > limit || height as u64 * res > limit {
        return Err(MapError::ValidationError(format!(
            "Map of {}x{} tiles at {} px exceeds the pixel range",
            width, height, tile_res
        )));
    }
    Ok(())
}

fn read_u32<R: Read>(reader: &mut R, field: &str) -> Result<u32, MapError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| truncated_or_io(e, field))?;
    Ok(u32::from_le_bytes(buf))
}

fn truncated_or_io(err: io::Error, field: &str) -> MapError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        MapError::Truncated(format!("missing {}", field))
    } else {
        MapError::IoError(err.to_string())
    }
}

/// Map file and map editing errors
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    FileNotFound(String),
    IoError(String),
    Truncated(String),
    ParseError(String),
    ValidationError(String),
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::FileNotFound(path) => write!(f, "Map file not found: {}", path),
            MapError::IoError(err) => write!(f, "IO error on map file: {}", err),
            MapError::Truncated(msg) => write!(f, "Map file truncated: {}", msg),
            MapError::ParseError(msg) => write!(f, "Failed to parse map file: {}", msg),
            MapError::ValidationError(msg) => write!(f, "Map validation error: {}", msg),
            MapError::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "Tile ({}, {}) outside {}x{} map", x, y, width, height),
        }
    }
}

impl std::error::Error for MapError {}
