//! Map asset loader.
//!
//! Reads the static town map from disk once at startup. The layout under
//! the map directory is:
//!
//! ```text
//! matrix/
//!   maze_meta_info.json                   world name, dimensions
//!   special_blocks/
//!     world_blocks.csv                    id, world                        (optional)
//!     sector_blocks.csv                   id, world, sector
//!     arena_blocks.csv                    id, world, sector, arena
//!     game_object_blocks.csv              id, world, <all>, object
//!     spawning_location_blocks.csv        id, world, sector, arena, name   (optional)
//!   maze/
//!     collision_maze.csv                  width*height block ids
//!     sector_maze.csv
//!     arena_maze.csv
//!     game_object_maze.csv
//!     spawning_location_maze.csv          (optional)
//! ```
//!
//! Block files map a numeric id to a name; the last field of each row is
//! the name at that level. Maze files are comma-separated block ids in
//! row-major order (line breaks are ignored). `0` means "nothing here".
//! Every tile belongs to the world named in the metadata; when
//! `world_blocks.csv` is present it must list that world.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::WorldError;
use crate::grid::{DEFAULT_COLLISION_BLOCK_ID, Grid, TileRecord};

/// Contents of `maze_meta_info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapMeta {
    /// Name of the world.
    pub world_name: String,
    /// Number of columns.
    pub maze_width: u32,
    /// Number of rows.
    pub maze_height: u32,
    /// Pixel size of one tile in the renderer.
    #[serde(default = "default_tile_size")]
    pub sq_tile_size: u32,
    /// Free-text note about the map.
    #[serde(default)]
    pub special_constraint: String,
    /// Block id that marks collision cells.
    #[serde(default = "default_collision_block_id")]
    pub collision_block_id: u32,
}

/// Load the map rooted at `map_dir`.
///
/// `collision_override` replaces the collision id from the metadata when
/// set.
///
/// # Errors
///
/// Returns [`WorldError::AssetIo`] for missing required files,
/// [`WorldError::Metadata`] for bad JSON, [`WorldError::MalformedAsset`]
/// for unparsable rows or unknown block ids, and the validation errors of
/// [`Grid::new`].
pub fn load(map_dir: &Path, collision_override: Option<u32>) -> Result<Grid, WorldError> {
    let matrix = map_dir.join("matrix");
    let meta = read_meta(&matrix.join("maze_meta_info.json"))?;
    let expected = usize::try_from(meta.maze_width)
        .ok()
        .and_then(|w| w.checked_mul(usize::try_from(meta.maze_height).ok()?))
        .ok_or(WorldError::InvalidDimensions {
            width: meta.maze_width,
            height: meta.maze_height,
        })?;

    let blocks = matrix.join("special_blocks");
    let mazes = matrix.join("maze");

    let worlds_path = blocks.join("world_blocks.csv");
    let worlds = read_optional_blocks(&worlds_path)?;
    if !worlds.is_empty() && !worlds.values().any(|w| *w == meta.world_name) {
        return Err(malformed(
            &worlds_path,
            format!("metadata world {:?} is not listed", meta.world_name),
        ));
    }

    let sectors = read_blocks(&blocks.join("sector_blocks.csv"))?;
    let arenas = read_blocks(&blocks.join("arena_blocks.csv"))?;
    let objects = read_blocks(&blocks.join("game_object_blocks.csv"))?;
    let spawns = read_optional_blocks(&blocks.join("spawning_location_blocks.csv"))?;

    let collision = read_layer(&mazes.join("collision_maze.csv"), expected)?;
    let sector_layer = read_layer(&mazes.join("sector_maze.csv"), expected)?;
    let arena_layer = read_layer(&mazes.join("arena_maze.csv"), expected)?;
    let object_layer = read_layer(&mazes.join("game_object_maze.csv"), expected)?;
    let spawn_path = mazes.join("spawning_location_maze.csv");
    let spawn_layer = if spawn_path.exists() {
        read_layer(&spawn_path, expected)?
    } else {
        vec![0; expected]
    };

    let mut records = Vec::with_capacity(expected);
    for i in 0..expected {
        records.push(TileRecord {
            world: Some(meta.world_name.clone()),
            sector: lookup(&sectors, cell(&sector_layer, i), "sector_maze.csv")?,
            arena: lookup(&arenas, cell(&arena_layer, i), "arena_maze.csv")?,
            game_object: lookup(&objects, cell(&object_layer, i), "game_object_maze.csv")?,
            spawning_location: lookup(
                &spawns,
                cell(&spawn_layer, i),
                "spawning_location_maze.csv",
            )?,
            collision: false,
        });
    }

    let collision_block_id = collision_override.unwrap_or(meta.collision_block_id);
    let grid = Grid::new(
        &meta.world_name,
        meta.maze_width,
        meta.maze_height,
        collision_block_id,
        collision,
        records,
    )?;

    tracing::info!(
        map_dir = %map_dir.display(),
        world = grid.world_name(),
        width = grid.width(),
        height = grid.height(),
        passable = grid.passable_count(),
        spawn_tiles = grid.spawn_tiles().len(),
        "map loaded"
    );
    Ok(grid)
}

fn read_meta(path: &Path) -> Result<MapMeta, WorldError> {
    let contents = read(path)?;
    serde_json::from_str(&contents).map_err(|source| WorldError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, WorldError> {
    std::fs::read_to_string(path).map_err(|source| WorldError::AssetIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a block file into `id -> name`.
fn read_blocks(path: &Path) -> Result<BTreeMap<u32, String>, WorldError> {
    let contents = read(path)?;
    let mut blocks = BTreeMap::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(id), Some(name)) = (fields.first(), fields.last()) else {
            continue;
        };
        if fields.len() < 2 || name.is_empty() {
            return Err(malformed(
                path,
                format!("line {}: missing name", line_no.saturating_add(1)),
            ));
        }
        let id: u32 = id.parse().map_err(|e| {
            malformed(
                path,
                format!("line {}: bad block id {id:?}: {e}", line_no.saturating_add(1)),
            )
        })?;
        blocks.insert(id, (*name).to_owned());
    }
    Ok(blocks)
}

fn read_optional_blocks(path: &Path) -> Result<BTreeMap<u32, String>, WorldError> {
    if path.exists() {
        read_blocks(path)
    } else {
        Ok(BTreeMap::new())
    }
}

/// Parse a maze layer; it must hold exactly `expected` cells.
fn read_layer(path: &Path, expected: usize) -> Result<Vec<u32>, WorldError> {
    let contents = read(path)?;
    let mut cells = Vec::with_capacity(expected);
    for raw in contents.split([',', '\n', '\r']) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value: u32 = raw
            .parse()
            .map_err(|e| malformed(path, format!("bad cell {raw:?}: {e}")))?;
        cells.push(value);
    }
    if cells.len() != expected {
        return Err(WorldError::DimensionMismatch {
            layer: path.display().to_string(),
            expected,
            actual: cells.len(),
        });
    }
    Ok(cells)
}

fn cell(layer: &[u32], index: usize) -> u32 {
    layer.get(index).copied().unwrap_or(0)
}

fn lookup(
    blocks: &BTreeMap<u32, String>,
    id: u32,
    layer: &str,
) -> Result<Option<String>, WorldError> {
    if id == 0 {
        return Ok(None);
    }
    blocks
        .get(&id)
        .cloned()
        .map(Some)
        .ok_or_else(|| malformed(Path::new(layer), format!("unknown block id {id}")))
}

fn malformed(path: &Path, reason: String) -> WorldError {
    WorldError::MalformedAsset {
        path: PathBuf::from(path),
        reason,
    }
}

const fn default_tile_size() -> u32 {
    32
}

const fn default_collision_block_id() -> u32 {
    DEFAULT_COLLISION_BLOCK_ID
}
