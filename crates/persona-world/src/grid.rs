//! Tile occupancy grid with per-tile address annotations.
//!
//! The [`Grid`] is the spatial backbone of the movement core. It holds one
//! raw block id per cell (the collision layer) and one [`TileRecord`] per
//! cell describing where the tile sits in the world > sector > arena >
//! object hierarchy. Dimensions are fixed at construction and the grid is
//! never mutated afterwards; callers share it behind an `Arc`.
//!
//! Cells are stored row-major: the cell for `(x, y)` lives at
//! `y * width + x`.

use persona_types::Tile;

use crate::address::{ADDRESS_SEPARATOR, AddressLevel};
use crate::error::WorldError;

/// Collision block id used by the stock town map.
pub const DEFAULT_COLLISION_BLOCK_ID: u32 = 32125;

/// Per-tile metadata.
///
/// The address levels form a strict containment chain: a sector needs a
/// world, an arena needs a sector, a game object needs an arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileRecord {
    /// World name.
    pub world: Option<String>,
    /// Sector name (a building or outdoor area).
    pub sector: Option<String>,
    /// Arena name (a room within a sector).
    pub arena: Option<String>,
    /// Game object name (a bed, a sofa, a counter).
    pub game_object: Option<String>,
    /// Spawning location name, if characters may be placed here.
    pub spawning_location: Option<String>,
    /// Whether the tile is blocked. Derived from the collision layer.
    pub collision: bool,
}

impl TileRecord {
    /// A record that only carries a world name.
    pub fn in_world(world: &str) -> Self {
        Self {
            world: Some(world.to_owned()),
            ..Self::default()
        }
    }

    /// Symbolic address of the tile down to `level`.
    ///
    /// Returns the deepest available prefix when lower levels are missing,
    /// and `None` when the tile has no world.
    pub fn address(&self, level: AddressLevel) -> Option<String> {
        let world = self.world.as_deref()?;
        let mut parts = vec![world];
        let levels = [
            self.sector.as_deref(),
            self.arena.as_deref(),
            match level {
                AddressLevel::Object => self.game_object.as_deref(),
                AddressLevel::Arena => None,
            },
        ];
        for part in levels {
            let Some(part) = part else {
                break;
            };
            parts.push(part);
        }
        Some(parts.join(&ADDRESS_SEPARATOR.to_string()))
    }

    const fn hierarchy_violation(&self) -> Option<&'static str> {
        if self.sector.is_some() && self.world.is_none() {
            return Some("sector without world");
        }
        if self.arena.is_some() && self.sector.is_none() {
            return Some("arena without sector");
        }
        if self.game_object.is_some() && self.arena.is_none() {
            return Some("game object without arena");
        }
        None
    }
}

/// Immutable tile grid: collision layer plus address annotations.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Name of the world this map depicts.
    world_name: String,
    /// Number of columns.
    width: u32,
    /// Number of rows.
    height: u32,
    /// Cell value that marks a blocked tile.
    collision_block_id: u32,
    /// Raw collision layer, row-major.
    cells: Vec<u32>,
    /// Per-tile annotations, row-major.
    records: Vec<TileRecord>,
    /// Tiles carrying a spawning location, in row-major order.
    spawn_tiles: Vec<Tile>,
}

impl Grid {
    /// Build a grid from a collision layer and per-tile annotations.
    ///
    /// `records[i].collision` is overwritten from `cells[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] for an empty or
    /// unindexable grid, [`WorldError::DimensionMismatch`] when a layer has
    /// the wrong cell count, and [`WorldError::Hierarchy`] when a record
    /// breaks the address containment chain.
    pub fn new(
        world_name: &str,
        width: u32,
        height: u32,
        collision_block_id: u32,
        cells: Vec<u32>,
        mut records: Vec<TileRecord>,
    ) -> Result<Self, WorldError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(WorldError::DimensionMismatch {
                layer: String::from("collision"),
                expected,
                actual: cells.len(),
            });
        }
        if records.len() != expected {
            return Err(WorldError::DimensionMismatch {
                layer: String::from("annotations"),
                expected,
                actual: records.len(),
            });
        }

        let mut spawn_tiles = Vec::new();
        for (index, (record, cell)) in records.iter_mut().zip(&cells).enumerate() {
            let tile = tile_for_index(width, index).ok_or(WorldError::InvalidDimensions {
                width,
                height,
            })?;
            if let Some(reason) = record.hierarchy_violation() {
                return Err(WorldError::Hierarchy { tile, reason });
            }
            record.collision = *cell == collision_block_id;
            if record.spawning_location.is_some() {
                spawn_tiles.push(tile);
            }
        }

        Ok(Self {
            world_name: world_name.to_owned(),
            width,
            height,
            collision_block_id,
            cells,
            records,
            spawn_tiles,
        })
    }

    /// Name of the world this map depicts.
    pub fn world_name(&self) -> &str {
        &self.world_name
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cell value that marks a blocked tile.
    pub const fn collision_block_id(&self) -> u32 {
        self.collision_block_id
    }

    /// Total number of cells.
    pub const fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells. Never true for a constructed grid.
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `tile` lies inside the grid.
    pub const fn contains(&self, tile: Tile) -> bool {
        tile.x < self.width && tile.y < self.height
    }

    /// Row-major cell index of `tile`, or `None` when out of bounds.
    pub fn index_of(&self, tile: Tile) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        let x = usize::try_from(tile.x).ok()?;
        let y = usize::try_from(tile.y).ok()?;
        let width = usize::try_from(self.width).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }

    /// Whether `tile` can be entered. Out-of-bounds tiles are blocked.
    pub fn is_passable(&self, tile: Tile) -> bool {
        self.index_of(tile)
            .and_then(|i| self.cells.get(i))
            .is_some_and(|cell| *cell != self.collision_block_id)
    }

    /// Full annotation of `tile`, or `None` when out of bounds.
    pub fn tile_info(&self, tile: Tile) -> Option<&TileRecord> {
        self.index_of(tile).and_then(|i| self.records.get(i))
    }

    /// Passable orthogonal neighbors of `tile` (up, down, left, right).
    pub fn neighbors(&self, tile: Tile) -> impl Iterator<Item = Tile> + '_ {
        let candidates = [
            tile.y.checked_sub(1).map(|y| Tile::new(tile.x, y)),
            tile.y.checked_add(1).map(|y| Tile::new(tile.x, y)),
            tile.x.checked_sub(1).map(|x| Tile::new(x, tile.y)),
            tile.x.checked_add(1).map(|x| Tile::new(x, tile.y)),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(move |t| self.is_passable(*t))
    }

    /// Iterate over every tile with its annotation, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = (Tile, &TileRecord)> {
        let width = self.width;
        self.records
            .iter()
            .enumerate()
            .filter_map(move |(i, record)| tile_for_index(width, i).map(|t| (t, record)))
    }

    /// Tiles that carry a spawning location, row-major.
    pub fn spawn_tiles(&self) -> &[Tile] {
        &self.spawn_tiles
    }

    /// Number of passable tiles.
    pub fn passable_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| **c != self.collision_block_id)
            .count()
    }
}

/// Incremental constructor for in-memory grids.
///
/// Every tile starts passable and inside the builder's world. Used for
/// synthetic maps; the asset loader goes through [`Grid::new`] directly.
#[derive(Debug)]
pub struct GridBuilder {
    world_name: String,
    width: u32,
    height: u32,
    collision_block_id: u32,
    cells: Vec<u32>,
    records: Vec<TileRecord>,
    error: Option<WorldError>,
}

impl GridBuilder {
    /// Start an open `width` x `height` grid in `world_name`.
    pub fn new(world_name: &str, width: u32, height: u32) -> Self {
        let (cells, records, error) = match cell_count(width, height) {
            Ok(n) => (vec![0; n], vec![TileRecord::in_world(world_name); n], None),
            Err(e) => (Vec::new(), Vec::new(), Some(e)),
        };
        Self {
            world_name: world_name.to_owned(),
            width,
            height,
            collision_block_id: DEFAULT_COLLISION_BLOCK_ID,
            cells,
            records,
            error,
        }
    }

    /// Start a grid from ASCII rows: `#` is blocked, anything else open.
    ///
    /// All rows must have the same length.
    pub fn from_ascii(world_name: &str, rows: &[&str]) -> Self {
        let height = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let width = rows
            .first()
            .map_or(0, |r| u32::try_from(r.chars().count()).unwrap_or(u32::MAX));
        let mut builder = Self::new(world_name, width, height);
        for (y, row) in rows.iter().enumerate() {
            if u32::try_from(row.chars().count()).ok() != Some(width) {
                builder.fail(WorldError::MalformedAsset {
                    path: "ascii".into(),
                    reason: format!("row {y} has a different width"),
                });
                break;
            }
            for (x, ch) in row.chars().enumerate() {
                if ch == '#'
                    && let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
                {
                    builder = builder.block(Tile::new(x, y));
                }
            }
        }
        builder
    }

    /// Use a custom collision sentinel.
    #[must_use]
    pub const fn collision_block_id(mut self, id: u32) -> Self {
        self.collision_block_id = id;
        self
    }

    /// Mark `tile` as blocked.
    #[must_use]
    pub fn block(mut self, tile: Tile) -> Self {
        let sentinel = self.collision_block_id;
        if let Some(cell) = self.cell_mut(tile) {
            *cell = sentinel;
        }
        self
    }

    /// Mark every tile of a rectangle (inclusive corners) as blocked.
    #[must_use]
    pub fn block_rect(mut self, from: Tile, to: Tile) -> Self {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for x in from.x.min(to.x)..=from.x.max(to.x) {
                self = self.block(Tile::new(x, y));
            }
        }
        self
    }

    /// Annotate `tile` with sector, arena, and optional object names.
    #[must_use]
    pub fn annotate(mut self, tile: Tile, sector: &str, arena: &str, object: Option<&str>) -> Self {
        if let Some(record) = self.record_mut(tile) {
            record.sector = Some(sector.to_owned());
            record.arena = Some(arena.to_owned());
            record.game_object = object.map(str::to_owned);
        }
        self
    }

    /// Mark `tile` as a spawning location named `name`.
    #[must_use]
    pub fn spawn(mut self, tile: Tile, name: &str) -> Self {
        if let Some(record) = self.record_mut(tile) {
            record.spawning_location = Some(name.to_owned());
        }
        self
    }

    /// Finish the grid.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building (an out-of-bounds
    /// tile, a ragged ASCII row) or any validation error of [`Grid::new`].
    pub fn build(self) -> Result<Grid, WorldError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Grid::new(
            &self.world_name,
            self.width,
            self.height,
            self.collision_block_id,
            self.cells,
            self.records,
        )
    }

    fn fail(&mut self, error: WorldError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn index_of(&mut self, tile: Tile) -> Option<usize> {
        let index = (tile.x < self.width && tile.y < self.height)
            .then(|| {
                let width = usize::try_from(self.width).ok()?;
                usize::try_from(tile.y)
                    .ok()?
                    .checked_mul(width)?
                    .checked_add(usize::try_from(tile.x).ok()?)
            })
            .flatten();
        if index.is_none() {
            self.fail(WorldError::MalformedAsset {
                path: "builder".into(),
                reason: format!("tile {tile} is outside {}x{}", self.width, self.height),
            });
        }
        index
    }

    fn cell_mut(&mut self, tile: Tile) -> Option<&mut u32> {
        let index = self.index_of(tile)?;
        self.cells.get_mut(index)
    }

    fn record_mut(&mut self, tile: Tile) -> Option<&mut TileRecord> {
        let index = self.index_of(tile)?;
        self.records.get_mut(index)
    }
}

/// Number of cells in a `width` x `height` grid.
fn cell_count(width: u32, height: u32) -> Result<usize, WorldError> {
    let count = (width > 0 && height > 0)
        .then(|| usize::try_from(width).ok()?.checked_mul(usize::try_from(height).ok()?))
        .flatten();
    count.ok_or(WorldError::InvalidDimensions { width, height })
}

/// Tile at row-major `index` in a grid `width` columns wide.
fn tile_for_index(width: u32, index: usize) -> Option<Tile> {
    let width = usize::try_from(width).ok()?;
    let x = index.checked_rem(width)?;
    let y = index.checked_div(width)?;
    Some(Tile::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?))
}
