//! Symbolic address resolution.
//!
//! A symbolic address is a colon-delimited path through the world
//! hierarchy: `world:sector`, `world:sector:arena`, or
//! `world:sector:arena:object`. Spawning locations are indexed under
//! `<spawn_loc>name`.
//!
//! The [`AddressResolver`] is the one place that parses and matches these
//! strings. It owns a forward index (address -> tiles), a containment tree
//! (world -> sector -> arena -> objects), and answers the reverse query
//! (tile -> address) through the shared [`Grid`].
//!
//! # Matching
//!
//! [`AddressResolver::tiles_for_address`] tries, in order:
//!
//! 1. exact key match
//! 2. case-insensitive key match
//! 3. case-insensitive substring match, scanning keys in sorted order
//!
//! The first hit wins. An address that matches nothing yields an empty set;
//! callers fall back to a default location rather than failing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use persona_types::Tile;

use crate::error::WorldError;
use crate::grid::Grid;

/// Separator between address levels.
pub const ADDRESS_SEPARATOR: char = ':';

/// Key prefix for spawning-location addresses.
pub const SPAWN_PREFIX: &str = "<spawn_loc>";

/// How deep a reverse lookup should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLevel {
    /// `world:sector:arena`, the level used for display.
    Arena,
    /// `world:sector:arena:object`, the full path.
    Object,
}

/// world -> sector -> arena -> objects.
type AddressTree = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeSet<String>>>>;

/// Bidirectional mapping between symbolic addresses and tiles.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    /// The grid the index was built from.
    grid: Arc<Grid>,
    /// Address key -> tiles carrying it.
    tiles: BTreeMap<String, BTreeSet<Tile>>,
    /// Lower-cased key -> original key, first key in sorted order wins.
    folded: BTreeMap<String, String>,
    /// Containment tree for enumeration queries.
    tree: AddressTree,
}

impl AddressResolver {
    /// Index every annotated tile of `grid`.
    pub fn new(grid: Arc<Grid>) -> Self {
        let mut tiles: BTreeMap<String, BTreeSet<Tile>> = BTreeMap::new();
        let mut tree = AddressTree::new();

        for (tile, record) in grid.tiles() {
            if let Some(spawn) = &record.spawning_location {
                tiles
                    .entry(format!("{SPAWN_PREFIX}{spawn}"))
                    .or_default()
                    .insert(tile);
            }

            let (Some(world), Some(sector)) = (&record.world, &record.sector) else {
                continue;
            };
            let sectors = tree.entry(world.clone()).or_default();
            let arenas = sectors.entry(sector.clone()).or_default();
            let mut key = join(&[world.as_str(), sector.as_str()]);
            tiles.entry(key.clone()).or_default().insert(tile);

            let Some(arena) = &record.arena else {
                continue;
            };
            let objects = arenas.entry(arena.clone()).or_default();
            key.push(ADDRESS_SEPARATOR);
            key.push_str(arena);
            tiles.entry(key.clone()).or_default().insert(tile);

            let Some(object) = &record.game_object else {
                continue;
            };
            objects.insert(object.clone());
            key.push(ADDRESS_SEPARATOR);
            key.push_str(object);
            tiles.entry(key).or_default().insert(tile);
        }

        let mut folded = BTreeMap::new();
        for key in tiles.keys() {
            folded.entry(key.to_lowercase()).or_insert_with(|| key.clone());
        }

        tracing::debug!(
            addresses = tiles.len(),
            worlds = tree.len(),
            "address index built"
        );

        Self {
            grid,
            tiles,
            folded,
            tree,
        }
    }

    /// The grid the index was built from.
    pub const fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// Number of distinct address keys.
    pub fn address_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles whose address matches `address`.
    ///
    /// Exact match, then case-insensitive match, then case-insensitive
    /// substring match (first key in sorted order). Empty when nothing
    /// matches or `address` is blank.
    pub fn tiles_for_address(&self, address: &str) -> BTreeSet<Tile> {
        self.matching_key(address)
            .and_then(|key| self.tiles.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// The index key `address` resolves to, if any.
    pub fn matching_key(&self, address: &str) -> Option<&str> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }
        if let Some((key, _)) = self.tiles.get_key_value(address) {
            return Some(key.as_str());
        }

        let lowered = address.to_lowercase();
        if let Some(key) = self.folded.get(&lowered) {
            return Some(key.as_str());
        }

        self.tiles
            .keys()
            .find(|key| key.to_lowercase().contains(&lowered))
            .map(String::as_str)
    }

    /// Symbolic address of `tile` down to `level`.
    ///
    /// `None` when the tile is out of bounds or has no world.
    pub fn address_for_tile(&self, tile: Tile, level: AddressLevel) -> Option<String> {
        self.grid.tile_info(tile)?.address(level)
    }

    /// Tiles of a spawning location by name.
    pub fn spawn_tiles(&self, name: &str) -> BTreeSet<Tile> {
        self.tiles
            .get(&format!("{SPAWN_PREFIX}{name}"))
            .cloned()
            .unwrap_or_default()
    }

    /// Every full `world:sector:arena:object` address under `world`.
    ///
    /// Walks sector, then arena, then object levels. Empty for an unknown
    /// world or a world without sectors.
    pub fn all_addresses_under(&self, world: &str) -> Vec<String> {
        let Some(sectors) = self.tree.get(world) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (sector, arenas) in sectors {
            for (arena, objects) in arenas {
                for object in objects {
                    out.push(join(&[world, sector.as_str(), arena.as_str(), object.as_str()]));
                }
            }
        }
        out
    }

    /// Sector names under `world`.
    pub fn sectors_in(&self, world: &str) -> Vec<String> {
        self.tree
            .get(world)
            .map(|sectors| sectors.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Arena names under a `world:sector` address.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Format`] unless `world_sector` has exactly two
    /// non-empty levels.
    pub fn arenas_in(&self, world_sector: &str) -> Result<Vec<String>, WorldError> {
        let parts = split(world_sector);
        let [world, sector] = parts.as_slice() else {
            return Err(WorldError::Format {
                address: world_sector.to_owned(),
                expected: "world:sector",
            });
        };
        if world.is_empty() || sector.is_empty() {
            return Err(WorldError::Format {
                address: world_sector.to_owned(),
                expected: "world:sector",
            });
        }
        Ok(self
            .tree
            .get(*world)
            .and_then(|sectors| sectors.get(*sector))
            .map(|arenas| arenas.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Object names under a `world:sector:arena` address.
    ///
    /// Malformed input yields an empty list.
    pub fn objects_in(&self, world_sector_arena: &str) -> Vec<String> {
        let parts = split(world_sector_arena);
        let [world, sector, arena] = parts.as_slice() else {
            return Vec::new();
        };
        self.tree
            .get(*world)
            .and_then(|sectors| sectors.get(*sector))
            .and_then(|arenas| arenas.get(*arena))
            .map(|objects| objects.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn join(parts: &[&str]) -> String {
    parts.join(&ADDRESS_SEPARATOR.to_string())
}

fn split(address: &str) -> Vec<&str> {
    address.trim().split(ADDRESS_SEPARATOR).map(str::trim).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::GridBuilder;

    fn resolver() -> AddressResolver {
        let grid = GridBuilder::new("the Ville", 6, 4)
            .annotate(Tile::new(0, 0), "Hobbs Cafe", "cafe", Some("cafe customer seating"))
            .annotate(Tile::new(1, 0), "Hobbs Cafe", "cafe", Some("cafe customer seating"))
            .annotate(Tile::new(2, 0), "Hobbs Cafe", "cafe", Some("behind the cafe counter"))
            .annotate(Tile::new(3, 0), "Hobbs Cafe", "cafe", None)
            .annotate(Tile::new(0, 2), "Lin family's house", "bedroom", Some("bed"))
            .annotate(Tile::new(1, 2), "Lin family's house", "kitchen", Some("refrigerator"))
            .annotate(Tile::new(2, 2), "Lin family's house", "kitchen", Some("Bed"))
            .spawn(Tile::new(5, 3), "lin-home")
            .build()
            .unwrap();
        AddressResolver::new(Arc::new(grid))
    }

    #[test]
    fn exact_match() {
        let r = resolver();
        let tiles = r.tiles_for_address("the Ville:Hobbs Cafe:cafe:cafe customer seating");
        assert_eq!(tiles, BTreeSet::from([Tile::new(0, 0), Tile::new(1, 0)]));
    }

    #[test]
    fn arena_key_covers_all_arena_tiles() {
        let r = resolver();
        let tiles = r.tiles_for_address("the Ville:Hobbs Cafe:cafe");
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn case_insensitive_match() {
        let r = resolver();
        let tiles = r.tiles_for_address("THE VILLE:hobbs cafe:CAFE:behind the cafe counter");
        assert_eq!(tiles, BTreeSet::from([Tile::new(2, 0)]));
    }

    #[test]
    fn substring_match_falls_back() {
        let r = resolver();
        let tiles = r.tiles_for_address("refrigerator");
        assert_eq!(tiles, BTreeSet::from([Tile::new(1, 2)]));
    }

    #[test]
    fn substring_match_is_deterministic() {
        let r = resolver();
        let first = r.matching_key("bed").map(str::to_owned);
        let second = r.matching_key("bed").map(str::to_owned);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn miss_yields_empty() {
        let r = resolver();
        assert!(r.tiles_for_address("the Moon:crater").is_empty());
        assert!(r.tiles_for_address("").is_empty());
        assert!(r.tiles_for_address("   ").is_empty());
    }

    #[test]
    fn reverse_lookup_levels() {
        let r = resolver();
        assert_eq!(
            r.address_for_tile(Tile::new(2, 0), AddressLevel::Arena).as_deref(),
            Some("the Ville:Hobbs Cafe:cafe")
        );
        assert_eq!(
            r.address_for_tile(Tile::new(2, 0), AddressLevel::Object).as_deref(),
            Some("the Ville:Hobbs Cafe:cafe:behind the cafe counter")
        );
        assert!(r.address_for_tile(Tile::new(9, 9), AddressLevel::Arena).is_none());
    }

    #[test]
    fn round_trip_for_every_full_address() {
        let r = resolver();
        let grid = Arc::clone(r.grid());
        let mut checked = 0;
        for (tile, record) in grid.tiles() {
            if record.game_object.is_none() {
                continue;
            }
            let address = r.address_for_tile(tile, AddressLevel::Object).unwrap();
            assert!(
                r.tiles_for_address(&address).contains(&tile),
                "{address} does not resolve back to {tile}"
            );
            checked += 1;
        }
        assert_eq!(checked, 6);
    }

    #[test]
    fn all_addresses_walk_the_tree() {
        let r = resolver();
        let all = r.all_addresses_under("the Ville");
        assert_eq!(
            all,
            vec![
                "the Ville:Hobbs Cafe:cafe:behind the cafe counter",
                "the Ville:Hobbs Cafe:cafe:cafe customer seating",
                "the Ville:Lin family's house:bedroom:bed",
                "the Ville:Lin family's house:kitchen:Bed",
                "the Ville:Lin family's house:kitchen:refrigerator",
            ]
        );
    }

    #[test]
    fn world_without_sectors_is_empty() {
        let grid = GridBuilder::new("Nowhere", 3, 3).build().unwrap();
        let r = AddressResolver::new(Arc::new(grid));
        assert!(r.all_addresses_under("Nowhere").is_empty());
        assert!(r.all_addresses_under("the Ville").is_empty());
        assert!(r.sectors_in("Nowhere").is_empty());
    }

    #[test]
    fn arenas_require_world_sector_shape() {
        let r = resolver();
        assert_eq!(
            r.arenas_in("the Ville:Lin family's house").unwrap(),
            vec!["bedroom", "kitchen"]
        );
        assert!(matches!(
            r.arenas_in("the Ville"),
            Err(WorldError::Format { .. })
        ));
        assert!(matches!(
            r.arenas_in("the Ville:Hobbs Cafe:cafe"),
            Err(WorldError::Format { .. })
        ));
        assert!(matches!(r.arenas_in("the Ville:"), Err(WorldError::Format { .. })));
    }

    #[test]
    fn objects_degrade_on_malformed_input() {
        let r = resolver();
        assert_eq!(
            r.objects_in("the Ville:Lin family's house:kitchen"),
            vec!["Bed", "refrigerator"]
        );
        assert!(r.objects_in("the Ville:Lin family's house").is_empty());
        assert!(r.objects_in("garbage").is_empty());
    }

    #[test]
    fn spawn_locations_indexed() {
        let r = resolver();
        assert_eq!(r.spawn_tiles("lin-home"), BTreeSet::from([Tile::new(5, 3)]));
        assert_eq!(
            r.tiles_for_address("<spawn_loc>lin-home"),
            BTreeSet::from([Tile::new(5, 3)])
        );
        assert!(r.spawn_tiles("nobody").is_empty());
    }
}
