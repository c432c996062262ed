//! Terrain table used by the in-memory grid map.

use civsim_core::{TerrainId, Yield};

/// Whether a terrain is walked on or sailed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Land units may enter the tile.
    Land,
    /// Sea units may enter the tile.
    Water,
}

/// Static description of a terrain type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainSpec {
    /// Identifier reported by [`civsim_core::GameMap::terrain_at`].
    pub id: TerrainId,
    /// Display name.
    pub name: &'static str,
    /// Base yield before improvements.
    pub base: Yield,
    /// Surface type.
    pub surface: Surface,
    /// Movement cost for units allowed on the surface.
    pub move_cost: u32,
}

/// Ocean terrain.
pub const OCEAN: TerrainId = TerrainId::new(0);
/// Grassland terrain.
pub const GRASSLAND: TerrainId = TerrainId::new(1);
/// Plains terrain.
pub const PLAINS: TerrainId = TerrainId::new(2);
/// Hills terrain.
pub const HILLS: TerrainId = TerrainId::new(3);
/// Forest terrain.
pub const FOREST: TerrainId = TerrainId::new(4);
/// Mountains terrain.
pub const MOUNTAINS: TerrainId = TerrainId::new(5);

/// Terrain table shipped with the grid map, indexed by terrain id.
#[must_use]
pub fn default_terrains() -> Vec<TerrainSpec> {
    vec![
        TerrainSpec {
            id: OCEAN,
            name: "Ocean",
            base: Yield::new(1, 0, 2),
            surface: Surface::Water,
            move_cost: 1,
        },
        TerrainSpec {
            id: GRASSLAND,
            name: "Grassland",
            base: Yield::new(2, 0, 0),
            surface: Surface::Land,
            move_cost: 1,
        },
        TerrainSpec {
            id: PLAINS,
            name: "Plains",
            base: Yield::new(1, 1, 0),
            surface: Surface::Land,
            move_cost: 1,
        },
        TerrainSpec {
            id: HILLS,
            name: "Hills",
            base: Yield::new(1, 0, 0),
            surface: Surface::Land,
            move_cost: 2,
        },
        TerrainSpec {
            id: FOREST,
            name: "Forest",
            base: Yield::new(1, 2, 0),
            surface: Surface::Land,
            move_cost: 2,
        },
        TerrainSpec {
            id: MOUNTAINS,
            name: "Mountains",
            base: Yield::new(0, 1, 0),
            surface: Surface::Land,
            move_cost: 3,
        },
    ]
}
