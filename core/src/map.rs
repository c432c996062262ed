//! Query interface of the terrain store shared by every civilization.
//!
//! The map is an external collaborator: the core consumes it, adapters
//! implement it. It only ever stores non-owning back-references
//! ([`UnitRef`], [`CityRef`]); the owning civilization keeps the values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AdvanceId, CityId, CivId, ResourceId, TerrainId, Tile, UnitConfig, UnitId, Yield};

/// Back-reference to a unit stored by the map for occupancy queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitRef {
    /// Civilization owning the unit.
    pub civ: CivId,
    /// Identifier of the unit within its civilization.
    pub unit: UnitId,
}

/// Back-reference to a city stored by the map for occupancy queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CityRef {
    /// Civilization owning the city.
    pub civ: CivId,
    /// Identifier of the city within its civilization.
    pub city: CityId,
}

/// Terrain improvements workers can build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainImprovement {
    /// Adds food to the tile.
    Irrigation,
    /// Adds production to the tile.
    Mine,
    /// Adds commerce and cheap movement.
    Road,
}

/// Read/write contract of the terrain store.
///
/// Coordinates handed to the map may lie outside the grid; implementations
/// normalise them with [`GameMap::wrap_x`] and [`GameMap::wrap_y`] and answer
/// "nothing here" for tiles that remain out of range on bounded axes.
pub trait GameMap {
    /// Number of columns.
    fn size_x(&self) -> i32;

    /// Number of rows.
    fn size_y(&self) -> i32;

    /// Normalises a column; wrapping axes map into `0..size_x`, bounded axes return the input.
    fn wrap_x(&self, x: i32) -> i32;

    /// Normalises a row; wrapping axes map into `0..size_y`, bounded axes return the input.
    fn wrap_y(&self, y: i32) -> i32;

    /// Normalises both coordinates of a tile.
    fn wrap(&self, tile: Tile) -> Tile {
        Tile::new(self.wrap_x(tile.x()), self.wrap_y(tile.y()))
    }

    /// Reports whether the tile lies inside the grid once wrapped.
    fn contains(&self, tile: Tile) -> bool {
        let wrapped = self.wrap(tile);
        wrapped.x() >= 0
            && wrapped.y() >= 0
            && wrapped.x() < self.size_x()
            && wrapped.y() < self.size_y()
    }

    /// Terrain type of the tile, or `None` when no terrain data exists.
    fn terrain_at(&self, tile: Tile) -> Option<TerrainId>;

    /// Civilization claiming the land under the tile.
    fn land_owner(&self, tile: Tile) -> Option<CivId>;

    /// Civilization with a unit or city standing on the tile.
    fn spot_owner(&self, tile: Tile) -> Option<CivId>;

    /// Movement cost for the unit type entering the tile; `None` when impassable.
    fn move_cost(&self, unit: &UnitConfig, tile: Tile) -> Option<u32>;

    /// Yield of the tile given the researched advances and the government production cap.
    fn resources_on_spot(
        &self,
        tile: Tile,
        researched: &BTreeSet<AdvanceId>,
        production_cap: u32,
    ) -> Yield;

    /// Special resource present on the tile.
    fn resource_at(&self, tile: Tile) -> Option<ResourceId>;

    /// Reports whether the tile touches navigable water.
    fn connected_to_sea(&self, tile: Tile) -> bool;

    /// Reports whether a road connects two adjacent tiles.
    fn road_between(&self, from: Tile, to: Tile) -> bool;

    /// Units standing on the tile, in arrival order.
    fn units_on_spot(&self, tile: Tile) -> &[UnitRef];

    /// Records a unit standing on the tile.
    fn add_unit(&mut self, unit: UnitRef, tile: Tile);

    /// Removes a unit record from the tile.
    fn remove_unit(&mut self, unit: UnitRef, tile: Tile);

    /// Records a city on the tile and lets it claim surrounding land.
    fn add_city(&mut self, city: CityRef, tile: Tile);

    /// Removes a city record from the tile.
    fn remove_city(&mut self, city: CityRef, tile: Tile);

    /// Releases every land claim of the civilization.
    fn remove_civ_land(&mut self, civ: CivId);

    /// Applies a terrain improvement built by the civilization; returns whether it took effect.
    fn try_improve_terrain(&mut self, tile: Tile, civ: CivId, kind: TerrainImprovement) -> bool;
}
