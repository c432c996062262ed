#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory terrain store implementing [`GameMap`].
//!
//! The simulation core only consumes the map interface. This adapter backs it
//! with a dense row-major grid that wraps horizontally when requested, so the
//! headless driver and the test suites have a concrete world to play on.

use std::collections::{BTreeMap, BTreeSet};

use civsim_core::{
    AdvanceId, CityRef, CivId, GameMap, ResourceId, TerrainId, TerrainImprovement, Tile, UnitConfig,
    UnitRef, Yield,
};

pub mod generate;
pub mod terrain;

use terrain::{default_terrains, Surface, TerrainSpec};

/// Land claimed around a freshly founded city, measured in tiles.
const CITY_CLAIM_RADIUS: i32 = 2;

/// Yield bonus granted by a special resource once its advance is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Advance needed before the bonus applies.
    pub needed_advance: AdvanceId,
    /// Bonus added to the tile yield.
    pub bonus: Yield,
}

#[derive(Clone, Debug, Default)]
struct TileState {
    terrain: Option<TerrainId>,
    land_owner: Option<CivId>,
    units: Vec<UnitRef>,
    city: Option<CityRef>,
    road: bool,
    irrigation: bool,
    mine: bool,
    resource: Option<ResourceId>,
}

/// Dense grid map that wraps around the horizontal axis when configured to.
#[derive(Clone, Debug)]
pub struct GridMap {
    width: i32,
    height: i32,
    wrap_horizontal: bool,
    terrains: Vec<TerrainSpec>,
    resources: BTreeMap<ResourceId, ResourceSpec>,
    tiles: Vec<TileState>,
}

impl GridMap {
    /// Creates a map where every tile has the provided terrain.
    #[must_use]
    pub fn filled(width: i32, height: i32, wrap_horizontal: bool, terrain: TerrainId) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let count = usize::try_from(width).unwrap_or(0) * usize::try_from(height).unwrap_or(0);
        let tiles = vec![
            TileState {
                terrain: Some(terrain),
                ..TileState::default()
            };
            count
        ];
        Self {
            width,
            height,
            wrap_horizontal,
            terrains: default_terrains(),
            resources: BTreeMap::new(),
            tiles,
        }
    }

    /// Replaces the terrain of a tile.
    pub fn set_terrain(&mut self, tile: Tile, terrain: TerrainId) {
        if let Some(state) = self.state_mut(tile) {
            state.terrain = Some(terrain);
        }
    }

    /// Removes every terrain record from a tile, making it unusable.
    pub fn clear_terrain(&mut self, tile: Tile) {
        if let Some(state) = self.state_mut(tile) {
            state.terrain = None;
        }
    }

    /// Overrides the civilization claiming a tile.
    pub fn set_land_owner(&mut self, tile: Tile, owner: Option<CivId>) {
        if let Some(state) = self.state_mut(tile) {
            state.land_owner = owner;
        }
    }

    /// Claims every tile in the square of the provided radius for the civilization.
    pub fn claim_land(&mut self, center: Tile, radius: i32, owner: CivId) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                self.set_land_owner(Tile::new(center.x() + dx, center.y() + dy), Some(owner));
            }
        }
    }

    /// Builds a road on a tile regardless of ownership.
    pub fn set_road(&mut self, tile: Tile) {
        if let Some(state) = self.state_mut(tile) {
            state.road = true;
        }
    }

    /// Registers the yield bonus of a special resource.
    pub fn define_resource(&mut self, resource: ResourceId, spec: ResourceSpec) {
        let _ = self.resources.insert(resource, spec);
    }

    /// Places a special resource on a tile.
    pub fn place_resource(&mut self, tile: Tile, resource: ResourceId) {
        if let Some(state) = self.state_mut(tile) {
            state.resource = Some(resource);
        }
    }

    /// Reports whether a tile carries a terrain improvement.
    #[must_use]
    pub fn has_improvement(&self, tile: Tile, improvement: TerrainImprovement) -> bool {
        self.state(tile).is_some_and(|state| match improvement {
            TerrainImprovement::Irrigation => state.irrigation,
            TerrainImprovement::Mine => state.mine,
            TerrainImprovement::Road => state.road,
        })
    }

    /// City standing on a tile.
    #[must_use]
    pub fn city_at(&self, tile: Tile) -> Option<CityRef> {
        self.state(tile).and_then(|state| state.city)
    }

    /// Surface of the tile's terrain, if any.
    #[must_use]
    pub fn surface(&self, tile: Tile) -> Option<Surface> {
        self.spec(tile).map(|spec| spec.surface)
    }

    fn spec(&self, tile: Tile) -> Option<&TerrainSpec> {
        let terrain = self.state(tile)?.terrain?;
        self.terrains
            .get(usize::try_from(terrain.get()).ok()?)
            .filter(|spec| spec.id == terrain)
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        let wrapped = self.wrap(tile);
        if !(0..self.width).contains(&wrapped.x()) || !(0..self.height).contains(&wrapped.y()) {
            return None;
        }
        let row = usize::try_from(wrapped.y()).ok()?;
        let column = usize::try_from(wrapped.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    fn state(&self, tile: Tile) -> Option<&TileState> {
        self.index(tile).and_then(|index| self.tiles.get(index))
    }

    fn state_mut(&mut self, tile: Tile) -> Option<&mut TileState> {
        self.index(tile).and_then(|index| self.tiles.get_mut(index))
    }

    fn is_water(&self, tile: Tile) -> bool {
        self.surface(tile) == Some(Surface::Water)
    }

    fn has_road_or_city(&self, tile: Tile) -> bool {
        self.state(tile)
            .is_some_and(|state| state.road || state.city.is_some())
    }
}

impl GameMap for GridMap {
    fn size_x(&self) -> i32 {
        self.width
    }

    fn size_y(&self) -> i32 {
        self.height
    }

    fn wrap_x(&self, x: i32) -> i32 {
        if self.wrap_horizontal && self.width > 0 {
            x.rem_euclid(self.width)
        } else {
            x
        }
    }

    fn wrap_y(&self, y: i32) -> i32 {
        y
    }

    fn terrain_at(&self, tile: Tile) -> Option<TerrainId> {
        self.state(tile).and_then(|state| state.terrain)
    }

    fn land_owner(&self, tile: Tile) -> Option<CivId> {
        self.state(tile).and_then(|state| state.land_owner)
    }

    fn spot_owner(&self, tile: Tile) -> Option<CivId> {
        let state = self.state(tile)?;
        state
            .city
            .map(|city| city.civ)
            .or_else(|| state.units.first().map(|unit| unit.civ))
    }

    fn move_cost(&self, unit: &UnitConfig, tile: Tile) -> Option<u32> {
        let spec = self.spec(tile)?;
        let state = self.state(tile)?;
        match (unit.is_water_unit(), spec.surface) {
            (true, Surface::Water) => Some(1),
            (true, Surface::Land) => state.city.map(|_| 1),
            (false, Surface::Water) => None,
            (false, Surface::Land) if state.road || state.city.is_some() => Some(1),
            (false, Surface::Land) => Some(spec.move_cost),
        }
    }

    fn resources_on_spot(
        &self,
        tile: Tile,
        researched: &BTreeSet<AdvanceId>,
        production_cap: u32,
    ) -> Yield {
        let (Some(spec), Some(state)) = (self.spec(tile), self.state(tile)) else {
            return Yield::default();
        };

        let mut total = spec.base;
        if state.irrigation {
            total.food += 1;
        }
        if state.mine {
            total.production += 2;
        }
        if state.road && spec.surface == Surface::Land {
            total.commerce += 1;
        }
        let bonus = state.resource.and_then(|id| self.resources.get(&id));
        if let Some(bonus) = bonus {
            if bonus.needed_advance.is_none() || researched.contains(&bonus.needed_advance) {
                total += bonus.bonus;
            }
        }

        if production_cap > 0 {
            let cap = i32::try_from(production_cap).unwrap_or(i32::MAX);
            for component in [&mut total.food, &mut total.production, &mut total.commerce] {
                if *component > cap {
                    *component -= 1;
                }
            }
        }
        total
    }

    fn resource_at(&self, tile: Tile) -> Option<ResourceId> {
        self.state(tile).and_then(|state| state.resource)
    }

    fn connected_to_sea(&self, tile: Tile) -> bool {
        (-1..=1).any(|dy| {
            (-1..=1).any(|dx| {
                (dx != 0 || dy != 0) && self.is_water(Tile::new(tile.x() + dx, tile.y() + dy))
            })
        })
    }

    fn road_between(&self, from: Tile, to: Tile) -> bool {
        let from = self.wrap(from);
        let to = self.wrap(to);
        let dx = (from.x() - to.x()).abs();
        let dx = if self.wrap_horizontal {
            dx.min(self.width - dx)
        } else {
            dx
        };
        let adjacent = dx <= 1 && (from.y() - to.y()).abs() <= 1;
        adjacent && self.has_road_or_city(from) && self.has_road_or_city(to)
    }

    fn units_on_spot(&self, tile: Tile) -> &[UnitRef] {
        self.state(tile).map_or(&[], |state| state.units.as_slice())
    }

    fn add_unit(&mut self, unit: UnitRef, tile: Tile) {
        if let Some(state) = self.state_mut(tile) {
            if !state.units.contains(&unit) {
                state.units.push(unit);
            }
        }
    }

    fn remove_unit(&mut self, unit: UnitRef, tile: Tile) {
        if let Some(state) = self.state_mut(tile) {
            state.units.retain(|existing| *existing != unit);
        }
    }

    fn add_city(&mut self, city: CityRef, tile: Tile) {
        if let Some(state) = self.state_mut(tile) {
            state.city = Some(city);
            state.land_owner = Some(city.civ);
        }
        for dy in -CITY_CLAIM_RADIUS..=CITY_CLAIM_RADIUS {
            for dx in -CITY_CLAIM_RADIUS..=CITY_CLAIM_RADIUS {
                let neighbor = Tile::new(tile.x() + dx, tile.y() + dy);
                if let Some(state) = self.state_mut(neighbor) {
                    if state.land_owner.is_none() {
                        state.land_owner = Some(city.civ);
                    }
                }
            }
        }
    }

    fn remove_city(&mut self, city: CityRef, tile: Tile) {
        if let Some(state) = self.state_mut(tile) {
            if state.city == Some(city) {
                state.city = None;
            }
        }
    }

    fn remove_civ_land(&mut self, civ: CivId) {
        for state in &mut self.tiles {
            if state.land_owner == Some(civ) {
                state.land_owner = None;
            }
        }
    }

    fn try_improve_terrain(
        &mut self,
        tile: Tile,
        civ: CivId,
        improvement: TerrainImprovement,
    ) -> bool {
        if self.surface(tile) != Some(Surface::Land) {
            return false;
        }
        let Some(state) = self.state_mut(tile) else {
            return false;
        };
        if state.land_owner.is_some_and(|owner| owner != civ) {
            return false;
        }
        let slot = match improvement {
            TerrainImprovement::Irrigation if !state.mine => &mut state.irrigation,
            TerrainImprovement::Mine if !state.irrigation => &mut state.mine,
            TerrainImprovement::Road => &mut state.road,
            _ => return false,
        };
        if *slot {
            return false;
        }
        *slot = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{GRASSLAND, HILLS, OCEAN};
    use civsim_core::{UnitFlags, UnitId, UnitKindId};

    fn config(sea: bool) -> UnitConfig {
        UnitConfig {
            id: UnitKindId::new(0),
            name: "Probe".to_owned(),
            max_moves: 1,
            max_strength: 1,
            production_cost: 10,
            population_cost: 0,
            needed_advance: AdvanceId::NONE,
            carry_units: 0,
            needed_resources: Vec::new(),
            flags: UnitFlags {
                sea,
                ..UnitFlags::default()
            },
        }
    }

    #[test]
    fn horizontal_axis_wraps_vertical_does_not() {
        let map = GridMap::filled(8, 4, true, GRASSLAND);

        assert_eq!(map.wrap(Tile::new(-1, 2)), Tile::new(7, 2));
        assert_eq!(map.wrap(Tile::new(9, 2)), Tile::new(1, 2));
        assert!(!map.contains(Tile::new(3, -1)));
        assert!(map.terrain_at(Tile::new(3, 4)).is_none());
    }

    #[test]
    fn land_units_cannot_enter_water() {
        let mut map = GridMap::filled(4, 4, false, GRASSLAND);
        map.set_terrain(Tile::new(1, 1), OCEAN);
        map.set_terrain(Tile::new(2, 2), HILLS);

        assert_eq!(map.move_cost(&config(false), Tile::new(1, 1)), None);
        assert_eq!(map.move_cost(&config(true), Tile::new(1, 1)), Some(1));
        assert_eq!(map.move_cost(&config(false), Tile::new(2, 2)), Some(2));
        assert_eq!(map.move_cost(&config(true), Tile::new(2, 2)), None);
        assert!(map.connected_to_sea(Tile::new(0, 0)));
        assert!(!map.connected_to_sea(Tile::new(3, 3)));
    }

    #[test]
    fn production_cap_trims_high_yields() {
        let mut map = GridMap::filled(3, 3, false, GRASSLAND);
        let tile = Tile::new(1, 1);
        let civ = CivId::new(0);
        let irrigated = map.try_improve_terrain(tile, civ, TerrainImprovement::Irrigation);
        let mined = map.try_improve_terrain(tile, civ, TerrainImprovement::Mine);
        assert!(irrigated);
        assert!(!mined);

        let researched = BTreeSet::new();
        assert_eq!(map.resources_on_spot(tile, &researched, 0).food, 3);
        assert_eq!(map.resources_on_spot(tile, &researched, 2).food, 2);
    }

    #[test]
    fn founding_a_city_claims_unowned_land() {
        let mut map = GridMap::filled(9, 9, false, GRASSLAND);
        map.set_land_owner(Tile::new(6, 4), Some(CivId::new(2)));
        let city = CityRef {
            civ: CivId::new(1),
            city: civsim_core::CityId::new(1),
        };

        map.add_city(city, Tile::new(4, 4));

        assert_eq!(map.land_owner(Tile::new(2, 2)), Some(CivId::new(1)));
        assert_eq!(map.land_owner(Tile::new(6, 4)), Some(CivId::new(2)));
        assert_eq!(map.land_owner(Tile::new(7, 4)), None);
        assert_eq!(map.spot_owner(Tile::new(4, 4)), Some(CivId::new(1)));

        map.remove_civ_land(CivId::new(1));
        assert_eq!(map.land_owner(Tile::new(2, 2)), None);
    }

    #[test]
    fn units_on_spot_track_occupancy() {
        let mut map = GridMap::filled(3, 3, false, GRASSLAND);
        let unit = UnitRef {
            civ: CivId::new(3),
            unit: UnitId::new(1),
        };

        map.add_unit(unit, Tile::new(1, 1));
        assert_eq!(map.units_on_spot(Tile::new(1, 1)), &[unit]);
        assert_eq!(map.spot_owner(Tile::new(1, 1)), Some(CivId::new(3)));

        map.remove_unit(unit, Tile::new(1, 1));
        assert!(map.units_on_spot(Tile::new(1, 1)).is_empty());
    }
}
