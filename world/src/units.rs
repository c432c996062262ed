//! Unit placement, movement and transport.

use civsim_core::{
    GameMap, LoadError, MoveError, Relationship, Rules, TerrainImprovement, TerrainOrder, Tile,
    Unit, UnitConfig, UnitId, UnitRef,
};
use civsim_system_pathfinding::path_to;

use crate::{Civilization, UNIT_SIGHT};

impl Civilization {
    /// Places a new unit of the given type on the tile.
    pub fn add_unit<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        config: &UnitConfig,
        tile: Tile,
    ) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id += 1;
        let tile = map.wrap(tile);

        let _ = self.units.insert(id, Unit::new(id, self.id, tile, config));
        *self.built_units.entry(config.id).or_insert(0) += 1;
        map.add_unit(self.unit_ref(id), tile);
        self.knowledge.reveal(&*map, tile, UNIT_SIGHT);
        id
    }

    /// Removes a unit together with everything it carries, recording the losses.
    pub fn remove_unit<M: GameMap + ?Sized>(&mut self, map: &mut M, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        match unit.carried_by {
            Some(carrier) => {
                if let Some(carrier) = self.units.get_mut(&carrier) {
                    carrier.cargo.retain(|loaded| *loaded != id);
                }
            }
            None => {
                self.knowledge.shade(&*map, unit.tile, UNIT_SIGHT);
                map.remove_unit(self.unit_ref(id), unit.tile);
            }
        }
        for loaded in &unit.cargo {
            let _ = self.remove_unit(map, *loaded);
        }
        *self.lost_units.entry(unit.kind).or_insert(0) += 1;
        Some(unit)
    }

    /// Checks whether a unit may step by `(dx, dy)`.
    ///
    /// The destination must accept the unit's terrain class, hold no foreign
    /// units, and must not be land of a civilization this one is at peace with.
    pub fn can_move_unit<M: GameMap + ?Sized>(
        &self,
        map: &M,
        rules: &Rules,
        id: UnitId,
        dx: i32,
        dy: i32,
    ) -> Result<(), MoveError> {
        let unit = self.units.get(&id).ok_or(MoveError::UnknownUnit(id))?;
        if !unit.has_moves() {
            return Err(MoveError::NoMovesLeft);
        }
        if dx == 0 && dy == 0 {
            return Err(MoveError::ZeroDisplacement);
        }
        let config = rules
            .unit(unit.kind)
            .ok_or(MoveError::UnknownKind(unit.kind))?;
        let target = map.wrap(Tile::new(unit.tile.x() + dx, unit.tile.y() + dy));
        if map.move_cost(config, target).is_none() {
            return Err(MoveError::TerrainForbidden);
        }
        if !self.move_acceptable_by_land_and_units(map, target) {
            return Err(MoveError::Blocked);
        }
        Ok(())
    }

    /// Steps a unit by `(dx, dy)`, unloading it first when carried.
    ///
    /// Moves along a road spend road moves unless the step followed a fight.
    pub fn move_unit<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        id: UnitId,
        dx: i32,
        dy: i32,
        fought: bool,
    ) -> Result<Tile, MoveError> {
        self.can_move_unit(&*map, rules, id, dx, dy)?;
        if self.units.get(&id).is_some_and(Unit::is_carried) {
            self.unload_unit(map, id);
        }

        let road_moves = rules.tunables().road_moves;
        let unit = self.units.get_mut(&id).ok_or(MoveError::UnknownUnit(id))?;
        let from = unit.tile;
        let to = map.wrap(Tile::new(from.x() + dx, from.y() + dy));
        let along_road = !fought && map.road_between(from, to);
        unit.spend_step(along_road, road_moves);
        unit.tile = to;
        let cargo = unit.cargo.clone();

        let unit_ref = self.unit_ref(id);
        map.remove_unit(unit_ref, from);
        self.knowledge.shade(&*map, from, UNIT_SIGHT);
        self.knowledge.reveal(&*map, to, UNIT_SIGHT);
        map.add_unit(unit_ref, to);
        for loaded in cargo {
            if let Some(loaded) = self.units.get_mut(&loaded) {
                loaded.tile = to;
            }
        }
        Ok(to)
    }

    /// Checks whether `unit` may board `carrier`.
    pub fn can_load_unit<M: GameMap + ?Sized>(
        &self,
        map: &M,
        rules: &Rules,
        unit: UnitId,
        carrier: UnitId,
    ) -> Result<(), LoadError> {
        let loadee = self.units.get(&unit).ok_or(LoadError::UnknownUnit(unit))?;
        let loader = self
            .units
            .get(&carrier)
            .ok_or(LoadError::UnknownUnit(carrier))?;
        if unit == carrier
            || loadee.is_carried()
            || !loadee.cargo.is_empty()
            || loader.is_carried()
        {
            return Err(LoadError::NotLoadable);
        }
        let capacity = rules
            .unit(loader.kind)
            .ok_or(LoadError::UnknownKind(loader.kind))?
            .carry_units;
        if capacity == 0 {
            return Err(LoadError::NotLoadable);
        }
        if loader.cargo.len() >= capacity as usize {
            return Err(LoadError::CarrierFull);
        }
        if chebyshev(map, loadee.tile, loader.tile) > 1 {
            return Err(LoadError::OutOfReach);
        }
        Ok(())
    }

    /// Loads `unit` into `carrier`; the unit leaves the map and follows its carrier.
    pub fn load_unit<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        unit: UnitId,
        carrier: UnitId,
    ) -> Result<(), LoadError> {
        self.can_load_unit(&*map, rules, unit, carrier)?;
        let carrier_tile = self
            .units
            .get_mut(&carrier)
            .map(|loader| {
                loader.cargo.push(unit);
                loader.tile
            })
            .ok_or(LoadError::UnknownUnit(carrier))?;
        let loadee = self
            .units
            .get_mut(&unit)
            .ok_or(LoadError::UnknownUnit(unit))?;
        let from = loadee.tile;
        loadee.carried_by = Some(carrier);
        loadee.tile = carrier_tile;
        loadee.fortified = false;

        self.knowledge.shade(&*map, from, UNIT_SIGHT);
        map.remove_unit(self.unit_ref(unit), from);
        Ok(())
    }

    /// Puts a carried unit back on the map at its carrier's tile.
    pub fn unload_unit<M: GameMap + ?Sized>(&mut self, map: &mut M, unit: UnitId) {
        let Some(loadee) = self.units.get_mut(&unit) else {
            return;
        };
        let Some(carrier) = loadee.carried_by.take() else {
            return;
        };
        let tile = loadee.tile;
        if let Some(loader) = self.units.get_mut(&carrier) {
            loader.cargo.retain(|loaded| *loaded != unit);
        }
        map.add_unit(self.unit_ref(unit), tile);
        self.knowledge.reveal(&*map, tile, UNIT_SIGHT);
    }

    /// Orders a worker unit to build a terrain improvement on its tile.
    ///
    /// Returns `false` when the unit is missing, carried, or not a worker.
    pub fn order_terrain_improvement(
        &mut self,
        rules: &Rules,
        id: UnitId,
        improvement: TerrainImprovement,
    ) -> bool {
        let Some(unit) = self.units.get_mut(&id) else {
            return false;
        };
        let is_worker = rules
            .unit(unit.kind)
            .is_some_and(|config| config.flags.worker);
        if !is_worker || unit.is_carried() {
            return false;
        }
        let tunables = rules.tunables();
        let turns_left = match improvement {
            TerrainImprovement::Irrigation => tunables.irrigation_turns,
            TerrainImprovement::Mine => tunables.mine_turns,
            TerrainImprovement::Road => tunables.road_turns,
        };
        unit.order = Some(TerrainOrder {
            improvement,
            turns_left: turns_left.max(1),
        });
        unit.fortified = false;
        true
    }

    /// Fortifies a unit in place; returns `false` for unknown units.
    pub fn fortify_unit(&mut self, id: UnitId) -> bool {
        let Some(unit) = self.units.get_mut(&id) else {
            return false;
        };
        unit.fortified = true;
        unit.order = None;
        true
    }

    /// Route this civilization's knowledge allows the unit to take towards `goal`.
    #[must_use]
    pub fn unit_path<M: GameMap + ?Sized>(
        &self,
        map: &M,
        rules: &Rules,
        id: UnitId,
        goal: Tile,
        ignore_enemy: bool,
    ) -> Vec<Tile> {
        let Some(unit) = self.units.get(&id) else {
            return Vec::new();
        };
        let Some(config) = rules.unit(unit.kind) else {
            return Vec::new();
        };
        path_to(map, self, config, ignore_enemy, unit.tile, goal)
    }

    pub(crate) fn unit_ref(&self, id: UnitId) -> UnitRef {
        UnitRef {
            civ: self.id,
            unit: id,
        }
    }

    fn move_acceptable_by_land_and_units<M: GameMap + ?Sized>(&self, map: &M, tile: Tile) -> bool {
        let foreign_units = map
            .units_on_spot(tile)
            .first()
            .is_some_and(|unit| unit.civ != self.id);
        if foreign_units {
            return false;
        }
        match map.land_owner(tile) {
            Some(owner) if owner != self.id => self.relationship(owner) != Relationship::Peace,
            _ => true,
        }
    }
}

fn chebyshev<M: GameMap + ?Sized>(map: &M, a: Tile, b: Tile) -> i32 {
    let a = map.wrap(a);
    let b = map.wrap(b);
    let mut dx = (a.x() - b.x()).abs();
    if map.wrap_x(a.x() + map.size_x()) == a.x() {
        dx = dx.min(map.size_x() - dx);
    }
    dx.max((a.y() - b.y()).abs())
}
