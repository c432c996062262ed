//! Units and cities owned by a civilization.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    map::TerrainImprovement, CityId, CivId, ImprovementId, Offset, Rules, Tile, UnitConfig, UnitId,
    UnitKindId,
};

/// Pending terrain improvement assigned to a worker unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainOrder {
    /// Improvement being built.
    pub improvement: TerrainImprovement,
    /// Turns of work left before the improvement is applied.
    pub turns_left: u32,
}

/// Unit owned by a civilization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    /// Identifier within the owning civilization.
    pub id: UnitId,
    /// Configuration the unit was built from.
    pub kind: UnitKindId,
    /// Owning civilization.
    pub civ: CivId,
    /// Current position; follows the carrier while loaded.
    pub tile: Tile,
    /// Regular moves left this turn.
    pub moves: u32,
    /// Road steps left from the last move point spent on a road.
    pub road_moves: u32,
    /// Whether the unit is fortified.
    pub fortified: bool,
    /// Whether the unit is a veteran.
    pub veteran: bool,
    /// Carrier the unit is loaded into.
    pub carried_by: Option<UnitId>,
    /// Units loaded into this unit.
    pub cargo: Vec<UnitId>,
    /// Terrain improvement in progress.
    pub order: Option<TerrainOrder>,
}

impl Unit {
    /// Creates a fresh unit with a full set of moves.
    #[must_use]
    pub fn new(id: UnitId, civ: CivId, tile: Tile, config: &UnitConfig) -> Self {
        Self {
            id,
            kind: config.id,
            civ,
            tile,
            moves: config.max_moves,
            road_moves: 0,
            fortified: false,
            veteran: false,
            carried_by: None,
            cargo: Vec::new(),
            order: None,
        }
    }

    /// Reports whether the unit may still move this turn.
    #[must_use]
    pub fn has_moves(&self) -> bool {
        self.moves > 0 || self.road_moves > 0
    }

    /// Reports whether the unit is loaded into a carrier.
    #[must_use]
    pub fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }

    /// Starts a new turn, returning the terrain improvement finished by a worker order.
    ///
    /// A unit working on an order spends the whole turn on it.
    pub fn new_round(&mut self, config: &UnitConfig) -> Option<TerrainImprovement> {
        self.road_moves = 0;
        let Some(order) = self.order.as_mut() else {
            self.moves = config.max_moves;
            return None;
        };

        self.moves = 0;
        order.turns_left = order.turns_left.saturating_sub(1);
        if order.turns_left > 0 {
            return None;
        }

        let finished = order.improvement;
        self.order = None;
        Some(finished)
    }

    /// Spends movement for a single step.
    ///
    /// A step along a road uses one road move, converting a regular move into
    /// `road_moves_per_move` road moves when none are left.
    pub fn spend_step(&mut self, along_road: bool, road_moves_per_move: u32) {
        self.fortified = false;
        self.order = None;
        if along_road {
            if self.road_moves > 0 {
                self.road_moves -= 1;
            } else if self.moves > 0 {
                self.moves -= 1;
                self.road_moves = road_moves_per_move.saturating_sub(1);
            }
            return;
        }

        self.moves = self.moves.saturating_sub(1);
        self.road_moves = 0;
    }
}

/// Item a city is currently producing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Production {
    /// Nothing is being produced; production still accumulates.
    #[default]
    None,
    /// A unit of the given configuration, built repeatedly.
    Unit(UnitKindId),
    /// A one-off city improvement.
    Improvement(ImprovementId),
}

/// City owned by a civilization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct City {
    /// Identifier within the owning civilization.
    pub id: CityId,
    /// Display name.
    pub name: String,
    /// Owning civilization.
    pub civ: CivId,
    /// Tile the city stands on.
    pub tile: Tile,
    /// Population; also the number of tiles the city can work.
    pub size: u32,
    /// Food stored towards growth.
    pub stored_food: i64,
    /// Production stored towards the current target.
    pub stored_production: i64,
    /// Completed improvements.
    pub improvements: BTreeSet<ImprovementId>,
    /// Current production target.
    pub production: Production,
    /// Worked tiles relative to the city tile.
    pub worked: Vec<Offset>,
    /// Culture accumulated from improvements.
    pub culture: u64,
}

impl City {
    /// Creates a size one city with nothing in production.
    #[must_use]
    pub fn new(id: CityId, name: impl Into<String>, civ: CivId, tile: Tile) -> Self {
        Self {
            id,
            name: name.into(),
            civ,
            tile,
            size: 1,
            stored_food: 0,
            stored_production: 0,
            improvements: BTreeSet::new(),
            production: Production::None,
            worked: Vec::new(),
            culture: 0,
        }
    }

    /// Absolute tile of a worked offset, before map wrapping.
    #[must_use]
    pub fn worked_tile(&self, offset: Offset) -> Tile {
        self.tile.offset(offset)
    }

    /// Stops working every tile.
    pub fn clear_workers(&mut self) {
        self.worked.clear();
    }

    /// Starts working the tile at the offset.
    ///
    /// Returns `false` when the offset is the city tile, is already worked, or
    /// when every citizen already works a tile.
    pub fn add_worker(&mut self, offset: Offset) -> bool {
        if offset.is_origin() || self.worked.contains(&offset) {
            return false;
        }
        if self.worked.len() >= self.size as usize {
            return false;
        }
        self.worked.push(offset);
        true
    }

    /// Removes one citizen, never shrinking below size one, and drops surplus workers.
    pub fn shrink(&mut self) {
        if self.size > 1 {
            self.size -= 1;
        }
        self.worked.truncate(self.size as usize);
    }

    /// Reports whether any completed improvement has the barracks flag.
    #[must_use]
    pub fn has_barracks(&self, rules: &Rules) -> bool {
        self.any_improvement(rules, |improvement| improvement.flags.barracks)
    }

    /// Reports whether any completed improvement has the granary flag.
    #[must_use]
    pub fn has_granary(&self, rules: &Rules) -> bool {
        self.any_improvement(rules, |improvement| improvement.flags.granary)
    }

    /// Reports whether any completed improvement has the palace flag.
    #[must_use]
    pub fn has_palace(&self, rules: &Rules) -> bool {
        self.any_improvement(rules, |improvement| improvement.flags.palace)
    }

    fn any_improvement<F>(&self, rules: &Rules, predicate: F) -> bool
    where
        F: Fn(&crate::CityImprovement) -> bool,
    {
        self.improvements
            .iter()
            .filter_map(|id| rules.improvement(*id))
            .any(predicate)
    }
}
