#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round loop that hands the turn from one civilization to the next.

use std::collections::BTreeSet;

use civsim_core::{CivId, GameMap, MoveError, Rules, Tile, UnitId};
use civsim_world::Civilization;
use tracing::{debug, info};

/// Radius scanned for foreign civilizations after a unit moves.
const DISCOVERY_RADIUS: i32 = 1;

/// Outcome of a single civilization ending its turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// Civilization whose turn ended.
    pub civ: CivId,
    /// Culture its cities produced this turn.
    pub culture: u64,
    /// Points awarded for the turn.
    pub points: u64,
    /// Civilizations eliminated at the end of the turn.
    pub eliminated: Vec<CivId>,
    /// Whether the turn order wrapped and a new round began.
    pub new_round: bool,
}

/// Game session owning the map, the rules and every civilization.
#[derive(Debug)]
pub struct Round<M: GameMap> {
    map: M,
    rules: Rules,
    civs: Vec<Civilization>,
    eliminated: BTreeSet<CivId>,
    current: usize,
    number: u32,
    debug_civ: Option<CivId>,
}

impl<M: GameMap> Round<M> {
    /// Starts the first round; civilizations play in ascending id order.
    #[must_use]
    pub fn new(map: M, rules: Rules, mut civs: Vec<Civilization>) -> Self {
        civs.sort_by_key(Civilization::id);
        Self {
            map,
            rules,
            civs,
            eliminated: BTreeSet::new(),
            current: 0,
            number: 1,
            debug_civ: None,
        }
    }

    /// Civilization whose production and research are traced in detail.
    #[must_use]
    pub const fn debug_civ(&self) -> Option<CivId> {
        self.debug_civ
    }

    /// Selects the civilization traced in detail.
    pub fn set_debug_civ(&mut self, civ: Option<CivId>) {
        self.debug_civ = civ;
    }

    /// Number of the round being played, starting at one.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Shared map.
    #[must_use]
    pub fn map(&self) -> &M {
        &self.map
    }

    /// Rules consulted by every civilization.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Every civilization, eliminated ones included, in turn order.
    #[must_use]
    pub fn civs(&self) -> &[Civilization] {
        &self.civs
    }

    /// Civilization with the provided id.
    #[must_use]
    pub fn civ(&self, id: CivId) -> Option<&Civilization> {
        self.civs.iter().find(|civ| civ.id() == id)
    }

    /// Civilization currently playing, if any is left.
    #[must_use]
    pub fn current(&self) -> Option<&Civilization> {
        self.civs.get(self.current)
    }

    /// Reports whether a civilization has been eliminated from the game.
    #[must_use]
    pub fn is_eliminated(&self, id: CivId) -> bool {
        self.eliminated.contains(&id)
    }

    /// Runs `f` with mutable access to a civilization, the map and the rules.
    pub fn with_civ<R>(
        &mut self,
        id: CivId,
        f: impl FnOnce(&mut Civilization, &mut M, &Rules) -> R,
    ) -> Option<R> {
        let civ = self.civs.iter_mut().find(|civ| civ.id() == id)?;
        Some(f(civ, &mut self.map, &self.rules))
    }

    /// Moves a unit of the current civilization and looks for foreign civilizations around it.
    pub fn try_move_unit(&mut self, unit: UnitId, dx: i32, dy: i32) -> Result<Tile, MoveError> {
        let civ = self
            .civs
            .get_mut(self.current)
            .ok_or(MoveError::UnknownUnit(unit))?;
        let tile = civ.move_unit(&mut self.map, &self.rules, unit, dx, dy, false)?;
        let _ = civ.check_discoveries(&self.map, tile, DISCOVERY_RADIUS);
        Ok(tile)
    }

    /// Ends the current civilization's turn and passes it to the next one still in the game.
    ///
    /// Returns `None` once no civilization is left to play.
    pub fn end_turn(&mut self) -> Option<TurnReport> {
        let debug_civ = self.debug_civ;
        let civ = self.civs.get_mut(self.current)?;
        let id = civ.id();
        let culture = civ.increment_resources(
            &mut self.map,
            &self.rules,
            debug_civ == Some(id),
        );
        civ.refill_moves(&mut self.map, &self.rules);
        let cities = u64::try_from(civ.cities().len()).unwrap_or(u64::MAX);
        let points = cities.saturating_add(culture);
        civ.add_points(points);
        debug!(civ = id.get(), points, culture, "turn ended");

        let eliminated = self.eliminate_defeated();
        let new_round = self.advance();
        if new_round {
            self.number += 1;
            info!(round = self.number, "round started");
        }
        Some(TurnReport {
            civ: id,
            culture,
            points,
            eliminated,
            new_round,
        })
    }

    fn eliminate_defeated(&mut self) -> Vec<CivId> {
        let mut fallen = Vec::new();
        for civ in &mut self.civs {
            if self.eliminated.contains(&civ.id()) || !civ.is_eliminated() {
                continue;
            }
            civ.eliminate(&mut self.map);
            let _ = self.eliminated.insert(civ.id());
            info!(
                civ = civ.id().get(),
                name = civ.name(),
                "civilization eliminated"
            );
            fallen.push(civ.id());
        }
        fallen
    }

    /// Moves to the next civilization in the game; returns whether the order wrapped.
    fn advance(&mut self) -> bool {
        let count = self.civs.len();
        let mut wrapped = false;
        for step in 1..=count {
            let next = self.current + step;
            if next >= count {
                wrapped = true;
            }
            let index = next % count;
            if !self.eliminated.contains(&self.civs[index].id()) {
                self.current = index;
                return wrapped;
            }
        }
        self.current = count;
        wrapped
    }
}
