//! Seeded headless game: map generation, starting positions and a simple autoplayer.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use civsim_core::{
    CivId, GameMap, GovernmentId, Message, Production, Rules, TerrainImprovement, Tile, UnitConfig,
    UnitId, UnitKindId,
};
use civsim_grid_map::{
    generate::{generate, starting_places, GeneratorConfig},
    terrain::Surface,
    GridMap,
};
use civsim_system_turn::{Round, TurnReport};
use civsim_world::{Civilization, CivilizationConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::ruleset::Ruleset;

/// Minimum distance, in tiles, between two starting positions.
const START_SPACING: i32 = 6;
/// Cities keep at least this distance from each other when settlers look for a spot.
const CITY_SPACING: i32 = 3;
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Parameters of a headless game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Map width in tiles.
    pub width: i32,
    /// Map height in tiles.
    pub height: i32,
    /// Seed shared by the map generator and the autoplayer.
    pub seed: u64,
    /// Number of nations taken from the rule set.
    pub civs: usize,
    /// Civilization whose cities and research are traced.
    pub debug_civ: Option<CivId>,
}

/// Final standing of one civilization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CivReport {
    /// Identifier of the civilization.
    pub id: CivId,
    /// Display name.
    pub name: String,
    /// Accumulated score.
    pub points: u64,
    /// Number of cities still held.
    pub cities: usize,
    /// Gold in the treasury.
    pub gold: i64,
    /// Number of advances discovered.
    pub advances: usize,
    /// Units built per unit type name.
    pub built: BTreeMap<String, u32>,
    /// Units lost per unit type name.
    pub lost: BTreeMap<String, u32>,
    /// Whether the civilization was eliminated.
    pub eliminated: bool,
}

/// Message emitted during a game, tagged with where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MessageLine {
    /// Round in which the message was drained.
    pub round: u32,
    /// Civilization that emitted the message.
    pub civ: CivId,
    /// The message itself.
    pub message: Message,
}

/// Running headless game.
#[derive(Debug)]
pub struct Game {
    round: Round<GridMap>,
    rng: ChaCha8Rng,
    settlers: UnitKindId,
}

impl Game {
    /// Generates the map and places every nation's starting units.
    pub fn new(config: &GameConfig, ruleset: Ruleset) -> Result<Self> {
        let Ruleset {
            rules,
            resource_bonuses,
            nations,
        } = ruleset;
        if config.civs == 0 || config.civs > nations.len() {
            bail!(
                "requested {} civilizations but the rule set lists {}",
                config.civs,
                nations.len()
            );
        }

        let mut map = generate(&GeneratorConfig {
            land_percent: 45,
            resources: resource_bonuses.keys().copied().collect(),
            ..GeneratorConfig::new(config.width, config.height, config.seed)
        });
        for (resource, spec) in resource_bonuses {
            map.define_resource(resource, spec);
        }

        let places = starting_places(&map, config.civs, START_SPACING, config.seed);
        if places.len() < config.civs {
            bail!(
                "map of {}x{} has room for only {} of {} civilizations",
                config.width,
                config.height,
                places.len(),
                config.civs
            );
        }

        let government = starting_government(&rules)?;
        let settlers = rules
            .units()
            .find(|unit| unit.flags.settler && unit.needed_advance.is_none())
            .cloned()
            .context("rule set has no settler unit available from the start")?;
        let escort = cheapest_land_military(&rules, |unit| unit.needed_advance.is_none());

        let mut civs = Vec::with_capacity(config.civs);
        for ((index, nation), place) in nations.into_iter().enumerate().zip(places) {
            let number = u32::try_from(index + 1).context("too many nations")?;
            let id = CivId::new(number);
            let mut civ = Civilization::new(
                CivilizationConfig {
                    id,
                    name: nation.name.clone(),
                    color: nation.color(),
                    city_names: nation.cities.clone(),
                    government,
                    minor: nation.minor,
                },
                &map,
            );
            if !nation.minor {
                let _ = civ.add_unit(&mut map, &settlers, place);
            }
            if let Some(escort) = &escort {
                let _ = civ.add_unit(&mut map, escort, place);
            }
            info!(
                civ = id.get(),
                name = %nation.name,
                x = place.x(),
                y = place.y(),
                "nation placed"
            );
            civs.push(civ);
        }

        let mut round = Round::new(map, rules, civs);
        round.set_debug_civ(config.debug_civ);
        Ok(Self {
            round,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            settlers: settlers.id,
        })
    }

    /// Round currently being played.
    #[must_use]
    pub fn round_number(&self) -> u32 {
        self.round.number()
    }

    /// Underlying session.
    #[must_use]
    pub fn session(&self) -> &Round<GridMap> {
        &self.round
    }

    /// Lets the current civilization act and ends its turn.
    ///
    /// Returns `None` once every civilization is gone.
    pub fn play_turn(&mut self) -> Option<TurnReport> {
        let id = self.round.current().map(Civilization::id)?;
        self.found_cities(id);
        self.command_units(id);
        self.choose_production(id);
        self.round.end_turn()
    }

    /// Removes the pending messages of every civilization.
    pub fn drain_messages(&mut self) -> Vec<MessageLine> {
        let round = self.round.number();
        let ids: Vec<CivId> = self.round.civs().iter().map(Civilization::id).collect();
        let mut lines = Vec::new();
        for civ in ids {
            let drained = self
                .round
                .with_civ(civ, |civilization, _, _| civilization.drain_messages())
                .unwrap_or_default();
            lines.extend(drained.into_iter().map(|message| MessageLine {
                round,
                civ,
                message,
            }));
        }
        lines
    }

    /// Standing of every civilization, in turn order.
    #[must_use]
    pub fn report(&self) -> Vec<CivReport> {
        let rules = self.round.rules();
        let by_name = |ledger: &BTreeMap<UnitKindId, u32>| -> BTreeMap<String, u32> {
            ledger
                .iter()
                .map(|(kind, count)| {
                    let name = rules
                        .unit(*kind)
                        .map_or_else(|| format!("unit {}", kind.get()), |unit| unit.name.clone());
                    (name, *count)
                })
                .collect()
        };
        self.round
            .civs()
            .iter()
            .map(|civ| CivReport {
                id: civ.id(),
                name: civ.name().to_owned(),
                points: civ.points(),
                cities: civ.cities().len(),
                gold: civ.gold(),
                advances: civ.researched().len(),
                built: by_name(civ.built_units()),
                lost: by_name(civ.lost_units()),
                eliminated: self.round.is_eliminated(civ.id()),
            })
            .collect()
    }

    /// Settlers standing on a free land tile found a city there.
    fn found_cities(&mut self, id: CivId) {
        let settlers = self.settlers;
        let _ = self.round.with_civ(id, |civ, map, rules| {
            let candidates: Vec<(UnitId, Tile)> = civ
                .units()
                .values()
                .filter(|unit| unit.kind == settlers && !unit.is_carried())
                .map(|unit| (unit.id, unit.tile))
                .collect();
            for (unit, tile) in candidates {
                if !can_found_city(civ, &*map, tile) {
                    continue;
                }
                let city = civ.add_city(map, rules, tile);
                let _ = civ.remove_unit(map, unit);
                debug!(
                    civ = id.get(),
                    city = city.get(),
                    x = tile.x(),
                    y = tile.y(),
                    "city founded"
                );
            }
        });
    }

    /// Workers build roads on their own land; every other unit wanders.
    fn command_units(&mut self, id: CivId) {
        let Some(civ) = self.round.civ(id) else {
            return;
        };
        let rules = self.round.rules();
        let map = self.round.map();
        let mut wanderers = Vec::new();
        let mut road_builders = Vec::new();
        for unit in civ.units().values() {
            if unit.is_carried() || unit.order.is_some() || !unit.has_moves() {
                continue;
            }
            let is_worker = rules
                .unit(unit.kind)
                .is_some_and(|config| config.flags.worker);
            let own_land = map.land_owner(unit.tile) == Some(id);
            if is_worker && own_land && !map.has_improvement(unit.tile, TerrainImprovement::Road) {
                road_builders.push(unit.id);
            } else {
                wanderers.push(unit.id);
            }
        }

        let _ = self.round.with_civ(id, |civ, _, rules| {
            for unit in road_builders {
                let _ = civ.order_terrain_improvement(rules, unit, TerrainImprovement::Road);
            }
        });
        for unit in wanderers {
            let (dx, dy) = DIRECTIONS[self.rng.gen_range(0..DIRECTIONS.len())];
            if let Err(error) = self.round.try_move_unit(unit, dx, dy) {
                debug!(civ = id.get(), unit = unit.get(), %error, "move refused");
            }
        }
    }

    /// Picks what every city builds this turn.
    ///
    /// Grown cities train settlers, cities then add the buildings they can,
    /// and otherwise they keep a garrison coming.
    fn choose_production(&mut self, id: CivId) {
        let settlers = self.settlers;
        let _ = self.round.with_civ(id, |civ, map, rules| {
            let has_palace = civ.cities().values().any(|city| city.has_palace(rules));
            let mut choices = Vec::new();
            for city in civ.cities().values() {
                if matches!(city.production, Production::Improvement(_)) {
                    continue;
                }
                let buildable = |config: &UnitConfig| {
                    civ.can_build_unit(&*map, rules, config, city)
                };
                let settler_ready = city.size >= 2 && rules.unit(settlers).is_some_and(buildable);
                let building = rules
                    .improvements()
                    .filter(|improvement| !(improvement.flags.palace && has_palace))
                    .find(|improvement| civ.can_build_improvement(improvement, city));
                let production = if settler_ready {
                    Production::Unit(settlers)
                } else if let Some(building) = building {
                    Production::Improvement(building.id)
                } else if let Some(unit) = cheapest_land_military(rules, buildable) {
                    Production::Unit(unit.id)
                } else {
                    Production::None
                };
                choices.push((city.id, production));
            }
            for (city, production) in choices {
                let _ = civ.set_production(city, production);
            }
        });
    }
}

fn starting_government(rules: &Rules) -> Result<GovernmentId> {
    rules
        .governments()
        .find(|government| government.needed_advance.is_none())
        .map(|government| government.id)
        .context("rule set has no government available from the start")
}

fn cheapest_land_military<F>(rules: &Rules, mut available: F) -> Option<UnitConfig>
where
    F: FnMut(&UnitConfig) -> bool,
{
    rules
        .units()
        .filter(|unit| unit.is_military() && !unit.is_water_unit())
        .filter(|unit| available(unit))
        .min_by_key(|unit| unit.production_cost)
        .cloned()
}

fn can_found_city(civ: &Civilization, map: &GridMap, tile: Tile) -> bool {
    for dy in -CITY_SPACING..=CITY_SPACING {
        for dx in -CITY_SPACING..=CITY_SPACING {
            let near = Tile::new(tile.x() + dx, tile.y() + dy);
            if map.city_at(near).is_some() {
                return false;
            }
        }
    }
    let owner_ok = map.land_owner(tile).map_or(true, |owner| owner == civ.id());
    owner_ok && map.surface(tile) == Some(Surface::Land)
}
