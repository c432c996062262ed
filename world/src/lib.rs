#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative per-civilization state for civsim.
//!
//! A [`Civilization`] exclusively owns its units and cities in id-keyed
//! arenas. The shared map only ever receives [`UnitRef`] and [`CityRef`]
//! back-references, and every operation that changes occupancy updates the
//! map, the fog of war and the civilization's own bookkeeping in the same
//! call. Observers learn about what happened through the civilization's
//! [`MessageQueue`].

use std::collections::{BTreeMap, BTreeSet};

use civsim_core::{
    AdvanceId, City, CityId, CityImprovement, CityRef, CivId, Color, FogLevel, GameMap,
    GovernmentId, Message, MessageQueue, Production, Relationship, ResourceId, Rules, Tile, Unit,
    UnitConfig, UnitId, UnitKindId,
};
use civsim_system_diplomacy::Relations;
use civsim_system_knowledge::KnowledgeLayer;
use civsim_system_pathfinding::{path_along_roads, Territory};
use civsim_system_workers::{assign_city_workers, rebuild_worker_map, ResourceWorkerMap, YieldRules};

mod economy;
mod units;

pub use economy::{MAX_ALLOCATION, SCIENCE_DISCOVERY_DURATION};

/// Radius a unit keeps visible around itself.
const UNIT_SIGHT: i32 = 1;
/// Radius a city keeps visible around itself.
const CITY_SIGHT: i32 = 1;
/// Radius uncovered once when a city is founded or acquired.
const CITY_FOUNDING_SIGHT: i32 = 2;
/// Gold and science share, in tenths, of a fresh civilization.
const DEFAULT_ALLOCATION: u32 = 5;

/// Identity and starting conditions of a civilization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CivilizationConfig {
    /// Identifier; also the civilization's position in turn order.
    pub id: CivId,
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: Color,
    /// Pool of names handed to founded cities, recycled once exhausted.
    pub city_names: Vec<String>,
    /// Government in force at the start.
    pub government: GovernmentId,
    /// Minor civilizations skip the economy and meet everyone at war.
    pub minor: bool,
}

/// One civilization with its units, cities, treasury, research and diplomacy.
#[derive(Clone, Debug)]
pub struct Civilization {
    id: CivId,
    name: String,
    color: Color,
    minor: bool,
    units: BTreeMap<UnitId, Unit>,
    cities: BTreeMap<CityId, City>,
    next_unit_id: u32,
    next_city_id: u32,
    city_names: Vec<String>,
    next_city_name: usize,
    gold: i64,
    science: i64,
    alloc_gold: u32,
    alloc_science: u32,
    national_income: i64,
    national_science: i64,
    military_expenses: i64,
    government: GovernmentId,
    anarchy_turns: u32,
    research_goal: AdvanceId,
    researched: BTreeSet<AdvanceId>,
    research_started: bool,
    cross_oceans: bool,
    relations: Relations,
    knowledge: KnowledgeLayer,
    workers: ResourceWorkerMap,
    built_units: BTreeMap<UnitKindId, u32>,
    lost_units: BTreeMap<UnitKindId, u32>,
    points: u64,
    messages: MessageQueue,
}

impl Civilization {
    /// Creates a civilization with an empty empire sized for the provided map.
    #[must_use]
    pub fn new<M: GameMap + ?Sized>(config: CivilizationConfig, map: &M) -> Self {
        Self {
            id: config.id,
            name: config.name,
            color: config.color,
            minor: config.minor,
            units: BTreeMap::new(),
            cities: BTreeMap::new(),
            next_unit_id: 1,
            next_city_id: 1,
            city_names: config.city_names,
            next_city_name: 0,
            gold: 0,
            science: 0,
            alloc_gold: DEFAULT_ALLOCATION,
            alloc_science: DEFAULT_ALLOCATION,
            national_income: 0,
            national_science: 0,
            military_expenses: 0,
            government: config.government,
            anarchy_turns: 0,
            research_goal: AdvanceId::NONE,
            researched: BTreeSet::new(),
            research_started: false,
            cross_oceans: false,
            relations: Relations::new(config.id, config.minor),
            knowledge: KnowledgeLayer::new(map),
            workers: ResourceWorkerMap::new(),
            built_units: BTreeMap::new(),
            lost_units: BTreeMap::new(),
            points: 0,
            messages: MessageQueue::new(),
        }
    }

    /// Identifier of the civilization.
    #[must_use]
    pub const fn id(&self) -> CivId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display color.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Reports whether this is a minor civilization.
    #[must_use]
    pub const fn is_minor(&self) -> bool {
        self.minor
    }

    /// Units keyed by id.
    #[must_use]
    pub fn units(&self) -> &BTreeMap<UnitId, Unit> {
        &self.units
    }

    /// Unit with the provided id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Cities keyed by id.
    #[must_use]
    pub fn cities(&self) -> &BTreeMap<CityId, City> {
        &self.cities
    }

    /// City with the provided id.
    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(&id)
    }

    /// Units built per unit type over the whole game.
    #[must_use]
    pub fn built_units(&self) -> &BTreeMap<UnitKindId, u32> {
        &self.built_units
    }

    /// Units lost per unit type over the whole game.
    #[must_use]
    pub fn lost_units(&self) -> &BTreeMap<UnitKindId, u32> {
        &self.lost_units
    }

    /// Pending messages for observers.
    #[must_use]
    pub fn messages(&self) -> &MessageQueue {
        &self.messages
    }

    /// Removes and returns every pending message in emission order.
    pub fn drain_messages(&mut self) -> Vec<Message> {
        self.messages.drain().collect()
    }

    /// Tile-to-city claims of the civilization.
    #[must_use]
    pub fn worker_map(&self) -> &ResourceWorkerMap {
        &self.workers
    }

    /// Fog state of a tile from this civilization's point of view.
    #[must_use]
    pub fn fog_at<M: GameMap + ?Sized>(&self, map: &M, tile: Tile) -> FogLevel {
        self.knowledge.fog_at(map.wrap(tile))
    }

    /// Land owner this civilization last observed on a tile.
    #[must_use]
    pub fn known_land_owner<M: GameMap + ?Sized>(&self, map: &M, tile: Tile) -> Option<CivId> {
        self.knowledge.known_land_owner(map.wrap(tile))
    }

    /// Knowledge layer of the civilization.
    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeLayer {
        &self.knowledge
    }

    /// Stored relationship towards another civilization.
    #[must_use]
    pub fn relationship(&self, other: CivId) -> Relationship {
        self.relations.relationship(other)
    }

    /// Stores a relationship towards another civilization.
    pub fn set_relationship(&mut self, other: CivId, relationship: Relationship) {
        self.relations
            .set_relationship(other, relationship, &mut self.messages);
    }

    /// Records first contact with another civilization; returns whether it was new.
    pub fn discover(&mut self, other: CivId) -> bool {
        self.relations.discover(other, &mut self.messages)
    }

    /// Forgets another civilization.
    pub fn undiscover(&mut self, other: CivId) {
        self.relations.undiscover(other, &mut self.messages);
    }

    /// Declares war on another civilization.
    pub fn set_war(&mut self, other: CivId) {
        self.relations.set_war(other, &mut self.messages);
    }

    /// Makes peace with another civilization.
    pub fn set_peace(&mut self, other: CivId) {
        self.relations.set_peace(other, &mut self.messages);
    }

    /// Discovers every foreign civilization standing within `radius` of `center`.
    ///
    /// Returns the foreign spot owners seen, one entry per occupied tile.
    pub fn check_discoveries<M: GameMap + ?Sized>(
        &mut self,
        map: &M,
        center: Tile,
        radius: i32,
    ) -> Vec<CivId> {
        let mut seen = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let tile = map.wrap(Tile::new(center.x() + dx, center.y() + dy));
                if let Some(owner) = map.spot_owner(tile).filter(|owner| *owner != self.id) {
                    let _ = self.discover(owner);
                    seen.push(owner);
                }
            }
        }
        seen
    }

    /// Founds a city on the tile and assigns its workers.
    pub fn add_city<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        tile: Tile,
    ) -> CityId {
        let id = self.allocate_city_id();
        let name = self.take_city_name(id);
        let tile = map.wrap(tile);
        map.add_city(self.city_ref(id), tile);
        self.insert_city(&*map, rules, City::new(id, name, self.id, tile));
        id
    }

    /// Takes over a city previously owned by another civilization.
    ///
    /// The city receives a fresh id from this civilization and the map
    /// record is replaced accordingly.
    pub fn adopt_city<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        mut city: City,
    ) -> CityId {
        map.remove_city(
            CityRef {
                civ: city.civ,
                city: city.id,
            },
            city.tile,
        );
        let id = self.allocate_city_id();
        city.id = id;
        city.civ = self.id;
        city.clear_workers();
        map.add_city(self.city_ref(id), city.tile);
        self.insert_city(&*map, rules, city);
        id
    }

    /// Removes a city, optionally erasing it from the map as well.
    ///
    /// Cities handed over to another civilization stay on the map until the
    /// new owner adopts them.
    pub fn remove_city<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        id: CityId,
        erase_from_map: bool,
    ) -> Option<City> {
        let city = self.detach_city(map, id, erase_from_map)?;
        self.rebuild_workers(&*map, rules);
        self.refresh_ledger(&*map, rules);
        Some(city)
    }

    /// Selects what a city produces; returns `false` for unknown cities.
    pub fn set_production(&mut self, city: CityId, production: Production) -> bool {
        let Some(city) = self.cities.get_mut(&city) else {
            return false;
        };
        city.production = production;
        true
    }

    /// Reports whether the civilization has been defeated.
    ///
    /// Minor civilizations fall with their last unit; major ones also need to lose every city.
    #[must_use]
    pub fn is_eliminated(&self) -> bool {
        if self.minor {
            self.units.is_empty()
        } else {
            self.units.is_empty() && self.cities.is_empty()
        }
    }

    /// Removes every unit and city and releases all land claims.
    pub fn eliminate<M: GameMap + ?Sized>(&mut self, map: &mut M) {
        while let Some(id) = self.units.keys().next().copied() {
            let _ = self.remove_unit(map, id);
        }
        while let Some(id) = self.cities.keys().next().copied() {
            let _ = self.detach_city(map, id, true);
        }
        self.workers.clear();
        map.remove_civ_land(self.id);
    }

    /// Reports whether the advance is known; [`AdvanceId::NONE`] always is.
    #[must_use]
    pub fn advance_discovered(&self, advance: AdvanceId) -> bool {
        advance.is_none() || self.researched.contains(&advance)
    }

    /// Reports whether the advance needed by a unit type is known.
    #[must_use]
    pub fn unit_discovered(&self, config: &UnitConfig) -> bool {
        self.advance_discovered(config.needed_advance)
    }

    /// Reports whether the advance needed by an improvement is known.
    #[must_use]
    pub fn improvement_discovered(&self, improvement: &CityImprovement) -> bool {
        self.advance_discovered(improvement.needed_advance)
    }

    /// Reports whether the city can start building the unit type.
    ///
    /// Water units need a coastal city; every needed resource must be
    /// defined, exploitable with known advances and reachable by road.
    #[must_use]
    pub fn can_build_unit<M: GameMap + ?Sized>(
        &self,
        map: &M,
        rules: &Rules,
        config: &UnitConfig,
        city: &City,
    ) -> bool {
        if !self.unit_discovered(config) {
            return false;
        }
        if config.is_water_unit() && !map.connected_to_sea(city.tile) {
            return false;
        }
        config.needed_resources.iter().all(|resource| {
            rules.resource(*resource).is_some_and(|definition| {
                self.advance_discovered(definition.needed_advance)
                    && self.has_access_to_resource(map, city, *resource)
            })
        })
    }

    /// Reports whether roads inside this civilization's land link the city to the resource.
    #[must_use]
    pub fn has_access_to_resource<M: GameMap + ?Sized>(
        &self,
        map: &M,
        city: &City,
        resource: ResourceId,
    ) -> bool {
        let route = path_along_roads(map, self.id, city.tile, |tile| {
            map.resource_at(tile) == Some(resource) && map.land_owner(tile) == Some(self.id)
        });
        !route.is_empty()
    }

    /// Reports whether the city can start building the improvement.
    #[must_use]
    pub fn can_build_improvement(&self, improvement: &CityImprovement, city: &City) -> bool {
        self.improvement_discovered(improvement) && !city.improvements.contains(&improvement.id)
    }

    /// Reports whether an ocean-going unit type has been unlocked.
    #[must_use]
    pub const fn can_cross_oceans(&self) -> bool {
        self.cross_oceans
    }

    fn allocate_city_id(&mut self) -> CityId {
        let id = CityId::new(self.next_city_id);
        self.next_city_id += 1;
        id
    }

    fn take_city_name(&mut self, id: CityId) -> String {
        let Some(name) = self.city_names.get(self.next_city_name).cloned() else {
            return format!("{} {}", self.name, id.get());
        };
        self.next_city_name += 1;
        if self.next_city_name >= self.city_names.len() {
            for recycled in &mut self.city_names {
                recycled.insert_str(0, "New ");
            }
            self.next_city_name = 0;
        }
        name
    }

    fn insert_city<M: GameMap + ?Sized>(&mut self, map: &M, rules: &Rules, mut city: City) {
        self.knowledge.reveal(map, city.tile, CITY_FOUNDING_SIGHT);
        self.knowledge.shade(map, city.tile, CITY_FOUNDING_SIGHT);
        self.knowledge.reveal(map, city.tile, CITY_SIGHT);

        let production_cap = self.production_cap(rules);
        assign_city_workers(
            &mut city,
            map,
            &mut self.workers,
            YieldRules {
                researched: &self.researched,
                production_cap,
            },
        );
        let _ = self.cities.insert(city.id, city);
        self.rebuild_workers(map, rules);
        self.refresh_ledger(map, rules);
    }

    fn detach_city<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        id: CityId,
        erase_from_map: bool,
    ) -> Option<City> {
        let city = self.cities.remove(&id)?;
        self.knowledge.shade(&*map, city.tile, CITY_SIGHT);
        if erase_from_map {
            map.remove_city(self.city_ref(id), city.tile);
        }
        Some(city)
    }

    fn city_ref(&self, id: CityId) -> CityRef {
        CityRef {
            civ: self.id,
            city: id,
        }
    }

    fn production_cap(&self, rules: &Rules) -> u32 {
        rules
            .government(self.government)
            .map_or(0, |government| government.production_cap)
    }

    fn rebuild_workers<M: GameMap + ?Sized>(&mut self, map: &M, rules: &Rules) {
        let production_cap = self.production_cap(rules);
        let _ = rebuild_worker_map(
            &mut self.cities,
            map,
            &mut self.workers,
            YieldRules {
                researched: &self.researched,
                production_cap,
            },
        );
    }

    fn yield_rules<'a>(&'a self, rules: &Rules) -> YieldRules<'a> {
        YieldRules {
            researched: &self.researched,
            production_cap: self.production_cap(rules),
        }
    }
}

impl Territory for Civilization {
    fn civ_id(&self) -> CivId {
        self.id
    }

    fn fog_at(&self, tile: Tile) -> FogLevel {
        self.knowledge.fog_at(tile)
    }

    fn blocked_by_land(&self, tile: Tile) -> bool {
        match self.knowledge.known_land_owner(tile) {
            Some(owner) if owner != self.id => {
                self.relations.relationship(owner) == Relationship::Peace
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civsim_core::RuleTunables;

    struct Empty;

    impl GameMap for Empty {
        fn size_x(&self) -> i32 {
            4
        }
        fn size_y(&self) -> i32 {
            4
        }
        fn wrap_x(&self, x: i32) -> i32 {
            x
        }
        fn wrap_y(&self, y: i32) -> i32 {
            y
        }
        fn terrain_at(&self, _tile: Tile) -> Option<civsim_core::TerrainId> {
            None
        }
        fn land_owner(&self, _tile: Tile) -> Option<CivId> {
            None
        }
        fn spot_owner(&self, _tile: Tile) -> Option<CivId> {
            None
        }
        fn move_cost(&self, _unit: &UnitConfig, _tile: Tile) -> Option<u32> {
            None
        }
        fn resources_on_spot(
            &self,
            _tile: Tile,
            _researched: &BTreeSet<AdvanceId>,
            _production_cap: u32,
        ) -> civsim_core::Yield {
            civsim_core::Yield::default()
        }
        fn resource_at(&self, _tile: Tile) -> Option<ResourceId> {
            None
        }
        fn connected_to_sea(&self, _tile: Tile) -> bool {
            false
        }
        fn road_between(&self, _from: Tile, _to: Tile) -> bool {
            false
        }
        fn units_on_spot(&self, _tile: Tile) -> &[civsim_core::UnitRef] {
            &[]
        }
        fn add_unit(&mut self, _unit: civsim_core::UnitRef, _tile: Tile) {}
        fn remove_unit(&mut self, _unit: civsim_core::UnitRef, _tile: Tile) {}
        fn add_city(&mut self, _city: CityRef, _tile: Tile) {}
        fn remove_city(&mut self, _city: CityRef, _tile: Tile) {}
        fn remove_civ_land(&mut self, _civ: CivId) {}
        fn try_improve_terrain(
            &mut self,
            _tile: Tile,
            _civ: CivId,
            _improvement: civsim_core::TerrainImprovement,
        ) -> bool {
            false
        }
    }

    fn civilization(names: &[&str]) -> Civilization {
        Civilization::new(
            CivilizationConfig {
                id: CivId::new(1),
                name: "Babylon".to_owned(),
                color: Color::from_rgb(200, 40, 40),
                city_names: names.iter().map(|name| (*name).to_owned()).collect(),
                government: GovernmentId::new(1),
                minor: false,
            },
            &Empty,
        )
    }

    #[test]
    fn city_names_are_recycled_with_prefix() {
        let mut map = Empty;
        let rules = Rules::new(RuleTunables::default());
        let mut civ = civilization(&["Ur", "Uruk"]);

        let ids: Vec<_> = (0..3)
            .map(|_| civ.add_city(&mut map, &rules, Tile::new(1, 1)))
            .collect();

        let names: Vec<_> = ids
            .iter()
            .filter_map(|id| civ.city(*id).map(|city| city.name.clone()))
            .collect();
        assert_eq!(names, vec!["Ur", "Uruk", "New Ur"]);
    }

    #[test]
    fn empty_name_pool_falls_back_to_civilization_name() {
        let mut map = Empty;
        let rules = Rules::new(RuleTunables::default());
        let mut civ = civilization(&[]);

        let id = civ.add_city(&mut map, &rules, Tile::new(2, 2));

        let name = civ.city(id).map(|city| city.name.as_str());
        assert_eq!(name, Some("Babylon 1"));
        assert!(!civ.is_eliminated());
    }
}
