//! Per-turn economy: growth, production, treasury, upkeep and research.

use std::collections::BTreeSet;

use civsim_core::{
    AdvanceId, AllocationError, CityId, GameMap, GovernmentId, Message, Production, Rules,
    UnitConfig, UnitKindId,
};
use civsim_system_workers::{assign_city_workers, total_resources, YieldRules};
use tracing::{debug, info, warn};

use crate::Civilization;

/// Science needed to discover an advance, as a multiple of its cost.
pub const SCIENCE_DISCOVERY_DURATION: i64 = 4;

/// Highest combined gold and science allocation, in tenths.
pub const MAX_ALLOCATION: u32 = 10;

/// Outcome of one city's production step.
enum Completed {
    Nothing,
    Unit(UnitKindId),
}

impl Civilization {
    /// Gold in the treasury; may stay negative after bankruptcy.
    #[must_use]
    pub const fn gold(&self) -> i64 {
        self.gold
    }

    /// Adds (or with a negative amount, removes) gold.
    pub fn add_gold(&mut self, amount: i64) {
        self.gold += amount;
    }

    /// Science accumulated towards the research goal.
    #[must_use]
    pub const fn science(&self) -> i64 {
        self.science
    }

    /// Adds science towards the research goal, as granted outside the commerce split.
    pub fn add_science(&mut self, amount: i64) {
        self.science += amount;
    }

    /// Gold and science allocation in tenths.
    #[must_use]
    pub const fn allocation(&self) -> (u32, u32) {
        (self.alloc_gold, self.alloc_science)
    }

    /// Gold earned per turn before upkeep.
    #[must_use]
    pub const fn national_income(&self) -> i64 {
        self.national_income
    }

    /// Science earned per turn.
    #[must_use]
    pub const fn national_science(&self) -> i64 {
        self.national_science
    }

    /// Gold paid per turn for units beyond the free allowance.
    #[must_use]
    pub const fn military_expenses(&self) -> i64 {
        self.military_expenses
    }

    /// Advance currently researched; [`AdvanceId::NONE`] when none is selected.
    #[must_use]
    pub const fn research_goal(&self) -> AdvanceId {
        self.research_goal
    }

    /// Advances discovered so far.
    #[must_use]
    pub fn researched(&self) -> &BTreeSet<AdvanceId> {
        &self.researched
    }

    /// Government in force.
    #[must_use]
    pub const fn government(&self) -> GovernmentId {
        self.government
    }

    /// Turns of anarchy left.
    #[must_use]
    pub const fn anarchy_turns(&self) -> u32 {
        self.anarchy_turns
    }

    /// Accumulated score.
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Adds to the score.
    pub fn add_points(&mut self, points: u64) {
        self.points += points;
    }

    /// Resets the score to zero.
    pub fn reset_points(&mut self) {
        self.points = 0;
    }

    /// Changes the gold and science shares of commerce.
    ///
    /// Income, science and upkeep are recomputed immediately. A rejected
    /// request leaves every value untouched.
    pub fn set_commerce_allocation<M: GameMap + ?Sized>(
        &mut self,
        map: &M,
        rules: &Rules,
        gold: u32,
        science: u32,
    ) -> Result<(), AllocationError> {
        if gold.saturating_add(science) > MAX_ALLOCATION {
            return Err(AllocationError::ExceedsTotal { gold, science });
        }
        self.alloc_gold = gold;
        self.alloc_science = science;
        self.refresh_ledger(map, rules);
        Ok(())
    }

    /// Installs a government followed by `anarchy_turns` turns without economy.
    pub fn set_government<M: GameMap + ?Sized>(
        &mut self,
        map: &M,
        rules: &Rules,
        government: GovernmentId,
        anarchy_turns: u32,
    ) {
        self.government = government;
        if anarchy_turns == 0 {
            self.anarchy_turns = 0;
            self.messages.push(Message::AnarchyOver);
        } else {
            info!(civ = self.id.get(), anarchy_turns, "anarchy begins");
            self.anarchy_turns = anarchy_turns;
        }
        self.refresh_ledger(map, rules);
    }

    /// Runs one turn of the economy and returns the culture produced by every city.
    ///
    /// Minor civilizations and civilizations in anarchy skip the update; the
    /// latter count their anarchy down instead.
    pub fn increment_resources<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        debug_enabled: bool,
    ) -> u64 {
        if self.minor {
            return 0;
        }
        if self.anarchy_turns > 0 {
            self.anarchy_turns -= 1;
            if self.anarchy_turns == 0 {
                info!(civ = self.id.get(), "anarchy over");
                self.messages.push(Message::AnarchyOver);
            }
            return 0;
        }

        let mut culture = 0;
        let mut resized = Vec::new();
        let ids: Vec<CityId> = self.cities.keys().copied().collect();
        for id in ids {
            let (completed, changed_size, city_culture) =
                self.advance_city(&*map, rules, id, debug_enabled);
            culture += city_culture;
            if changed_size {
                resized.push(id);
            }
            if let Completed::Unit(kind) = completed {
                self.finish_unit(map, rules, id, kind);
            }
        }

        if !resized.is_empty() {
            let production_cap = self.production_cap(rules);
            for id in resized {
                if let Some(city) = self.cities.get_mut(&id) {
                    assign_city_workers(
                        city,
                        &*map,
                        &mut self.workers,
                        YieldRules {
                            researched: &self.researched,
                            production_cap,
                        },
                    );
                }
            }
            self.rebuild_workers(&*map, rules);
        }

        self.refresh_ledger(&*map, rules);
        self.gold += self.national_income - self.military_expenses;
        self.handle_bankruptcy(map, rules);
        self.science += self.national_science;
        self.advance_research(rules, debug_enabled);
        culture
    }

    /// Disbands military units in id order while the treasury is negative.
    ///
    /// Each disbanded unit refunds the government's unit cost. When no
    /// military unit is left, or disbanding refunds nothing, the treasury
    /// stays negative.
    pub fn handle_bankruptcy<M: GameMap + ?Sized>(&mut self, map: &mut M, rules: &Rules) {
        let unit_cost = rules
            .government(self.government)
            .map_or(0, |government| i64::from(government.unit_cost));
        while self.gold < 0 {
            let military = self
                .units
                .values()
                .find(|unit| is_military(rules, unit.kind))
                .map(|unit| unit.id);
            let Some(id) = military.filter(|_| unit_cost > 0) else {
                warn!(
                    civ = self.id.get(),
                    gold = self.gold,
                    "treasury stays negative"
                );
                break;
            };
            self.gold += unit_cost;
            self.messages.push(Message::UnitDisbanded { unit: id });
            let _ = self.remove_unit(map, id);
        }
        self.refresh_military_expenses(rules);
    }

    /// Restores moves and advances terrain orders, applying finished improvements to the map.
    pub fn refill_moves<M: GameMap + ?Sized>(&mut self, map: &mut M, rules: &Rules) {
        for unit in self.units.values_mut() {
            let Some(config) = rules.unit(unit.kind) else {
                continue;
            };
            if let Some(improvement) = unit.new_round(config) {
                let _ = map.try_improve_terrain(unit.tile, self.id, improvement);
            }
        }
    }

    /// Recomputes income, science and upkeep from the current empire.
    pub(crate) fn refresh_ledger<M: GameMap + ?Sized>(&mut self, map: &M, rules: &Rules) {
        let yield_rules = self.yield_rules(rules);
        let (mut income, mut science) = (0_i64, 0_i64);
        for city in self.cities.values() {
            let commerce = i64::from(total_resources(city, map, yield_rules).commerce);
            let gold_share = i64::from(self.alloc_gold);
            let science_share = i64::from(self.alloc_science);
            income += commerce * gold_share / 10;
            science += commerce * science_share / 10;
            for id in &city.improvements {
                let Some(improvement) = rules.improvement(*id) else {
                    continue;
                };
                if gold_share > 0 {
                    income += commerce * gold_share * i64::from(improvement.comm_bonus) / 1000;
                }
                if science_share > 0 {
                    science +=
                        commerce * science_share * i64::from(improvement.science_bonus) / 1000;
                }
            }
        }
        self.national_income = income;
        self.national_science = science;
        self.refresh_military_expenses(rules);
    }

    fn refresh_military_expenses(&mut self, rules: &Rules) {
        let Some(government) = rules.government(self.government) else {
            self.military_expenses = 0;
            return;
        };
        let city_allowance = u64::try_from(self.cities.len())
            .unwrap_or(u64::MAX)
            .saturating_mul(u64::from(government.city_units));
        let mut free = u64::from(government.free_units).saturating_add(city_allowance);
        let mut expenses = 0_i64;
        for unit in self.units.values() {
            if !is_military(rules, unit.kind) {
                continue;
            }
            if free > 0 {
                free -= 1;
            } else {
                expenses += i64::from(government.unit_cost);
            }
        }
        self.military_expenses = expenses;
    }

    /// Grows or starves a city, advances its production and collects its culture.
    fn advance_city<M: GameMap + ?Sized>(
        &mut self,
        map: &M,
        rules: &Rules,
        id: CityId,
        debug_enabled: bool,
    ) -> (Completed, bool, u64) {
        let yield_rules = self.yield_rules(rules);
        let Some(city) = self.cities.get(&id) else {
            return (Completed::Nothing, false, 0);
        };
        let produced = total_resources(city, map, yield_rules);
        let has_granary = city.has_granary(rules);

        let tunables = rules.tunables();
        let Some(city) = self.cities.get_mut(&id) else {
            return (Completed::Nothing, false, 0);
        };
        let size_before = city.size;
        let eaten = i64::from(city.size) * i64::from(tunables.food_eaten_per_citizen);
        city.stored_food += i64::from(produced.food) - eaten;
        city.stored_production += i64::from(produced.production);

        let food_box = i64::from(city.size + 1) * i64::from(tunables.food_box_per_citizen);
        if city.stored_food >= food_box {
            city.size += 1;
            city.stored_food = if has_granary { food_box / 2 } else { 0 };
        } else if city.stored_food < 0 {
            city.shrink();
            city.stored_food = 0;
        }

        let mut completed = Completed::Nothing;
        match city.production {
            Production::None => {}
            Production::Unit(kind) => {
                if let Some(config) = rules.unit(kind) {
                    let affordable = city.stored_production >= i64::from(config.production_cost);
                    if affordable && city.size > config.population_cost {
                        city.size -= config.population_cost;
                        city.worked.truncate(city.size as usize);
                        city.stored_production -= i64::from(config.production_cost);
                        completed = Completed::Unit(kind);
                    }
                }
            }
            Production::Improvement(improvement_id) => {
                if let Some(improvement) = rules.improvement(improvement_id) {
                    if city.stored_production >= i64::from(improvement.cost) {
                        if city.improvements.insert(improvement_id) {
                            city.stored_production -= i64::from(improvement.cost);
                        }
                        city.production = Production::None;
                        info!(
                            civ = self.id.get(),
                            city = id.get(),
                            improvement = %improvement.name,
                            "improvement completed"
                        );
                        self.messages.push(Message::ImprovementCompleted {
                            city: id,
                            improvement: improvement_id,
                        });
                        if improvement.flags.palace {
                            self.destroy_old_palace(rules, id);
                        }
                    }
                }
            }
        }

        let Some(city) = self.cities.get_mut(&id) else {
            return (completed, true, 0);
        };
        let culture: u64 = city
            .improvements
            .iter()
            .filter_map(|improvement| rules.improvement(*improvement))
            .map(|improvement| u64::from(improvement.culture))
            .sum();
        city.culture += culture;
        if debug_enabled {
            debug!(
                civ = self.id.get(),
                city = id.get(),
                size = city.size,
                food = city.stored_food,
                production = city.stored_production,
                target = ?city.production,
                "city advanced"
            );
        }
        (completed, city.size != size_before, culture)
    }

    fn finish_unit<M: GameMap + ?Sized>(
        &mut self,
        map: &mut M,
        rules: &Rules,
        city_id: CityId,
        kind: UnitKindId,
    ) {
        let (Some(city), Some(config)) = (self.cities.get(&city_id), rules.unit(kind)) else {
            return;
        };
        let tile = city.tile;
        let veteran = city.has_barracks(rules);
        let unit = self.add_unit(map, config, tile);
        if let Some(created) = self.units.get_mut(&unit) {
            created.veteran = veteran;
        }
        self.messages.push(Message::NewUnit {
            city: city_id,
            kind,
            unit,
        });
    }

    /// Removes the palace from every city other than `keep`.
    fn destroy_old_palace(&mut self, rules: &Rules, keep: CityId) {
        for (id, city) in &mut self.cities {
            if *id == keep {
                continue;
            }
            city.improvements.retain(|improvement| {
                !rules
                    .improvement(*improvement)
                    .is_some_and(|definition| definition.flags.palace)
            });
        }
    }

    fn advance_research(&mut self, rules: &Rules, debug_enabled: bool) {
        let Some(goal) = rules.advance(self.research_goal) else {
            if !self.research_started && self.researched.is_empty() {
                self.messages.push(Message::AdvanceDiscovered {
                    advance: AdvanceId::NONE,
                });
                self.update_ocean_crossing(rules, AdvanceId::NONE);
            }
            self.research_started = true;
            self.setup_default_research_goal(rules);
            return;
        };
        self.research_started = true;

        let cost = i64::from(goal.cost);
        if debug_enabled {
            debug!(
                civ = self.id.get(),
                goal = %goal.name,
                science = self.science,
                needed = cost * SCIENCE_DISCOVERY_DURATION,
                "research progress"
            );
        }
        if self.science < cost * SCIENCE_DISCOVERY_DURATION {
            return;
        }

        let discovered = goal.id;
        self.science -= cost;
        info!(civ = self.id.get(), advance = %goal.name, "advance discovered");
        self.messages.push(Message::AdvanceDiscovered {
            advance: discovered,
        });
        let _ = self.researched.insert(discovered);
        self.update_ocean_crossing(rules, discovered);
        self.setup_default_research_goal(rules);
    }

    /// Picks the lowest-id advance whose prerequisites are all researched.
    fn setup_default_research_goal(&mut self, rules: &Rules) {
        self.research_goal = rules
            .advances()
            .find(|advance| {
                !self.researched.contains(&advance.id)
                    && advance
                        .prerequisites()
                        .all(|needed| self.researched.contains(&needed))
            })
            .map_or(AdvanceId::NONE, |advance| advance.id);
    }

    fn update_ocean_crossing(&mut self, rules: &Rules, advance: AdvanceId) {
        if rules
            .units()
            .any(|config| config.needed_advance == advance && config.flags.ocean)
        {
            self.cross_oceans = true;
        }
    }
}

fn is_military(rules: &Rules, kind: UnitKindId) -> bool {
    rules.unit(kind).is_some_and(UnitConfig::is_military)
}
