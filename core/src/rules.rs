//! Immutable configuration records loaded by the surrounding application.
//!
//! The core never parses definition files. Adapters build a [`Rules`] value
//! once during bootstrap and hand out shared references to it; lookups of
//! unknown identifiers simply return `None` and the calling feature is
//! treated as unavailable.

use std::collections::BTreeMap;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::{AdvanceId, GovernmentId, ImprovementId, ResourceId, UnitKindId};

/// Maximum number of prerequisite advances an advance may list.
pub const MAX_PREREQUISITES: usize = 4;

/// Capability flags attached to a unit configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitFlags {
    /// The unit can found cities.
    pub settler: bool,
    /// The unit can improve terrain.
    pub worker: bool,
    /// The unit moves on water instead of land.
    pub sea: bool,
    /// The unit can cross deep ocean.
    pub ocean: bool,
}

/// Static description of a unit type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Identifier of the configuration.
    pub id: UnitKindId,
    /// Display name.
    pub name: String,
    /// Moves restored at the start of every turn.
    pub max_moves: u32,
    /// Combat strength; units with zero strength are civilian.
    pub max_strength: u32,
    /// Production required to build the unit.
    pub production_cost: u32,
    /// Population removed from the producing city.
    #[serde(default)]
    pub population_cost: u32,
    /// Advance required before the unit can be built.
    #[serde(default)]
    pub needed_advance: AdvanceId,
    /// Number of units this unit can carry.
    #[serde(default)]
    pub carry_units: u32,
    /// Map resources the producing city must have access to.
    #[serde(default)]
    pub needed_resources: Vec<ResourceId>,
    /// Capability flags.
    #[serde(default)]
    pub flags: UnitFlags,
}

impl UnitConfig {
    /// Reports whether the unit counts towards military upkeep.
    #[must_use]
    pub fn is_military(&self) -> bool {
        self.max_strength > 0
    }

    /// Reports whether the unit moves on water.
    #[must_use]
    pub fn is_water_unit(&self) -> bool {
        self.flags.sea || self.flags.ocean
    }
}

/// Technology node of the research tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    /// Identifier of the advance. Never zero.
    pub id: AdvanceId,
    /// Display name.
    pub name: String,
    /// Research cost.
    pub cost: u32,
    /// Prerequisite slots; [`AdvanceId::NONE`] marks an unused slot.
    #[serde(default, deserialize_with = "prerequisite_slots")]
    pub needed: [AdvanceId; MAX_PREREQUISITES],
}

impl Advance {
    /// Creates an advance from its cost and prerequisite list.
    ///
    /// Prerequisites beyond [`MAX_PREREQUISITES`] are ignored.
    #[must_use]
    pub fn new(id: AdvanceId, name: impl Into<String>, cost: u32, needed: &[AdvanceId]) -> Self {
        let mut slots = [AdvanceId::NONE; MAX_PREREQUISITES];
        for (slot, prerequisite) in slots.iter_mut().zip(needed) {
            *slot = *prerequisite;
        }
        Self {
            id,
            name: name.into(),
            cost,
            needed: slots,
        }
    }

    /// Iterator over the prerequisites actually in use.
    pub fn prerequisites(&self) -> impl Iterator<Item = AdvanceId> + '_ {
        self.needed.iter().copied().filter(|id| !id.is_none())
    }
}

fn prerequisite_slots<'de, D>(deserializer: D) -> Result<[AdvanceId; MAX_PREREQUISITES], D::Error>
where
    D: Deserializer<'de>,
{
    let listed = Vec::<AdvanceId>::deserialize(deserializer)?;
    if listed.len() > MAX_PREREQUISITES {
        let expected = "at most four prerequisite advances";
        return Err(D::Error::invalid_length(listed.len(), &expected));
    }
    let mut slots = [AdvanceId::NONE; MAX_PREREQUISITES];
    for (slot, prerequisite) in slots.iter_mut().zip(listed) {
        *slot = prerequisite;
    }
    Ok(slots)
}

/// Capability flags attached to a city improvement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovementFlags {
    /// Units built in the city start as veterans.
    pub barracks: bool,
    /// The city keeps half of its food box when it grows.
    pub granary: bool,
    /// Seat of government; at most one per civilization.
    pub palace: bool,
}

/// Static description of a city improvement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityImprovement {
    /// Identifier of the improvement.
    pub id: ImprovementId,
    /// Display name.
    pub name: String,
    /// Production required to build the improvement.
    pub cost: u32,
    /// Advance required before the improvement can be built.
    #[serde(default)]
    pub needed_advance: AdvanceId,
    /// Percentage bonus applied to the city's gold share.
    #[serde(default)]
    pub comm_bonus: u32,
    /// Percentage bonus applied to the city's science share.
    #[serde(default)]
    pub science_bonus: u32,
    /// Culture points produced every turn.
    #[serde(default)]
    pub culture: u32,
    /// Capability flags.
    #[serde(default)]
    pub flags: ImprovementFlags,
}

/// Static description of a form of government.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Government {
    /// Identifier of the government.
    pub id: GovernmentId,
    /// Display name.
    pub name: String,
    /// Advance required before the government can be adopted.
    #[serde(default)]
    pub needed_advance: AdvanceId,
    /// Military units supported for free nationally.
    pub free_units: u32,
    /// Additional free military units per city.
    #[serde(default)]
    pub city_units: u32,
    /// Gold paid per military unit beyond the free allowance.
    pub unit_cost: u32,
    /// Tile yield above which a penalty applies; zero disables the cap.
    #[serde(default)]
    pub production_cap: u32,
}

/// Special map resource that some units need access to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier of the resource.
    pub id: ResourceId,
    /// Display name.
    pub name: String,
    /// Advance required before the resource can be exploited.
    #[serde(default)]
    pub needed_advance: AdvanceId,
}

/// Numeric tunables that shape the pace of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTunables {
    /// Road steps granted per regular move point.
    pub road_moves: u32,
    /// Food consumed per citizen every turn.
    pub food_eaten_per_citizen: u32,
    /// Food box size per citizen; a city of size `n` grows at `(n + 1) * box`.
    pub food_box_per_citizen: u32,
    /// Worker turns needed to irrigate a tile.
    pub irrigation_turns: u32,
    /// Worker turns needed to mine a tile.
    pub mine_turns: u32,
    /// Worker turns needed to build a road.
    pub road_turns: u32,
}

impl Default for RuleTunables {
    fn default() -> Self {
        Self {
            road_moves: 3,
            food_eaten_per_citizen: 2,
            food_box_per_citizen: 10,
            irrigation_turns: 3,
            mine_turns: 4,
            road_turns: 2,
        }
    }
}

/// Complete rule set consulted by every civilization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rules {
    units: BTreeMap<UnitKindId, UnitConfig>,
    advances: BTreeMap<AdvanceId, Advance>,
    improvements: BTreeMap<ImprovementId, CityImprovement>,
    governments: BTreeMap<GovernmentId, Government>,
    resources: BTreeMap<ResourceId, Resource>,
    tunables: RuleTunables,
}

impl Rules {
    /// Creates an empty rule set with the provided tunables.
    #[must_use]
    pub fn new(tunables: RuleTunables) -> Self {
        Self {
            tunables,
            ..Self::default()
        }
    }

    /// Registers a unit configuration, replacing any previous entry with the same id.
    pub fn insert_unit(&mut self, config: UnitConfig) {
        let _ = self.units.insert(config.id, config);
    }

    /// Registers an advance, replacing any previous entry with the same id.
    pub fn insert_advance(&mut self, advance: Advance) {
        let _ = self.advances.insert(advance.id, advance);
    }

    /// Registers a city improvement, replacing any previous entry with the same id.
    pub fn insert_improvement(&mut self, improvement: CityImprovement) {
        let _ = self.improvements.insert(improvement.id, improvement);
    }

    /// Registers a government, replacing any previous entry with the same id.
    pub fn insert_government(&mut self, government: Government) {
        let _ = self.governments.insert(government.id, government);
    }

    /// Registers a map resource, replacing any previous entry with the same id.
    pub fn insert_resource(&mut self, resource: Resource) {
        let _ = self.resources.insert(resource.id, resource);
    }

    /// Looks up a unit configuration.
    #[must_use]
    pub fn unit(&self, id: UnitKindId) -> Option<&UnitConfig> {
        self.units.get(&id)
    }

    /// Unit configurations in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &UnitConfig> {
        self.units.values()
    }

    /// Looks up an advance. The [`AdvanceId::NONE`] sentinel never resolves.
    #[must_use]
    pub fn advance(&self, id: AdvanceId) -> Option<&Advance> {
        self.advances.get(&id)
    }

    /// Advances in ascending id order.
    pub fn advances(&self) -> impl Iterator<Item = &Advance> {
        self.advances.values()
    }

    /// Looks up a city improvement.
    #[must_use]
    pub fn improvement(&self, id: ImprovementId) -> Option<&CityImprovement> {
        self.improvements.get(&id)
    }

    /// City improvements in ascending id order.
    pub fn improvements(&self) -> impl Iterator<Item = &CityImprovement> {
        self.improvements.values()
    }

    /// Looks up a government.
    #[must_use]
    pub fn government(&self, id: GovernmentId) -> Option<&Government> {
        self.governments.get(&id)
    }

    /// Governments in ascending id order.
    pub fn governments(&self) -> impl Iterator<Item = &Government> {
        self.governments.values()
    }

    /// Looks up a map resource.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    /// Numeric tunables.
    #[must_use]
    pub const fn tunables(&self) -> &RuleTunables {
        &self.tunables
    }
}
