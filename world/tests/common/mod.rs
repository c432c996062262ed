#![allow(dead_code)]

use civsim_core::{
    Advance, AdvanceId, CityImprovement, CivId, Color, Government, GovernmentId, ImprovementFlags,
    ImprovementId, RuleTunables, Rules, UnitConfig, UnitFlags, UnitKindId,
};
use civsim_grid_map::GridMap;
use civsim_world::{Civilization, CivilizationConfig};

pub const SETTLERS: UnitKindId = UnitKindId::new(1);
pub const WARRIORS: UnitKindId = UnitKindId::new(2);
pub const WORKERS: UnitKindId = UnitKindId::new(3);
pub const TRIREME: UnitKindId = UnitKindId::new(4);

pub const BARRACKS: ImprovementId = ImprovementId::new(1);
pub const GRANARY: ImprovementId = ImprovementId::new(2);
pub const PALACE: ImprovementId = ImprovementId::new(3);

pub const DESPOTISM: GovernmentId = GovernmentId::new(1);

pub fn unit(id: UnitKindId, name: &str, strength: u32, cost: u32) -> UnitConfig {
    UnitConfig {
        id,
        name: name.to_owned(),
        max_moves: 1,
        max_strength: strength,
        production_cost: cost,
        population_cost: 0,
        needed_advance: AdvanceId::NONE,
        carry_units: 0,
        needed_resources: Vec::new(),
        flags: UnitFlags::default(),
    }
}

pub fn improvement(
    id: ImprovementId,
    name: &str,
    cost: u32,
    flags: ImprovementFlags,
) -> CityImprovement {
    CityImprovement {
        id,
        name: name.to_owned(),
        cost,
        needed_advance: AdvanceId::NONE,
        comm_bonus: 0,
        science_bonus: 0,
        culture: 1,
        flags,
    }
}

/// Small rule set: free-upkeep despotism, two land units, a worker, a boat and three buildings.
pub fn rules(tunables: RuleTunables) -> Rules {
    let mut rules = Rules::new(tunables);

    let mut settlers = unit(SETTLERS, "Settlers", 0, 1);
    settlers.population_cost = 1;
    settlers.flags.settler = true;
    rules.insert_unit(settlers);
    rules.insert_unit(unit(WARRIORS, "Warriors", 1, 1));
    let mut workers = unit(WORKERS, "Workers", 0, 1);
    workers.flags.worker = true;
    rules.insert_unit(workers);
    let mut trireme = unit(TRIREME, "Trireme", 1, 4);
    trireme.max_moves = 3;
    trireme.carry_units = 1;
    trireme.flags.sea = true;
    rules.insert_unit(trireme);

    rules.insert_improvement(improvement(
        BARRACKS,
        "Barracks",
        0,
        ImprovementFlags {
            barracks: true,
            ..ImprovementFlags::default()
        },
    ));
    rules.insert_improvement(improvement(
        GRANARY,
        "Granary",
        0,
        ImprovementFlags {
            granary: true,
            ..ImprovementFlags::default()
        },
    ));
    rules.insert_improvement(improvement(
        PALACE,
        "Palace",
        0,
        ImprovementFlags {
            palace: true,
            ..ImprovementFlags::default()
        },
    ));

    rules.insert_government(Government {
        id: DESPOTISM,
        name: "Despotism".to_owned(),
        needed_advance: AdvanceId::NONE,
        free_units: 3,
        city_units: 0,
        unit_cost: 5,
        production_cap: 0,
    });
    rules
}

pub fn with_advances(mut rules: Rules, advances: &[Advance]) -> Rules {
    for advance in advances {
        rules.insert_advance(advance.clone());
    }
    rules
}

pub fn set_government(rules: &mut Rules, free_units: u32, unit_cost: u32) {
    rules.insert_government(Government {
        id: DESPOTISM,
        name: "Despotism".to_owned(),
        needed_advance: AdvanceId::NONE,
        free_units,
        city_units: 0,
        unit_cost,
        production_cap: 0,
    });
}

pub fn civilization(id: u32, minor: bool, map: &GridMap) -> Civilization {
    Civilization::new(
        CivilizationConfig {
            id: CivId::new(id),
            name: format!("Civ {id}"),
            color: Color::from_rgb(10, 20, 30),
            city_names: vec!["Alpha".to_owned(), "Beta".to_owned()],
            government: DESPOTISM,
            minor,
        },
        map,
    )
}
