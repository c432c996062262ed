mod common;

use civsim_core::{
    CityRef, CivId, FogLevel, GameMap, LoadError, Message, MoveError, Relationship, ResourceId,
    RuleTunables, TerrainImprovement, Tile, UnitId,
};
use civsim_grid_map::{
    terrain::{GRASSLAND, OCEAN},
    GridMap, ResourceSpec,
};

use common::{civilization, rules, SETTLERS, TRIREME, WARRIORS, WORKERS};

fn land() -> GridMap {
    GridMap::filled(12, 12, false, GRASSLAND)
}

#[test]
fn units_light_up_their_surroundings_and_leave_memories() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");

    let id = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));

    assert_eq!(civ.fog_at(&map, Tile::new(5, 5)), FogLevel::Visible);
    assert_eq!(civ.fog_at(&map, Tile::new(6, 6)), FogLevel::Visible);
    assert_eq!(civ.fog_at(&map, Tile::new(7, 5)), FogLevel::Unseen);
    assert_eq!(civ.built_units().get(&WARRIORS), Some(&1));

    let removed = civ.remove_unit(&mut map, id).expect("unit existed");

    assert_eq!(removed.id, id);
    assert_eq!(civ.fog_at(&map, Tile::new(5, 5)), FogLevel::Remembered);
    assert!(map.units_on_spot(Tile::new(5, 5)).is_empty());
    assert_eq!(civ.lost_units().get(&WARRIORS), Some(&1));
    assert!(civ.remove_unit(&mut map, id).is_none());
}

#[test]
fn a_step_spends_the_move_and_updates_the_map() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));

    assert_eq!(
        civ.move_unit(&mut map, &rules, id, 0, 0, false),
        Err(MoveError::ZeroDisplacement)
    );
    assert_eq!(
        civ.move_unit(&mut map, &rules, id, 1, 0, false),
        Ok(Tile::new(6, 5))
    );

    assert!(map.units_on_spot(Tile::new(5, 5)).is_empty());
    assert_eq!(map.spot_owner(Tile::new(6, 5)), Some(CivId::new(1)));
    assert_eq!(civ.fog_at(&map, Tile::new(7, 5)), FogLevel::Visible);
    assert_eq!(civ.fog_at(&map, Tile::new(4, 5)), FogLevel::Remembered);
    assert_eq!(
        civ.move_unit(&mut map, &rules, id, 1, 0, false),
        Err(MoveError::NoMovesLeft)
    );

    civ.refill_moves(&mut map, &rules);
    assert!(civ.can_move_unit(&map, &rules, id, 1, 0).is_ok());
    assert_eq!(
        civ.can_move_unit(&map, &rules, UnitId::new(99), 1, 0),
        Err(MoveError::UnknownUnit(UnitId::new(99)))
    );
}

#[test]
fn moving_a_fortified_unit_breaks_its_fortification() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));

    assert!(civ.fortify_unit(id));
    assert!(civ.unit(id).is_some_and(|unit| unit.fortified));
    assert!(!civ.fortify_unit(UnitId::new(99)));

    assert_eq!(
        civ.move_unit(&mut map, &rules, id, 0, 1, false),
        Ok(Tile::new(5, 6))
    );
    assert!(civ.unit(id).is_some_and(|unit| !unit.fortified));
}

#[test]
fn roads_stretch_one_move_into_several_steps() {
    let mut map = land();
    for x in 2..7 {
        map.set_road(Tile::new(x, 5));
    }
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = civ.add_unit(&mut map, &warriors, Tile::new(2, 5));

    for expected in 3..6 {
        assert_eq!(
            civ.move_unit(&mut map, &rules, id, 1, 0, false),
            Ok(Tile::new(expected, 5))
        );
    }
    assert_eq!(
        civ.move_unit(&mut map, &rules, id, 1, 0, false),
        Err(MoveError::NoMovesLeft)
    );

    civ.refill_moves(&mut map, &rules);
    assert_eq!(
        civ.move_unit(&mut map, &rules, id, -1, 0, true),
        Ok(Tile::new(4, 5))
    );
    let unit = civ.unit(id).expect("unit exists");
    assert_eq!((unit.moves, unit.road_moves), (0, 0));
}

#[test]
fn water_and_peaceful_borders_stop_land_units() {
    let mut map = land();
    map.set_terrain(Tile::new(4, 5), OCEAN);
    map.set_land_owner(Tile::new(6, 5), Some(CivId::new(2)));
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));

    assert_eq!(
        civ.can_move_unit(&map, &rules, id, -1, 0),
        Err(MoveError::TerrainForbidden)
    );
    assert!(civ.can_move_unit(&map, &rules, id, 1, 0).is_ok());

    civ.set_peace(CivId::new(2));
    assert_eq!(
        civ.can_move_unit(&map, &rules, id, 1, 0),
        Err(MoveError::Blocked)
    );

    civ.set_war(CivId::new(2));
    assert!(civ.can_move_unit(&map, &rules, id, 1, 0).is_ok());
}

#[test]
fn foreign_units_block_the_destination() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut ours = civilization(1, false, &map);
    let mut theirs = civilization(2, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = ours.add_unit(&mut map, &warriors, Tile::new(5, 5));
    let _ = theirs.add_unit(&mut map, &warriors, Tile::new(5, 6));
    let _ = ours.add_unit(&mut map, &warriors, Tile::new(6, 5));

    assert_eq!(
        ours.can_move_unit(&map, &rules, id, 0, 1),
        Err(MoveError::Blocked)
    );
    assert!(ours.can_move_unit(&map, &rules, id, 1, 0).is_ok());
}

#[test]
fn carriers_take_their_cargo_along() {
    let mut map = GridMap::filled(12, 12, false, OCEAN);
    map.set_terrain(Tile::new(5, 5), GRASSLAND);
    map.set_terrain(Tile::new(1, 1), GRASSLAND);
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let trireme = rules.unit(TRIREME).cloned().expect("trireme");
    let boat = civ.add_unit(&mut map, &trireme, Tile::new(6, 5));
    let first = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));
    let second = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));
    let stranded = civ.add_unit(&mut map, &warriors, Tile::new(1, 1));

    assert_eq!(
        civ.load_unit(&mut map, &rules, stranded, boat),
        Err(LoadError::OutOfReach)
    );
    assert_eq!(
        civ.load_unit(&mut map, &rules, boat, first),
        Err(LoadError::NotLoadable)
    );
    civ.load_unit(&mut map, &rules, first, boat)
        .expect("adjacent unit boards");
    assert_eq!(
        civ.load_unit(&mut map, &rules, second, boat),
        Err(LoadError::CarrierFull)
    );

    let loaded = civ.unit(first).expect("loaded unit exists");
    assert_eq!(loaded.carried_by, Some(boat));
    assert_eq!(loaded.tile, Tile::new(6, 5));
    assert_eq!(map.units_on_spot(Tile::new(5, 5)).len(), 1);
    assert_eq!(map.units_on_spot(Tile::new(6, 5)).len(), 1);

    assert_eq!(
        civ.move_unit(&mut map, &rules, boat, 1, 0, false),
        Ok(Tile::new(7, 5))
    );
    assert_eq!(civ.unit(first).map(|unit| unit.tile), Some(Tile::new(7, 5)));

    let _ = civ.remove_unit(&mut map, boat);
    assert!(civ.unit(first).is_none());
    assert_eq!(civ.lost_units().get(&WARRIORS), Some(&1));
    assert_eq!(civ.lost_units().get(&TRIREME), Some(&1));
    assert!(map.units_on_spot(Tile::new(7, 5)).is_empty());
}

#[test]
fn moving_a_carried_unit_lands_it() {
    let mut map = GridMap::filled(12, 12, false, OCEAN);
    map.set_terrain(Tile::new(5, 5), GRASSLAND);
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let trireme = rules.unit(TRIREME).cloned().expect("trireme");
    let boat = civ.add_unit(&mut map, &trireme, Tile::new(6, 5));
    let passenger = civ.add_unit(&mut map, &warriors, Tile::new(5, 5));
    civ.load_unit(&mut map, &rules, passenger, boat)
        .expect("adjacent unit boards");

    assert_eq!(
        civ.move_unit(&mut map, &rules, passenger, -1, 0, false),
        Ok(Tile::new(5, 5))
    );

    assert_eq!(civ.unit(passenger).and_then(|unit| unit.carried_by), None);
    assert!(civ.unit(boat).is_some_and(|unit| unit.cargo.is_empty()));
    assert_eq!(map.units_on_spot(Tile::new(6, 5)).len(), 1);
    assert_eq!(map.units_on_spot(Tile::new(5, 5)).len(), 1);
}

#[test]
fn workers_finish_terrain_orders_over_several_turns() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let workers = rules.unit(WORKERS).cloned().expect("workers");
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let worker = civ.add_unit(&mut map, &workers, Tile::new(5, 5));
    let soldier = civ.add_unit(&mut map, &warriors, Tile::new(6, 5));

    let road = TerrainImprovement::Road;
    assert!(!civ.order_terrain_improvement(&rules, soldier, road));
    assert!(civ.order_terrain_improvement(&rules, worker, road));

    civ.refill_moves(&mut map, &rules);
    assert!(!map.has_improvement(Tile::new(5, 5), road));
    assert_eq!(civ.unit(worker).map(|unit| unit.moves), Some(0));

    civ.refill_moves(&mut map, &rules);
    assert!(map.has_improvement(Tile::new(5, 5), road));
    assert!(civ.unit(worker).is_some_and(|unit| unit.order.is_none()));

    civ.refill_moves(&mut map, &rules);
    assert_eq!(civ.unit(worker).map(|unit| unit.moves), Some(1));
}

#[test]
fn minor_civilizations_meet_everyone_at_war() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut major = civilization(1, false, &map);
    let mut minor = civilization(2, true, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let _ = major.add_unit(&mut map, &warriors, Tile::new(4, 3));
    let _ = minor.add_unit(&mut map, &warriors, Tile::new(3, 3));

    let seen = minor.check_discoveries(&map, Tile::new(3, 3), 1);

    assert_eq!(seen, vec![CivId::new(1)]);
    assert_eq!(minor.relationship(CivId::new(1)), Relationship::War);
    assert_eq!(major.relationship(CivId::new(2)), Relationship::Unknown);
    assert_eq!(
        minor.drain_messages(),
        vec![
            Message::CivDiscovered { civ: CivId::new(1) },
            Message::RelationshipChanged {
                civ: CivId::new(1),
                relationship: Relationship::War,
            },
        ]
    );

    let _ = major.check_discoveries(&map, Tile::new(4, 3), 1);
    assert_eq!(major.relationship(CivId::new(2)), Relationship::Peace);
    assert_eq!(minor.check_discoveries(&map, Tile::new(3, 3), 1).len(), 1);
    assert!(minor.messages().is_empty());
}

#[test]
fn elimination_clears_units_cities_and_land() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let settlers = rules.unit(SETTLERS).cloned().expect("settlers");
    let _ = civ.add_unit(&mut map, &settlers, Tile::new(2, 2));
    let city = civ.add_city(&mut map, &rules, Tile::new(8, 8));
    assert_eq!(map.land_owner(Tile::new(9, 9)), Some(CivId::new(1)));
    assert!(!civ.is_eliminated());

    civ.eliminate(&mut map);

    assert!(civ.is_eliminated());
    assert!(civ.city(city).is_none());
    assert_eq!(map.city_at(Tile::new(8, 8)), None);
    assert_eq!(map.land_owner(Tile::new(9, 9)), None);
    assert!(map.units_on_spot(Tile::new(2, 2)).is_empty());
    assert!(civ.worker_map().is_empty());
}

#[test]
fn a_minor_civilization_falls_with_its_last_unit() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut minor = civilization(3, true, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = minor.add_unit(&mut map, &warriors, Tile::new(2, 2));
    assert!(!minor.is_eliminated());

    let _ = minor.remove_unit(&mut map, id);

    assert!(minor.is_eliminated());
}

#[test]
fn captured_cities_change_hands_with_fresh_ids() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut loser = civilization(1, false, &map);
    let mut winner = civilization(2, false, &map);
    let _ = winner.add_city(&mut map, &rules, Tile::new(2, 2));
    let lost = loser.add_city(&mut map, &rules, Tile::new(8, 8));

    let city = loser
        .remove_city(&mut map, &rules, lost, false)
        .expect("city existed");
    assert_eq!(
        map.city_at(Tile::new(8, 8)),
        Some(CityRef {
            civ: CivId::new(1),
            city: lost,
        })
    );

    let adopted = winner.adopt_city(&mut map, &rules, city);

    assert_eq!(adopted.get(), 2);
    assert_eq!(
        map.city_at(Tile::new(8, 8)),
        Some(CityRef {
            civ: CivId::new(2),
            city: adopted,
        })
    );
    let city = winner.city(adopted).expect("adopted city");
    assert_eq!(city.civ, CivId::new(2));
    assert_eq!(map.land_owner(Tile::new(8, 8)), Some(CivId::new(2)));
    assert_eq!(map.land_owner(Tile::new(9, 9)), Some(CivId::new(1)));
    assert!(loser.cities().is_empty());
    assert_eq!(winner.fog_at(&map, Tile::new(10, 10)), FogLevel::Remembered);
}

#[test]
fn coastal_cities_and_road_linked_resources_unlock_units() {
    let mut map = land();
    let iron = ResourceId::new(1);
    map.define_resource(
        iron,
        ResourceSpec {
            needed_advance: civsim_core::AdvanceId::NONE,
            bonus: civsim_core::Yield::new(0, 1, 0),
        },
    );
    map.place_resource(Tile::new(9, 5), iron);
    map.set_terrain(Tile::new(4, 4), OCEAN);
    let mut rules = rules(RuleTunables::default());
    rules.insert_resource(civsim_core::Resource {
        id: iron,
        name: "Iron".to_owned(),
        needed_advance: civsim_core::AdvanceId::NONE,
    });
    let mut legion = common::unit(civsim_core::UnitKindId::new(10), "Legion", 2, 4);
    legion.needed_resources = vec![iron];
    rules.insert_unit(legion.clone());
    let trireme = rules.unit(TRIREME).cloned().expect("trireme");

    let mut civ = civilization(1, false, &map);
    let coastal = civ.add_city(&mut map, &rules, Tile::new(5, 5));
    map.claim_land(Tile::new(5, 5), 4, CivId::new(1));
    let city = civ.city(coastal).cloned().expect("city exists");

    assert!(civ.can_build_unit(&map, &rules, &trireme, &city));
    assert!(!civ.can_build_unit(&map, &rules, &legion, &city));

    for x in 6..9 {
        map.set_road(Tile::new(x, 5));
    }
    assert!(civ.has_access_to_resource(&map, &city, iron));
    assert!(civ.can_build_unit(&map, &rules, &legion, &city));

    let inland = civ.add_city(&mut map, &rules, Tile::new(9, 9));
    let inland = civ.city(inland).cloned().expect("city exists");
    assert!(!civ.can_build_unit(&map, &rules, &trireme, &inland));
}

#[test]
fn unit_paths_follow_known_terrain() {
    let mut map = land();
    let rules = rules(RuleTunables::default());
    let mut civ = civilization(1, false, &map);
    let warriors = rules.unit(WARRIORS).cloned().expect("warriors");
    let id = civ.add_unit(&mut map, &warriors, Tile::new(2, 2));

    let path = civ.unit_path(&map, &rules, id, Tile::new(3, 3), false);

    assert_eq!(path, vec![Tile::new(2, 2), Tile::new(3, 3)]);
    let stranger = civ.unit_path(&map, &rules, UnitId::new(42), Tile::new(3, 3), false);
    assert!(stranger.is_empty());
}
