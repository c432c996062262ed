use civsim_core::{CivId, FogLevel, GameMap, Tile};
use civsim_grid_map::{terrain::GRASSLAND, GridMap};
use civsim_system_knowledge::KnowledgeLayer;

fn map() -> GridMap {
    GridMap::filled(10, 6, true, GRASSLAND)
}

#[test]
fn reveal_then_shade_leaves_tiles_remembered() {
    let mut map = map();
    map.set_land_owner(Tile::new(4, 3), Some(CivId::new(2)));
    let mut layer = KnowledgeLayer::new(&map);

    layer.reveal(&map, Tile::new(4, 3), 1);
    assert_eq!(layer.fog_at(Tile::new(5, 4)), FogLevel::Visible);

    layer.shade(&map, Tile::new(4, 3), 1);
    assert_eq!(layer.fog_at(Tile::new(5, 4)), FogLevel::Remembered);
    assert_eq!(layer.fog_at(Tile::new(6, 3)), FogLevel::Unseen);
    assert_eq!(layer.known_land_owner(Tile::new(4, 3)), Some(CivId::new(2)));
}

#[test]
fn ownership_cache_survives_changes_outside_visibility() {
    let mut map = map();
    map.set_land_owner(Tile::new(2, 2), Some(CivId::new(1)));
    let mut layer = KnowledgeLayer::new(&map);

    layer.reveal(&map, Tile::new(2, 2), 0);
    layer.shade(&map, Tile::new(2, 2), 0);
    map.set_land_owner(Tile::new(2, 2), Some(CivId::new(3)));

    assert_eq!(layer.known_land_owner(Tile::new(2, 2)), Some(CivId::new(1)));
    assert_eq!(map.land_owner(Tile::new(2, 2)), Some(CivId::new(3)));

    layer.reveal(&map, Tile::new(2, 2), 0);
    assert_eq!(layer.known_land_owner(Tile::new(2, 2)), Some(CivId::new(3)));
}

#[test]
fn overlapping_observers_keep_shared_tiles_visible() {
    let map = map();
    let mut layer = KnowledgeLayer::new(&map);

    layer.reveal(&map, Tile::new(3, 3), 1);
    layer.reveal(&map, Tile::new(4, 3), 1);
    layer.shade(&map, Tile::new(3, 3), 1);

    assert_eq!(layer.fog_at(Tile::new(4, 3)), FogLevel::Visible);
    assert_eq!(layer.fog_at(Tile::new(2, 3)), FogLevel::Remembered);
}

#[test]
fn city_founding_sequence_keeps_inner_ring_visible() {
    let map = map();
    let mut layer = KnowledgeLayer::new(&map);
    let city = Tile::new(5, 3);

    layer.reveal(&map, city, 2);
    layer.shade(&map, city, 2);
    layer.reveal(&map, city, 1);

    assert_eq!(layer.fog_at(Tile::new(6, 4)), FogLevel::Visible);
    assert_eq!(layer.fog_at(Tile::new(7, 5)), FogLevel::Remembered);
    assert_eq!(layer.explored_tiles(), 25);
}

#[test]
fn reveal_wraps_horizontally_and_clips_vertically() {
    let map = map();
    let mut layer = KnowledgeLayer::new(&map);

    layer.reveal(&map, Tile::new(0, 0), 1);

    assert_eq!(layer.fog_at(Tile::new(9, 1)), FogLevel::Visible);
    assert_eq!(layer.fog_at(Tile::new(9, 5)), FogLevel::Unseen);
    assert_eq!(layer.explored_tiles(), 6);
}
