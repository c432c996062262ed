//! Seeded procedural generation of playable grid maps.

use civsim_core::{GameMap, ResourceId, TerrainId, Tile};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    terrain::{FOREST, GRASSLAND, HILLS, MOUNTAINS, OCEAN, PLAINS, Surface},
    GridMap,
};

/// Parameters of the continent generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// Seed of the deterministic random stream.
    pub seed: u64,
    /// Share of land tiles in percent.
    pub land_percent: u32,
    /// Special resources scattered over land, cycled through in order.
    pub resources: Vec<ResourceId>,
}

impl GeneratorConfig {
    /// Creates a configuration with forty percent land and no resources.
    #[must_use]
    pub fn new(width: i32, height: i32, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            land_percent: 40,
            resources: Vec::new(),
        }
    }
}

/// Builds a horizontally wrapping map by growing continents from random seeds.
///
/// The same configuration always yields the same map.
#[must_use]
pub fn generate(config: &GeneratorConfig) -> GridMap {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut map = GridMap::filled(config.width, config.height, true, OCEAN);
    if config.width <= 0 || config.height <= 0 {
        return map;
    }

    let area = i64::from(config.width) * i64::from(config.height);
    let target = area * i64::from(config.land_percent.min(100)) / 100;
    let mut land = 0_i64;
    let mut attempts = 0_i64;
    let inland_rows = (config.height / 8).max(1)..(config.height - config.height / 8).max(2);

    while land < target && attempts < area * 8 {
        attempts += 1;
        let mut cursor = Tile::new(
            rng.gen_range(0..config.width),
            rng.gen_range(inland_rows.clone()),
        );
        for _ in 0..rng.gen_range(8..32) {
            if !map.contains(cursor) {
                break;
            }
            if map.terrain_at(cursor) == Some(OCEAN) {
                map.set_terrain(cursor, pick_land(&mut rng));
                land += 1;
            }
            cursor = map.wrap(Tile::new(
                cursor.x() + rng.gen_range(-1..=1),
                cursor.y() + rng.gen_range(-1..=1),
            ));
        }
    }

    if !config.resources.is_empty() {
        let mut placed = 0_usize;
        for y in 0..config.height {
            for x in 0..config.width {
                let tile = Tile::new(x, y);
                if map.surface(tile) == Some(Surface::Land) && rng.gen_ratio(1, 12) {
                    let resource = config.resources[placed % config.resources.len()];
                    map.place_resource(tile, resource);
                    placed += 1;
                }
            }
        }
    }

    map
}

fn pick_land(rng: &mut ChaCha8Rng) -> TerrainId {
    const WEIGHTED: [TerrainId; 10] = [
        GRASSLAND, GRASSLAND, GRASSLAND, PLAINS, PLAINS, PLAINS, FOREST, FOREST, HILLS, MOUNTAINS,
    ];
    *WEIGHTED.choose(rng).unwrap_or(&GRASSLAND)
}

/// Picks up to `count` land tiles at least `spacing` tiles apart (Chebyshev).
///
/// Candidates are shuffled with the provided seed so placement is reproducible.
#[must_use]
pub fn starting_places(map: &GridMap, count: usize, spacing: i32, seed: u64) -> Vec<Tile> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut candidates: Vec<Tile> = (0..map.size_y())
        .flat_map(|y| (0..map.size_x()).map(move |x| Tile::new(x, y)))
        .filter(|tile| {
            matches!(map.terrain_at(*tile), Some(GRASSLAND) | Some(PLAINS))
                && map.land_owner(*tile).is_none()
        })
        .collect();
    candidates.shuffle(&mut rng);

    let mut chosen: Vec<Tile> = Vec::with_capacity(count);
    for candidate in candidates {
        if chosen.len() == count {
            break;
        }
        let far_enough = chosen
            .iter()
            .all(|placed| chebyshev(map, *placed, candidate) >= spacing);
        if far_enough {
            chosen.push(candidate);
        }
    }
    chosen
}

fn chebyshev(map: &GridMap, a: Tile, b: Tile) -> i32 {
    let dx = (a.x() - b.x()).abs();
    let dx = dx.min(map.size_x() - dx);
    dx.max((a.y() - b.y()).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let config = GeneratorConfig::new(32, 20, 7);
        let first = generate(&config);
        let second = generate(&config);

        for y in 0..20 {
            for x in 0..32 {
                let tile = Tile::new(x, y);
                assert_eq!(first.terrain_at(tile), second.terrain_at(tile));
            }
        }
    }

    #[test]
    fn generation_produces_some_land() {
        let map = generate(&GeneratorConfig::new(32, 20, 3));
        let land = (0..20)
            .flat_map(|y| (0..32).map(move |x| Tile::new(x, y)))
            .filter(|tile| map.surface(*tile) == Some(Surface::Land))
            .count();

        assert!(land > 0);
    }

    #[test]
    fn starting_places_respect_spacing() {
        let map = GridMap::filled(30, 30, true, GRASSLAND);
        let places = starting_places(&map, 4, 6, 11);

        assert_eq!(places.len(), 4);
        for (index, a) in places.iter().enumerate() {
            for b in &places[index + 1..] {
                assert!(chebyshev(&map, *a, *b) >= 6);
            }
        }
    }
}
