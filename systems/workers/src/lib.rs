#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Assignment of map tiles to the cities drawing yield from them.
//!
//! Every city greedily picks tiles around it with [`next_good_resource_spot`].
//! The civilization-wide [`ResourceWorkerMap`] records which city works which
//! tile and [`rebuild_worker_map`] resolves overlapping claims until every tile
//! has at most one claimant.

use std::collections::{BTreeMap, BTreeSet};

use civsim_core::{AdvanceId, City, CityId, GameMap, Offset, Tile, Yield};
use tracing::debug;

/// Distance, per axis, of the farthest tile a city may work.
pub const WORK_RADIUS: i32 = 2;

/// Research state and government cap that shape tile yields.
#[derive(Clone, Copy, Debug)]
pub struct YieldRules<'a> {
    /// Advances researched by the civilization.
    pub researched: &'a BTreeSet<AdvanceId>,
    /// Production cap of the civilization's government.
    pub production_cap: u32,
}

/// Tile-to-city claims of a single civilization, keyed by wrapped tile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceWorkerMap {
    claims: BTreeMap<Tile, CityId>,
}

impl ResourceWorkerMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// City claiming the wrapped tile.
    #[must_use]
    pub fn claimant(&self, tile: Tile) -> Option<CityId> {
        self.claims.get(&tile).copied()
    }

    /// Records a claim unless another city already holds the tile; returns the holder on conflict.
    pub fn claim(&mut self, tile: Tile, city: CityId) -> Result<(), CityId> {
        match self.claims.get(&tile) {
            Some(holder) if *holder != city => Err(*holder),
            Some(_) => Ok(()),
            None => {
                let _ = self.claims.insert(tile, city);
                Ok(())
            }
        }
    }

    /// Reports whether `city` may start working the wrapped tile.
    #[must_use]
    pub fn available_to(&self, tile: Tile, city: CityId) -> bool {
        self.claimant(tile).map_or(true, |holder| holder == city)
    }

    /// Removes every claim.
    pub fn clear(&mut self) {
        self.claims.clear();
    }

    /// Claims ordered by tile.
    pub fn iter(&self) -> impl Iterator<Item = (Tile, CityId)> + '_ {
        self.claims.iter().map(|(tile, city)| (*tile, *city))
    }

    /// Number of claimed tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Reports whether no tile is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Sums the yield of the tiles the city currently works.
#[must_use]
pub fn total_resources<M: GameMap + ?Sized>(city: &City, map: &M, rules: YieldRules<'_>) -> Yield {
    city.worked.iter().fold(Yield::default(), |total, offset| {
        total
            + map.resources_on_spot(
                city.worked_tile(*offset),
                rules.researched,
                rules.production_cap,
            )
    })
}

/// Offsets a city may work, in scan order: rows top to bottom, columns left to right.
pub fn candidate_offsets() -> impl Iterator<Item = Offset> {
    (-WORK_RADIUS..=WORK_RADIUS).flat_map(|dy| {
        (-WORK_RADIUS..=WORK_RADIUS)
            .map(move |dx| Offset::new(dx, dy))
            .filter(|offset| {
                !offset.is_origin()
                    && !(offset.dx().abs() == WORK_RADIUS && offset.dy().abs() == WORK_RADIUS)
            })
    })
}

/// Picks the best tile the city could start working, or `None` when nothing is eligible.
///
/// Tiles covering the remaining food need (`size * 2 + 2` minus food already
/// worked) win first; once food is covered, production, then commerce, then
/// food break ties. Later candidates replace earlier ones on equal merit.
#[must_use]
pub fn next_good_resource_spot<M: GameMap + ?Sized>(
    city: &City,
    map: &M,
    workers: &ResourceWorkerMap,
    rules: YieldRules<'_>,
) -> Option<Offset> {
    let worked = total_resources(city, map, rules);
    let required_food = i64::from(city.size) * 2 + 2 - i64::from(worked.food);

    let mut best = None;
    let (mut opt_food, mut opt_prod, mut opt_comm) = (-1_i64, -1_i64, -1_i64);
    for offset in candidate_offsets() {
        if city.worked.contains(&offset) {
            continue;
        }
        let tile = map.wrap(city.worked_tile(offset));
        if map.terrain_at(tile).is_none()
            || map.land_owner(tile) != Some(city.civ)
            || !workers.available_to(tile, city.id)
        {
            continue;
        }

        let spot = map.resources_on_spot(tile, rules.researched, rules.production_cap);
        let (food, prod, comm) = (
            i64::from(spot.food),
            i64::from(spot.production),
            i64::from(spot.commerce),
        );
        let closes_deficit = food >= opt_food && opt_food < required_food;
        let better_surplus = food >= required_food
            && (prod > opt_prod || (prod == opt_prod && (comm > opt_comm || food > opt_food)));
        if closes_deficit || better_surplus {
            best = Some(offset);
            opt_food = food;
            opt_prod = prod;
            opt_comm = comm;
        }
    }
    best
}

/// Clears the city's worked tiles and refills them greedily, claiming each pick in `workers`.
pub fn assign_city_workers<M: GameMap + ?Sized>(
    city: &mut City,
    map: &M,
    workers: &mut ResourceWorkerMap,
    rules: YieldRules<'_>,
) {
    city.clear_workers();
    while let Some(offset) = next_good_resource_spot(city, map, workers, rules) {
        if !city.add_worker(offset) {
            break;
        }
        let _ = workers.claim(map.wrap(city.worked_tile(offset)), city.id);
    }
}

/// Rebuilds the claims of every city, reassigning conflicting cities until none remain.
///
/// Each pass claims every city tile, then each city's worked tiles in id
/// order. A city meeting a tile held by another city stops claiming and is
/// reassigned against the claims gathered so far, so its new picks cannot
/// collide with anything claimed in the pass. The following pass therefore
/// finds no conflict. Returns the number of passes taken.
pub fn rebuild_worker_map<M: GameMap + ?Sized>(
    cities: &mut BTreeMap<CityId, City>,
    map: &M,
    workers: &mut ResourceWorkerMap,
    rules: YieldRules<'_>,
) -> usize {
    let mut passes = 0;
    loop {
        passes += 1;
        workers.clear();
        for city in cities.values() {
            let _ = workers.claim(map.wrap(city.tile), city.id);
        }

        let mut conflicting = Vec::new();
        for city in cities.values() {
            for offset in &city.worked {
                let tile = map.wrap(city.worked_tile(*offset));
                if let Err(holder) = workers.claim(tile, city.id) {
                    debug!(
                        city = city.id.get(),
                        holder = holder.get(),
                        x = tile.x(),
                        y = tile.y(),
                        "worked tile conflict"
                    );
                    conflicting.push(city.id);
                    break;
                }
            }
        }

        if conflicting.is_empty() {
            return passes;
        }
        debug_assert!(passes < 2, "conflicts must be gone after one reassignment");

        for id in conflicting {
            if let Some(city) = cities.get_mut(&id) {
                assign_city_workers(city, map, workers, rules);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_skip_origin_and_corners_in_row_major_order() {
        let offsets: Vec<_> = candidate_offsets().collect();

        assert_eq!(offsets.len(), 20);
        assert_eq!(offsets.first(), Some(&Offset::new(-1, -2)));
        assert_eq!(offsets.last(), Some(&Offset::new(1, 2)));
        assert!(!offsets.contains(&Offset::ORIGIN));
        assert!(!offsets.contains(&Offset::new(2, -2)));
    }

    #[test]
    fn claims_conflict_only_between_cities() {
        let mut workers = ResourceWorkerMap::new();
        let tile = Tile::new(3, 3);

        assert_eq!(workers.claim(tile, CityId::new(1)), Ok(()));
        assert_eq!(workers.claim(tile, CityId::new(1)), Ok(()));
        assert_eq!(workers.claim(tile, CityId::new(2)), Err(CityId::new(1)));
        assert!(workers.available_to(tile, CityId::new(1)));
        assert!(!workers.available_to(tile, CityId::new(2)));
    }
}
