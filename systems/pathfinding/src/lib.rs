#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Best-first search over the 8-connected tile grid.
//!
//! A single A* routine ([`search`]) is parameterised by a [`SearchStrategy`]
//! supplying neighbours, step costs and the heuristic, plus a goal predicate.
//! The concrete strategies cover unit routing towards a fixed tile, nearest
//! tile matching a predicate, unconstrained crow-flight reachability and road
//! connectivity inside a civilization's own land.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use civsim_core::{CivId, FogLevel, GameMap, Tile, UnitConfig};

/// Knowledge a civilization contributes to constrained searches.
pub trait Territory {
    /// Civilization performing the search.
    fn civ_id(&self) -> CivId;

    /// Fog state of an already wrapped tile.
    fn fog_at(&self, tile: Tile) -> FogLevel;

    /// Reports whether remembered land ownership forbids entering the wrapped tile.
    fn blocked_by_land(&self, tile: Tile) -> bool;
}

/// Pluggable behaviour of the generic search.
pub trait SearchStrategy {
    /// Appends the tiles reachable in one step from `tile`.
    fn neighbors(&self, tile: Tile, out: &mut Vec<Tile>);

    /// Cost of stepping from `from` to the adjacent `to`.
    fn cost(&self, from: Tile, to: Tile) -> u32;

    /// Estimated remaining cost from `tile`.
    fn heuristic(&self, tile: Tile) -> u32;
}

#[derive(Debug)]
struct OpenNode {
    estimate: u32,
    travelled: u32,
    tile: Tile,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, u64, Tile) {
        (self.estimate, self.travelled, self.tie, self.tile)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest estimate first.
        other.key().cmp(&self.key())
    }
}

/// Runs A* from `start` until a tile satisfying `is_goal` is popped.
///
/// Returns the tiles from `start` to the goal inclusive, or an empty vector
/// when every reachable tile was expanded without meeting the goal. Each tile
/// is settled at most once, so the search ends on any strategy whose
/// neighbourhood is finite.
pub fn search<S, G>(strategy: &S, start: Tile, mut is_goal: G) -> Vec<Tile>
where
    S: SearchStrategy + ?Sized,
    G: FnMut(Tile) -> bool,
{
    let mut open = BinaryHeap::new();
    let mut travelled: HashMap<Tile, u32> = HashMap::new();
    let mut came_from: HashMap<Tile, Tile> = HashMap::new();
    let mut neighbors = Vec::with_capacity(8);
    let mut tie: u64 = 0;

    let _ = travelled.insert(start, 0);
    open.push(OpenNode {
        estimate: strategy.heuristic(start),
        travelled: 0,
        tile: start,
        tie,
    });

    while let Some(node) = open.pop() {
        if travelled.get(&node.tile) != Some(&node.travelled) {
            continue;
        }
        if is_goal(node.tile) {
            return reconstruct(&came_from, start, node.tile);
        }

        neighbors.clear();
        strategy.neighbors(node.tile, &mut neighbors);
        for next in neighbors.drain(..) {
            let step = strategy.cost(node.tile, next);
            let tentative = node.travelled.saturating_add(step);
            if travelled
                .get(&next)
                .is_some_and(|known| tentative >= *known)
            {
                continue;
            }
            let _ = travelled.insert(next, tentative);
            let _ = came_from.insert(next, node.tile);
            tie += 1;
            open.push(OpenNode {
                estimate: tentative.saturating_add(strategy.heuristic(next)),
                travelled: tentative,
                tile: next,
                tie,
            });
        }
    }

    Vec::new()
}

fn reconstruct(came_from: &HashMap<Tile, Tile>, start: Tile, goal: Tile) -> Vec<Tile> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(previous) = came_from.get(&current) else {
            break;
        };
        current = *previous;
        path.push(current);
    }
    path.reverse();
    path
}

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

fn grid_neighbors<M: GameMap + ?Sized>(map: &M, tile: Tile) -> impl Iterator<Item = Tile> + '_ {
    DIRECTIONS.iter().filter_map(move |(dx, dy)| {
        let next = map.wrap(Tile::new(tile.x() + dx, tile.y() + dy));
        map.contains(next).then_some(next)
    })
}

/// Neighbour rule shared by the constrained strategies.
#[derive(Clone, Copy, Debug)]
struct Constraints<'a, M: ?Sized, T: ?Sized> {
    map: &'a M,
    territory: &'a T,
    unit: &'a UnitConfig,
    ignore_enemy: bool,
}

impl<M, T> Constraints<'_, M, T>
where
    M: GameMap + ?Sized,
    T: Territory + ?Sized,
{
    fn push_neighbors(&self, tile: Tile, out: &mut Vec<Tile>) {
        for next in grid_neighbors(self.map, tile) {
            if self.map.move_cost(self.unit, next).is_none() {
                continue;
            }
            let fog = self.territory.fog_at(next);
            if fog == FogLevel::Unseen {
                continue;
            }
            let open = !self.territory.blocked_by_land(next)
                && (fog == FogLevel::Remembered || self.free_of_foreign_units(next));
            if open || self.ignore_enemy {
                out.push(next);
            }
        }
    }

    fn free_of_foreign_units(&self, tile: Tile) -> bool {
        self.map
            .units_on_spot(tile)
            .first()
            .map_or(true, |unit| unit.civ == self.territory.civ_id())
    }
}

/// Routes a unit to a fixed tile using terrain costs and a Manhattan heuristic.
///
/// The heuristic ignores wrapping and diagonal steps, so it is an estimate
/// rather than a strict lower bound.
#[derive(Clone, Copy, Debug)]
pub struct RouteToGoal<'a, M: ?Sized, T: ?Sized> {
    constraints: Constraints<'a, M, T>,
    goal: Tile,
}

impl<M, T> SearchStrategy for RouteToGoal<'_, M, T>
where
    M: GameMap + ?Sized,
    T: Territory + ?Sized,
{
    fn neighbors(&self, tile: Tile, out: &mut Vec<Tile>) {
        self.constraints.push_neighbors(tile, out);
    }

    fn cost(&self, _from: Tile, to: Tile) -> u32 {
        self.constraints
            .map
            .move_cost(self.constraints.unit, to)
            .unwrap_or(u32::MAX)
    }

    fn heuristic(&self, tile: Tile) -> u32 {
        tile.manhattan_distance(self.goal)
    }
}

/// Uniform-cost search for the closest tile matching a predicate.
#[derive(Clone, Copy, Debug)]
pub struct NearestMatching<'a, M: ?Sized, T: ?Sized> {
    constraints: Constraints<'a, M, T>,
}

impl<M, T> SearchStrategy for NearestMatching<'_, M, T>
where
    M: GameMap + ?Sized,
    T: Territory + ?Sized,
{
    fn neighbors(&self, tile: Tile, out: &mut Vec<Tile>) {
        self.constraints.push_neighbors(tile, out);
    }

    fn cost(&self, _from: Tile, _to: Tile) -> u32 {
        1
    }

    fn heuristic(&self, _tile: Tile) -> u32 {
        0
    }
}

/// Uniform-cost search over the bare grid, blind to terrain and knowledge.
#[derive(Clone, Copy, Debug)]
pub struct CrowFlight<'a, M: ?Sized> {
    map: &'a M,
}

impl<M: GameMap + ?Sized> SearchStrategy for CrowFlight<'_, M> {
    fn neighbors(&self, tile: Tile, out: &mut Vec<Tile>) {
        out.extend(grid_neighbors(self.map, tile));
    }

    fn cost(&self, _from: Tile, _to: Tile) -> u32 {
        1
    }

    fn heuristic(&self, _tile: Tile) -> u32 {
        0
    }
}

/// Uniform-cost search following roads through a civilization's own land.
///
/// Tiles accepted by `terminal` may be entered without a road, so a road that
/// ends next to a target still reaches it.
#[derive(Clone, Copy, Debug)]
pub struct AlongRoads<'a, M: ?Sized, F> {
    map: &'a M,
    civ: CivId,
    terminal: F,
}

impl<M, F> SearchStrategy for AlongRoads<'_, M, F>
where
    M: GameMap + ?Sized,
    F: Fn(Tile) -> bool,
{
    fn neighbors(&self, tile: Tile, out: &mut Vec<Tile>) {
        for next in grid_neighbors(self.map, tile) {
            if self.map.land_owner(next) != Some(self.civ) {
                continue;
            }
            if self.map.road_between(tile, next) || (self.terminal)(next) {
                out.push(next);
            }
        }
    }

    fn cost(&self, _from: Tile, _to: Tile) -> u32 {
        1
    }

    fn heuristic(&self, _tile: Tile) -> u32 {
        0
    }
}

/// Path a unit of type `unit` would take from `start` to `goal`.
pub fn path_to<M, T>(
    map: &M,
    territory: &T,
    unit: &UnitConfig,
    ignore_enemy: bool,
    start: Tile,
    goal: Tile,
) -> Vec<Tile>
where
    M: GameMap + ?Sized,
    T: Territory + ?Sized,
{
    let goal = map.wrap(goal);
    let strategy = RouteToGoal {
        constraints: Constraints {
            map,
            territory,
            unit,
            ignore_enemy,
        },
        goal,
    };
    search(&strategy, map.wrap(start), |tile| tile == goal)
}

/// Shortest step-count path from `start` to the nearest tile accepted by `is_goal`.
pub fn path_to_nearest<M, T, G>(
    map: &M,
    territory: &T,
    unit: &UnitConfig,
    ignore_enemy: bool,
    start: Tile,
    is_goal: G,
) -> Vec<Tile>
where
    M: GameMap + ?Sized,
    T: Territory + ?Sized,
    G: FnMut(Tile) -> bool,
{
    let strategy = NearestMatching {
        constraints: Constraints {
            map,
            territory,
            unit,
            ignore_enemy,
        },
    };
    search(&strategy, map.wrap(start), is_goal)
}

/// Grid-distance path to the nearest tile accepted by `is_goal`, ignoring terrain and knowledge.
pub fn crow_path_to_nearest<M, G>(map: &M, start: Tile, is_goal: G) -> Vec<Tile>
where
    M: GameMap + ?Sized,
    G: FnMut(Tile) -> bool,
{
    search(&CrowFlight { map }, map.wrap(start), is_goal)
}

/// Road path inside `civ`'s land from `start` to the nearest tile accepted by `is_goal`.
pub fn path_along_roads<M, G>(map: &M, civ: CivId, start: Tile, is_goal: G) -> Vec<Tile>
where
    M: GameMap + ?Sized,
    G: Fn(Tile) -> bool,
{
    let strategy = AlongRoads {
        map,
        civ,
        terminal: &is_goal,
    };
    search(&strategy, map.wrap(start), &is_goal)
}
