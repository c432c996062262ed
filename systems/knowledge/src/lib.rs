#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-civilization fog of war and remembered land ownership.
//!
//! Visibility is reference counted: every observer that reveals a square must
//! later shade the same square. A tile stays [`FogLevel::Visible`] while at
//! least one observer covers it and falls back to [`FogLevel::Remembered`]
//! afterwards. The ownership cache is only refreshed by [`KnowledgeLayer::reveal`]
//! and survives any amount of shading.

use civsim_core::{CivId, FogLevel, GameMap, Tile};

/// Fog grid plus the last land owner observed on each tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeLayer {
    width: i32,
    height: i32,
    observers: Vec<u16>,
    seen: Vec<bool>,
    known_owners: Vec<Option<CivId>>,
}

impl KnowledgeLayer {
    /// Creates a layer sized to the map where nothing has been seen yet.
    #[must_use]
    pub fn new<M: GameMap + ?Sized>(map: &M) -> Self {
        Self::with_dimensions(map.size_x(), map.size_y())
    }

    /// Creates an unseen layer with explicit dimensions.
    #[must_use]
    pub fn with_dimensions(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let count = usize::try_from(i64::from(width) * i64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            observers: vec![0; count],
            seen: vec![false; count],
            known_owners: vec![None; count],
        }
    }

    /// Adds an observer over the square of the given radius and snapshots land owners.
    pub fn reveal<M: GameMap + ?Sized>(&mut self, map: &M, center: Tile, radius: i32) {
        for tile in square(center, radius) {
            let wrapped = map.wrap(tile);
            let Some(index) = self.index(wrapped) else {
                continue;
            };
            self.observers[index] = self.observers[index].saturating_add(1);
            self.seen[index] = true;
            self.known_owners[index] = map.land_owner(wrapped);
        }
    }

    /// Removes an observer from the square of the given radius.
    ///
    /// Tiles nobody observes any more become remembered; the ownership cache is kept.
    pub fn shade<M: GameMap + ?Sized>(&mut self, map: &M, center: Tile, radius: i32) {
        for tile in square(center, radius) {
            if let Some(index) = self.index(map.wrap(tile)) {
                self.observers[index] = self.observers[index].saturating_sub(1);
            }
        }
    }

    /// Fog state of an already wrapped tile; out-of-range tiles are unseen.
    #[must_use]
    pub fn fog_at(&self, tile: Tile) -> FogLevel {
        match self.index(tile) {
            Some(index) if self.observers[index] > 0 => FogLevel::Visible,
            Some(index) if self.seen[index] => FogLevel::Remembered,
            _ => FogLevel::Unseen,
        }
    }

    /// Land owner recorded the last time the already wrapped tile was revealed.
    #[must_use]
    pub fn known_land_owner(&self, tile: Tile) -> Option<CivId> {
        self.index(tile).and_then(|index| self.known_owners[index])
    }

    /// Number of tiles that have ever been seen.
    #[must_use]
    pub fn explored_tiles(&self) -> usize {
        self.seen.iter().filter(|seen| **seen).count()
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        if tile.x() < 0 || tile.y() < 0 || tile.x() >= self.width || tile.y() >= self.height {
            return None;
        }
        let row = usize::try_from(tile.y()).ok()?;
        let column = usize::try_from(tile.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}

fn square(center: Tile, radius: i32) -> impl Iterator<Item = Tile> {
    (-radius..=radius).flat_map(move |dy| {
        (-radius..=radius).map(move |dx| Tile::new(center.x() + dx, center.y() + dy))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_layer_is_unseen_and_unowned() {
        let layer = KnowledgeLayer::with_dimensions(4, 4);

        assert_eq!(layer.fog_at(Tile::new(1, 1)), FogLevel::Unseen);
        assert_eq!(layer.known_land_owner(Tile::new(1, 1)), None);
        assert_eq!(layer.fog_at(Tile::new(-1, 9)), FogLevel::Unseen);
        assert_eq!(layer.explored_tiles(), 0);
    }
}
