#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the civsim engine.
//!
//! This crate defines the vocabulary that connects the authoritative
//! civilization state, the pure systems and the adapters. Identifiers and
//! coordinates are plain value types, configuration records are immutable
//! data loaded once by the surrounding application, and the [`map::GameMap`]
//! trait describes the terrain store that every spatial operation consults.
//! Civilizations report what happened during a turn exclusively through the
//! [`Message`] queue.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

pub mod entities;
pub mod map;
pub mod rules;

mod error;
mod message;

pub use entities::{City, Production, TerrainOrder, Unit};
pub use error::{AllocationError, LoadError, MoveError};
pub use map::{CityRef, GameMap, TerrainImprovement, UnitRef};
pub use message::{Message, MessageQueue};
pub use rules::{
    Advance, CityImprovement, Government, ImprovementFlags, Resource, RuleTunables, Rules,
    UnitConfig, UnitFlags, MAX_PREREQUISITES,
};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier assigned to a civilization; doubles as its index in turn order.
    CivId
);
define_id!(
    /// Identifier of a unit, unique within its owning civilization and never reused.
    UnitId
);
define_id!(
    /// Identifier of a city, unique within its owning civilization and never reused.
    CityId
);
define_id!(
    /// Identifier of a unit configuration record.
    UnitKindId
);
define_id!(
    /// Identifier of a technology advance. Zero stands for "no advance".
    AdvanceId
);
define_id!(
    /// Identifier of a city improvement configuration record.
    ImprovementId
);
define_id!(
    /// Identifier of a government configuration record.
    GovernmentId
);
define_id!(
    /// Identifier of a special map resource.
    ResourceId
);
define_id!(
    /// Identifier of a terrain type reported by the map.
    TerrainId
);

impl AdvanceId {
    /// Sentinel meaning "no advance", which every civilization implicitly knows.
    pub const NONE: AdvanceId = AdvanceId(0);

    /// Reports whether the identifier is the "no advance" sentinel.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Location of a single map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    x: i32,
    y: i32,
}

impl Tile {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the tile displaced by the provided offset, without wrapping.
    #[must_use]
    pub const fn offset(self, offset: Offset) -> Tile {
        Tile::new(self.x + offset.dx, self.y + offset.dy)
    }

    /// Computes the Manhattan distance between two tiles, ignoring map wrapping.
    #[must_use]
    pub fn manhattan_distance(self, other: Tile) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Displacement relative to a tile, used for worked tiles around a city.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Offset {
    dx: i32,
    dy: i32,
}

impl Offset {
    /// Offset pointing at the anchor tile itself.
    pub const ORIGIN: Offset = Offset { dx: 0, dy: 0 };

    /// Creates a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal displacement.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical displacement.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Reports whether the offset points at the anchor tile.
    #[must_use]
    pub const fn is_origin(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Display color attached to a civilization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Diplomatic state one civilization holds towards another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// The other civilization has not been contacted.
    #[default]
    Unknown,
    /// Borders are respected and units do not fight.
    Peace,
    /// Units may attack and borders are not respected.
    War,
}

/// Visibility of a tile from a single civilization's perspective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FogLevel {
    /// The tile has never been seen.
    #[default]
    Unseen,
    /// The tile was seen before but nobody is watching it now.
    Remembered,
    /// At least one unit or city currently sees the tile.
    Visible,
}

/// Food, production and commerce produced by a tile or a city.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Yield {
    /// Food units.
    pub food: i32,
    /// Production (shield) units.
    pub production: i32,
    /// Commerce (trade) units.
    pub commerce: i32,
}

impl Yield {
    /// Creates a yield from its three components.
    #[must_use]
    pub const fn new(food: i32, production: i32, commerce: i32) -> Self {
        Self {
            food,
            production,
            commerce,
        }
    }
}

impl Add for Yield {
    type Output = Yield;

    fn add(self, rhs: Yield) -> Yield {
        Yield::new(
            self.food + rhs.food,
            self.production + rhs.production,
            self.commerce + rhs.commerce,
        )
    }
}

impl AddAssign for Yield {
    fn add_assign(&mut self, rhs: Yield) {
        *self = *self + rhs;
    }
}
