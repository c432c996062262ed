//! Typed rejections for player-initiated requests.

use thiserror::Error;

use crate::{UnitId, UnitKindId};

/// Reasons a commerce allocation change may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// Gold and science shares together exceed ten tenths.
    #[error("gold ({gold}) and science ({science}) allocation exceed ten tenths")]
    ExceedsTotal {
        /// Requested gold share in tenths.
        gold: u32,
        /// Requested science share in tenths.
        science: u32,
    },
}

/// Reasons a unit move may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    /// No unit with the provided identifier exists.
    #[error("unit {0:?} does not exist")]
    UnknownUnit(UnitId),
    /// The unit's configuration is missing from the rules.
    #[error("unit configuration {0:?} is not defined")]
    UnknownKind(UnitKindId),
    /// The unit has neither moves nor road moves left this turn.
    #[error("unit has no moves left")]
    NoMovesLeft,
    /// The requested displacement was zero.
    #[error("move does not change the unit's position")]
    ZeroDisplacement,
    /// The destination terrain cannot be entered by the unit.
    #[error("terrain does not allow the move")]
    TerrainForbidden,
    /// A foreign unit or peaceful foreign land blocks the destination.
    #[error("destination is blocked by foreign units or land")]
    Blocked,
}

/// Reasons a unit cannot board a carrier.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// No unit with the provided identifier exists.
    #[error("unit {0:?} does not exist")]
    UnknownUnit(UnitId),
    /// The carrier's configuration is missing from the rules.
    #[error("unit configuration {0:?} is not defined")]
    UnknownKind(UnitKindId),
    /// The carrier has no free cargo slot.
    #[error("carrier is full")]
    CarrierFull,
    /// The unit is too far away from the carrier.
    #[error("carrier is not adjacent")]
    OutOfReach,
    /// The unit is already carried or carries units itself.
    #[error("unit cannot be loaded")]
    NotLoadable,
}
