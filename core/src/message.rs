//! Observer-facing event stream emitted by civilizations.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{AdvanceId, CityId, CivId, ImprovementId, Relationship, UnitId, UnitKindId};

/// Events a civilization reports to observers such as a UI or a log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// A city finished building a unit.
    NewUnit {
        /// City that produced the unit.
        city: CityId,
        /// Configuration of the produced unit.
        kind: UnitKindId,
        /// Identifier allocated to the new unit.
        unit: UnitId,
    },
    /// Research completed an advance. Advance zero is reported once when research starts.
    AdvanceDiscovered {
        /// Advance that was discovered.
        advance: AdvanceId,
    },
    /// Another civilization was contacted for the first time.
    CivDiscovered {
        /// Civilization that was contacted.
        civ: CivId,
    },
    /// A city finished building an improvement.
    ImprovementCompleted {
        /// City that completed the improvement.
        city: CityId,
        /// Improvement that was completed.
        improvement: ImprovementId,
    },
    /// A unit was disbanded because the treasury could not pay for it.
    UnitDisbanded {
        /// Unit that was disbanded.
        unit: UnitId,
    },
    /// The stored relationship towards another civilization changed.
    RelationshipChanged {
        /// Civilization the relationship refers to.
        civ: CivId,
        /// Newly stored relationship.
        relationship: Relationship,
    },
    /// The anarchy period following a change of government ended.
    AnarchyOver,
}

/// First-in first-out queue of [`Message`] values awaiting an observer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageQueue {
    pending: VecDeque<Message>,
}

impl MessageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at the back of the queue.
    pub fn push(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    /// Removes and returns the oldest message, if any.
    pub fn pop(&mut self) -> Option<Message> {
        self.pending.pop_front()
    }

    /// Removes every pending message in the order they were emitted.
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.pending.drain(..)
    }

    /// Iterator over the pending messages without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.pending.iter()
    }

    /// Number of pending messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no message is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
