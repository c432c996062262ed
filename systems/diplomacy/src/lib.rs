#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! One civilization's view of every other civilization.
//!
//! Relations are one-sided: a civilization discovering another only updates
//! its own table. Every stored change is reported through the civilization's
//! [`MessageQueue`].

use std::collections::BTreeMap;

use civsim_core::{CivId, Message, MessageQueue, Relationship};
use tracing::info;

/// Diplomatic table held by a single civilization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relations {
    owner: CivId,
    minor: bool,
    states: BTreeMap<CivId, Relationship>,
}

impl Relations {
    /// Creates an empty table for `owner`; minor civilizations meet everyone at war.
    #[must_use]
    pub fn new(owner: CivId, minor: bool) -> Self {
        Self {
            owner,
            minor,
            states: BTreeMap::new(),
        }
    }

    /// Stored relationship towards `other`; always peace towards the owner itself.
    #[must_use]
    pub fn relationship(&self, other: CivId) -> Relationship {
        if other == self.owner {
            return Relationship::Peace;
        }
        self.states.get(&other).copied().unwrap_or_default()
    }

    /// Stores a relationship, reporting it only when the value changes.
    pub fn set_relationship(
        &mut self,
        other: CivId,
        relationship: Relationship,
        messages: &mut MessageQueue,
    ) {
        if other == self.owner || self.relationship(other) == relationship {
            return;
        }
        if relationship == Relationship::Unknown {
            let _ = self.states.remove(&other);
        } else {
            let _ = self.states.insert(other, relationship);
        }
        messages.push(Message::RelationshipChanged {
            civ: other,
            relationship,
        });
    }

    /// Records first contact with `other`; returns whether it was new.
    pub fn discover(&mut self, other: CivId, messages: &mut MessageQueue) -> bool {
        if other == self.owner || self.relationship(other) != Relationship::Unknown {
            return false;
        }
        messages.push(Message::CivDiscovered { civ: other });
        let initial = if self.minor {
            Relationship::War
        } else {
            Relationship::Peace
        };
        info!(civ = self.owner.get(), other = other.get(), ?initial, "first contact");
        self.set_relationship(other, initial, messages);
        true
    }

    /// Forgets `other`, returning the relationship to unknown.
    pub fn undiscover(&mut self, other: CivId, messages: &mut MessageQueue) {
        self.set_relationship(other, Relationship::Unknown, messages);
    }

    /// Declares war on `other`.
    pub fn set_war(&mut self, other: CivId, messages: &mut MessageQueue) {
        self.set_relationship(other, Relationship::War, messages);
    }

    /// Makes peace with `other`.
    pub fn set_peace(&mut self, other: CivId, messages: &mut MessageQueue) {
        self.set_relationship(other, Relationship::Peace, messages);
    }

    /// Civilizations that have been contacted, in id order.
    pub fn known(&self) -> impl Iterator<Item = (CivId, Relationship)> + '_ {
        self.states.iter().map(|(civ, state)| (*civ, *state))
    }
}
