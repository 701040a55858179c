//! Member domain model.
//!
//! # Responsibility
//! - Define the canonical record for one person or pet in the family graph.
//! - Own the weighted adjacency list and its reinforcement rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another member.
//! - `connections` and the key set of `connection_weights` are the same set.
//! - Every stored weight is in `1..=MAX_CONNECTION_WEIGHT`; weight 0 is
//!   represented by absence.
//!
//! # See also
//! - service::tree_store for the symmetric two-sided updates.

use crate::model::relationship::Relationship;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every member, including the owner profile.
pub type MemberId = Uuid;

/// Upper bound for repeated linking between two members.
pub const MAX_CONNECTION_WEIGHT: u8 = 5;

/// Glyph used when a persisted record carries no emoji.
pub const DEFAULT_EMOJI: &str = "👤";

/// Avatar glyphs offered by member forms. Not enforced by the model.
pub const EMOJI_PALETTE: &[&str] = &[
    "👤", "👨", "👩", "👶", "👧", "👦", "👨‍🦰", "👩‍🦰", "👴", "👵", "🧑", "🧑‍🦰", "🧑‍🦱", "🧑‍🦳",
    "🧑‍🦲", "👨‍🦱", "👨‍🦳", "👨‍🦲", "👩‍🦱", "👩‍🦳", "👩‍🦲", "👱‍♂️", "👱‍♀️", "👲", "🧔", "🧔‍♂️",
    "🧔‍♀️", "👨‍👩‍👦", "👨‍👩‍👧", "👨‍👩‍👧‍👦", "👨‍👩‍👦‍👦", "👨‍👩‍👧‍👧", "🐕", "🐶", "🐩", "🐈", "🐱",
    "🐰", "🐇", "🐹", "🐦", "🦜", "🦮", "🐠", "🐟", "🐢",
];

/// Invariant violations reported by [`Member::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValidationError {
    /// Nil UUID is reserved and cannot identify a member.
    NilId,
    /// An id is listed in `connections` without a weight entry, or the reverse.
    WeightsOutOfSync(MemberId),
    /// Stored weight is outside `1..=MAX_CONNECTION_WEIGHT`.
    WeightOutOfRange { peer: MemberId, weight: u8 },
    /// Member lists itself as a connection.
    SelfConnection(MemberId),
}

impl Display for MemberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "member id must not be nil"),
            Self::WeightsOutOfSync(peer) => {
                write!(f, "connections and weights disagree for peer {peer}")
            }
            Self::WeightOutOfRange { peer, weight } => write!(
                f,
                "connection weight {weight} for peer {peer} must be in 1..={MAX_CONNECTION_WEIGHT}"
            ),
            Self::SelfConnection(id) => write!(f, "member {id} cannot connect to itself"),
        }
    }
}

impl Error for MemberValidationError {}

/// One node of the family graph: a person or a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MemberRecord", rename_all = "camelCase")]
pub struct Member {
    /// Stable id used by edges, positions and drag payloads.
    pub id: MemberId,
    pub name: String,
    pub age: u32,
    /// Avatar glyph, usually one of [`EMOJI_PALETTE`].
    pub emoji: String,
    pub relationship: Relationship,
    connections: Vec<MemberId>,
    connection_weights: HashMap<MemberId, u8>,
}

impl Member {
    /// Creates a member with a freshly generated id and no connections.
    pub fn new(
        name: impl Into<String>,
        age: u32,
        emoji: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, age, emoji, relationship)
    }

    /// Creates a member with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: MemberId,
        name: impl Into<String>,
        age: u32,
        emoji: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            emoji: emoji.into(),
            relationship,
            connections: Vec::new(),
            connection_weights: HashMap::new(),
        }
    }

    /// Seeds the adjacency list with weight 1 per listed peer.
    ///
    /// Duplicate ids collapse into one entry.
    pub fn with_connections(mut self, peers: impl IntoIterator<Item = MemberId>) -> Self {
        for peer in peers {
            if !self.connection_weights.contains_key(&peer) {
                self.connections.push(peer);
                self.connection_weights.insert(peer, 1);
            }
        }
        self
    }

    /// Peer ids in link order.
    pub fn connections(&self) -> &[MemberId] {
        &self.connections
    }

    /// Peer id to weight map, always in lockstep with [`Self::connections`].
    pub fn connection_weights(&self) -> &HashMap<MemberId, u8> {
        &self.connection_weights
    }

    /// Links `peer` with weight 1, or reinforces an existing link up to the cap.
    ///
    /// Returns `true` when the stored weight changed.
    pub fn add_connection(&mut self, peer: MemberId) -> bool {
        match self.connection_weights.get_mut(&peer) {
            None => {
                self.connections.push(peer);
                self.connection_weights.insert(peer, 1);
                true
            }
            Some(weight) if *weight < MAX_CONNECTION_WEIGHT => {
                *weight += 1;
                true
            }
            Some(_) => false,
        }
    }

    /// Weakens the link to `peer` by one; a weight-1 link is removed entirely.
    ///
    /// Returns `true` when the stored weight changed.
    pub fn remove_connection(&mut self, peer: MemberId) -> bool {
        match self.connection_weights.get(&peer).copied() {
            None => false,
            Some(weight) if weight > 1 => {
                self.connection_weights.insert(peer, weight - 1);
                true
            }
            Some(_) => self.remove_all_connections(peer),
        }
    }

    /// Removes the link to `peer` regardless of its weight.
    pub fn remove_all_connections(&mut self, peer: MemberId) -> bool {
        let had_weight = self.connection_weights.remove(&peer).is_some();
        let before = self.connections.len();
        self.connections.retain(|id| *id != peer);
        had_weight || self.connections.len() != before
    }

    /// Drops every link this member holds. Peers are not touched.
    pub fn clear_connections(&mut self) -> bool {
        let changed = !self.connections.is_empty() || !self.connection_weights.is_empty();
        self.connections.clear();
        self.connection_weights.clear();
        changed
    }

    /// Weight of the link to `peer`, 0 when absent.
    pub fn connection_count(&self, peer: MemberId) -> u8 {
        self.connection_weights.get(&peer).copied().unwrap_or(0)
    }

    pub fn is_connected_to(&self, peer: MemberId) -> bool {
        self.connection_weights.contains_key(&peer)
    }

    /// Sum of all link weights; primary key for display ordering.
    pub fn total_connections(&self) -> u32 {
        self.connection_weights
            .values()
            .map(|weight| u32::from(*weight))
            .sum()
    }

    /// Checks the adjacency invariants.
    ///
    /// # Errors
    /// - Returns the first violation found, in connection order.
    pub fn validate(&self) -> Result<(), MemberValidationError> {
        if self.id.is_nil() {
            return Err(MemberValidationError::NilId);
        }
        if self.connections.len() != self.connection_weights.len() {
            let orphan = self
                .connection_weights
                .keys()
                .find(|peer| !self.connections.contains(peer))
                .or_else(|| {
                    self.connections
                        .iter()
                        .find(|peer| !self.connection_weights.contains_key(peer))
                })
                .copied()
                .unwrap_or(self.id);
            return Err(MemberValidationError::WeightsOutOfSync(orphan));
        }
        for peer in &self.connections {
            if *peer == self.id {
                return Err(MemberValidationError::SelfConnection(self.id));
            }
            match self.connection_weights.get(peer) {
                None => return Err(MemberValidationError::WeightsOutOfSync(*peer)),
                Some(weight) if !(1..=MAX_CONNECTION_WEIGHT).contains(weight) => {
                    return Err(MemberValidationError::WeightOutOfRange {
                        peer: *peer,
                        weight: *weight,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Lenient wire shape used while decoding persisted members.
///
/// Older records carry only `connections`, or name the weight map
/// `connectionCounts`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberRecord {
    id: MemberId,
    name: String,
    age: u32,
    #[serde(default = "default_emoji")]
    emoji: String,
    relationship: Relationship,
    #[serde(default)]
    connections: Vec<MemberId>,
    #[serde(default, alias = "connectionCounts")]
    connection_weights: Option<HashMap<MemberId, i64>>,
}

fn default_emoji() -> String {
    DEFAULT_EMOJI.to_string()
}

impl From<MemberRecord> for Member {
    fn from(record: MemberRecord) -> Self {
        let mut member = Member::with_id(
            record.id,
            record.name,
            record.age,
            record.emoji,
            record.relationship,
        );
        let weights = record.connection_weights.unwrap_or_default();
        for peer in record.connections {
            if member.connection_weights.contains_key(&peer) {
                continue;
            }
            let weight = weights
                .get(&peer)
                .copied()
                .unwrap_or(1)
                .clamp(1, i64::from(MAX_CONNECTION_WEIGHT));
            member.connections.push(peer);
            // Clamped above, so the narrowing cannot truncate.
            member.connection_weights.insert(peer, weight as u8);
        }
        member
    }
}

#[cfg(test)]
mod tests {
    use super::{Member, MemberValidationError, MAX_CONNECTION_WEIGHT};
    use crate::model::relationship::Relationship;
    use uuid::Uuid;

    fn sample() -> Member {
        Member::new("Ada", 36, "👩", Relationship::Parent)
    }

    #[test]
    fn remove_connection_on_unknown_peer_is_noop() {
        let mut member = sample();
        assert!(!member.remove_connection(Uuid::new_v4()));
        assert!(member.connections().is_empty());
    }

    #[test]
    fn add_connection_stops_at_cap() {
        let mut member = sample();
        let peer = Uuid::new_v4();
        for _ in 0..MAX_CONNECTION_WEIGHT {
            assert!(member.add_connection(peer));
        }
        assert!(!member.add_connection(peer));
        assert_eq!(member.connection_count(peer), MAX_CONNECTION_WEIGHT);
        assert_eq!(member.connections(), &[peer]);
    }

    #[test]
    fn validate_rejects_self_connection() {
        let mut member = sample();
        let own_id = member.id;
        member.add_connection(own_id);
        assert_eq!(
            member.validate(),
            Err(MemberValidationError::SelfConnection(own_id))
        );
    }

    #[test]
    fn clear_connections_empties_both_sides_of_lockstep() {
        let mut member = sample().with_connections([Uuid::new_v4(), Uuid::new_v4()]);
        assert!(member.clear_connections());
        assert!(member.connections().is_empty());
        assert!(member.connection_weights().is_empty());
        assert!(!member.clear_connections());
    }
}
