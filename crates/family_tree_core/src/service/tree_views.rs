//! Read-only projections over the family tree store.
//!
//! # Responsibility
//! - Provide the display ordering used by member lists.
//! - Filter hidden members and their edges out of canvas projections.
//! - Expose per-member connection lookups for member cards.
//!
//! # Invariants
//! - Projections never mutate the store, except `HiddenSet::toggle` which
//!   delegates the hide flow's full teardown to the store.
//! - The hidden set is presentation state and is never persisted.

use crate::model::member::{Member, MemberId};
use crate::repo::slot_repo::SlotStorage;
use crate::service::tree_store::FamilyTreeStore;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Orders members for display: owner profile first, then by total connection
/// weight descending, then by age descending.
///
/// The sort is stable, so remaining ties keep insertion order.
pub fn display_order<'a>(profile: Option<&'a Member>, members: &'a [Member]) -> Vec<&'a Member> {
    let mut ordered: Vec<&Member> = members.iter().collect();
    ordered.sort_by(|left, right| compare_for_display(left, right));

    let mut result = Vec::with_capacity(ordered.len() + 1);
    result.extend(profile);
    result.extend(ordered);
    result
}

/// [`display_order`] over a store's current state.
pub fn store_display_order<S: SlotStorage>(store: &FamilyTreeStore<S>) -> Vec<&Member> {
    display_order(store.user_profile(), store.members())
}

fn compare_for_display(left: &Member, right: &Member) -> Ordering {
    right
        .total_connections()
        .cmp(&left.total_connections())
        .then_with(|| right.age.cmp(&left.age))
}

/// Member ids excluded from canvas rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenSet {
    ids: HashSet<MemberId>,
}

impl HiddenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide(&mut self, id: MemberId) -> bool {
        self.ids.insert(id)
    }

    pub fn show(&mut self, id: MemberId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flips visibility of `id`. Hiding also tears down every edge of the
    /// member in the store so no dangling line remains.
    ///
    /// Returns `true` when the member is hidden after the call.
    pub fn toggle<S: SlotStorage>(&mut self, id: MemberId, store: &mut FamilyTreeStore<S>) -> bool {
        if self.ids.remove(&id) {
            return false;
        }
        self.ids.insert(id);
        store.remove_connections_for_member(id);
        true
    }
}

/// Keeps members that are not hidden, preserving input order.
pub fn visible_members<'a>(ordered: &[&'a Member], hidden: &HiddenSet) -> Vec<&'a Member> {
    ordered
        .iter()
        .copied()
        .filter(|member| !hidden.contains(member.id))
        .collect()
}

/// One undirected edge between two visible members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView {
    pub from: MemberId,
    pub to: MemberId,
    /// Number of parallel lines to draw.
    pub weight: u8,
}

/// Edges between visible members, one entry per unordered pair.
///
/// Edges are reported from the endpoint that comes first in owner-then-
/// insertion order; edges to unknown ids are skipped.
pub fn visible_edges<S: SlotStorage>(store: &FamilyTreeStore<S>, hidden: &HiddenSet) -> Vec<EdgeView> {
    let mut seen: HashSet<(MemberId, MemberId)> = HashSet::new();
    let mut edges = Vec::new();
    for member in store.all_members().filter(|member| !hidden.contains(member.id)) {
        for peer in member.connections() {
            if hidden.contains(*peer) || !store.contains(*peer) {
                continue;
            }
            let key = if member.id < *peer {
                (member.id, *peer)
            } else {
                (*peer, member.id)
            };
            if seen.insert(key) {
                edges.push(EdgeView {
                    from: member.id,
                    to: *peer,
                    weight: member.connection_count(*peer),
                });
            }
        }
    }
    edges
}

/// A peer as listed on a member card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedMember<'a> {
    pub member: &'a Member,
    pub weight: u8,
    pub is_profile: bool,
}

/// Peers of `id` in link order. Unknown peers are skipped.
pub fn connected_members<S: SlotStorage>(
    store: &FamilyTreeStore<S>,
    id: MemberId,
) -> Vec<ConnectedMember<'_>> {
    let Some(member) = store.member(id) else {
        return Vec::new();
    };
    member
        .connections()
        .iter()
        .filter_map(|peer_id| {
            store.member(*peer_id).map(|peer| ConnectedMember {
                member: peer,
                weight: member.connection_count(*peer_id),
                is_profile: store.is_profile(*peer_id),
            })
        })
        .collect()
}

/// Total connection weight per member, owner profile included.
pub fn connection_counts<S: SlotStorage>(store: &FamilyTreeStore<S>) -> HashMap<MemberId, u32> {
    store
        .all_members()
        .map(|member| (member.id, member.total_connections()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{display_order, HiddenSet};
    use crate::model::member::Member;
    use crate::model::relationship::Relationship;
    use uuid::Uuid;

    #[test]
    fn profile_leads_even_without_connections() {
        let profile = Member::new("Me", 20, "👤", Relationship::SelfProfile);
        let busy = Member::new("Busy", 80, "👴", Relationship::Grandparent)
            .with_connections([Uuid::new_v4(), Uuid::new_v4()]);
        let members = vec![busy];

        let ordered = display_order(Some(&profile), &members);
        assert_eq!(ordered[0].id, profile.id);
        assert_eq!(ordered[1].id, members[0].id);
    }

    #[test]
    fn hide_and_show_report_membership_changes() {
        let mut hidden = HiddenSet::new();
        let id = Uuid::new_v4();
        assert!(hidden.hide(id));
        assert!(!hidden.hide(id));
        assert!(hidden.contains(id));
        assert!(hidden.show(id));
        assert!(hidden.is_empty());
    }
}
