//! Family tree store: the owner of every member and edge.
//!
//! # Responsibility
//! - Hold the member collection, the owner profile and canvas positions.
//! - Apply create/update/delete/connect/disconnect with symmetric edges.
//! - Persist full state through a [`SlotStorage`] port after each mutation.
//!
//! # Invariants
//! - After any public call returns, `a.connection_count(b) ==
//!   b.connection_count(a)` for every pair touched by that call.
//! - Two-sided edge updates commit both endpoints or neither.
//! - Unknown ids turn mutations into silent no-ops; nothing is created.
//! - Persistence failures never roll back in-memory state.

use crate::config::TreeStoreConfig;
use crate::model::member::{Member, MemberId};
use crate::model::relationship::{resolve_relation_labels, RelationLabel, Relationship};
use crate::repo::slot_repo::{SlotStorage, StorageError, StorageSlot};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Free-form canvas coordinates of one member card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

impl CanvasPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Completed mutation, delivered to subscribers after persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChange {
    MemberAdded(MemberId),
    MemberUpdated(MemberId),
    MemberDeleted(MemberId),
    ProfileSet(MemberId),
    Connected { a: MemberId, b: MemberId },
    Disconnected { a: MemberId, b: MemberId },
    /// Every edge between the pair was removed regardless of weight.
    PairSevered { a: MemberId, b: MemberId },
    /// Every edge incident to the member was removed.
    ConnectionsCleared(MemberId),
    PositionUpdated(MemberId),
    DanglingEdgesPruned(usize),
}

/// Handle returned by [`FamilyTreeStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChangeListener = Box<dyn FnMut(&TreeChange)>;

/// Failure while writing state through the storage port.
#[derive(Debug)]
pub enum PersistError {
    Encode {
        slot: StorageSlot,
        source: serde_json::Error,
    },
    Storage(StorageError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode { slot, source } => write!(f, "failed to encode slot `{slot}`: {source}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode { source, .. } => Some(source),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for PersistError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

const STATE_SLOTS: [StorageSlot; 3] = StorageSlot::ALL;
/// Written together after every member or profile mutation, so a slot left
/// stale by a failed write is repaired by the next successful one.
const GRAPH_SLOTS: &[StorageSlot] = &[StorageSlot::Members, StorageSlot::UserProfile];

/// Explicit store handle over one family graph.
pub struct FamilyTreeStore<S: SlotStorage> {
    storage: S,
    config: TreeStoreConfig,
    members: Vec<Member>,
    user_profile: Option<Member>,
    positions: HashMap<MemberId, CanvasPosition>,
    listeners: Vec<(SubscriptionId, ChangeListener)>,
    next_subscription: u64,
}

impl<S: SlotStorage> FamilyTreeStore<S> {
    /// Loads persisted state from `storage`.
    ///
    /// Unreadable or undecodable slots are logged and treated as empty.
    pub fn open(storage: S, config: TreeStoreConfig) -> Self {
        let members: Vec<Member> = load_slot(&storage, StorageSlot::Members).unwrap_or_default();
        let user_profile: Option<Member> = load_slot(&storage, StorageSlot::UserProfile);
        let positions: HashMap<MemberId, CanvasPosition> =
            load_slot(&storage, StorageSlot::MemberPositions).unwrap_or_default();

        let mut store = Self {
            storage,
            config,
            members,
            user_profile,
            positions,
            listeners: Vec::new(),
            next_subscription: 0,
        };

        if store.config.prune_dangling_on_load {
            let pruned = store.prune_edges_to_unknown_ids();
            if pruned > 0 {
                warn!("event=tree_load module=service status=repaired pruned_edges={pruned}");
                store.persist(GRAPH_SLOTS);
            }
        }

        info!(
            "event=tree_load module=service status=ok member_count={} has_profile={} position_count={}",
            store.members.len(),
            store.user_profile.is_some(),
            store.positions.len()
        );
        store
    }

    /// Opens an empty store with default configuration.
    pub fn with_defaults(storage: S) -> Self {
        Self::open(storage, TreeStoreConfig::default())
    }

    pub fn config(&self) -> &TreeStoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Non-owner members in insertion (persisted) order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn user_profile(&self) -> Option<&Member> {
        self.user_profile.as_ref()
    }

    /// Owner profile first, then members in insertion order.
    pub fn all_members(&self) -> impl Iterator<Item = &Member> {
        self.user_profile.iter().chain(self.members.iter())
    }

    /// Looks up a member by id, including the owner profile.
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        match &self.user_profile {
            Some(profile) if profile.id == id => Some(profile),
            _ => self.members.iter().find(|member| member.id == id),
        }
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.member(id).is_some()
    }

    pub fn is_profile(&self, id: MemberId) -> bool {
        self.user_profile
            .as_ref()
            .is_some_and(|profile| profile.id == id)
    }

    /// Edge weight from `a` to `b`, 0 when either is unknown or unlinked.
    pub fn connection_count(&self, a: MemberId, b: MemberId) -> u8 {
        self.member(a)
            .map(|member| member.connection_count(b))
            .unwrap_or(0)
    }

    pub fn positions(&self) -> &HashMap<MemberId, CanvasPosition> {
        &self.positions
    }

    pub fn position(&self, id: MemberId) -> Option<CanvasPosition> {
        self.positions.get(&id).copied()
    }

    /// Registers a listener called after every completed mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&TreeChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Appends a member to the collection.
    ///
    /// Ids must be unique; a colliding id is ignored and returns `false`.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.contains(member.id) {
            warn!(
                "event=member_add module=service status=skip reason=id_collision member_id={}",
                member.id
            );
            return false;
        }
        let id = member.id;
        self.members.push(member);
        debug!("event=member_add module=service status=ok member_id={id}");
        self.finish(TreeChange::MemberAdded(id), GRAPH_SLOTS);
        true
    }

    /// Replaces the stored member with the same id wholesale.
    ///
    /// No-op when the id is not in the member collection.
    pub fn update_member(&mut self, member: Member) -> bool {
        let Some(slot) = self.members.iter_mut().find(|stored| stored.id == member.id) else {
            debug!(
                "event=member_update module=service status=skip reason=not_found member_id={}",
                member.id
            );
            return false;
        };
        let id = member.id;
        *slot = member;
        self.finish(TreeChange::MemberUpdated(id), GRAPH_SLOTS);
        true
    }

    /// Removes a member and its canvas position.
    ///
    /// With `delete_teardown` enabled every peer edge to the member is removed
    /// first. The owner profile cannot be deleted.
    pub fn delete_member(&mut self, id: MemberId) -> bool {
        let Some(index) = self.members.iter().position(|member| member.id == id) else {
            debug!(
                "event=member_delete module=service status=skip reason=not_found member_id={id}"
            );
            return false;
        };

        if self.config.delete_teardown {
            self.unlink_everywhere(id);
        }
        self.members.remove(index);
        self.positions.remove(&id);

        info!(
            "event=member_delete module=service status=ok member_id={id} teardown={}",
            self.config.delete_teardown
        );
        self.finish(TreeChange::MemberDeleted(id), &STATE_SLOTS);
        true
    }

    /// Replaces the owner profile wholesale. The role is forced to `Self`.
    pub fn set_user_profile(&mut self, mut profile: Member) {
        profile.relationship = Relationship::SelfProfile;
        let id = profile.id;
        self.user_profile = Some(profile);
        self.finish(TreeChange::ProfileSet(id), GRAPH_SLOTS);
    }

    /// Links `a` and `b`, or reinforces their link, on both sides at once.
    ///
    /// Relation labels for the pair are resolved; they only rewrite roles when
    /// `apply_resolved_labels` is enabled, first label onto `a`, second onto
    /// `b`.
    pub fn connect(&mut self, a: MemberId, b: MemberId) -> bool {
        let Some((mut first, mut second)) = self.pair_snapshot(a, b, "connect") else {
            return false;
        };

        let involves_owner = self.is_profile(a) || self.is_profile(b);
        let (label_a, label_b) =
            resolve_relation_labels(first.relationship, second.relationship, involves_owner);
        debug!(
            "event=tree_connect module=service status=resolved label_a={label_a} label_b={label_b} applied={}",
            self.config.apply_resolved_labels
        );

        let linked_first = first.add_connection(b);
        let linked_second = second.add_connection(a);
        let mut changed = linked_first || linked_second;
        if self.config.apply_resolved_labels {
            changed |= self.apply_label(&mut first, label_a);
            changed |= self.apply_label(&mut second, label_b);
        }
        if !changed {
            return false;
        }

        self.commit_pair(first, second);
        self.finish(TreeChange::Connected { a, b }, GRAPH_SLOTS);
        true
    }

    /// Weakens the `a`-`b` link by one on both sides; weight 1 unlinks.
    pub fn disconnect(&mut self, a: MemberId, b: MemberId) -> bool {
        let changed = self.apply_pair(a, b, "disconnect", Member::remove_connection);
        if changed {
            self.finish(TreeChange::Disconnected { a, b }, GRAPH_SLOTS);
        }
        changed
    }

    /// Removes the `a`-`b` link on both sides regardless of weight.
    pub fn remove_all_connections_between(&mut self, a: MemberId, b: MemberId) -> bool {
        let changed = self.apply_pair(a, b, "sever", Member::remove_all_connections);
        if changed {
            self.finish(TreeChange::PairSevered { a, b }, GRAPH_SLOTS);
        }
        changed
    }

    /// Full teardown: clears the member's own edges and removes it from
    /// every peer, the owner profile included.
    ///
    /// Peers holding a dangling reference to an unknown `id` are cleaned too.
    pub fn remove_connections_for_member(&mut self, id: MemberId) -> bool {
        let changed = self.unlink_everywhere(id);
        if changed {
            self.finish(TreeChange::ConnectionsCleared(id), GRAPH_SLOTS);
        }
        changed
    }

    /// Records where a member card sits on the canvas.
    ///
    /// Non-finite coordinates are rejected: they cannot round-trip through
    /// the positions slot.
    pub fn update_position(&mut self, id: MemberId, position: CanvasPosition) -> bool {
        if !position.is_finite() {
            debug!(
                "event=position_update module=service status=skip reason=non_finite member_id={id}"
            );
            return false;
        }
        if !self.contains(id) {
            return false;
        }
        if self.positions.get(&id) == Some(&position) {
            return false;
        }
        self.positions.insert(id, position);
        self.finish(
            TreeChange::PositionUpdated(id),
            &[StorageSlot::MemberPositions],
        );
        true
    }

    /// Removes edges that point at ids no longer present anywhere.
    ///
    /// Returns the number of removed edge entries.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let pruned = self.prune_edges_to_unknown_ids();
        if pruned > 0 {
            self.finish(TreeChange::DanglingEdgesPruned(pruned), GRAPH_SLOTS);
        }
        pruned
    }

    /// Writes every slot, surfacing the first failure.
    pub fn flush(&self) -> Result<(), PersistError> {
        for slot in STATE_SLOTS {
            self.write_slot(slot)?;
        }
        Ok(())
    }

    fn pair_snapshot(
        &self,
        a: MemberId,
        b: MemberId,
        operation: &'static str,
    ) -> Option<(Member, Member)> {
        if a == b {
            debug!("event=tree_{operation} module=service status=skip reason=same_member");
            return None;
        }
        match (self.member(a), self.member(b)) {
            (Some(first), Some(second)) => Some((first.clone(), second.clone())),
            _ => {
                debug!("event=tree_{operation} module=service status=skip reason=not_found");
                None
            }
        }
    }

    /// Mutates copies of both endpoints and commits them together.
    fn apply_pair(
        &mut self,
        a: MemberId,
        b: MemberId,
        operation: &'static str,
        edit: fn(&mut Member, MemberId) -> bool,
    ) -> bool {
        let Some((mut first, mut second)) = self.pair_snapshot(a, b, operation) else {
            return false;
        };
        let changed_first = edit(&mut first, b);
        let changed_second = edit(&mut second, a);
        if !changed_first && !changed_second {
            return false;
        }
        self.commit_pair(first, second);
        true
    }

    fn commit_pair(&mut self, first: Member, second: Member) {
        self.commit(first);
        self.commit(second);
    }

    fn commit(&mut self, member: Member) {
        if let Some(profile) = self.user_profile.as_mut() {
            if profile.id == member.id {
                *profile = member;
                return;
            }
        }
        if let Some(slot) = self.members.iter_mut().find(|stored| stored.id == member.id) {
            *slot = member;
        }
    }

    fn apply_label(&self, member: &mut Member, label: RelationLabel) -> bool {
        if self.is_profile(member.id) {
            return false;
        }
        match label.as_relationship() {
            Some(role) if role != member.relationship => {
                member.relationship = role;
                true
            }
            _ => false,
        }
    }

    fn unlink_everywhere(&mut self, id: MemberId) -> bool {
        let mut changed = false;
        for member in self.members.iter_mut() {
            changed |= if member.id == id {
                member.clear_connections()
            } else {
                member.remove_all_connections(id)
            };
        }
        if let Some(profile) = self.user_profile.as_mut() {
            changed |= if profile.id == id {
                profile.clear_connections()
            } else {
                profile.remove_all_connections(id)
            };
        }
        changed
    }

    fn prune_edges_to_unknown_ids(&mut self) -> usize {
        let known: HashSet<MemberId> = self.all_members().map(|member| member.id).collect();
        let mut pruned = 0;
        for member in self.members.iter_mut().chain(self.user_profile.iter_mut()) {
            let own_id = member.id;
            let stale: Vec<MemberId> = member
                .connections()
                .iter()
                .copied()
                .filter(|peer| *peer == own_id || !known.contains(peer))
                .collect();
            for peer in stale {
                if member.remove_all_connections(peer) {
                    pruned += 1;
                }
            }
        }
        pruned
    }

    fn finish(&mut self, change: TreeChange, slots: &[StorageSlot]) {
        self.persist(slots);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    /// Best-effort write; failures are logged and dropped.
    fn persist(&self, slots: &[StorageSlot]) {
        for slot in slots {
            if let Err(err) = self.write_slot(*slot) {
                error!("event=tree_persist module=service status=error slot={slot} error={err}");
            }
        }
    }

    fn write_slot(&self, slot: StorageSlot) -> Result<(), PersistError> {
        let encoded = match slot {
            StorageSlot::Members => serde_json::to_string(&self.members),
            StorageSlot::UserProfile => match &self.user_profile {
                Some(profile) => serde_json::to_string(profile),
                None => return Ok(()),
            },
            StorageSlot::MemberPositions => serde_json::to_string(&self.positions),
        }
        .map_err(|source| PersistError::Encode { slot, source })?;
        self.storage.save_slot(slot, &encoded)?;
        Ok(())
    }
}

fn load_slot<T: DeserializeOwned>(storage: &impl SlotStorage, slot: StorageSlot) -> Option<T> {
    let payload = match storage.load_slot(slot) {
        Ok(Some(payload)) => payload,
        Ok(None) => return None,
        Err(err) => {
            warn!("event=tree_load module=service status=error slot={slot} error_code=read_failed error={err}");
            return None;
        }
    };
    match serde_json::from_str(&payload) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("event=tree_load module=service status=error slot={slot} error_code=decode_failed error={err}");
            None
        }
    }
}
