//! Core domain logic for the family tree editor.
//! This crate is the single source of truth for relationship-graph invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::TreeStoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::member::{
    Member, MemberId, MemberValidationError, DEFAULT_EMOJI, EMOJI_PALETTE, MAX_CONNECTION_WEIGHT,
};
pub use model::relationship::{
    resolve_relation_labels, ParseRelationshipError, RelationLabel, Relationship,
};
pub use repo::slot_repo::{
    MemorySlotStorage, SlotStorage, SqliteSlotStorage, StorageError, StorageResult, StorageSlot,
};
pub use service::tree_store::{
    CanvasPosition, FamilyTreeStore, PersistError, SubscriptionId, TreeChange,
};
pub use service::tree_views::{
    connected_members, connection_counts, display_order, store_display_order, visible_edges,
    visible_members, ConnectedMember, EdgeView, HiddenSet,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
