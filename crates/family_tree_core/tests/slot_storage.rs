use family_tree_core::db::{open_db, open_db_in_memory};
use family_tree_core::{
    CanvasPosition, FamilyTreeStore, Member, Relationship, SlotStorage, SqliteSlotStorage,
    StorageError, StorageSlot,
};
use rusqlite::Connection;

#[test]
fn missing_slot_loads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteSlotStorage::try_new(&conn).unwrap();

    for slot in StorageSlot::ALL {
        assert_eq!(storage.load_slot(slot).unwrap(), None);
    }
}

#[test]
fn save_replaces_previous_payload() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteSlotStorage::try_new(&conn).unwrap();

    storage.save_slot(StorageSlot::Members, "[]").unwrap();
    storage
        .save_slot(StorageSlot::Members, r#"[{"id":"x"}]"#)
        .unwrap();

    assert_eq!(
        storage.load_slot(StorageSlot::Members).unwrap().as_deref(),
        Some(r#"[{"id":"x"}]"#)
    );
    assert_eq!(storage.load_slot(StorageSlot::UserProfile).unwrap(), None);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteSlotStorage::try_new(&conn)
        .err()
        .expect("raw connection must be rejected");

    assert!(matches!(
        err,
        StorageError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn store_state_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("family_tree.db");

    let (profile_id, kid_id) = {
        let conn = open_db(&path).unwrap();
        let storage = SqliteSlotStorage::try_new(&conn).unwrap();
        let mut store = FamilyTreeStore::with_defaults(storage);

        let profile = Member::new("Me", 34, "🧑", Relationship::SelfProfile);
        let kid = Member::new("Kid", 5, "👶", Relationship::Child);
        let ids = (profile.id, kid.id);
        store.set_user_profile(profile);
        store.add_member(kid);
        store.connect(ids.0, ids.1);
        store.connect(ids.1, ids.0);
        store.update_position(ids.1, CanvasPosition::new(120.0, 48.5));
        ids
    };

    let conn = open_db(&path).unwrap();
    let storage = SqliteSlotStorage::try_new(&conn).unwrap();
    let store = FamilyTreeStore::with_defaults(storage);

    assert_eq!(store.user_profile().unwrap().id, profile_id);
    assert_eq!(store.members().len(), 1);
    assert_eq!(store.connection_count(profile_id, kid_id), 2);
    assert_eq!(store.connection_count(kid_id, profile_id), 2);
    assert_eq!(
        store.position(kid_id),
        Some(CanvasPosition::new(120.0, 48.5))
    );
}
