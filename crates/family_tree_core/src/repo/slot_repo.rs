//! Keyed slot storage port and its SQLite/in-memory implementations.
//!
//! # Responsibility
//! - Persist opaque structured-text payloads under three fixed slot keys.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - A slot holds at most one payload; saving replaces it wholesale.
//! - Loading a slot that was never written returns `Ok(None)`.
//! - The port never interprets payloads; encoding is the store's concern.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Independently keyed persistence slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    /// Ordered collection of non-owner members.
    Members,
    /// Optional owner profile.
    UserProfile,
    /// Canvas position per member id.
    MemberPositions,
}

impl StorageSlot {
    pub const ALL: [StorageSlot; 3] = [
        StorageSlot::Members,
        StorageSlot::UserProfile,
        StorageSlot::MemberPositions,
    ];

    /// Stable storage key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::UserProfile => "userProfile",
            Self::MemberPositions => "memberPositions",
        }
    }
}

impl Display for StorageSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors from slot storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Backend refused the write.
    WriteRejected(StorageSlot),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "slot storage requires schema version {expected_version}, got {actual_version}"
            ),
            Self::WriteRejected(slot) => write!(f, "write rejected for slot `{slot}`"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Load/save port consumed by the family tree store.
pub trait SlotStorage {
    /// Reads the payload stored under `slot`, if any.
    fn load_slot(&self, slot: StorageSlot) -> StorageResult<Option<String>>;
    /// Replaces the payload stored under `slot`.
    fn save_slot(&self, slot: StorageSlot, payload: &str) -> StorageResult<()>;
}

impl<T: SlotStorage + ?Sized> SlotStorage for &T {
    fn load_slot(&self, slot: StorageSlot) -> StorageResult<Option<String>> {
        (**self).load_slot(slot)
    }

    fn save_slot(&self, slot: StorageSlot, payload: &str) -> StorageResult<()> {
        (**self).save_slot(slot, payload)
    }
}

/// SQLite-backed slot storage over the `storage_slots` table.
pub struct SqliteSlotStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlotStorage<'conn> {
    /// Creates storage from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> StorageResult<Self> {
        let actual_version = current_user_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StorageError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl SlotStorage for SqliteSlotStorage<'_> {
    fn load_slot(&self, slot: StorageSlot) -> StorageResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM storage_slots WHERE slot_key = ?1;",
                [slot.key()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save_slot(&self, slot: StorageSlot, payload: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO storage_slots (slot_key, payload)
             VALUES (?1, ?2)
             ON CONFLICT(slot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![slot.key(), payload],
        )?;
        Ok(())
    }
}

/// Process-local slot storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySlotStorage {
    slots: RefCell<HashMap<StorageSlot, String>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates one slot, bypassing the write counter.
    pub fn with_slot(self, slot: StorageSlot, payload: impl Into<String>) -> Self {
        self.slots.borrow_mut().insert(slot, payload.into());
        self
    }

    /// Makes every following `save_slot` call fail with `WriteRejected`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Current raw payload of `slot`.
    pub fn payload(&self, slot: StorageSlot) -> Option<String> {
        self.slots.borrow().get(&slot).cloned()
    }
}

impl SlotStorage for MemorySlotStorage {
    fn load_slot(&self, slot: StorageSlot) -> StorageResult<Option<String>> {
        Ok(self.payload(slot))
    }

    fn save_slot(&self, slot: StorageSlot, payload: &str) -> StorageResult<()> {
        if self.fail_writes.get() {
            return Err(StorageError::WriteRejected(slot));
        }
        self.slots.borrow_mut().insert(slot, payload.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySlotStorage, SlotStorage, StorageError, StorageSlot};

    #[test]
    fn slot_keys_are_stable() {
        let keys: Vec<_> = StorageSlot::ALL.iter().map(|slot| slot.key()).collect();
        assert_eq!(keys, vec!["members", "userProfile", "memberPositions"]);
    }

    #[test]
    fn memory_storage_rejects_writes_when_asked() {
        let storage = MemorySlotStorage::new();
        storage.set_fail_writes(true);
        let err = storage
            .save_slot(StorageSlot::Members, "[]")
            .expect_err("writes should be rejected");
        assert!(matches!(err, StorageError::WriteRejected(StorageSlot::Members)));
        assert_eq!(storage.load_slot(StorageSlot::Members).unwrap(), None);
        assert_eq!(storage.write_count(), 0);
    }
}
