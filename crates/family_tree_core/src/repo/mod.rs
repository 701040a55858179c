//! Repository layer: the storage port behind the family tree store.
//!
//! # Responsibility
//! - Define the keyed load/save contract the store persists through.
//! - Isolate SQLite details from store orchestration.
//!
//! # Invariants
//! - Storage never interprets payloads.

pub mod slot_repo;
