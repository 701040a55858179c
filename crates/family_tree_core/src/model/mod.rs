//! Family graph domain model.
//!
//! # Responsibility
//! - Define the member record and its weighted adjacency list.
//! - Define the role vocabulary and the pairwise relation-label table.
//!
//! # Invariants
//! - Every member is identified by a stable `MemberId`.
//! - Edge weights live in `1..=MAX_CONNECTION_WEIGHT`; absence means no edge.

pub mod member;
pub mod relationship;
