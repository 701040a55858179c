//! Flutter-facing bindings for the family tree core.

pub mod api;
