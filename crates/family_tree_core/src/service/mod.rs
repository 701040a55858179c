//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate member mutations and keep edges symmetric.
//! - Project store state into the views the presentation layer draws.

pub mod tree_store;
pub mod tree_views;
