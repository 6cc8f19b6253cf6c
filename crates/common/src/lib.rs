//! Shared types for the framecore frame pipeline.
//!
//! # Invariants
//! - `EntityId` ordering is total and stable for the lifetime of a process,
//!   so every BTreeMap keyed by it iterates deterministically.
//! - `Transform` is purely local; world matrices live in the scene's
//!   transform graph.

mod types;

pub use types::{EntityId, Transform};
