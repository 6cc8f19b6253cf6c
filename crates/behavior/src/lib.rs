//! Behavior bindings: per-entity update scripts.
//!
//! # Invariants
//! - Behaviors of one entity update in the order they were bound.
//! - Disabled behaviors are skipped without side effects.
//! - Bindings are never removed while a pass runs; toggling `enabled` is the
//!   only change allowed between behaviors.
//! - The first failing behavior ends the pass and its error propagates.

mod behavior;
pub mod builtin;
mod error;
mod registry;

pub use behavior::{AsAny, Behavior, BehaviorContext, FrameTime};
pub use builtin::{CameraControl, FollowPath, SimpleMove};
pub use error::BehaviorError;
pub use registry::{BehaviorBinding, BehaviorHandle, BehaviorRegistry};
