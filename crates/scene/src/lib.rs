//! Scene container and transform graph.
//!
//! # Invariants
//! - Component storage is BTreeMap keyed by `EntityId`, so queries iterate
//!   in the same order every frame.
//! - `update_world_matrices` visits every transform exactly once, parents
//!   before children. World matrices read before the first pass of a frame
//!   are last frame's values.
//! - Parent links never form a cycle.

mod camera;
mod error;
mod scene;

pub use camera::Camera;
pub use error::SceneError;
pub use scene::{Renderable, Scene, TransformNode};
