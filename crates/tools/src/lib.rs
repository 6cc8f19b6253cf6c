//! Developer tooling: frame statistics and scene inspection.
//!
//! # Invariants
//! - Tools only read pipeline state; none of them feed back into a frame.
//! - Statistics cover recorded samples only, never unfilled buffer slots.

mod inspector;
mod stats;

pub use inspector::{EntityInfo, FrameInspector, FrameSummary, SceneSummary};
pub use stats::FrameStats;
