//! Asset loading for the frame pipeline.
//!
//! Loaders turn paths into shared, immutable GPU resource handles. Every
//! load happens before the frame loop starts; a failure there is fatal.
//!
//! # Invariants
//! - Loading the same content twice while the first handle is alive yields
//!   the same handle.
//! - Loaders never keep resources alive on their own; caches hold weak
//!   references.

mod error;
mod fs;
mod loader;
mod memory;

pub use error::AssetError;
pub use fs::FsAssetLoader;
pub use loader::AssetLoader;
pub use memory::{AssetManifest, MemoryAssetLoader};
