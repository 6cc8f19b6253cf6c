//! Rendering core: backend-agnostic frame drawing.
//!
//! # Invariants
//! - The draw pass never mutates scene state; it reads a sorted batch and
//!   frame uniforms and emits backend calls.
//! - Shader binds and material applies are bounded by the number of distinct
//!   transitions in sorted batch order, never by batch length.
//! - Every registered post effect is cleared each frame; only the active one
//!   is applied and composited.
//!
//! All GPU access goes through [`GraphicsBackend`]. [`RecordingBackend`] keeps
//! a command log instead of touching a device and is what tests and the
//! headless CLI run against.

mod backend;
mod batch;
mod debug;
mod effects;
mod error;
mod material;
mod minimizer;
mod post;
mod recording;
mod resource;
mod uniforms;

pub use backend::{GraphicsBackend, RenderTargetDesc, TargetId, Viewport};
pub use batch::{BatchEntry, RenderBatch, SortKey};
pub use debug::{DebugMessage, DebugSeverity, log_debug_message};
pub use effects::{BloomEffect, BloomShaders, GreyscaleEffect, PassthroughEffect};
pub use error::RenderError;
pub use material::{Material, MaterialId, MaterialParam, MaterialRef};
pub use minimizer::{DrawStats, StateMinimizer};
pub use post::{EffectBuffers, EffectSettings, PostEffect, PostEffectChain};
pub use recording::{GpuCommand, RecordingBackend};
pub use resource::{
    Mesh, MeshRef, ResourceId, ResourceTracker, ShaderBuilder, ShaderProgram, ShaderRef,
    ShaderStage, ShaderStageKind, Texture, TextureKind, TextureRef,
};
pub use uniforms::{FrameUniforms, LightingParams, SceneUniforms, ShadingMode, UniformValue, names};
