//! Shared GPU resource handles.
//!
//! Meshes, textures and shader programs are reference counted (`Rc`). Each
//! owns a [`ResourceHandle`] that reports its id back to the
//! [`ResourceTracker`] when the last owner drops it; the frame driver drains
//! those ids and tells the backend to destroy the GPU objects.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::uniforms::UniformValue;

/// Identity of a GPU resource. Allocated in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

#[derive(Debug, Default)]
struct TrackerState {
    next_id: u64,
    live: usize,
    released: Vec<ResourceId>,
}

/// Allocates resource ids and collects the ids of released resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    state: Rc<RefCell<TrackerState>>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> ResourceHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.live += 1;
        ResourceHandle {
            id: ResourceId(state.next_id),
            tracker: Rc::downgrade(&self.state),
        }
    }

    /// Number of resources created by this tracker that are still alive.
    pub fn live_count(&self) -> usize {
        self.state.borrow().live
    }

    /// Take the ids released since the last drain, in release order.
    pub fn drain_released(&self) -> Vec<ResourceId> {
        std::mem::take(&mut self.state.borrow_mut().released)
    }

    pub fn create_mesh(
        &self,
        label: impl Into<String>,
        vertex_count: u32,
        index_count: u32,
    ) -> MeshRef {
        Rc::new(Mesh {
            handle: self.allocate(),
            label: label.into(),
            vertex_count,
            index_count,
        })
    }

    pub fn create_texture(
        &self,
        label: impl Into<String>,
        kind: TextureKind,
        width: u32,
        height: u32,
    ) -> TextureRef {
        Rc::new(Texture {
            handle: self.allocate(),
            label: label.into(),
            kind,
            width,
            height,
        })
    }
}

/// Ownership token embedded in every GPU resource.
#[derive(Debug)]
pub struct ResourceHandle {
    id: ResourceId,
    tracker: Weak<RefCell<TrackerState>>,
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if let Some(state) = self.tracker.upgrade() {
            let mut state = state.borrow_mut();
            state.live = state.live.saturating_sub(1);
            state.released.push(self.id);
        }
    }
}

/// An immutable, externally loaded mesh.
#[derive(Debug)]
pub struct Mesh {
    handle: ResourceHandle,
    label: String,
    vertex_count: u32,
    index_count: u32,
}

pub type MeshRef = Rc<Mesh>;

impl Mesh {
    pub fn id(&self) -> ResourceId {
        self.handle.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureKind {
    Texture2D,
    CubeMap,
}

#[derive(Debug)]
pub struct Texture {
    handle: ResourceHandle,
    label: String,
    kind: TextureKind,
    width: u32,
    height: u32,
}

pub type TextureRef = Rc<Texture>;

impl Texture {
    pub fn id(&self) -> ResourceId {
        self.handle.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderStageKind {
    Vertex,
    Geometry,
    Fragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    pub kind: ShaderStageKind,
    pub source: String,
}

/// A linked shader program.
///
/// Defaults are program-level uniforms set outside the frame loop; they are
/// pushed every time the program is activated.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: ResourceHandle,
    label: String,
    stages: Vec<ShaderStage>,
    defaults: RefCell<BTreeMap<String, UniformValue>>,
}

pub type ShaderRef = Rc<ShaderProgram>;

impl ShaderProgram {
    pub fn id(&self) -> ResourceId {
        self.handle.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    pub fn set_default(&self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.defaults.borrow_mut().insert(name.into(), value.into());
    }

    pub fn defaults(&self) -> Vec<(String, UniformValue)> {
        self.defaults
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }
}

/// Accumulates shader stages and links them into a [`ShaderProgram`].
#[derive(Debug, Clone)]
pub struct ShaderBuilder {
    label: String,
    stages: Vec<ShaderStage>,
}

impl ShaderBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stages: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn add_stage(&mut self, kind: ShaderStageKind, source: impl Into<String>) -> &mut Self {
        self.stages.push(ShaderStage {
            kind,
            source: source.into(),
        });
        self
    }

    pub fn stage(mut self, kind: ShaderStageKind, source: impl Into<String>) -> Self {
        self.add_stage(kind, source);
        self
    }

    /// Validate the stage set and produce a shared program.
    ///
    /// A program needs exactly one vertex and one fragment stage; a geometry
    /// stage is optional.
    pub fn link(self, tracker: &ResourceTracker) -> Result<ShaderRef, RenderError> {
        for kind in [
            ShaderStageKind::Vertex,
            ShaderStageKind::Geometry,
            ShaderStageKind::Fragment,
        ] {
            let matching: Vec<&ShaderStage> =
                self.stages.iter().filter(|s| s.kind == kind).collect();
            if matching.len() > 1 {
                return Err(RenderError::DuplicateStage {
                    label: self.label,
                    stage: kind,
                });
            }
            match matching.first() {
                Some(stage) if stage.source.trim().is_empty() => {
                    return Err(RenderError::EmptyStage {
                        label: self.label,
                        stage: kind,
                    });
                }
                None if kind != ShaderStageKind::Geometry => {
                    return Err(RenderError::MissingStage {
                        label: self.label,
                        stage: kind,
                    });
                }
                _ => {}
            }
        }

        tracing::debug!(label = %self.label, stages = self.stages.len(), "linked shader");
        Ok(Rc::new(ShaderProgram {
            handle: tracker.allocate(),
            label: self.label,
            stages: self.stages,
            defaults: RefCell::new(BTreeMap::new()),
        }))
    }
}
