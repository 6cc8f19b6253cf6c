use serde::{Deserialize, Serialize};

use crate::debug::DebugMessage;
use crate::error::RenderError;
use crate::resource::{Mesh, ResourceId, ShaderProgram, Texture};
use crate::uniforms::UniformValue;

/// Identity of an offscreen render target created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// Size of the default framebuffer; offscreen targets match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub depth: bool,
}

/// Backend-agnostic GPU interface.
///
/// The frame pipeline talks to the GPU only through this trait. Uniform and
/// texture calls apply to the currently bound shader program. Implementations
/// must not reorder calls.
pub trait GraphicsBackend {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetId, RenderError>;
    fn destroy_render_target(&mut self, target: TargetId);
    fn clear_render_target(&mut self, target: TargetId);
    fn bind_render_target(&mut self, target: TargetId);
    fn bind_default_framebuffer(&mut self);
    /// Clear color and depth of the default framebuffer.
    fn clear_default_framebuffer(&mut self, color: [f32; 4], depth: f32);

    fn bind_shader(&mut self, shader: &ShaderProgram);
    fn set_uniform(&mut self, name: &str, value: &UniformValue);
    fn bind_texture(&mut self, slot: u32, texture: &Texture);
    fn bind_target_texture(&mut self, slot: u32, target: TargetId);
    fn unbind_texture(&mut self, slot: u32);

    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_fullscreen_quad(&mut self);

    /// Swap buffers. May block on vertical sync.
    fn present(&mut self);

    /// Destroy the GPU object behind a released resource handle.
    fn release_resource(&mut self, id: ResourceId);

    /// Messages from the asynchronous debug channel since the last call.
    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        Vec::new()
    }
}
