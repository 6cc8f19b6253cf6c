use glam::Mat4;

use crate::backend::{GraphicsBackend, RenderTargetDesc, TargetId};
use crate::debug::DebugMessage;
use crate::error::RenderError;
use crate::resource::{Mesh, ResourceId, ShaderProgram, Texture};
use crate::uniforms::{UniformValue, names};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateTarget {
        target: TargetId,
        label: String,
        width: u32,
        height: u32,
    },
    DestroyTarget(TargetId),
    ClearTarget(TargetId),
    BindTarget(TargetId),
    BindDefaultFramebuffer,
    ClearDefault { color: [f32; 4], depth: f32 },
    BindShader(ResourceId),
    SetUniform { name: String, value: UniformValue },
    BindTexture { slot: u32, texture: ResourceId },
    BindTargetTexture { slot: u32, target: TargetId },
    UnbindTexture { slot: u32 },
    /// `model` is the last `u_Model` pushed before the draw.
    DrawMesh {
        mesh: ResourceId,
        model: Option<Mat4>,
    },
    DrawFullscreen { shader: Option<ResourceId> },
    Present,
    Release(ResourceId),
}

/// Backend that records commands instead of driving a GPU.
///
/// Used by tests, benchmarks and the headless CLI. Debug messages can be
/// queued with [`RecordingBackend::push_debug_message`] to exercise the
/// diagnostic channel.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<GpuCommand>,
    next_target: u32,
    live_targets: Vec<TargetId>,
    bound_shader: Option<ResourceId>,
    last_model: Option<Mat4>,
    debug_queue: Vec<DebugMessage>,
    presented: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, pred: impl Fn(&GpuCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn shader_binds(&self) -> usize {
        self.count(|c| matches!(c, GpuCommand::BindShader(_)))
    }

    /// Mesh draws in issue order, with the model matrix each one used.
    pub fn mesh_draws(&self) -> Vec<(ResourceId, Option<Mat4>)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawMesh { mesh, model } => Some((*mesh, *model)),
                _ => None,
            })
            .collect()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    pub fn live_targets(&self) -> &[TargetId] {
        &self.live_targets
    }

    pub fn push_debug_message(&mut self, msg: DebugMessage) {
        self.debug_queue.push(msg);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetId, RenderError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::TargetCreation(desc.label.clone()));
        }
        let target = TargetId(self.next_target);
        self.next_target += 1;
        self.live_targets.push(target);
        self.commands.push(GpuCommand::CreateTarget {
            target,
            label: desc.label.clone(),
            width: desc.width,
            height: desc.height,
        });
        Ok(target)
    }

    fn destroy_render_target(&mut self, target: TargetId) {
        self.live_targets.retain(|t| *t != target);
        self.commands.push(GpuCommand::DestroyTarget(target));
    }

    fn clear_render_target(&mut self, target: TargetId) {
        self.commands.push(GpuCommand::ClearTarget(target));
    }

    fn bind_render_target(&mut self, target: TargetId) {
        self.commands.push(GpuCommand::BindTarget(target));
    }

    fn bind_default_framebuffer(&mut self) {
        self.commands.push(GpuCommand::BindDefaultFramebuffer);
    }

    fn clear_default_framebuffer(&mut self, color: [f32; 4], depth: f32) {
        self.commands
            .push(GpuCommand::ClearDefault { color, depth });
    }

    fn bind_shader(&mut self, shader: &ShaderProgram) {
        self.bound_shader = Some(shader.id());
        self.last_model = None;
        self.commands.push(GpuCommand::BindShader(shader.id()));
    }

    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        if let (names::MODEL, UniformValue::Mat4(m)) = (name, value) {
            self.last_model = Some(*m);
        }
        self.commands.push(GpuCommand::SetUniform {
            name: name.to_string(),
            value: *value,
        });
    }

    fn bind_texture(&mut self, slot: u32, texture: &Texture) {
        self.commands.push(GpuCommand::BindTexture {
            slot,
            texture: texture.id(),
        });
    }

    fn bind_target_texture(&mut self, slot: u32, target: TargetId) {
        self.commands
            .push(GpuCommand::BindTargetTexture { slot, target });
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.commands.push(GpuCommand::UnbindTexture { slot });
    }

    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.commands.push(GpuCommand::DrawMesh {
            mesh: mesh.id(),
            model: self.last_model,
        });
    }

    fn draw_fullscreen_quad(&mut self) {
        self.commands.push(GpuCommand::DrawFullscreen {
            shader: self.bound_shader,
        });
    }

    fn present(&mut self) {
        self.presented += 1;
        self.commands.push(GpuCommand::Present);
    }

    fn release_resource(&mut self, id: ResourceId) {
        self.commands.push(GpuCommand::Release(id));
    }

    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        std::mem::take(&mut self.debug_queue)
    }
}
