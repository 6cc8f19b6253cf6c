use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::backend::GraphicsBackend;
use crate::resource::{ShaderRef, TextureRef};
use crate::uniforms::UniformValue;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a material. Allocated in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

impl MaterialId {
    fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub enum MaterialParam {
    Value(UniformValue),
    Texture(TextureRef),
}

macro_rules! value_param {
    ($($ty:ty),*) => {
        $(impl From<$ty> for MaterialParam {
            fn from(v: $ty) -> Self {
                Self::Value(v.into())
            }
        })*
    };
}

value_param!(UniformValue, i32, f32, Vec2, Vec3, Vec4, Mat3, Mat4);

impl From<TextureRef> for MaterialParam {
    fn from(t: TextureRef) -> Self {
        Self::Texture(t)
    }
}

/// Shader plus the per-material uniforms and textures it draws with.
///
/// Shared between renderables through [`MaterialRef`]. Parameters are kept
/// in name order, which also fixes texture slot assignment.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    label: String,
    shader: ShaderRef,
    render_layer: i32,
    params: BTreeMap<String, MaterialParam>,
}

pub type MaterialRef = Rc<RefCell<Material>>;

impl Material {
    pub fn new(label: impl Into<String>, shader: ShaderRef) -> Self {
        Self {
            id: MaterialId::next(),
            label: label.into(),
            shader,
            render_layer: 0,
            params: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.render_layer = layer;
        self
    }

    pub fn with(mut self, name: impl Into<String>, param: impl Into<MaterialParam>) -> Self {
        self.set(name, param);
        self
    }

    pub fn shared(self) -> MaterialRef {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shader(&self) -> &ShaderRef {
        &self.shader
    }

    pub fn set_shader(&mut self, shader: ShaderRef) {
        self.shader = shader;
    }

    pub fn render_layer(&self) -> i32 {
        self.render_layer
    }

    pub fn set_render_layer(&mut self, layer: i32) {
        self.render_layer = layer;
    }

    pub fn set(&mut self, name: impl Into<String>, param: impl Into<MaterialParam>) {
        self.params.insert(name.into(), param.into());
    }

    pub fn get(&self, name: &str) -> Option<&MaterialParam> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &MaterialParam)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn texture_count(&self) -> u32 {
        self.params
            .values()
            .filter(|p| matches!(p, MaterialParam::Texture(_)))
            .count() as u32
    }

    /// Push every parameter into the bound shader.
    ///
    /// Textures take slots `0..n` in name order and each sampler uniform is
    /// pointed at its slot. Slots in `n..previous_slots` still hold textures
    /// from the previous material and are unbound. Returns `n`.
    pub fn apply(&self, gpu: &mut dyn GraphicsBackend, previous_slots: u32) -> u32 {
        let mut slot = 0u32;
        for (name, param) in &self.params {
            match param {
                MaterialParam::Value(value) => gpu.set_uniform(name, value),
                MaterialParam::Texture(texture) => {
                    gpu.bind_texture(slot, texture);
                    gpu.set_uniform(name, &UniformValue::Int(slot as i32));
                    slot += 1;
                }
            }
        }
        for stale in slot..previous_slots {
            gpu.unbind_texture(stale);
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCommand, RecordingBackend};
    use crate::resource::{ResourceId, ResourceTracker, ShaderBuilder, ShaderStageKind, TextureKind};

    fn shader(tracker: &ResourceTracker) -> ShaderRef {
        ShaderBuilder::new("lit")
            .stage(ShaderStageKind::Vertex, "v")
            .stage(ShaderStageKind::Fragment, "f")
            .link(tracker)
            .unwrap()
    }

    #[test]
    fn ids_increase_with_creation() {
        let tracker = ResourceTracker::new();
        let s = shader(&tracker);
        let a = Material::new("a", s.clone());
        let b = Material::new("b", s);
        assert!(a.id() < b.id());
    }

    fn bind(slot: u32, texture: ResourceId) -> GpuCommand {
        GpuCommand::BindTexture { slot, texture }
    }

    fn set(name: &str, value: impl Into<UniformValue>) -> GpuCommand {
        GpuCommand::SetUniform {
            name: name.to_string(),
            value: value.into(),
        }
    }

    #[test]
    fn apply_binds_textures_in_name_order() {
        let tracker = ResourceTracker::new();
        let specular = tracker.create_texture("spec", TextureKind::Texture2D, 1, 1);
        let diffuse = tracker.create_texture("diff", TextureKind::Texture2D, 1, 1);
        let mat = Material::new("stone", shader(&tracker))
            .with("s_Specular", specular.clone())
            .with("s_Diffuse", diffuse.clone())
            .with("u_Shininess", 2.0f32);

        let mut gpu = RecordingBackend::new();
        let used = mat.apply(&mut gpu, 0);
        assert_eq!(used, 2);
        assert_eq!(
            gpu.commands(),
            &[
                bind(0, diffuse.id()),
                set("s_Diffuse", 0),
                bind(1, specular.id()),
                set("s_Specular", 1),
                set("u_Shininess", 2.0f32),
            ]
        );
    }

    #[test]
    fn apply_unbinds_slots_left_by_previous_material() {
        let tracker = ResourceTracker::new();
        let tex = tracker.create_texture("t", TextureKind::Texture2D, 1, 1);
        let mat = Material::new("one-texture", shader(&tracker)).with("s_Diffuse", tex);

        let mut gpu = RecordingBackend::new();
        mat.apply(&mut gpu, 3);
        let unbinds: Vec<u32> = gpu
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::UnbindTexture { slot } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(unbinds, vec![1, 2]);
    }

    #[test]
    fn set_replaces_existing_param() {
        let tracker = ResourceTracker::new();
        let mut mat = Material::new("m", shader(&tracker));
        mat.set("u_TextureMix", 0.0f32);
        mat.set("u_TextureMix", 0.6f32);
        assert!(matches!(
            mat.get("u_TextureMix"),
            Some(MaterialParam::Value(UniformValue::Float(v))) if *v == 0.6
        ));
        assert_eq!(mat.params().count(), 1);
        assert_eq!(mat.texture_count(), 0);
    }
}
