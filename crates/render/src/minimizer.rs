use std::collections::BTreeSet;

use glam::Mat3;
use serde::Serialize;

use crate::backend::GraphicsBackend;
use crate::batch::RenderBatch;
use crate::material::{MaterialId, MaterialParam};
use crate::resource::ResourceId;
use crate::uniforms::{FrameUniforms, names};

/// State changes issued by one draw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrawStats {
    pub shader_binds: usize,
    pub material_applies: usize,
    pub draw_calls: usize,
}

/// Walks a sorted batch and skips redundant shader binds and material applies.
///
/// Frame uniforms are pushed once per shader activation. Shader defaults are
/// pushed before every material apply, so a value set by one material never
/// carries into the next. Per-draw matrices are pushed for every entry.
#[derive(Debug, Default)]
pub struct StateMinimizer {
    current_shader: Option<ResourceId>,
    current_material: Option<MaterialId>,
    bound_slots: u32,
    /// Value uniforms set by the current material.
    material_values: BTreeSet<String>,
}

impl StateMinimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw every entry in `batch` order.
    ///
    /// Tracking starts unset on each call, so the first entry always binds its
    /// shader and applies its material.
    pub fn draw(
        &mut self,
        batch: &RenderBatch,
        frame: &FrameUniforms,
        gpu: &mut dyn GraphicsBackend,
    ) -> DrawStats {
        *self = Self::default();
        let mut stats = DrawStats::default();

        for entry in batch.entries() {
            let material = entry.material.borrow();
            let shader = material.shader();

            if self.current_shader != Some(shader.id()) {
                gpu.bind_shader(shader);
                frame.push(gpu);
                self.current_shader = Some(shader.id());
                // A new program has none of the previous material's uniforms.
                self.current_material = None;
                self.material_values.clear();
                stats.shader_binds += 1;
            }

            if self.current_material != Some(material.id()) {
                let defaults = shader.defaults();
                for (name, value) in &defaults {
                    gpu.set_uniform(name, value);
                }
                let values: BTreeSet<String> = material
                    .params()
                    .filter(|(_, param)| matches!(param, MaterialParam::Value(_)))
                    .map(|(name, _)| name.to_string())
                    .collect();
                for stale in self.material_values.difference(&values) {
                    if !defaults.iter().any(|(name, _)| name == stale) {
                        tracing::warn!(
                            uniform = %stale,
                            material = material.label(),
                            "uniform keeps the previous material's value"
                        );
                    }
                }
                self.bound_slots = material.apply(gpu, self.bound_slots);
                self.material_values = values;
                self.current_material = Some(material.id());
                stats.material_applies += 1;
            }

            let mvp = frame.view_projection * entry.world;
            let normal = Mat3::from_mat4(entry.world).inverse().transpose();
            gpu.set_uniform(names::MODEL_VIEW_PROJECTION, &mvp.into());
            gpu.set_uniform(names::MODEL, &entry.world.into());
            gpu.set_uniform(names::NORMAL_MATRIX, &normal.into());
            gpu.draw_mesh(&entry.mesh);
            stats.draw_calls += 1;
        }

        tracing::trace!(
            shader_binds = stats.shader_binds,
            material_applies = stats.material_applies,
            draw_calls = stats.draw_calls,
            "draw pass"
        );
        stats
    }
}
