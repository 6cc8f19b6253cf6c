use std::path::Path;

use framecore_render::{
    MeshRef, ResourceTracker, ShaderBuilder, ShaderRef, ShaderStage, ShaderStageKind, TextureRef,
};

use crate::error::AssetError;

/// Source of meshes, textures and shader stages.
pub trait AssetLoader {
    /// Tracker every loaded resource is registered with.
    fn tracker(&self) -> &ResourceTracker;

    fn load_mesh(&mut self, path: &Path) -> Result<MeshRef, AssetError>;

    fn load_texture(&mut self, path: &Path) -> Result<TextureRef, AssetError>;

    /// Load a cube map stored as a single cross-layout image.
    fn load_cube_map(&mut self, path: &Path) -> Result<TextureRef, AssetError>;

    fn load_shader_stage(
        &mut self,
        path: &Path,
        kind: ShaderStageKind,
    ) -> Result<ShaderStage, AssetError>;

    /// Load each stage and link them into one program.
    fn load_shader(
        &mut self,
        label: &str,
        stages: &[(&Path, ShaderStageKind)],
    ) -> Result<ShaderRef, AssetError> {
        let mut builder = ShaderBuilder::new(label);
        for (path, kind) in stages {
            let stage = self.load_shader_stage(path, *kind)?;
            builder.add_stage(stage.kind, stage.source);
        }
        let shader = builder.link(self.tracker())?;
        tracing::debug!(label, id = shader.id().0, "shader loaded");
        Ok(shader)
    }
}
