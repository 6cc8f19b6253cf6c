use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use framecore_render::{
    Mesh, MeshRef, ResourceTracker, ShaderStage, ShaderStageKind, Texture, TextureKind, TextureRef,
};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::loader::AssetLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSpec {
    pub vertex_count: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSpec {
    pub width: u32,
    pub height: u32,
}

/// Declares the assets a [`MemoryAssetLoader`] can serve, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub meshes: BTreeMap<String, MeshSpec>,
    pub textures: BTreeMap<String, TextureSpec>,
    pub shaders: BTreeMap<String, String>,
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn mesh(mut self, path: &str, vertex_count: u32, index_count: u32) -> Self {
        self.meshes.insert(
            path.to_string(),
            MeshSpec {
                vertex_count,
                index_count,
            },
        );
        self
    }

    pub fn texture(mut self, path: &str, width: u32, height: u32) -> Self {
        let spec = TextureSpec { width, height };
        self.textures.insert(path.to_string(), spec);
        self
    }

    pub fn shader(mut self, path: &str, source: &str) -> Self {
        self.shaders.insert(path.to_string(), source.to_string());
        self
    }
}

/// Serves assets described by an [`AssetManifest`] without touching disk.
/// Used by headless runs and tests.
#[derive(Debug)]
pub struct MemoryAssetLoader {
    manifest: AssetManifest,
    tracker: ResourceTracker,
    meshes: BTreeMap<String, Weak<Mesh>>,
    textures: BTreeMap<(String, bool), Weak<Texture>>,
}

fn key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl MemoryAssetLoader {
    pub fn new(manifest: AssetManifest, tracker: ResourceTracker) -> Self {
        Self {
            manifest,
            tracker,
            meshes: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    fn texture(&mut self, path: &Path, kind: TextureKind) -> Result<TextureRef, AssetError> {
        let name = key(path);
        let cache_key = (name.clone(), kind == TextureKind::CubeMap);
        if let Some(texture) = self.textures.get(&cache_key).and_then(Weak::upgrade) {
            return Ok(texture);
        }
        let spec = self
            .manifest
            .textures
            .get(&name)
            .ok_or_else(|| AssetError::NotFound(PathBuf::from(&name)))?;
        let texture = self
            .tracker
            .create_texture(name, kind, spec.width, spec.height);
        self.textures.insert(cache_key, Rc::downgrade(&texture));
        Ok(texture)
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    fn load_mesh(&mut self, path: &Path) -> Result<MeshRef, AssetError> {
        let name = key(path);
        if let Some(mesh) = self.meshes.get(&name).and_then(Weak::upgrade) {
            return Ok(mesh);
        }
        let spec = self
            .manifest
            .meshes
            .get(&name)
            .ok_or_else(|| AssetError::NotFound(PathBuf::from(&name)))?;
        let mesh = self
            .tracker
            .create_mesh(name.clone(), spec.vertex_count, spec.index_count);
        tracing::trace!(path = %name, "mesh served from memory");
        self.meshes.insert(name, Rc::downgrade(&mesh));
        Ok(mesh)
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureRef, AssetError> {
        self.texture(path, TextureKind::Texture2D)
    }

    fn load_cube_map(&mut self, path: &Path) -> Result<TextureRef, AssetError> {
        self.texture(path, TextureKind::CubeMap)
    }

    fn load_shader_stage(
        &mut self,
        path: &Path,
        kind: ShaderStageKind,
    ) -> Result<ShaderStage, AssetError> {
        let name = key(path);
        let source = self
            .manifest
            .shaders
            .get(&name)
            .ok_or_else(|| AssetError::NotFound(PathBuf::from(&name)))?;
        Ok(ShaderStage {
            kind,
            source: source.clone(),
        })
    }
}
