use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use framecore_render::{
    Mesh, MeshRef, ResourceTracker, ShaderStage, ShaderStageKind, Texture, TextureKind, TextureRef,
};
use sha2::{Digest, Sha256};

use crate::error::AssetError;
use crate::loader::AssetLoader;

/// First 8 bytes of the SHA-256 of `tag` followed by `bytes`.
pub(crate) fn content_hash(tag: &str, bytes: &[u8]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&result[..8]);
    u64::from_le_bytes(head)
}

/// Loads assets from disk, relative to a root directory.
///
/// Meshes are Wavefront OBJ (only counts are extracted), textures are
/// Netpbm images (P2/P3/P5/P6), and shader stages are plain text. Cube maps
/// are a single image in a 4x3 cross layout.
#[derive(Debug)]
pub struct FsAssetLoader {
    root: PathBuf,
    tracker: ResourceTracker,
    meshes: BTreeMap<u64, Weak<Mesh>>,
    textures: BTreeMap<u64, Weak<Texture>>,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>, tracker: ResourceTracker) -> Self {
        Self {
            root: root.into(),
            tracker,
            meshes: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn read(&self, path: &Path) -> Result<(PathBuf, Vec<u8>), AssetError> {
        let full = self.resolve(path);
        match std::fs::read(&full) {
            Ok(bytes) => Ok((full, bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(full))
            }
            Err(source) => Err(AssetError::Io { path: full, source }),
        }
    }

    fn texture(&mut self, path: &Path, kind: TextureKind) -> Result<TextureRef, AssetError> {
        let (full, bytes) = self.read(path)?;
        let tag = match kind {
            TextureKind::Texture2D => "texture2d",
            TextureKind::CubeMap => "cubemap",
        };
        let hash = content_hash(tag, &bytes);
        if let Some(texture) = self.textures.get(&hash).and_then(Weak::upgrade) {
            tracing::trace!(path = %full.display(), "texture cache hit");
            return Ok(texture);
        }

        let (width, height) = netpbm_size(&full, &bytes)?;
        let (width, height) = match kind {
            TextureKind::Texture2D => (width, height),
            TextureKind::CubeMap => {
                if width % 4 != 0 || height % 3 != 0 || width / 4 != height / 3 {
                    return Err(AssetError::Parse {
                        path: full,
                        reason: format!("{width}x{height} is not a 4x3 cube cross"),
                    });
                }
                (width / 4, height / 3)
            }
        };
        let label = label_of(&full);
        let texture = self.tracker.create_texture(label, kind, width, height);
        tracing::debug!(path = %full.display(), width, height, ?kind, "texture loaded");
        self.textures.insert(hash, Rc::downgrade(&texture));
        Ok(texture)
    }
}

fn label_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Vertex and index counts of an OBJ file. Polygons are fanned into
/// triangles.
fn obj_counts(path: &Path, source: &str) -> Result<(u32, u32), AssetError> {
    let mut vertices = 0u32;
    let mut indices = 0u32;
    for (line_no, line) in source.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => vertices += 1,
            Some("f") => {
                let corners = parts.count() as u32;
                if corners < 3 {
                    return Err(AssetError::Parse {
                        path: path.to_path_buf(),
                        reason: format!("line {}: face with {corners} corners", line_no + 1),
                    });
                }
                indices += (corners - 2) * 3;
            }
            _ => {}
        }
    }
    if vertices == 0 {
        return Err(AssetError::Parse {
            path: path.to_path_buf(),
            reason: "no vertices".into(),
        });
    }
    Ok((vertices, indices))
}

/// Width and height from a Netpbm header.
fn netpbm_size(path: &Path, bytes: &[u8]) -> Result<(u32, u32), AssetError> {
    let magic = bytes
        .get(..2)
        .ok_or_else(|| AssetError::UnsupportedFormat(path.to_path_buf()))?;
    if !matches!(magic, b"P2" | b"P3" | b"P5" | b"P6") {
        return Err(AssetError::UnsupportedFormat(path.to_path_buf()));
    }

    let header_end = bytes.len().min(512);
    let header = String::from_utf8_lossy(&bytes[2..header_end]);
    let mut fields = header
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);
    let mut next = |what: &str| -> Result<u32, AssetError> {
        fields
            .next()
            .and_then(|f| f.parse().ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| AssetError::Parse {
                path: path.to_path_buf(),
                reason: format!("bad or missing {what}"),
            })
    };
    let width = next("width")?;
    let height = next("height")?;
    Ok((width, height))
}

impl AssetLoader for FsAssetLoader {
    fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    fn load_mesh(&mut self, path: &Path) -> Result<MeshRef, AssetError> {
        let (full, bytes) = self.read(path)?;
        let hash = content_hash("mesh", &bytes);
        if let Some(mesh) = self.meshes.get(&hash).and_then(Weak::upgrade) {
            tracing::trace!(path = %full.display(), "mesh cache hit");
            return Ok(mesh);
        }

        let (vertices, indices) = obj_counts(&full, &String::from_utf8_lossy(&bytes))?;
        let mesh = self.tracker.create_mesh(label_of(&full), vertices, indices);
        tracing::debug!(path = %full.display(), vertices, indices, "mesh loaded");
        self.meshes.insert(hash, Rc::downgrade(&mesh));
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
        let (full, bytes) = self.read(path)?;
        let source = String::from_utf8(bytes).map_err(|err| AssetError::Parse {
            path: full,
            reason: err.to_string(),
        })?;
        Ok(ShaderStage { kind, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecore_render::RenderError;
    use tempfile::TempDir;

    const QUAD: &str = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nf 1 2 3 4\n";

    fn write(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_obj_counts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "quad.obj", QUAD.as_bytes());
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        let mesh = loader.load_mesh(Path::new("quad.obj")).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.label(), "quad.obj");
    }

    #[test]
    fn identical_content_shares_a_handle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.obj", QUAD.as_bytes());
        write(&dir, "b.obj", QUAD.as_bytes());
        let tracker = ResourceTracker::new();
        let mut loader = FsAssetLoader::new(dir.path(), tracker.clone());
        let a = loader.load_mesh(Path::new("a.obj")).unwrap();
        let b = loader.load_mesh(Path::new("b.obj")).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(tracker.live_count(), 1);
    }

    #[test]
    fn cache_does_not_keep_resources_alive() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.obj", QUAD.as_bytes());
        let tracker = ResourceTracker::new();
        let mut loader = FsAssetLoader::new(dir.path(), tracker.clone());
        let first = loader.load_mesh(Path::new("a.obj")).unwrap();
        let first_id = first.id();
        drop(first);
        assert_eq!(tracker.drain_released(), vec![first_id]);

        let second = loader.load_mesh(Path::new("a.obj")).unwrap();
        assert_ne!(second.id(), first_id);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        assert!(matches!(
            loader.load_mesh(Path::new("nope.obj")),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn obj_without_vertices_fails() {
        let dir = TempDir::new().unwrap();
        write(&dir, "empty.obj", b"# nothing\n");
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        assert!(matches!(
            loader.load_mesh(Path::new("empty.obj")),
            Err(AssetError::Parse { .. })
        ));
    }

    #[test]
    fn reads_netpbm_dimensions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "stone.ppm", b"P3\n# comment\n4 2\n255\n0 0 0\n");
        write(&dir, "sky.ppm", b"P6 8 6 255\n");
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());

        let stone = loader.load_texture(Path::new("stone.ppm")).unwrap();
        assert_eq!(stone.size(), (4, 2));
        assert_eq!(stone.kind(), TextureKind::Texture2D);

        let sky = loader.load_cube_map(Path::new("sky.ppm")).unwrap();
        assert_eq!(sky.size(), (2, 2));
        assert_eq!(sky.kind(), TextureKind::CubeMap);
    }

    #[test]
    fn rejects_unknown_image_format() {
        let dir = TempDir::new().unwrap();
        write(&dir, "stone.png", b"\x89PNG....");
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        assert!(matches!(
            loader.load_texture(Path::new("stone.png")),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn cube_map_needs_cross_layout() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad.ppm", b"P6 8 8 255\n");
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        assert!(matches!(
            loader.load_cube_map(Path::new("bad.ppm")),
            Err(AssetError::Parse { .. })
        ));
    }

    #[test]
    fn links_shader_from_files() {
        let dir = TempDir::new().unwrap();
        let vert = write(&dir, "basic.vert", b"void main() {}");
        let frag = write(&dir, "basic.frag", b"void main() {}");
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        let shader = loader
            .load_shader(
                "basic",
                &[
                    (vert.as_path(), ShaderStageKind::Vertex),
                    (frag.as_path(), ShaderStageKind::Fragment),
                ],
            )
            .unwrap();
        assert_eq!(shader.label(), "basic");
        assert_eq!(shader.stages().len(), 2);
    }

    #[test]
    fn shader_without_fragment_fails_to_link() {
        let dir = TempDir::new().unwrap();
        let vert = write(&dir, "basic.vert", b"void main() {}");
        let mut loader = FsAssetLoader::new(dir.path(), ResourceTracker::new());
        let err = loader
            .load_shader("basic", &[(vert.as_path(), ShaderStageKind::Vertex)])
            .unwrap_err();
        let AssetError::Link(RenderError::MissingStage { .. }) = err else {
            panic!("expected a missing stage, got {err}");
        };
    }
}
