//! The shrine demo scene: a stone ground plane, a shrine, five crystals on
//! looping paths, a skybox and three post effects.

use std::path::Path;

use anyhow::Context;
use framecore_assets::{AssetLoader, AssetManifest};
use framecore_behavior::{BehaviorRegistry, CameraControl, FollowPath};
use framecore_common::{EntityId, Transform};
use framecore_driver::{Controllables, SceneSetup, SpinAnimation, TextureToggle};
use framecore_render::{
    BloomEffect, BloomShaders, GraphicsBackend, GreyscaleEffect, Material, MaterialRef, MeshRef,
    PassthroughEffect, PostEffectChain, ShaderRef, ShaderStageKind, TextureKind, Viewport,
};
use framecore_scene::{Camera, Renderable, Scene};
use glam::{Mat3, Vec3};

const LIT_VERT: &str = "shaders/vertex_shader.glsl";
const LIT_FRAG: &str = "shaders/frag_blinn_phong_textured.glsl";
const PASSTHROUGH_VERT: &str = "shaders/passthrough_vert.glsl";
const PASSTHROUGH_FRAG: &str = "shaders/passthrough_frag.glsl";
const GREYSCALE_FRAG: &str = "shaders/greyscale_frag.glsl";
const BLOOM_BRIGHT_FRAG: &str = "shaders/bloom_bright_frag.glsl";
const BLOOM_BLUR_FRAG: &str = "shaders/bloom_blur_frag.glsl";
const BLOOM_COMPOSITE_FRAG: &str = "shaders/bloom_composite_frag.glsl";
const SKYBOX_VERT: &str = "shaders/skybox-shader.vert.glsl";
const SKYBOX_FRAG: &str = "shaders/skybox-shader.frag.glsl";

const PLANE: &str = "models/plane.obj";
const SHRINE: &str = "models/shrine.obj";
const CRYSTAL: &str = "models/crystal.obj";

const STONE: &str = "images/Stone_001_Diffuse.png";
const STONE_SPEC: &str = "images/Stone_001_Specular.png";
const NO_SPEC: &str = "images/grassSpec.png";
const SHRINE_COLOR: &str = "images/reyebl.png";
const CRYSTAL_NORMAL: &str = "images/Crystal_Normal.png";
const CRYSTAL_ALBEDO: &str = "images/Crystal_Albedo.png";
const CRYSTAL_GLOW: &str = "images/Crystal_Emission.png";
const SKY: &str = "images/cubemaps/skybox/ToonSky.jpg";

const SKYBOX_LAYER: i32 = 100;

const CORNERS: [Vec3; 4] = [
    Vec3::new(4.5, -4.0, 1.0),
    Vec3::new(4.5, 4.0, 1.0),
    Vec3::new(-4.25, 4.0, 1.0),
    Vec3::new(-4.25, -4.25, 1.0),
];
const DRIFTERS: [&str; 4] = [
    "crystal_left",
    "crystal_up",
    "crystal_down",
    "crystal_right",
];

/// Asset set used when no manifest or asset directory is given.
pub fn builtin_manifest() -> AssetManifest {
    let mut manifest = AssetManifest::default()
        .mesh(PLANE, 4, 6)
        .mesh(SHRINE, 2_486, 7_458)
        .mesh(CRYSTAL, 96, 288)
        .texture(STONE, 1024, 1024)
        .texture(STONE_SPEC, 1024, 1024)
        .texture(NO_SPEC, 256, 256)
        .texture(SHRINE_COLOR, 512, 512)
        .texture(CRYSTAL_NORMAL, 512, 512)
        .texture(CRYSTAL_ALBEDO, 512, 512)
        .texture(CRYSTAL_GLOW, 512, 512)
        .texture(SKY, 2048, 1536);
    for path in [
        LIT_VERT,
        LIT_FRAG,
        PASSTHROUGH_VERT,
        PASSTHROUGH_FRAG,
        GREYSCALE_FRAG,
        BLOOM_BRIGHT_FRAG,
        BLOOM_BLUR_FRAG,
        BLOOM_COMPOSITE_FRAG,
        SKYBOX_VERT,
        SKYBOX_FRAG,
    ] {
        manifest = manifest.shader(path, "#version 410\nvoid main() {}\n");
    }
    manifest
}

/// Everything the driver needs from the demo.
pub struct Demo {
    pub setup: SceneSetup,
    pub controllables: Controllables,
    pub spin: SpinAnimation,
    pub textures: TextureToggle,
}

fn program(
    loader: &mut dyn AssetLoader,
    label: &str,
    vert: &str,
    frag: &str,
) -> anyhow::Result<ShaderRef> {
    loader
        .load_shader(
            label,
            &[
                (Path::new(vert), ShaderStageKind::Vertex),
                (Path::new(frag), ShaderStageKind::Fragment),
            ],
        )
        .with_context(|| format!("loading shader '{label}'"))
}

fn mesh(loader: &mut dyn AssetLoader, path: &str) -> anyhow::Result<MeshRef> {
    loader
        .load_mesh(Path::new(path))
        .with_context(|| format!("loading mesh {path}"))
}

fn drawable(
    scene: &mut Scene,
    name: &str,
    transform: Transform,
    mesh: &MeshRef,
    material: &MaterialRef,
) -> anyhow::Result<EntityId> {
    let entity = scene.create_entity(name);
    scene.add_transform(entity, transform)?;
    scene.add_renderable(
        entity,
        Renderable {
            mesh: mesh.clone(),
            material: material.clone(),
        },
    )?;
    Ok(entity)
}

fn upright(position: Vec3) -> Transform {
    Transform::from_position(position).with_euler_degrees(90.0, 0.0, -90.0)
}

/// Load every asset and build the scene. Any load failure aborts.
pub fn build(
    loader: &mut dyn AssetLoader,
    gpu: &mut dyn GraphicsBackend,
    viewport: Viewport,
) -> anyhow::Result<Demo> {
    let lit = program(loader, "blinn_phong", LIT_VERT, LIT_FRAG)?;
    let blit = program(loader, "passthrough", PASSTHROUGH_VERT, PASSTHROUGH_FRAG)?;
    let greyscale = program(loader, "greyscale", PASSTHROUGH_VERT, GREYSCALE_FRAG)?;
    let bloom_shaders = BloomShaders {
        bright: program(loader, "bloom_bright", PASSTHROUGH_VERT, BLOOM_BRIGHT_FRAG)?,
        blur: program(loader, "bloom_blur", PASSTHROUGH_VERT, BLOOM_BLUR_FRAG)?,
        composite: program(loader, "bloom_mix", PASSTHROUGH_VERT, BLOOM_COMPOSITE_FRAG)?,
        blit: blit.clone(),
    };
    let skybox_shader = program(loader, "skybox", SKYBOX_VERT, SKYBOX_FRAG)?;

    let mut texture = |path: &str| {
        loader
            .load_texture(Path::new(path))
            .with_context(|| format!("loading texture {path}"))
    };
    let stone = texture(STONE)?;
    let stone_spec = texture(STONE_SPEC)?;
    let no_spec = texture(NO_SPEC)?;
    let shrine_color = texture(SHRINE_COLOR)?;
    let crystal_normal = texture(CRYSTAL_NORMAL)?;
    let crystal_albedo = texture(CRYSTAL_ALBEDO)?;
    let crystal_glow = texture(CRYSTAL_GLOW)?;
    let sky = loader
        .load_cube_map(Path::new(SKY))
        .with_context(|| format!("loading cube map {SKY}"))?;

    let tracker = loader.tracker().clone();
    let white = tracker.create_texture("white", TextureKind::Texture2D, 1, 1);

    let stone_mat = Material::new("stone", lit.clone())
        .with("s_Diffuse", stone)
        .with("s_Specular", stone_spec)
        .with("u_Shininess", 2.0f32)
        .with("u_TextureMix", 0.0f32)
        .shared();
    let shrine_mat = Material::new("shrine", lit.clone())
        .with("s_Diffuse", shrine_color)
        .with("s_Specular", no_spec)
        .with("u_Shininess", 8.0f32)
        .with("u_TextureMix", 0.0f32)
        .shared();
    let drift_mat = Material::new("drifting_crystal", lit.clone())
        .with("s_Diffuse", crystal_normal.clone())
        .with("s_Diffuse2", crystal_glow.clone())
        .with("s_Specular", crystal_albedo.clone())
        .with("u_Shininess", 8.0f32)
        .with("u_TextureMix", 0.6f32)
        .shared();
    let crystal_mat = Material::new("crystal", lit)
        .with("s_Diffuse", crystal_normal)
        .with("s_Diffuse2", crystal_albedo)
        .with("s_Specular", crystal_glow)
        .with("u_Shininess", 8.0f32)
        .with("u_TextureMix", 0.7f32)
        .shared();
    let sky_rotation = Mat3::from_rotation_x(90f32.to_radians());
    let skybox_mat = Material::new("skybox", skybox_shader)
        .with_layer(SKYBOX_LAYER)
        .with("s_Environment", sky)
        .with("u_EnvironmentRotation", sky_rotation)
        .shared();

    let mut textures = TextureToggle::new(white);
    for material in [&stone_mat, &shrine_mat, &drift_mat, &crystal_mat] {
        textures.track(material, "s_Diffuse");
    }
    textures.track(&drift_mat, "s_Diffuse2");

    let plane = mesh(loader, PLANE)?;
    let shrine_mesh = mesh(loader, SHRINE)?;
    let crystal = mesh(loader, CRYSTAL)?;
    // Icosphere with inverted faces.
    let sphere = tracker.create_mesh("skybox_sphere", 12, 60);

    let mut scene = Scene::new("shrine");
    let mut registry = BehaviorRegistry::new();

    let ground = Transform::default().with_scale(Vec3::new(0.35, 0.35, 1.0));
    drawable(&mut scene, "ground", ground, &plane, &stone_mat)?;
    let shrine = drawable(
        &mut scene,
        "shrine",
        upright(Vec3::ZERO),
        &shrine_mesh,
        &shrine_mat,
    )?;

    let crystal_mid = drawable(
        &mut scene,
        "crystal_mid",
        upright(Vec3::new(0.0, 0.0, 5.0)),
        &crystal,
        &crystal_mat,
    )?;
    let hover = vec![Vec3::new(0.0, 0.0, 5.5), Vec3::new(0.0, 0.0, 5.0)];
    registry.bind(crystal_mid, FollowPath::new(hover, 0.25));

    // Each drifting crystal runs one edge of the square and back.
    let mut spin = SpinAnimation::new().with(crystal_mid, 90.0, 1);
    for (i, name) in DRIFTERS.into_iter().enumerate() {
        let start = CORNERS[i];
        let goal = CORNERS[(i + 1) % CORNERS.len()];
        let entity = drawable(&mut scene, name, upright(start), &crystal, &drift_mat)?;
        let path = FollowPath::new(vec![goal, start], 2.0);
        registry.bind(entity, path);
        spin = spin.with(entity, 90.0, -2);
    }

    let origin = Transform::default();
    drawable(&mut scene, "skybox", origin, &sphere, &skybox_mat)?;

    let camera = scene.create_entity("camera");
    let mut eye = Transform::from_position(Vec3::new(0.0, 7.0, 7.0));
    eye.look_at(Vec3::ZERO, Vec3::Z);
    scene.add_transform(camera, eye)?;
    let lens = Camera::perspective(90.0, viewport.aspect()).with_ortho_height(3.0);
    scene.add_camera(camera, lens)?;
    registry.bind(camera, CameraControl::default());

    let capture = PassthroughEffect::new(gpu, viewport, blit.clone())?;
    scene.create_entity("basic_effect");
    let mut chain = PostEffectChain::new(Box::new(capture));
    let greyscale_owner = scene.create_entity("greyscale_effect");
    let greyscale = GreyscaleEffect::new(gpu, viewport, greyscale, blit)?;
    chain.register(greyscale_owner, Box::new(greyscale));
    let bloom_owner = scene.create_entity("bloom_effect");
    let bloom = BloomEffect::new(gpu, viewport, bloom_shaders)?;
    chain.register(bloom_owner, Box::new(bloom));

    tracing::info!(
        entities = scene.entity_count(),
        resources = tracker.live_count(),
        effects = chain.len(),
        "demo scene built"
    );

    Ok(Demo {
        setup: SceneSetup {
            scene,
            registry,
            chain,
            tracker,
        },
        controllables: Controllables::new(vec![shrine]),
        spin,
        textures,
    })
}

#[cfg(test)]
mod tests {
    use framecore_assets::MemoryAssetLoader;
    use framecore_render::{RecordingBackend, ResourceTracker};

    use super::*;

    #[test]
    fn builds_from_builtin_manifest() {
        let mut loader = MemoryAssetLoader::new(builtin_manifest(), ResourceTracker::new());
        let mut gpu = RecordingBackend::new();
        let demo = build(&mut loader, &mut gpu, Viewport::default()).unwrap();
        let scene = &demo.setup.scene;
        assert_eq!(scene.drawables().count(), 8);
        assert!(scene.find("crystal_down").is_some());
        assert_eq!(demo.setup.chain.names(), vec!["greyscale", "bloom"]);
        assert_eq!(demo.setup.registry.behavior_count(), 6);
        assert_eq!(demo.controllables.len(), 1);
        assert_eq!(demo.textures.len(), 5);
    }

    #[test]
    fn missing_asset_aborts() {
        let mut manifest = builtin_manifest();
        manifest.meshes.remove(CRYSTAL);
        let mut loader = MemoryAssetLoader::new(manifest, ResourceTracker::new());
        let mut gpu = RecordingBackend::new();
        assert!(build(&mut loader, &mut gpu, Viewport::default()).is_err());
    }
}
