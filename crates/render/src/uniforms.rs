use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::backend::GraphicsBackend;

/// Uniform names shared by the scene shaders.
pub mod names {
    pub const VIEW: &str = "u_View";
    pub const PROJECTION: &str = "u_Projection";
    pub const CAMERA_POSITION: &str = "u_CamPos";
    pub const MODEL_VIEW_PROJECTION: &str = "u_ModelViewProjection";
    pub const MODEL: &str = "u_Model";
    pub const NORMAL_MATRIX: &str = "u_NormalMatrix";

    pub const LIGHT_POSITION: &str = "u_LightPos";
    pub const LIGHT_COLOR: &str = "u_LightCol";
    pub const LIGHT_AMBIENT_POWER: &str = "u_AmbientLightStrength";
    pub const LIGHT_SPECULAR_POWER: &str = "u_SpecularLightStrength";
    pub const AMBIENT_COLOR: &str = "u_AmbientCol";
    pub const AMBIENT_POWER: &str = "u_AmbientStrength";
    pub const ATTENUATION_CONSTANT: &str = "u_LightAttenuationConstant";
    pub const ATTENUATION_LINEAR: &str = "u_LightAttenuationLinear";
    pub const ATTENUATION_QUADRATIC: &str = "u_LightAttenuationQuadratic";
    pub const MODE: &str = "u_Mode";
    pub const RIM: &str = "u_rim";
}

/// A plain-data uniform value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(v: Mat3) -> Self {
        Self::Mat3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

/// Point light and ambient terms for the lit scene shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingParams {
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub light_ambient_power: f32,
    pub light_specular_power: f32,
    pub ambient_color: Vec3,
    pub ambient_power: f32,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            light_position: Vec3::new(0.0, 0.0, 10.0),
            light_color: Vec3::new(0.9, 0.85, 0.5),
            light_ambient_power: 0.95,
            light_specular_power: 1.0,
            ambient_color: Vec3::ONE,
            ambient_power: 0.1,
            attenuation_constant: 1.0,
            attenuation_linear: 0.09,
            attenuation_quadratic: 0.032,
        }
    }
}

/// Lighting model selector pushed as `u_Mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    #[default]
    AmbientSpecular,
    NoLighting,
    AmbientOnly,
    SpecularOnly,
    AmbientSpecularBloom,
}

impl ShadingMode {
    pub fn as_uniform(self) -> i32 {
        match self {
            Self::AmbientSpecular => 0,
            Self::NoLighting => 1,
            Self::AmbientOnly => 2,
            Self::SpecularOnly => 3,
            Self::AmbientSpecularBloom => 7,
        }
    }
}

/// Scene-level uniforms the UI overlay may edit between frames.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneUniforms {
    pub lighting: LightingParams,
    pub mode: ShadingMode,
    pub rim: bool,
}

impl SceneUniforms {
    pub fn push(&self, gpu: &mut dyn GraphicsBackend) {
        let l = &self.lighting;
        let values: [(&str, UniformValue); 11] = [
            (names::LIGHT_POSITION, l.light_position.into()),
            (names::LIGHT_COLOR, l.light_color.into()),
            (names::LIGHT_AMBIENT_POWER, l.light_ambient_power.into()),
            (names::LIGHT_SPECULAR_POWER, l.light_specular_power.into()),
            (names::AMBIENT_COLOR, l.ambient_color.into()),
            (names::AMBIENT_POWER, l.ambient_power.into()),
            (names::ATTENUATION_CONSTANT, l.attenuation_constant.into()),
            (names::ATTENUATION_LINEAR, l.attenuation_linear.into()),
            (names::ATTENUATION_QUADRATIC, l.attenuation_quadratic.into()),
            (names::MODE, self.mode.as_uniform().into()),
            (names::RIM, i32::from(self.rim).into()),
        ];
        for (name, value) in &values {
            gpu.set_uniform(name, value);
        }
    }
}

/// Per-frame globals, computed once after the world-matrix pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub scene: SceneUniforms,
}

impl FrameUniforms {
    /// Build from the camera's world matrix and projection.
    pub fn from_camera(camera_world: Mat4, projection: Mat4, scene: SceneUniforms) -> Self {
        let view = camera_world.inverse();
        Self {
            view,
            projection,
            view_projection: projection * view,
            camera_position: camera_world.w_axis.truncate(),
            scene,
        }
    }

    /// Push into the currently bound shader.
    pub fn push(&self, gpu: &mut dyn GraphicsBackend) {
        gpu.set_uniform(names::VIEW, &self.view.into());
        gpu.set_uniform(names::PROJECTION, &self.projection.into());
        gpu.set_uniform(names::CAMERA_POSITION, &self.camera_position.into());
        self.scene.push(gpu);
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::from_camera(Mat4::IDENTITY, Mat4::IDENTITY, SceneUniforms::default())
    }
}
