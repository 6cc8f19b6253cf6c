use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Projection parameters for a camera entity. Position and orientation come
/// from the entity's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub fov_degrees: f32,
    /// Visible height in world units when orthographic.
    pub ortho_height: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub orthographic: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            ortho_height: 3.0,
            near: 0.01,
            far: 1000.0,
            aspect: 16.0 / 9.0,
            orthographic: false,
        }
    }
}

impl Camera {
    pub fn perspective(fov_degrees: f32, aspect: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            ..Self::default()
        }
    }

    pub fn with_ortho_height(mut self, height: f32) -> Self {
        self.ortho_height = height;
        self
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Flip between perspective and orthographic. Returns the new mode.
    pub fn toggle_ortho(&mut self) -> bool {
        self.orthographic = !self.orthographic;
        self.orthographic
    }

    pub fn projection_matrix(&self) -> Mat4 {
        if self.orthographic {
            let half_h = self.ortho_height * 0.5;
            let half_w = half_h * self.aspect;
            Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, self.near, self.far)
        } else {
            Mat4::perspective_rh_gl(
                self.fov_degrees.to_radians(),
                self.aspect,
                self.near,
                self.far,
            )
        }
    }
}
