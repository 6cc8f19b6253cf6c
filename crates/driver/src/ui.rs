use framecore_render::{EffectSettings, MaterialParam, MaterialRef, SceneUniforms, TextureRef};
use framecore_tools::FrameSummary;
use serde::{Deserialize, Serialize};

/// Everything the UI overlay may edit. Owned by the driver and lent to the
/// overlay once per frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub scene: SceneUniforms,
    pub active_effect: usize,
    pub effect_settings: EffectSettings,
    pub textures_enabled: bool,
}

impl UiState {
    pub fn new(active_effect: usize) -> Self {
        Self {
            active_effect,
            textures_enabled: true,
            ..Default::default()
        }
    }
}

/// Immediate-mode overlay drawn after the 3D pass.
pub trait UiOverlay {
    fn draw(&mut self, state: &mut UiState, summary: &FrameSummary);
}

/// Overlay that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverlay;

impl UiOverlay for NoOverlay {
    fn draw(&mut self, _: &mut UiState, _: &FrameSummary) {}
}

/// Swaps tracked material textures for a placeholder while textures are
/// disabled, and restores the originals when re-enabled.
#[derive(Debug)]
pub struct TextureToggle {
    placeholder: TextureRef,
    slots: Vec<(MaterialRef, String, TextureRef)>,
    enabled: bool,
}

impl TextureToggle {
    pub fn new(placeholder: TextureRef) -> Self {
        Self {
            placeholder,
            slots: Vec::new(),
            enabled: true,
        }
    }

    /// Track texture parameter `name` of `material`. Returns false when the
    /// material has no texture under that name.
    pub fn track(&mut self, material: &MaterialRef, name: &str) -> bool {
        let original = match material.borrow().get(name) {
            Some(MaterialParam::Texture(texture)) => texture.clone(),
            _ => return false,
        };
        let slot = (material.clone(), name.to_string(), original);
        self.slots.push(slot);
        true
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bring every tracked material in line with `enabled`. Returns true when
    /// anything changed.
    pub fn sync(&mut self, enabled: bool) -> bool {
        if enabled == self.enabled {
            return false;
        }
        for (material, name, original) in &self.slots {
            let texture = if enabled {
                original.clone()
            } else {
                self.placeholder.clone()
            };
            material.borrow_mut().set(name.as_str(), texture);
        }
        self.enabled = enabled;
        tracing::debug!(
            enabled,
            materials = self.slots.len(),
            "material textures toggled"
        );
        true
    }
}
