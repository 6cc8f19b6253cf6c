use framecore_driver::{UiOverlay, UiState};
use framecore_render::ShadingMode;
use framecore_tools::FrameSummary;

/// A click on one of the demo panel's controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    Mode(ShadingMode),
    ToggleTextures,
    ToggleRim,
    Threshold(f32),
    Passes(u32),
}

/// Stand-in for the interactive panel. Each click fires once the frame
/// count reaches its mark.
#[derive(Debug, Default)]
pub struct ScriptedPanel {
    events: Vec<(u64, PanelEvent)>,
    applied: usize,
}

impl ScriptedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, frame: u64, event: PanelEvent) -> Self {
        self.events.push((frame, event));
        self.events.sort_by_key(|(frame, _)| *frame);
        self
    }

    pub fn applied(&self) -> usize {
        self.applied
    }
}

/// Bloom shading needs the bloom effect; every other mode uses the first.
fn effect_for(mode: ShadingMode) -> usize {
    match mode {
        ShadingMode::AmbientSpecularBloom => 1,
        _ => 0,
    }
}

impl UiOverlay for ScriptedPanel {
    fn draw(&mut self, state: &mut UiState, summary: &FrameSummary) {
        while let Some(&(frame, event)) = self.events.get(self.applied) {
            if frame > summary.frames {
                break;
            }
            tracing::debug!(frame, ?event, "panel event");
            match event {
                PanelEvent::Mode(mode) => {
                    state.scene.mode = mode;
                    state.active_effect = effect_for(mode);
                }
                PanelEvent::ToggleTextures => state.textures_enabled = !state.textures_enabled,
                PanelEvent::ToggleRim => state.scene.rim = !state.scene.rim,
                PanelEvent::Threshold(threshold) => state.effect_settings.threshold = threshold,
                PanelEvent::Passes(passes) => state.effect_settings.passes = passes,
            }
            self.applied += 1;
        }
    }
}
