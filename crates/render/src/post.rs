//! Offscreen post-processing.
//!
//! A [`PostEffectChain`] owns one capture effect that the scene is drawn
//! into, plus a list of registered effects of which exactly one is active.

use framecore_common::EntityId;
use serde::{Deserialize, Serialize};

use crate::backend::{GraphicsBackend, RenderTargetDesc, TargetId, Viewport};
use crate::error::RenderError;
use crate::resource::ShaderProgram;
use crate::uniforms::UniformValue;

/// Viewport-sized render targets owned by one effect.
#[derive(Debug)]
pub struct EffectBuffers {
    label: String,
    targets: Vec<TargetId>,
    bound: Option<usize>,
}

impl EffectBuffers {
    pub fn create(
        gpu: &mut dyn GraphicsBackend,
        label: impl Into<String>,
        count: usize,
        viewport: Viewport,
    ) -> Result<Self, RenderError> {
        viewport.validate()?;
        let label = label.into();
        let mut targets = Vec::with_capacity(count);
        for index in 0..count {
            let desc = RenderTargetDesc {
                label: format!("{label}[{index}]"),
                width: viewport.width,
                height: viewport.height,
                depth: index == 0,
            };
            targets.push(gpu.create_render_target(&desc)?);
        }
        Ok(Self {
            label,
            targets,
            bound: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, index: usize) -> Result<TargetId, RenderError> {
        self.targets
            .get(index)
            .copied()
            .ok_or_else(|| RenderError::BufferIndexOutOfRange {
                effect: self.label.clone(),
                index,
                len: self.targets.len(),
            })
    }

    pub fn bound(&self) -> Option<usize> {
        self.bound
    }

    pub fn clear(&self, gpu: &mut dyn GraphicsBackend) {
        for target in &self.targets {
            gpu.clear_render_target(*target);
        }
    }

    pub fn bind(&mut self, gpu: &mut dyn GraphicsBackend, index: usize) -> Result<(), RenderError> {
        let target = self.target(index)?;
        gpu.bind_render_target(target);
        self.bound = Some(index);
        Ok(())
    }

    /// Return drawing to the default framebuffer.
    pub fn unbind(&mut self, gpu: &mut dyn GraphicsBackend) {
        gpu.bind_default_framebuffer();
        self.bound = None;
    }

    pub fn destroy(&mut self, gpu: &mut dyn GraphicsBackend) {
        for target in self.targets.drain(..) {
            gpu.destroy_render_target(target);
        }
        self.bound = None;
    }
}

/// Tunables the UI overlay edits for the active effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Bloom bright-pass cutoff, `0.0..=1.0`.
    pub threshold: f32,
    /// Bloom blur passes, `0..=10`.
    pub passes: u32,
    /// Greyscale blend, `0.0..=1.0`.
    pub intensity: f32,
}

impl EffectSettings {
    pub const MAX_PASSES: u32 = 10;

    pub fn clamped(self) -> Self {
        Self {
            threshold: self.threshold.clamp(0.0, 1.0),
            passes: self.passes.min(Self::MAX_PASSES),
            intensity: self.intensity.clamp(0.0, 1.0),
        }
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            passes: Self::MAX_PASSES,
            intensity: 1.0,
        }
    }
}

/// A render-target based screen effect.
///
/// Implementors only write `apply_effect` and `draw_to_screen`; buffer
/// management defaults to the owned [`EffectBuffers`].
pub trait PostEffect {
    fn name(&self) -> &str;
    fn buffers(&self) -> &EffectBuffers;
    fn buffers_mut(&mut self) -> &mut EffectBuffers;

    fn clear(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.buffers().clear(gpu);
    }

    fn bind_buffer(
        &mut self,
        gpu: &mut dyn GraphicsBackend,
        index: usize,
    ) -> Result<(), RenderError> {
        self.buffers_mut().bind(gpu, index)
    }

    fn unbind_buffer(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.buffers_mut().unbind(gpu);
    }

    /// Process `source`'s first buffer into this effect's buffers.
    fn apply_effect(
        &mut self,
        gpu: &mut dyn GraphicsBackend,
        source: &EffectBuffers,
    ) -> Result<(), RenderError>;

    /// Composite the processed result onto the default framebuffer.
    fn draw_to_screen(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError>;

    fn tune(&mut self, _settings: &EffectSettings) {}

    fn release(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.buffers_mut().destroy(gpu);
    }
}

/// Draw one fullscreen quad with `shader`, sampling `inputs` from slots
/// `0..inputs.len()` in order.
pub(crate) fn fullscreen_pass(
    gpu: &mut dyn GraphicsBackend,
    shader: &ShaderProgram,
    inputs: &[(&str, TargetId)],
    uniforms: &[(&str, UniformValue)],
) {
    gpu.bind_shader(shader);
    for (name, value) in shader.defaults() {
        gpu.set_uniform(&name, &value);
    }
    for (slot, (sampler, target)) in (0u32..).zip(inputs) {
        gpu.bind_target_texture(slot, *target);
        gpu.set_uniform(sampler, &UniformValue::Int(slot as i32));
    }
    for (name, value) in uniforms {
        gpu.set_uniform(name, value);
    }
    gpu.draw_fullscreen_quad();
    for slot in 0..inputs.len() as u32 {
        gpu.unbind_texture(slot);
    }
}

struct Registered {
    owner: EntityId,
    effect: Box<dyn PostEffect>,
}

/// Base capture plus the registered effects, one of which is active.
///
/// Every frame all effects are cleared, but only the active one is applied
/// and drawn. A requested switch is committed at the next [`clear_all`], so
/// it takes effect for the whole of the following frame.
///
/// [`clear_all`]: PostEffectChain::clear_all
pub struct PostEffectChain {
    capture: Box<dyn PostEffect>,
    effects: Vec<Registered>,
    active: usize,
    pending: Option<usize>,
}

impl PostEffectChain {
    pub fn new(capture: Box<dyn PostEffect>) -> Self {
        Self {
            capture,
            effects: Vec::new(),
            active: 0,
            pending: None,
        }
    }

    /// Append an effect; returns its index.
    pub fn register(&mut self, owner: EntityId, effect: Box<dyn PostEffect>) -> usize {
        tracing::debug!(effect = effect.name(), owner = %owner.short(), "registered post effect");
        self.effects.push(Registered { owner, effect });
        self.effects.len() - 1
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|r| r.effect.name()).collect()
    }

    pub fn owner(&self, index: usize) -> Option<EntityId> {
        self.effects.get(index).map(|r| r.owner)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_name(&self) -> Option<&str> {
        self.effects.get(self.active).map(|r| r.effect.name())
    }

    pub fn capture(&self) -> &dyn PostEffect {
        self.capture.as_ref()
    }

    fn check_index(&self, index: usize) -> Result<(), RenderError> {
        if index >= self.effects.len() {
            return Err(RenderError::EffectIndexOutOfRange {
                index,
                len: self.effects.len(),
            });
        }
        Ok(())
    }

    /// Select the active effect for the next frame.
    pub fn request_active(&mut self, index: usize) -> Result<(), RenderError> {
        self.check_index(index)?;
        if index != self.active {
            self.pending = Some(index);
        }
        Ok(())
    }

    /// Commit any pending switch and clear the capture and every registered
    /// effect.
    pub fn clear_all(&mut self, gpu: &mut dyn GraphicsBackend) {
        if let Some(next) = self.pending.take() {
            tracing::debug!(from = self.active, to = next, "active post effect switched");
            self.active = next;
        }
        self.capture.clear(gpu);
        for r in &mut self.effects {
            r.effect.clear(gpu);
        }
    }

    pub fn begin_capture(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        self.capture.bind_buffer(gpu, 0)
    }

    pub fn end_capture(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.capture.unbind_buffer(gpu);
    }

    /// Run the active effect over the captured frame.
    pub fn apply_active(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        self.check_index(self.active)?;
        let source = self.capture.buffers();
        self.effects[self.active].effect.apply_effect(gpu, source)
    }

    pub fn draw_active(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        self.check_index(self.active)?;
        self.effects[self.active].effect.draw_to_screen(gpu)
    }

    pub fn tune_active(&mut self, settings: &EffectSettings) {
        if let Some(r) = self.effects.get_mut(self.active) {
            r.effect.tune(&settings.clamped());
        }
    }

    /// Destroy every render target owned by the chain.
    pub fn release(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.capture.release(gpu);
        for r in &mut self.effects {
            r.effect.release(gpu);
        }
    }
}

impl std::fmt::Debug for PostEffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostEffectChain")
            .field("capture", &self.capture.name())
            .field("effects", &self.names())
            .field("active", &self.active)
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::recording::RecordingBackend;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Logs which of its hooks ran.
    struct Probe {
        name: &'static str,
        buffers: EffectBuffers,
        log: Log,
    }

    impl Probe {
        fn boxed(gpu: &mut RecordingBackend, name: &'static str, log: &Log) -> Box<Self> {
            Box::new(Self {
                name,
                buffers: EffectBuffers::create(gpu, name, 1, Viewport::new(8, 8)).unwrap(),
                log: Rc::clone(log),
            })
        }

        fn note(&self, what: &str) {
            self.log.borrow_mut().push(format!("{what}:{}", self.name));
        }
    }

    impl PostEffect for Probe {
        fn name(&self) -> &str {
            self.name
        }
        fn buffers(&self) -> &EffectBuffers {
            &self.buffers
        }
        fn buffers_mut(&mut self) -> &mut EffectBuffers {
            &mut self.buffers
        }
        fn clear(&mut self, gpu: &mut dyn GraphicsBackend) {
            self.note("clear");
            self.buffers.clear(gpu);
        }
        fn apply_effect(
            &mut self,
            _: &mut dyn GraphicsBackend,
            source: &EffectBuffers,
        ) -> Result<(), RenderError> {
            source.target(0)?;
            self.note("apply");
            Ok(())
        }
        fn draw_to_screen(&mut self, _: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
            self.note("draw");
            Ok(())
        }
        fn tune(&mut self, settings: &EffectSettings) {
            self.note(&format!("tune{}", settings.passes));
        }
    }

    fn chain(gpu: &mut RecordingBackend, log: &Log) -> PostEffectChain {
        let mut chain = PostEffectChain::new(Probe::boxed(gpu, "capture", log));
        chain.register(EntityId::new(), Probe::boxed(gpu, "a", log));
        chain.register(EntityId::new(), Probe::boxed(gpu, "b", log));
        chain
    }

    fn run_frame(chain: &mut PostEffectChain, gpu: &mut RecordingBackend) {
        chain.clear_all(gpu);
        chain.begin_capture(gpu).unwrap();
        chain.end_capture(gpu);
        chain.apply_active(gpu).unwrap();
        chain.draw_active(gpu).unwrap();
    }

    #[test]
    fn all_effects_cleared_only_active_applied() {
        let log = Log::default();
        let mut gpu = RecordingBackend::new();
        let mut chain = chain(&mut gpu, &log);
        chain.request_active(1).unwrap();

        run_frame(&mut chain, &mut gpu);

        assert_eq!(
            *log.borrow(),
            ["clear:capture", "clear:a", "clear:b", "apply:b", "draw:b"]
        );
        assert_eq!(chain.active_name(), Some("b"));
    }

    #[test]
    fn switch_lands_on_next_clear() {
        let log = Log::default();
        let mut gpu = RecordingBackend::new();
        let mut chain = chain(&mut gpu, &log);
        run_frame(&mut chain, &mut gpu);
        assert_eq!(chain.active_index(), 0);

        chain.request_active(1).unwrap();
        assert_eq!(chain.active_index(), 0);
        chain.clear_all(&mut gpu);
        assert_eq!(chain.active_index(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let log = Log::default();
        let mut gpu = RecordingBackend::new();
        let mut chain = chain(&mut gpu, &log);
        let err = chain.request_active(2).unwrap_err();
        assert!(matches!(
            err,
            RenderError::EffectIndexOutOfRange { index: 2, len: 2 }
        ));
        assert_eq!(chain.active_index(), 0);
    }

    #[test]
    fn empty_chain_fails_at_apply() {
        let log = Log::default();
        let mut gpu = RecordingBackend::new();
        let mut chain = PostEffectChain::new(Probe::boxed(&mut gpu, "capture", &log));
        chain.clear_all(&mut gpu);
        assert!(chain.apply_active(&mut gpu).is_err());
        assert!(chain.draw_active(&mut gpu).is_err());
    }

    #[test]
    fn tune_reaches_active_effect_clamped() {
        let log = Log::default();
        let mut gpu = RecordingBackend::new();
        let mut chain = chain(&mut gpu, &log);
        chain.tune_active(&EffectSettings {
            threshold: 3.0,
            passes: 40,
            intensity: -1.0,
        });
        assert_eq!(*log.borrow(), ["tune10:a"]);
    }

    #[test]
    fn release_destroys_every_target() {
        let log = Log::default();
        let mut gpu = RecordingBackend::new();
        let mut chain = chain(&mut gpu, &log);
        assert_eq!(gpu.live_targets().len(), 3);
        chain.release(&mut gpu);
        assert!(gpu.live_targets().is_empty());
    }

    #[test]
    fn buffer_index_is_checked() {
        let mut gpu = RecordingBackend::new();
        let mut buffers = EffectBuffers::create(&mut gpu, "x", 2, Viewport::new(4, 4)).unwrap();
        assert!(buffers.bind(&mut gpu, 1).is_ok());
        assert_eq!(buffers.bound(), Some(1));
        let err = buffers.bind(&mut gpu, 2).unwrap_err();
        let RenderError::BufferIndexOutOfRange { index, len, .. } = err else {
            panic!("expected an out of range buffer, got {err}");
        };
        assert_eq!((index, len), (2, 2));
    }

    #[test]
    fn settings_clamp_to_slider_ranges() {
        let s = EffectSettings {
            threshold: -0.5,
            passes: 11,
            intensity: 2.0,
        }
        .clamped();
        assert_eq!((s.threshold, s.passes, s.intensity), (0.0, 10, 1.0));
    }
}
