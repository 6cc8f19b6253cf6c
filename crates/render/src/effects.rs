use crate::backend::{GraphicsBackend, Viewport};
use crate::error::RenderError;
use crate::post::{EffectBuffers, EffectSettings, PostEffect, fullscreen_pass};
use crate::resource::ShaderRef;
use crate::uniforms::UniformValue;

const IMAGE: &str = "s_Image";

/// Copies its source unchanged. Also used as the base capture target.
#[derive(Debug)]
pub struct PassthroughEffect {
    buffers: EffectBuffers,
    blit: ShaderRef,
}

impl PassthroughEffect {
    pub fn new(
        gpu: &mut dyn GraphicsBackend,
        viewport: Viewport,
        blit: ShaderRef,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            buffers: EffectBuffers::create(gpu, "passthrough", 1, viewport)?,
            blit,
        })
    }
}

impl PostEffect for PassthroughEffect {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn buffers(&self) -> &EffectBuffers {
        &self.buffers
    }

    fn buffers_mut(&mut self) -> &mut EffectBuffers {
        &mut self.buffers
    }

    fn apply_effect(
        &mut self,
        gpu: &mut dyn GraphicsBackend,
        source: &EffectBuffers,
    ) -> Result<(), RenderError> {
        let input = source.target(0)?;
        self.buffers.bind(gpu, 0)?;
        fullscreen_pass(gpu, &self.blit, &[(IMAGE, input)], &[]);
        self.buffers.unbind(gpu);
        Ok(())
    }

    fn draw_to_screen(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        let output = self.buffers.target(0)?;
        fullscreen_pass(gpu, &self.blit, &[(IMAGE, output)], &[]);
        Ok(())
    }
}

/// Luminance conversion blended by `intensity`.
#[derive(Debug)]
pub struct GreyscaleEffect {
    buffers: EffectBuffers,
    shader: ShaderRef,
    blit: ShaderRef,
    intensity: f32,
}

impl GreyscaleEffect {
    pub fn new(
        gpu: &mut dyn GraphicsBackend,
        viewport: Viewport,
        shader: ShaderRef,
        blit: ShaderRef,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            buffers: EffectBuffers::create(gpu, "greyscale", 1, viewport)?,
            shader,
            blit,
            intensity: EffectSettings::default().intensity,
        })
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

impl PostEffect for GreyscaleEffect {
    fn name(&self) -> &str {
        "greyscale"
    }

    fn buffers(&self) -> &EffectBuffers {
        &self.buffers
    }

    fn buffers_mut(&mut self) -> &mut EffectBuffers {
        &mut self.buffers
    }

    fn apply_effect(
        &mut self,
        gpu: &mut dyn GraphicsBackend,
        source: &EffectBuffers,
    ) -> Result<(), RenderError> {
        let input = source.target(0)?;
        self.buffers.bind(gpu, 0)?;
        fullscreen_pass(
            gpu,
            &self.shader,
            &[(IMAGE, input)],
            &[("u_Intensity", UniformValue::Float(self.intensity))],
        );
        self.buffers.unbind(gpu);
        Ok(())
    }

    fn draw_to_screen(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        let output = self.buffers.target(0)?;
        fullscreen_pass(gpu, &self.blit, &[(IMAGE, output)], &[]);
        Ok(())
    }

    fn tune(&mut self, settings: &EffectSettings) {
        self.intensity = settings.intensity;
    }
}

/// Programs used by [`BloomEffect`].
#[derive(Debug, Clone)]
pub struct BloomShaders {
    /// Keeps pixels brighter than `u_Threshold`.
    pub bright: ShaderRef,
    /// Separable gaussian; `u_Horizontal` picks the axis.
    pub blur: ShaderRef,
    /// Adds `s_Bloom` on top of `s_Image`.
    pub composite: ShaderRef,
    pub blit: ShaderRef,
}

const COMPOSITE: usize = 0;
const BRIGHT: usize = 1;
const SCRATCH: usize = 2;

/// Bright pass, ping-pong blur, then additive composite over the source.
#[derive(Debug)]
pub struct BloomEffect {
    buffers: EffectBuffers,
    shaders: BloomShaders,
    threshold: f32,
    passes: u32,
}

impl BloomEffect {
    pub fn new(
        gpu: &mut dyn GraphicsBackend,
        viewport: Viewport,
        shaders: BloomShaders,
    ) -> Result<Self, RenderError> {
        let defaults = EffectSettings::default();
        Ok(Self {
            buffers: EffectBuffers::create(gpu, "bloom", 3, viewport)?,
            shaders,
            threshold: defaults.threshold,
            passes: defaults.passes,
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Buffer holding the blurred highlights after `passes` blur steps.
    fn blurred(&self) -> usize {
        if self.passes % 2 == 1 { SCRATCH } else { BRIGHT }
    }
}

impl PostEffect for BloomEffect {
    fn name(&self) -> &str {
        "bloom"
    }

    fn buffers(&self) -> &EffectBuffers {
        &self.buffers
    }

    fn buffers_mut(&mut self) -> &mut EffectBuffers {
        &mut self.buffers
    }

    fn apply_effect(
        &mut self,
        gpu: &mut dyn GraphicsBackend,
        source: &EffectBuffers,
    ) -> Result<(), RenderError> {
        let input = source.target(0)?;

        self.buffers.bind(gpu, BRIGHT)?;
        fullscreen_pass(
            gpu,
            &self.shaders.bright,
            &[(IMAGE, input)],
            &[("u_Threshold", UniformValue::Float(self.threshold))],
        );

        for pass in 0..self.passes {
            let horizontal = pass % 2 == 0;
            let (from, to) = if horizontal {
                (BRIGHT, SCRATCH)
            } else {
                (SCRATCH, BRIGHT)
            };
            let from = self.buffers.target(from)?;
            self.buffers.bind(gpu, to)?;
            fullscreen_pass(
                gpu,
                &self.shaders.blur,
                &[(IMAGE, from)],
                &[("u_Horizontal", UniformValue::Int(i32::from(horizontal)))],
            );
        }

        let bloom = self.buffers.target(self.blurred())?;
        self.buffers.bind(gpu, COMPOSITE)?;
        fullscreen_pass(
            gpu,
            &self.shaders.composite,
            &[(IMAGE, input), ("s_Bloom", bloom)],
            &[],
        );
        self.buffers.unbind(gpu);
        Ok(())
    }

    fn draw_to_screen(&mut self, gpu: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        let output = self.buffers.target(COMPOSITE)?;
        fullscreen_pass(gpu, &self.shaders.blit, &[(IMAGE, output)], &[]);
        Ok(())
    }

    fn tune(&mut self, settings: &EffectSettings) {
        if settings.threshold != self.threshold || settings.passes != self.passes {
            tracing::debug!(
                threshold = settings.threshold,
                passes = settings.passes,
                "bloom tuned"
            );
        }
        self.threshold = settings.threshold;
        self.passes = settings.passes;
    }
}
