use framecore_behavior::{BehaviorContext, BehaviorRegistry};
use framecore_input::{Action, InputSource, KeyToggles};
use framecore_render::{
    DrawStats, FrameUniforms, GraphicsBackend, PostEffectChain, RenderBatch, ResourceTracker,
    StateMinimizer, log_debug_message,
};
use framecore_scene::{Scene, SceneError};
use framecore_tools::{FrameInspector, FrameStats, FrameSummary};
use serde::Serialize;

use crate::clock::FrameClock;
use crate::config::DriverConfig;
use crate::controllables::Controllables;
use crate::error::FrameError;
use crate::script::SceneScript;
use crate::ui::{NoOverlay, TextureToggle, UiOverlay, UiState};

/// Scene content built before the loop starts.
pub struct SceneSetup {
    pub scene: Scene,
    pub registry: BehaviorRegistry,
    pub chain: PostEffectChain,
    pub tracker: ResourceTracker,
}

/// What one frame did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub delta: f32,
    pub actions: Vec<Action>,
    pub behaviors_run: usize,
    pub transforms_updated: usize,
    pub draw: DrawStats,
    pub active_effect: usize,
}

/// Runs the per-frame sequence over a scene.
pub struct FrameDriver<B, I> {
    config: DriverConfig,
    scene: Scene,
    registry: BehaviorRegistry,
    chain: PostEffectChain,
    tracker: ResourceTracker,
    backend: B,
    input: I,
    clock: FrameClock,
    stats: FrameStats,
    toggles: KeyToggles,
    controllables: Controllables,
    scripts: Vec<Box<dyn SceneScript>>,
    overlay: Box<dyn UiOverlay>,
    texture_toggle: Option<TextureToggle>,
    ui: UiState,
    batch: RenderBatch,
    minimizer: StateMinimizer,
}

impl<B: GraphicsBackend, I: InputSource> FrameDriver<B, I> {
    pub fn new(
        config: DriverConfig,
        setup: SceneSetup,
        backend: B,
        input: I,
    ) -> Result<Self, FrameError> {
        config.validate()?;
        let SceneSetup {
            mut scene,
            registry,
            mut chain,
            tracker,
        } = setup;

        if !chain.is_empty() {
            chain.request_active(config.initial_effect)?;
        }
        if let Some(camera) = scene.active_camera().and_then(|e| scene.camera_mut(e)) {
            camera.set_aspect(config.viewport.aspect());
        }

        let mut clock = FrameClock::new(config.max_delta);
        clock.start(input.now());

        tracing::info!(
            scene = scene.name(),
            entities = scene.entity_count(),
            behaviors = registry.behavior_count(),
            effects = chain.len(),
            "frame driver ready"
        );

        Ok(Self {
            stats: FrameStats::new(config.stats_capacity),
            ui: UiState::new(config.initial_effect),
            config,
            scene,
            registry,
            chain,
            tracker,
            backend,
            input,
            clock,
            toggles: KeyToggles::defaults(),
            controllables: Controllables::default(),
            scripts: Vec::new(),
            overlay: Box::new(NoOverlay),
            texture_toggle: None,
            batch: RenderBatch::new(),
            minimizer: StateMinimizer::new(),
        })
    }

    pub fn with_toggles(mut self, toggles: KeyToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Register the controllables and enable movement on the first one.
    pub fn with_controllables(mut self, controllables: Controllables) -> Self {
        controllables.sync(&mut self.registry);
        self.controllables = controllables;
        self
    }

    pub fn with_script(mut self, script: impl SceneScript + 'static) -> Self {
        self.scripts.push(Box::new(script));
        self
    }

    pub fn with_overlay(mut self, overlay: impl UiOverlay + 'static) -> Self {
        self.overlay = Box::new(overlay);
        self
    }

    pub fn with_texture_toggle(mut self, toggle: TextureToggle) -> Self {
        self.texture_toggle = Some(toggle);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.registry
    }

    pub fn chain(&self) -> &PostEffectChain {
        &self.chain
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn controllables(&self) -> &Controllables {
        &self.controllables
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn frame_count(&self) -> u64 {
        self.clock.frame()
    }

    pub fn summary(&self) -> FrameSummary {
        FrameInspector::summary(&self.stats, self.clock.frame())
    }

    /// Run one frame.
    pub fn run_frame(&mut self) -> Result<FrameReport, FrameError> {
        let span = tracing::trace_span!("frame", frame = self.clock.frame());
        let _enter = span.enter();

        self.input.poll_events();
        let time = self.clock.begin(self.input.now());

        for script in &mut self.scripts {
            script.apply(&mut self.scene)?;
        }

        self.stats.record(time.delta);

        let actions = if self.input.is_ui_focused() {
            Vec::new()
        } else {
            self.toggles.poll(&self.input)
        };
        for action in &actions {
            self.handle_action(*action)?;
        }

        let mut ctx = BehaviorContext {
            scene: &mut self.scene,
            input: &self.input,
            time,
        };
        let behaviors_run = self.registry.update_all(&mut ctx)?;

        self.chain.clear_all(&mut self.backend);
        self.backend
            .clear_default_framebuffer(self.config.clear_color, self.config.clear_depth);

        let transforms_updated = self.scene.update_world_matrices();

        let (camera_world, projection) = self.scene.camera_matrices()?;
        let frame = FrameUniforms::from_camera(camera_world, projection, self.ui.scene);

        self.scene.collect_batch(&mut self.batch);
        self.batch.sort();

        self.chain.begin_capture(&mut self.backend)?;
        let draw = self.minimizer.draw(&self.batch, &frame, &mut self.backend);
        self.chain.end_capture(&mut self.backend);

        self.chain.tune_active(&self.ui.effect_settings);
        self.chain.apply_active(&mut self.backend)?;
        self.chain.draw_active(&mut self.backend)?;

        self.draw_overlay()?;

        self.backend.present();
        self.clock.end();

        for msg in self.backend.drain_debug_messages() {
            log_debug_message(&msg);
        }
        self.release_dropped();

        Ok(FrameReport {
            frame: time.frame,
            delta: time.delta,
            actions,
            behaviors_run,
            transforms_updated,
            draw,
            active_effect: self.chain.active_index(),
        })
    }

    /// Run frames until the input source asks to close.
    pub fn run(&mut self) -> Result<FrameSummary, FrameError> {
        tracing::info!("frame loop started");
        while !self.input.close_requested() {
            self.run_frame()?;
        }
        let summary = self.summary();
        tracing::info!(%summary, "frame loop finished");
        Ok(summary)
    }

    /// Release scene-owned resources and hand back the backend.
    pub fn shutdown(self) -> B {
        let Self {
            mut scene,
            mut registry,
            mut chain,
            tracker,
            mut backend,
            texture_toggle,
            batch,
            ..
        } = self;

        chain.release(&mut backend);
        drop(chain);
        drop(texture_toggle);
        drop(batch);
        registry.clear();
        scene.clear();

        let released = tracker.drain_released();
        for id in &released {
            backend.release_resource(*id);
        }
        tracing::info!(
            released = released.len(),
            still_live = tracker.live_count(),
            "frame driver shut down"
        );
        backend
    }

    fn handle_action(&mut self, action: Action) -> Result<(), FrameError> {
        match action {
            Action::ToggleOrtho => {
                let entity = self
                    .scene
                    .active_camera()
                    .ok_or(SceneError::NoActiveCamera)?;
                if let Some(camera) = self.scene.camera_mut(entity) {
                    let ortho = camera.toggle_ortho();
                    tracing::debug!(ortho, "camera projection toggled");
                }
            }
            Action::CycleNext | Action::CyclePrevious => {
                let selected = if action == Action::CycleNext {
                    self.controllables.next()
                } else {
                    self.controllables.previous()
                };
                if let Some(entity) = selected {
                    self.controllables.sync(&mut self.registry);
                    tracing::debug!(
                        entity = %entity,
                        index = ?self.controllables.selected_index(),
                        "controllable selected"
                    );
                }
            }
            Action::ToggleRelative => {
                if let Some(relative) = self.controllables.toggle_relative(&mut self.registry) {
                    tracing::debug!(relative, "relative movement toggled");
                }
            }
        }
        Ok(())
    }

    /// Draw the overlay and act on whatever it changed.
    fn draw_overlay(&mut self) -> Result<(), FrameError> {
        let summary = FrameInspector::summary(&self.stats, self.clock.frame() + 1);
        let before = self.ui.active_effect;
        self.overlay.draw(&mut self.ui, &summary);

        if self.ui.active_effect != before {
            if let Err(err) = self.chain.request_active(self.ui.active_effect) {
                tracing::error!(error = %err, "overlay selected an invalid post effect");
                return Err(err.into());
            }
            tracing::debug!(effect = self.ui.active_effect, "post effect requested");
        }
        if let Some(toggle) = &mut self.texture_toggle {
            toggle.sync(self.ui.textures_enabled);
        }
        Ok(())
    }

    fn release_dropped(&mut self) {
        for id in self.tracker.drain_released() {
            tracing::trace!(id = id.0, "releasing GPU resource");
            self.backend.release_resource(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use framecore_behavior::{Behavior, BehaviorError, SimpleMove};
    use framecore_common::{EntityId, Transform};
    use framecore_input::{KeyCode, ScriptedInput};
    use framecore_render::{
        DebugMessage, DebugSeverity, GpuCommand, Material, PassthroughEffect, RecordingBackend,
        ShaderBuilder, ShaderRef, ShaderStageKind, Viewport,
    };
    use framecore_scene::{Camera, Renderable};
    use glam::Vec3;

    use super::*;

    fn shader(tracker: &ResourceTracker, label: &str) -> ShaderRef {
        ShaderBuilder::new(label)
            .stage(ShaderStageKind::Vertex, "v")
            .stage(ShaderStageKind::Fragment, "f")
            .link(tracker)
            .unwrap()
    }

    /// One drawable, one camera, two passthrough effects.
    fn setup(gpu: &mut RecordingBackend) -> (SceneSetup, EntityId) {
        let tracker = ResourceTracker::new();
        let blit = shader(&tracker, "blit");
        let viewport = Viewport::new(64, 32);
        let capture = PassthroughEffect::new(gpu, viewport, blit.clone()).unwrap();
        let mut chain = PostEffectChain::new(Box::new(capture));
        for _ in 0..2 {
            let effect = PassthroughEffect::new(gpu, viewport, blit.clone()).unwrap();
            chain.register(EntityId::new(), Box::new(effect));
        }

        let mut scene = Scene::new("test");
        let camera = scene.create_entity("camera");
        let eye = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        scene.add_transform(camera, eye).unwrap();
        scene.add_camera(camera, Camera::default()).unwrap();

        let prop = scene.create_entity("prop");
        scene.add_transform(prop, Transform::default()).unwrap();
        let material = Material::new("m", shader(&tracker, "lit")).shared();
        scene
            .add_renderable(
                prop,
                Renderable {
                    mesh: tracker.create_mesh("cube", 8, 36),
                    material,
                },
            )
            .unwrap();

        let setup = SceneSetup {
            scene,
            registry: BehaviorRegistry::new(),
            chain,
            tracker,
        };
        (setup, prop)
    }

    fn config() -> DriverConfig {
        DriverConfig {
            viewport: Viewport::new(64, 32),
            ..Default::default()
        }
    }

    #[test]
    fn frame_reports_each_pass() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let mut driver = FrameDriver::new(config(), setup, gpu, ScriptedInput::new(0.25)).unwrap();
        let report = driver.run_frame().unwrap();
        assert_eq!(report.frame, 0);
        assert_eq!(report.delta, 0.25);
        assert_eq!(report.transforms_updated, 2);
        assert_eq!(report.draw.draw_calls, 1);
        assert_eq!(driver.backend().frames_presented(), 1);
        assert_eq!(driver.frame_count(), 1);
        assert_eq!(driver.stats().latest(), Some(4.0));
    }

    #[test]
    fn gpu_commands_follow_frame_order() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        gpu.take_commands();
        let mut driver = FrameDriver::new(config(), setup, gpu, ScriptedInput::new(0.1)).unwrap();
        driver.run_frame().unwrap();

        let commands = driver.backend().commands();
        let first = |pred: &dyn Fn(&GpuCommand) -> bool| commands.iter().position(pred).unwrap();
        let last = |pred: &dyn Fn(&GpuCommand) -> bool| commands.iter().rposition(pred).unwrap();

        let last_target_clear = last(&|c| matches!(c, GpuCommand::ClearTarget(_)));
        let clear_default = first(&|c| matches!(c, GpuCommand::ClearDefault { .. }));
        let capture_bind = first(&|c| matches!(c, GpuCommand::BindTarget(_)));
        let mesh_draw = first(&|c| matches!(c, GpuCommand::DrawMesh { .. }));
        let fullscreen = first(&|c| matches!(c, GpuCommand::DrawFullscreen { .. }));
        let present = first(&|c| matches!(c, GpuCommand::Present));

        assert!(last_target_clear < clear_default);
        assert!(clear_default < capture_bind);
        assert!(capture_bind < mesh_draw);
        assert!(mesh_draw < fullscreen);
        assert!(fullscreen < present);
        assert_eq!(present, commands.len() - 1);
    }

    #[test]
    fn ui_focus_blocks_toggles() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let input = ScriptedInput::new(0.1)
            .tap(KeyCode::T, 0)
            .focus_ui(0..1)
            .tap(KeyCode::T, 2);
        let mut driver = FrameDriver::new(config(), setup, gpu, input).unwrap();
        assert!(driver.run_frame().unwrap().actions.is_empty());
        driver.run_frame().unwrap();
        let report = driver.run_frame().unwrap();
        assert_eq!(report.actions, vec![Action::ToggleOrtho]);
        let camera = driver.scene().active_camera().unwrap();
        assert!(driver.scene().camera(camera).unwrap().orthographic);
    }

    #[test]
    fn controllables_cycle_on_keypad() {
        let mut gpu = RecordingBackend::new();
        let (mut setup, prop) = setup(&mut gpu);
        let other = setup.scene.create_entity("other");
        setup
            .scene
            .add_transform(other, Transform::default())
            .unwrap();
        let prop_move = setup.registry.bind(prop, SimpleMove::default());
        let other_move = setup.registry.bind(other, SimpleMove::default());

        let input = ScriptedInput::new(0.1).tap(KeyCode::KeypadAdd, 0);
        let mut driver = FrameDriver::new(config(), setup, gpu, input)
            .unwrap()
            .with_controllables(Controllables::new(vec![prop, other]));
        assert_eq!(driver.registry().is_enabled(other_move), Some(false));

        driver.run_frame().unwrap();
        assert_eq!(driver.controllables().selected(), Some(other));
        assert_eq!(driver.registry().is_enabled(prop_move), Some(false));
        assert_eq!(driver.registry().is_enabled(other_move), Some(true));
    }

    struct PickEffect(usize);

    impl UiOverlay for PickEffect {
        fn draw(&mut self, state: &mut UiState, _: &FrameSummary) {
            state.active_effect = self.0;
        }
    }

    #[test]
    fn overlay_switch_lands_next_frame() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let mut driver = FrameDriver::new(config(), setup, gpu, ScriptedInput::new(0.1))
            .unwrap()
            .with_overlay(PickEffect(1));
        assert_eq!(driver.run_frame().unwrap().active_effect, 0);
        assert_eq!(driver.run_frame().unwrap().active_effect, 1);
    }

    #[test]
    fn overlay_out_of_range_effect_is_fatal() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let mut driver = FrameDriver::new(config(), setup, gpu, ScriptedInput::new(0.1))
            .unwrap()
            .with_overlay(PickEffect(5));
        assert!(matches!(driver.run_frame(), Err(FrameError::Render(_))));
    }

    #[test]
    fn invalid_initial_effect_is_rejected() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let config = DriverConfig {
            initial_effect: 2,
            ..config()
        };
        let input = ScriptedInput::new(0.1);
        assert!(FrameDriver::new(config, setup, gpu, input).is_err());
    }

    struct Explode;

    impl Behavior for Explode {
        fn name(&self) -> &'static str {
            "explode"
        }
        fn update(
            &mut self,
            entity: EntityId,
            _: &mut BehaviorContext<'_>,
        ) -> Result<(), BehaviorError> {
            Err(BehaviorError::Fault {
                behavior: "explode",
                entity,
                reason: "test".into(),
            })
        }
    }

    #[test]
    fn behavior_fault_stops_before_present() {
        let mut gpu = RecordingBackend::new();
        let (mut setup, prop) = setup(&mut gpu);
        setup.registry.bind(prop, Explode);
        let input = ScriptedInput::new(0.1).close_after(3);
        let mut driver = FrameDriver::new(config(), setup, gpu, input).unwrap();
        assert!(matches!(driver.run(), Err(FrameError::Behavior(_))));
        assert_eq!(driver.backend().frames_presented(), 0);
    }

    #[test]
    fn run_stops_on_close_request() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let input = ScriptedInput::new(0.5).close_after(4);
        let mut driver = FrameDriver::new(config(), setup, gpu, input).unwrap();
        let summary = driver.run().unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.avg_fps, 2.0);
    }

    #[test]
    fn debug_messages_are_drained_each_frame() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        gpu.push_debug_message(DebugMessage {
            source: "api".into(),
            id: 1,
            severity: DebugSeverity::High,
            message: "bad state".into(),
        });
        let mut driver = FrameDriver::new(config(), setup, gpu, ScriptedInput::new(0.1)).unwrap();
        driver.run_frame().unwrap();
        assert!(driver.backend_mut().drain_debug_messages().is_empty());
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut gpu = RecordingBackend::new();
        let (setup, _) = setup(&mut gpu);
        let tracker = setup.tracker.clone();
        let mut driver = FrameDriver::new(config(), setup, gpu, ScriptedInput::new(0.1)).unwrap();
        driver.run_frame().unwrap();
        let gpu = driver.shutdown();
        assert!(gpu.live_targets().is_empty());
        assert_eq!(tracker.live_count(), 0);
        // blit, lit shader, cube mesh
        assert_eq!(gpu.count(|c| matches!(c, GpuCommand::Release(_))), 3);
    }
}
