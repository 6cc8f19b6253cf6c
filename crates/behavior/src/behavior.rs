use std::any::Any;

use framecore_common::{EntityId, Transform};
use framecore_input::InputSource;
use framecore_scene::Scene;

use crate::error::BehaviorError;

/// Timing for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the previous frame, already clamped.
    pub delta: f32,
    /// Seconds since the loop started.
    pub elapsed: f64,
    pub frame: u64,
}

/// What a behavior may touch during its update.
pub struct BehaviorContext<'a> {
    pub scene: &'a mut Scene,
    pub input: &'a dyn InputSource,
    pub time: FrameTime,
}

impl BehaviorContext<'_> {
    /// Local transform of `entity`, or a `MissingTransform` error naming the
    /// calling behavior.
    pub fn transform_mut(
        &mut self,
        behavior: &'static str,
        entity: EntityId,
    ) -> Result<&mut Transform, BehaviorError> {
        self.scene
            .transform_mut(entity)
            .ok_or(BehaviorError::MissingTransform { behavior, entity })
    }
}

/// Downcasting support for boxed behaviors.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A per-entity update script.
pub trait Behavior: AsAny {
    fn name(&self) -> &'static str;

    fn update(
        &mut self,
        entity: EntityId,
        ctx: &mut BehaviorContext<'_>,
    ) -> Result<(), BehaviorError>;
}
